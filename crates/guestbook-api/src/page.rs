use std::str::FromStr;

use handlebars::{Handlebars, RenderError, TemplateError};
use rand::Rng;
use serde::Serialize;
use tracing::warn;

use guestbook_theme::ThemeId;
use guestbook_theme::styles::{Snowflake, snowflakes};
use guestbook_types::models::{Mood, MoodFilter, SearchScope, Tab, ViewMode};

use crate::moods::{self, LegendEntry};
use crate::qr;
use crate::render::{self, BlockRow};
use crate::repository::{self, Sheet};
use crate::session::SessionState;
use crate::wordcloud::{self, WordCloud};

pub const EMPTY_SHEET: &str = "目前還沒有留言，成為第一個留言的人吧！";
pub const SUBMITTED: &str = "留言成功發表！";
pub const NO_WORD_CLOUD: &str = "無法生成詞雲，留言內容可能不足";
pub const NO_CHART: &str = "無法繪製心情圖表";
pub const NO_QR: &str = "無法產生 QR 碼，請直接使用下方連結";

// -- Query parameters --

/// The query parameters a page understands. Repeated parameters keep their
/// first value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub dev_mode: bool,
    pub app_url: Option<String>,
    pub theme: Option<String>,
    /// The query string as received, forwarded on every form so a visitor
    /// stays in the same mode.
    pub raw: Option<String>,
}

impl PageQuery {
    pub fn from_pairs(pairs: &[(String, String)], raw: Option<String>) -> Self {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        Self {
            dev_mode: first("dev_mode").is_some_and(|v| v.to_lowercase() == "true"),
            app_url: first("app_url").filter(|u| is_http_url(u)),
            theme: first("theme"),
            raw: raw.filter(|r| !r.is_empty()),
        }
    }

    /// `?…` suffix for links and form actions, empty without a query.
    pub fn suffix(&self) -> String {
        self.raw.as_ref().map(|r| format!("?{}", r)).unwrap_or_default()
    }

    /// Share link: the request's `app_url` when valid, `fallback` otherwise.
    pub fn share_url<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.app_url.as_deref().unwrap_or(fallback)
    }

    /// Theme for this render: the developer preview in dev mode, `detected`
    /// otherwise. Never stored.
    pub fn theme(&self, detected: (ThemeId, &'static str)) -> (ThemeId, &'static str, bool) {
        if !self.dev_mode {
            return (detected.0, detected.1, false);
        }
        match self.theme.as_deref().map(ThemeId::from_str) {
            Some(Ok(theme)) => (theme, theme.description(), true),
            Some(Err(e)) => {
                warn!("Ignoring theme preview: {}", e);
                (detected.0, detected.1, false)
            }
            None => (detected.0, detected.1, false),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

// -- View model --

/// One option of a select box, radio group or tab bar.
#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl Choice {
    fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThemeView {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub css: String,
    pub top_animation: Option<&'static str>,
    pub bottom_animation: Option<&'static str>,
    pub snowflakes: Vec<Snowflake>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DevPanel {
    pub themes: Vec<Choice>,
    pub app_url: Option<String>,
    /// Set when a preview theme is active.
    pub applied: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareView {
    pub app_url: String,
    pub qr_svg: Option<String>,
    pub qr_note: Option<&'static str>,
}

/// What the visitor typed into a rejected compose form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeDraft {
    pub name: String,
    pub content: String,
    pub anonymous: bool,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposeView {
    pub name: String,
    pub content: String,
    pub anonymous: bool,
    pub moods: Vec<Choice>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BrowseView {
    pub error: Option<String>,
    pub notice: Option<&'static str>,
    pub loading: bool,
    pub total: usize,
    pub chart_svg: Option<String>,
    pub chart_note: Option<&'static str>,
    pub legend: Vec<LegendEntry>,
    pub show_word_cloud: bool,
    pub word_cloud: Option<WordCloud>,
    pub word_cloud_note: Option<&'static str>,
    pub view_modes: Vec<Choice>,
    pub mood_options: Vec<Choice>,
    pub search_query: String,
    pub search_scopes: Vec<Choice>,
    pub result_message: Option<String>,
    pub heading: &'static str,
    /// `card`, `timeline` or `grid`; selects the row styling.
    pub layout: &'static str,
    pub rows: Vec<BlockRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub theme: ThemeView,
    pub dev: Option<DevPanel>,
    pub share: ShareView,
    pub tabs: Vec<Choice>,
    /// `?…` to append to every form action.
    pub query: String,
    pub success: Option<&'static str>,
    pub compose: Option<ComposeView>,
    pub browse: Option<BrowseView>,
}

/// Inputs of one page render besides the session itself.
#[derive(Debug, Clone, Default)]
pub struct RenderInput {
    pub query: PageQuery,
    /// Theme picked by the date rules for this request.
    pub detected: Option<(ThemeId, &'static str)>,
    /// Share link fallback.
    pub app_url: String,
    /// Sheet contents for the browse tab, or the read error.
    pub sheet: Option<Result<Sheet, String>>,
    pub draft: Option<ComposeDraft>,
}

/// Build the page for the session's active tab, consuming its one-shot
/// flags.
pub fn render<R: Rng + ?Sized>(state: &mut SessionState, input: RenderInput, rng: &mut R) -> PageView {
    let detected = input
        .detected
        .unwrap_or((ThemeId::Default, ThemeId::Default.description()));
    let (theme, description, previewing) = input.query.theme(detected);
    let suffix = input.query.suffix();

    let success = state.take_submission_ack().then_some(SUBMITTED);

    let (compose, browse) = match state.tab {
        Tab::Compose => (Some(compose_view(state, input.draft)), None),
        Tab::Browse => (None, Some(browse_view(state, input.sheet, &suffix, rng))),
    };

    let app_url = input.query.share_url(&input.app_url).to_string();

    PageView {
        theme: theme_view(theme, description, rng),
        dev: input.query.dev_mode.then(|| dev_panel(theme, &input.query, previewing)),
        share: share_view(app_url),
        tabs: [Tab::Compose, Tab::Browse]
            .into_iter()
            .map(|t| Choice::new(tab_value(t), t.label(), t == state.tab))
            .collect(),
        query: suffix,
        success,
        compose,
        browse,
    }
}

fn tab_value(tab: Tab) -> &'static str {
    match tab {
        Tab::Compose => "compose",
        Tab::Browse => "browse",
    }
}

fn mood_value(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "happy",
        Mood::Sad => "sad",
        Mood::Angry => "angry",
        Mood::Tired => "tired",
        Mood::Loved => "loved",
        Mood::Thinking => "thinking",
    }
}

fn theme_view<R: Rng + ?Sized>(theme: ThemeId, description: &'static str, rng: &mut R) -> ThemeView {
    let (top_animation, bottom_animation) = theme.icon_animations();
    ThemeView {
        id: theme.as_str(),
        name: theme.display_name(),
        description,
        icon: theme.icon(),
        css: theme.css(),
        top_animation,
        bottom_animation,
        snowflakes: snowflakes(theme, rng),
    }
}

fn dev_panel(current: ThemeId, query: &PageQuery, previewing: bool) -> DevPanel {
    DevPanel {
        themes: ThemeId::ALL
            .into_iter()
            .map(|t| Choice::new(t.as_str(), t.display_name(), t == current))
            .collect(),
        app_url: query.app_url.clone(),
        applied: previewing.then(|| format!("已應用 {} 主題", current.display_name())),
    }
}

fn share_view(app_url: String) -> ShareView {
    match qr::qr_svg(&app_url) {
        Ok(svg) => ShareView {
            app_url,
            qr_svg: Some(svg),
            qr_note: None,
        },
        Err(e) => {
            warn!("QR code for '{}' failed: {}", app_url, e);
            ShareView {
                app_url,
                qr_svg: None,
                qr_note: Some(NO_QR),
            }
        }
    }
}

fn compose_view(state: &SessionState, draft: Option<ComposeDraft>) -> ComposeView {
    let draft = draft.unwrap_or_default();
    ComposeView {
        name: draft.name,
        content: draft.content,
        anonymous: draft.anonymous,
        moods: Mood::ALL
            .into_iter()
            .map(|m| Choice::new(mood_value(m), m.label(), m == state.mood))
            .collect(),
        error: Some(draft.error).filter(|e| !e.is_empty()),
    }
}

fn browse_view<R: Rng + ?Sized>(
    state: &mut SessionState,
    sheet: Option<Result<Sheet, String>>,
    suffix: &str,
    rng: &mut R,
) -> BrowseView {
    let mut view = BrowseView {
        show_word_cloud: state.show_word_cloud,
        view_modes: ViewMode::ALL
            .into_iter()
            .map(|m| Choice::new(m.as_str(), m.label(), m == state.view_mode))
            .collect(),
        search_query: state.search_query.clone(),
        search_scopes: [SearchScope::Content, SearchScope::Author]
            .into_iter()
            .map(|s| Choice::new(s.as_str(), s.label(), s == state.search_scope))
            .collect(),
        heading: state.view_mode.heading(),
        ..BrowseView::default()
    };

    let sheet = match sheet {
        Some(Ok(sheet)) => sheet,
        Some(Err(e)) => {
            view.error = Some(format!("獲取留言時出錯: {}", e));
            return view;
        }
        None => Sheet::default(),
    };

    if sheet.is_empty() {
        view.notice = Some(EMPTY_SHEET);
        return view;
    }
    let records = &sheet.records;
    view.total = records.len();

    let tally = moods::aggregate(records);
    view.legend = moods::legend(&tally);
    match moods::mood_chart_svg(&tally) {
        Ok(svg) => view.chart_svg = svg,
        Err(e) => {
            warn!("Mood chart failed: {}", e);
            view.chart_note = Some(NO_CHART);
        }
    }

    if state.show_word_cloud {
        view.word_cloud = wordcloud::word_cloud(records);
        if view.word_cloud.is_none() {
            view.word_cloud_note = Some(NO_WORD_CLOUD);
        }
    }

    // a filter left over from an older snapshot of the sheet falls back to all
    let options = repository::mood_options(records);
    if !options.iter().any(|o| o == state.mood_filter.as_option()) {
        state.mood_filter = MoodFilter::All;
    }
    let selected = state.mood_filter.as_option().to_string();
    view.mood_options = options
        .into_iter()
        .map(|o| {
            let is_selected = o == selected;
            Choice::new(o.clone(), o, is_selected)
        })
        .collect();

    let filtered = repository::apply_filters(
        records,
        &state.mood_filter,
        &state.search_query,
        state.search_scope,
    );
    if state.search_active() {
        view.result_message = Some(repository::result_count_message(filtered.len()));
    }

    view.loading = state.take_animation();
    view.layout = state.view_mode.as_str();

    let mut rows = render::render_blocks(&filtered, state.view_mode, &state.liked, rng);
    for block in rows.iter_mut().flat_map(|r| r.blocks.iter_mut()) {
        block.like_action.push_str(suffix);
    }
    view.rows = rows;
    view
}

// -- Templates --

/// The compiled page templates.
pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.register_template_string("page", include_str!("../templates/page.hbs"))?;
        registry.register_partial("styles", include_str!("../templates/styles.hbs"))?;
        registry.register_partial("sidebar", include_str!("../templates/sidebar.hbs"))?;
        registry.register_partial("compose", include_str!("../templates/compose.hbs"))?;
        registry.register_partial("browse", include_str!("../templates/browse.hbs"))?;
        registry.register_partial("message", include_str!("../templates/message.hbs"))?;
        Ok(Self { registry })
    }

    pub fn render(&self, view: &PageView) -> Result<String, RenderError> {
        self.registry.render("page", view)
    }
}
