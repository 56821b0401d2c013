use std::convert::Infallible;

use axum::{
    Extension, Form, Json,
    extract::{FromRequestParts, Query, State},
    http::{StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{error, warn};

use guestbook_theme::detect_theme;
use guestbook_types::api::{SelectTabForm, ThemeResponse};
use guestbook_types::models::{Tab, local_now};

use crate::page::{self, ComposeDraft, PageQuery, RenderInput};
use crate::qr;
use crate::repository;
use crate::session::{SessionEvent, SessionId, SessionState};
use crate::state::AppState;

impl<S: Send + Sync> FromRequestParts<S> for PageQuery {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pairs = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map(|Query(pairs)| pairs)
            .unwrap_or_default();
        Ok(PageQuery::from_pairs(&pairs, parts.uri.query().map(str::to_string)))
    }
}

/// Back to the page, keeping the visitor's query parameters.
pub fn back_to_page(query: &PageQuery) -> Redirect {
    Redirect::to(&format!("/{}", query.suffix()))
}

/// Render the full page for a session. The sheet is only read when the
/// browse tab is showing, and the page is built outside the session lock.
pub async fn render_page(
    state: &AppState,
    session: SessionId,
    query: PageQuery,
    draft: Option<ComposeDraft>,
) -> Result<Html<String>, StatusCode> {
    let before = state.sessions.update(session, SessionState::checkout).await;

    let sheet = match before.tab {
        Tab::Compose => None,
        Tab::Browse => Some(match state.read_all_rows().await {
            Ok(rows) => Ok(repository::parse(&rows)),
            Err(e) => {
                error!("Failed to read messages: {}", e);
                Err(e.to_string())
            }
        }),
    };

    let input = RenderInput {
        query,
        detected: Some(detect_theme(&local_now(), &*state.calendar)),
        app_url: state.app_url.clone(),
        sheet,
        draft,
    };
    let mut after = before.clone();
    let view = page::render(&mut after, input, &mut rand::rng());
    state
        .sessions
        .update(session, |s| s.commit(&before, &after))
        .await;

    state.pages.render(&view).map(Html).map_err(|e| {
        error!("Page template failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    query: PageQuery,
) -> Result<Html<String>, StatusCode> {
    render_page(&state, session, query, None).await
}

pub async fn select_tab(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    query: PageQuery,
    Form(form): Form<SelectTabForm>,
) -> Redirect {
    state.sessions.apply(session, SessionEvent::SelectTab(form.tab)).await;
    back_to_page(&query)
}

/// QR code of the share link as an SVG image.
pub async fn qr_code(State(state): State<AppState>, query: PageQuery) -> Result<Response, StatusCode> {
    let url = query.share_url(&state.app_url);
    let svg = qr::qr_svg(url).map_err(|e| {
        warn!("QR code for '{}' failed: {}", url, e);
        StatusCode::UNPROCESSABLE_ENTITY
    })?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

/// The theme this request would be rendered with.
pub async fn get_theme(State(state): State<AppState>, query: PageQuery) -> Json<ThemeResponse> {
    let (theme, description, _) = query.theme(detect_theme(&local_now(), &*state.calendar));
    Json(ThemeResponse {
        id: theme.as_str().to_string(),
        name: theme.display_name().to_string(),
        description: description.to_string(),
        icon: theme.icon().to_string(),
    })
}

pub async fn health() -> &'static str {
    "ok"
}
