use axum::{
    Extension, Form,
    extract::State,
    response::Redirect,
};

use guestbook_types::api::{BrowseControlsForm, WordCloudForm};
use guestbook_types::models::MoodFilter;

use crate::home::back_to_page;
use crate::page::PageQuery;
use crate::session::{SessionEvent, SessionId};
use crate::state::AppState;

/// View mode, mood filter and search box, submitted together.
pub async fn update_controls(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    query: PageQuery,
    Form(form): Form<BrowseControlsForm>,
) -> Redirect {
    state
        .sessions
        .update(session, |s| {
            if let Some(mode) = form.view_mode {
                s.apply(SessionEvent::SetViewMode(mode));
            }
            if let Some(mood) = form.mood.as_deref() {
                s.apply(SessionEvent::SetMoodFilter(MoodFilter::from_option(mood)));
            }
            if form.search.is_some() || form.search_by.is_some() {
                let query = form.search.unwrap_or_else(|| s.search_query.clone());
                let scope = form.search_by.unwrap_or(s.search_scope);
                s.apply(SessionEvent::SetSearch { query, scope });
            }
        })
        .await;
    back_to_page(&query)
}

pub async fn clear_search(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    query: PageQuery,
) -> Redirect {
    state.sessions.apply(session, SessionEvent::ClearSearch).await;
    back_to_page(&query)
}

/// Reload the list and replay the loading animation.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    query: PageQuery,
) -> Redirect {
    state.sessions.apply(session, SessionEvent::Refresh).await;
    back_to_page(&query)
}

pub async fn toggle_word_cloud(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    query: PageQuery,
    Form(form): Form<WordCloudForm>,
) -> Redirect {
    state
        .sessions
        .apply(session, SessionEvent::SetWordCloud(form.show.is_some()))
        .await;
    back_to_page(&query)
}
