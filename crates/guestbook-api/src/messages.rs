use axum::{
    Extension, Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info};

use guestbook_types::api::{MessagesResponse, SubmitMessageForm};
use guestbook_types::models::{
    ANONYMOUS_AUTHOR, MoodFilter, NewMessage, SearchScope, Tab, format_timestamp, local_now,
};

use crate::home::{back_to_page, render_page};
use crate::moods;
use crate::page::{ComposeDraft, PageQuery};
use crate::repository;
use crate::session::{SessionEvent, SessionId};
use crate::state::AppState;

pub const EMPTY_CONTENT: &str = "請輸入留言內容！";

/// Validate and append a message. Success redirects to the message list;
/// failures re-render the compose form with the visitor's input kept.
pub async fn submit_message(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    query: PageQuery,
    Form(form): Form<SubmitMessageForm>,
) -> Result<Response, StatusCode> {
    let anonymous = form.anonymous.is_some();
    let mood = form.mood;
    state
        .sessions
        .update(session, move |s| {
            s.apply(SessionEvent::SelectTab(Tab::Compose));
            s.apply(SessionEvent::SelectMood(mood));
        })
        .await;

    if form.content.trim().is_empty() {
        let draft = ComposeDraft {
            name: form.name,
            content: form.content,
            anonymous,
            error: EMPTY_CONTENT.to_string(),
        };
        let page = render_page(&state, session, query, Some(draft)).await?;
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    let author = if anonymous || form.name.trim().is_empty() {
        ANONYMOUS_AUTHOR.to_string()
    } else {
        form.name.clone()
    };
    let message = NewMessage {
        author,
        content: form.content.clone(),
        mood,
        timestamp: format_timestamp(local_now()),
    };

    if let Err(e) = state.append_row(message.into_row()).await {
        error!("Failed to append message: {}", e);
        let draft = ComposeDraft {
            name: form.name,
            content: form.content,
            anonymous,
            error: format!("發表留言時出錯: {}", e),
        };
        let page = render_page(&state, session, query, Some(draft)).await?;
        return Ok((StatusCode::SERVICE_UNAVAILABLE, page).into_response());
    }

    info!("New {} message appended", mood.text());
    state
        .sessions
        .apply(session, SessionEvent::SubmissionSucceeded)
        .await;
    Ok(back_to_page(&query).into_response())
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub mood: Option<String>,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub search_by: SearchScope,
}

/// All messages as JSON, optionally filtered like the message list. The mood
/// tally always covers the whole sheet.
pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>, StatusCode> {
    let rows = state.read_all_rows().await.map_err(|e| {
        error!("Failed to read messages: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let sheet = repository::parse(&rows);

    let filter = query
        .mood
        .as_deref()
        .map(MoodFilter::from_option)
        .unwrap_or_default();
    let messages = repository::apply_filters(&sheet.records, &filter, &query.search, query.search_by)
        .into_iter()
        .cloned()
        .collect();

    Ok(Json(MessagesResponse {
        headers: sheet.headers.clone(),
        moods: moods::aggregate(&sheet.records).into_vec(),
        messages,
    }))
}
