use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};

use guestbook_types::api::LikeResponse;
use guestbook_types::models::MessageId;

use crate::home::back_to_page;
use crate::page::PageQuery;
use crate::session::{SessionEvent, SessionId};
use crate::state::AppState;

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

/// Like or unlike a message for this session. Likes live in the session
/// only; the sheet is never touched.
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(row): Path<usize>,
    Extension(session): Extension<SessionId>,
    query: PageQuery,
    headers: HeaderMap,
) -> Response {
    let id = MessageId(row);
    let liked = state
        .sessions
        .update(session, |s| {
            s.apply(SessionEvent::ToggleLike(id));
            s.is_liked(id)
        })
        .await;

    if wants_json(&headers) {
        Json(LikeResponse { liked }).into_response()
    } else {
        back_to_page(&query).into_response()
    }
}
