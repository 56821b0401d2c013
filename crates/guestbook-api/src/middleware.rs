use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;
use uuid::Uuid;

use crate::session::SessionId;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "guestbook_session";

/// Resolve the visitor's session from the session cookie, starting a new one
/// when the cookie is missing or names a session this process never issued.
/// Handlers read the result as `Extension<SessionId>`.
pub async fn attach_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let cookie_id = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
        .map(SessionId);

    let (id, fresh) = match cookie_id {
        Some(id) if state.sessions.touch(id).await => (id, false),
        _ => {
            let id = state.sessions.create().await;
            debug!("Started session {}", id.0);
            (id, true)
        }
    };

    req.extensions_mut().insert(id);
    let response = next.run(req).await;

    if fresh {
        let cookie = Cookie::build((SESSION_COOKIE, id.0.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        (jar.add(cookie), response).into_response()
    } else {
        response
    }
}
