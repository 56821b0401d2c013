use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::attach_session;
use crate::state::AppState;
use crate::{browse, home, messages, reactions};

/// All routes of the guestbook. Page routes run behind the session
/// middleware; the JSON, QR and health routes are stateless.
pub fn router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route("/", get(home::index))
        .route("/tab", post(home::select_tab))
        .route("/messages", post(messages::submit_message))
        .route("/messages/{row}/like", post(reactions::toggle_like))
        .route("/browse/controls", post(browse::update_controls))
        .route("/browse/clear-search", post(browse::clear_search))
        .route("/browse/refresh", post(browse::refresh))
        .route("/browse/word-cloud", post(browse::toggle_word_cloud))
        .layer(middleware::from_fn_with_state(state.clone(), attach_session));

    let open_routes = Router::new()
        .route("/qr.svg", get(home::qr_code))
        .route("/api/messages", get(messages::get_messages))
        .route("/api/theme", get(home::get_theme))
        .route("/health", get(home::health));

    Router::new()
        .merge(page_routes)
        .merge(open_routes)
        .with_state(state)
}
