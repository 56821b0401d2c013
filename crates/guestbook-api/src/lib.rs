//! HTTP side of the guestbook: message parsing and filtering, mood
//! statistics, page rendering, per-visitor sessions and the axum handlers.

pub mod browse;
pub mod home;
pub mod messages;
pub mod middleware;
pub mod moods;
pub mod page;
pub mod qr;
pub mod reactions;
pub mod render;
pub mod repository;
pub mod routes;
pub mod session;
pub mod state;
pub mod wordcloud;

pub use routes::router;
pub use state::{AppState, AppStateInner};
