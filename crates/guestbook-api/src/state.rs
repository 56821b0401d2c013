use std::sync::Arc;

use tracing::error;

use guestbook_db::{RowStore, StoreError};
use guestbook_theme::HolidayCalendar;

use crate::page::Pages;
use crate::session::SessionStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn RowStore>,
    pub sessions: SessionStore,
    pub calendar: Arc<dyn HolidayCalendar>,
    /// Share link used when the request does not name one.
    pub app_url: String,
    pub pages: Pages,
}

impl AppStateInner {
    pub fn new(
        store: Arc<dyn RowStore>,
        calendar: Arc<dyn HolidayCalendar>,
        app_url: impl Into<String>,
    ) -> anyhow::Result<AppState> {
        Ok(Arc::new(Self {
            store,
            sessions: SessionStore::new(),
            calendar,
            app_url: app_url.into(),
            pages: Pages::new()?,
        }))
    }

    /// Read the whole sheet off the async runtime.
    pub async fn read_all_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.read_all_rows())
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                StoreError::Storage(e.to_string())
            })?
    }

    /// Append one row off the async runtime.
    pub async fn append_row(&self, row: Vec<String>) -> Result<(), StoreError> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.append_row(&row))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                StoreError::Storage(e.to_string())
            })?
    }
}
