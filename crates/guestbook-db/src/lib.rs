pub mod memory;
pub mod migrations;
pub mod queries;
pub mod remote;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use thiserror::Error;
use tracing::info;

pub use memory::MemorySheet;
pub use remote::{RemoteSheet, ServiceAccountKey};

/// Header row written to a fresh sheet. Columns are read by position,
/// so these labels are for people looking at the sheet.
pub const DEFAULT_HEADER: [&str; 4] = ["名字", "留言內容", "你現在的心情", "時間"];

/// Any failure talking to the row store. Callers report all of them the
/// same way and never retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("row store unavailable: {0}")]
    Unavailable(String),
    #[error("sheet not found: {0}")]
    SheetNotFound(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("unexpected data from row store: {0}")]
    Decode(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}

/// Append-only store of string rows. Row 1 is the header.
pub trait RowStore: Send + Sync {
    /// Append one row after the last one. At most once: no dedup, no retry.
    fn append_row(&self, row: &[String]) -> Result<(), StoreError>;

    /// Every row in the store, header included, in sheet order.
    fn read_all_rows(&self) -> Result<Vec<Vec<String>>, StoreError>;
}

/// Sheet kept in a local SQLite file, one JSON-encoded row per record.
pub struct SqliteSheet {
    conn: Mutex<Connection>,
}

impl SqliteSheet {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Sheet database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Storage(format!("DB lock poisoned: {}", e)))?;
        f(&conn)
    }
}
