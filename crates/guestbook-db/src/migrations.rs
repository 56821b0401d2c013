use rusqlite::Connection;
use tracing::info;

use crate::{DEFAULT_HEADER, StoreError};

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Sheet DB: running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE sheet_rows (
                row_number  INTEGER PRIMARY KEY AUTOINCREMENT,
                cells       TEXT NOT NULL,
                appended_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;

        let header = serde_json::to_string(&DEFAULT_HEADER)
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        conn.execute("INSERT INTO sheet_rows (cells) VALUES (?1)", [&header])?;
    }

    Ok(())
}
