use rusqlite::Connection;

use crate::{RowStore, SqliteSheet, StoreError};

impl RowStore for SqliteSheet {
    fn append_row(&self, row: &[String]) -> Result<(), StoreError> {
        let cells = serde_json::to_string(row).map_err(|e| StoreError::Storage(e.to_string()))?;
        self.with_conn(|conn| {
            conn.execute("INSERT INTO sheet_rows (cells) VALUES (?1)", [&cells])?;
            Ok(())
        })
    }

    fn read_all_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        self.with_conn(query_rows)
    }
}

fn query_rows(conn: &Connection) -> Result<Vec<Vec<String>>, StoreError> {
    let mut stmt = conn.prepare("SELECT row_number, cells FROM sheet_rows ORDER BY row_number")?;

    let raw = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(number, cells)| {
            serde_json::from_str::<Vec<String>>(&cells)
                .map_err(|e| StoreError::Decode(format!("row {}: {}", number, e)))
        })
        .collect()
}
