use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{DEFAULT_HEADER, RowStore, StoreError};

/// Row store held in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySheet {
    rows: Mutex<Vec<Vec<String>>>,
    appends: AtomicUsize,
}

impl MemorySheet {
    /// A sheet with no rows at all, not even a header.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sheet holding just the default header row.
    pub fn with_header() -> Self {
        Self::from_rows(vec![DEFAULT_HEADER.iter().map(|h| h.to_string()).collect()])
    }

    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows: Mutex::new(rows),
            appends: AtomicUsize::new(0),
        }
    }

    /// Number of successful `append_row` calls.
    pub fn append_count(&self) -> usize {
        self.appends.load(Ordering::Relaxed)
    }
}

impl RowStore for MemorySheet {
    fn append_row(&self, row: &[String]) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|e| StoreError::Storage(format!("sheet lock poisoned: {}", e)))?;
        rows.push(row.to_vec());
        self.appends.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn read_all_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        let rows = self
            .rows
            .lock()
            .map_err(|e| StoreError::Storage(format!("sheet lock poisoned: {}", e)))?;
        Ok(rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_appends() {
        let sheet = MemorySheet::with_header();
        assert_eq!(sheet.append_count(), 0);
        sheet.append_row(&["a".into(), "b".into()]).unwrap();
        assert_eq!(sheet.append_count(), 1);
        assert_eq!(sheet.read_all_rows().unwrap().len(), 2);
    }
}
