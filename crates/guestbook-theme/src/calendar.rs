use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

/// Source of public-holiday names.
pub trait HolidayCalendar: Send + Sync {
    /// Name of the holiday that falls on `date`, if any.
    fn holiday_name(&self, date: NaiveDate) -> Result<Option<String>>;
}

/// Calendar that never names a holiday, leaving detection to the
/// month/day range rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicOnly;

impl HolidayCalendar for HeuristicOnly {
    fn holiday_name(&self, _date: NaiveDate) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Exact holiday calendar loaded from a JSON object of
/// `"YYYY-MM-DD": "holiday name"` entries.
#[derive(Debug, Default, Clone)]
pub struct HolidayTable {
    days: HashMap<NaiveDate, String>,
}

impl HolidayTable {
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, String> =
            serde_json::from_str(json).context("holiday table is not a JSON object of strings")?;

        let mut days = HashMap::with_capacity(raw.len());
        for (day, name) in raw {
            let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                .with_context(|| format!("bad holiday date '{}'", day))?;
            days.insert(date, name);
        }
        Ok(Self { days })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading holiday table {}", path.display()))?;
        let table = Self::from_json(&json)?;
        info!("Loaded {} holidays from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl HolidayCalendar for HolidayTable {
    fn holiday_name(&self, date: NaiveDate) -> Result<Option<String>> {
        Ok(self.days.get(&date).cloned())
    }
}
