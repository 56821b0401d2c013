use std::collections::BTreeSet;

use guestbook_types::models::{ALL_MOODS, MessageId, MessageRecord, MoodFilter, SearchScope};

/// Column labels used when the sheet's header row is shorter than the schema.
const FALLBACK_LABELS: [&str; 4] = ["名字", "留言內容", "心情", "時間"];

/// Parsed contents of the row store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    /// Header labels, made unique.
    pub headers: Vec<String>,
    pub records: Vec<MessageRecord>,
}

impl Sheet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Display label of a schema column (0 = author .. 3 = timestamp).
    pub fn column_label(&self, index: usize) -> &str {
        self.headers
            .get(index)
            .map(String::as_str)
            .or_else(|| FALLBACK_LABELS.get(index).copied())
            .unwrap_or_default()
    }
}

/// Turn raw sheet rows into message records.
///
/// Row 0 is the header. Data rows are read by position (author, content,
/// mood, timestamp); missing trailing cells become `None` (or an empty
/// content). A sheet with no rows or only a header yields no records.
pub fn parse(raw_rows: &[Vec<String>]) -> Sheet {
    let Some((header, data)) = raw_rows.split_first() else {
        return Sheet::default();
    };

    let records = data
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let cell = |col: usize| row.get(col).cloned();
            MessageRecord {
                // +1 for the header, +1 for 1-based sheet rows
                id: MessageId(i + 2),
                author: cell(0),
                content: cell(1).unwrap_or_default(),
                mood: cell(2),
                timestamp: cell(3),
            }
        })
        .collect();

    Sheet {
        headers: unique_headers(header),
        records,
    }
}

/// Suffix repeated header labels with their column index so every label is
/// unique: `["a", "a"]` becomes `["a", "a_1"]`.
pub fn unique_headers(headers: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
        if unique.contains(header) {
            unique.push(format!("{}_{}", header, i));
        } else {
            unique.push(header.clone());
        }
    }
    unique
}

/// Options for the mood filter: "all" first, then every distinct non-empty
/// mood in sorted order.
pub fn mood_options(records: &[MessageRecord]) -> Vec<String> {
    let distinct: BTreeSet<&str> = records
        .iter()
        .filter_map(|r| r.mood.as_deref())
        .filter(|m| !m.is_empty())
        .collect();

    std::iter::once(ALL_MOODS.to_string())
        .chain(distinct.into_iter().map(str::to_string))
        .collect()
}

/// Mood filter, then case-insensitive substring search over the chosen field.
pub fn apply_filters<'a>(
    records: &'a [MessageRecord],
    mood: &MoodFilter,
    query: &str,
    scope: SearchScope,
) -> Vec<&'a MessageRecord> {
    let needle = query.to_lowercase();

    records
        .iter()
        .filter(|r| match mood {
            MoodFilter::All => true,
            MoodFilter::Only(wanted) => r.mood.as_deref().unwrap_or_default() == wanted.as_str(),
        })
        .filter(|r| {
            if needle.is_empty() {
                return true;
            }
            let haystack = match scope {
                SearchScope::Content => r.content.as_str(),
                SearchScope::Author => r.author.as_deref().unwrap_or_default(),
            };
            haystack.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Result line shown under an active search.
pub fn result_count_message(count: usize) -> String {
    format!("找到 {} 則符合條件的留言", count)
}
