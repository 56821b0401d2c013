use std::fmt;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder author for anonymous or nameless posts.
pub const ANONYMOUS_AUTHOR: &str = "匿名用戶";

/// Mood label used when a row has no mood cell.
pub const UNKNOWN_MOOD: &str = "未知";

/// Filter option that disables mood filtering.
pub const ALL_MOODS: &str = "全部心情";

/// Cell format of the timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const LOCAL_OFFSET_SECS: i32 = 8 * 3600;

/// Fixed local offset of the guestbook (Asia/Taipei, no DST).
pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Current time in the guestbook's local offset.
pub fn local_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&local_offset())
}

/// Format a timestamp the way it is written to the row store.
pub fn format_timestamp(at: DateTime<FixedOffset>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

// -- Mood --

/// The six moods a visitor can attach to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    #[default]
    Happy,
    Sad,
    Angry,
    Tired,
    Loved,
    Thinking,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Tired,
        Mood::Loved,
        Mood::Thinking,
    ];

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Sad => "😢",
            Mood::Angry => "😡",
            Mood::Tired => "😴",
            Mood::Loved => "🥰",
            Mood::Thinking => "🤔",
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Mood::Happy => "開心",
            Mood::Sad => "難過",
            Mood::Angry => "生氣",
            Mood::Tired => "疲倦",
            Mood::Loved => "感動",
            Mood::Thinking => "思考中",
        }
    }

    /// Cell text written to the row store, e.g. `😊 開心`.
    pub fn label(self) -> String {
        format!("{} {}", self.emoji(), self.text())
    }

    /// CSS class that animates the emoji in the message lists.
    pub fn animation_class(self) -> &'static str {
        match self {
            Mood::Happy => "mood-happy",
            Mood::Sad => "mood-sad",
            Mood::Angry => "mood-angry",
            Mood::Tired => "mood-tired",
            Mood::Loved => "mood-love",
            Mood::Thinking => "mood-thinking",
        }
    }

    /// Recognise a mood from a stored cell by its emoji.
    ///
    /// Cells are free text in the sheet, so a bare emoji or a label with a
    /// different wording still maps to its mood.
    pub fn from_cell(cell: &str) -> Option<Mood> {
        Mood::ALL.into_iter().find(|m| cell.contains(m.emoji()))
    }
}

// -- Browse controls --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Compose,
    Browse,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Tab::Compose => "發表留言",
            Tab::Browse => "留言廣場",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Card,
    Timeline,
    Grid,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Card, ViewMode::Timeline, ViewMode::Grid];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Card => "卡片模式",
            ViewMode::Timeline => "時間軸模式",
            ViewMode::Grid => "網格模式",
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            ViewMode::Card => "💌 留言卡片",
            ViewMode::Timeline => "⏰ 留言時間軸",
            ViewMode::Grid => "🧩 留言牆",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Card => "card",
            ViewMode::Timeline => "timeline",
            ViewMode::Grid => "grid",
        }
    }
}

/// Which field the search box matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    Content,
    Author,
}

impl SearchScope {
    pub fn label(self) -> &'static str {
        match self {
            SearchScope::Content => "內容",
            SearchScope::Author => "用戶名",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SearchScope::Content => "content",
            SearchScope::Author => "author",
        }
    }
}

/// Mood filter: everything, or rows whose mood cell equals the value exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MoodFilter {
    #[default]
    All,
    Only(String),
}

impl MoodFilter {
    /// Build a filter from the value submitted by the filter select box.
    pub fn from_option(value: &str) -> Self {
        if value.is_empty() || value == ALL_MOODS {
            MoodFilter::All
        } else {
            MoodFilter::Only(value.to_string())
        }
    }

    pub fn as_option(&self) -> &str {
        match self {
            MoodFilter::All => ALL_MOODS,
            MoodFilter::Only(mood) => mood,
        }
    }
}

// -- Messages --

/// Identifier of a stored message: its 1-based row number in the sheet.
///
/// The store is append-only, so a row number never changes meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub usize);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message read back from the row store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: MessageId,
    pub author: Option<String>,
    pub content: String,
    pub mood: Option<String>,
    pub timestamp: Option<String>,
}

impl MessageRecord {
    pub fn author_or_anonymous(&self) -> &str {
        match self.author.as_deref() {
            Some(author) if !author.is_empty() => author,
            _ => ANONYMOUS_AUTHOR,
        }
    }

    /// Author + timestamp key used by older deployments to track likes.
    /// Not unique: two anonymous posts in the same second collide.
    pub fn legacy_key(&self) -> String {
        format!(
            "{}_{}",
            self.author.as_deref().unwrap_or_default(),
            self.timestamp.as_deref().unwrap_or_default()
        )
    }
}

/// A message about to be appended, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub author: String,
    pub content: String,
    pub mood: Mood,
    pub timestamp: String,
}

impl NewMessage {
    /// The four cells in sheet column order: author, content, mood, timestamp.
    pub fn into_row(self) -> Vec<String> {
        vec![self.author, self.content, self.mood.label(), self.timestamp]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_recognised_from_bare_emoji_and_label() {
        assert_eq!(Mood::from_cell("😢"), Some(Mood::Sad));
        assert_eq!(Mood::from_cell("🤔 思考中"), Some(Mood::Thinking));
        assert_eq!(Mood::from_cell("sleepy"), None);
    }

    #[test]
    fn new_message_row_is_in_column_order() {
        let row = NewMessage {
            author: "Alice".into(),
            content: "Hello world".into(),
            mood: Mood::Happy,
            timestamp: "2024-05-01 10:00:00".into(),
        }
        .into_row();
        assert_eq!(row, vec!["Alice", "Hello world", "😊 開心", "2024-05-01 10:00:00"]);
    }

    #[test]
    fn anonymous_fallback_for_blank_author() {
        let record = MessageRecord {
            id: MessageId(2),
            author: Some(String::new()),
            content: "hi".into(),
            mood: None,
            timestamp: None,
        };
        assert_eq!(record.author_or_anonymous(), ANONYMOUS_AUTHOR);
        assert_eq!(record.legacy_key(), "_");
    }

    #[test]
    fn same_second_anonymous_posts_share_legacy_key_but_not_id() {
        let post = |row: usize, content: &str| MessageRecord {
            id: MessageId(row),
            author: Some(ANONYMOUS_AUTHOR.into()),
            content: content.into(),
            mood: Some(Mood::Happy.label()),
            timestamp: Some("2024-05-01 10:00:00".into()),
        };
        let (first, second) = (post(2, "hi"), post(3, "hello"));

        assert_eq!(first.legacy_key(), "匿名用戶_2024-05-01 10:00:00");
        assert_eq!(first.legacy_key(), second.legacy_key());
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn timestamps_use_taipei_offset() {
        let at = chrono::DateTime::parse_from_rfc3339("2024-05-01T02:00:00Z")
            .unwrap()
            .with_timezone(&local_offset());
        assert_eq!(format_timestamp(at), "2024-05-01 10:00:00");
    }
}
