use serde::{Deserialize, Serialize};

use crate::models::{MessageRecord, Mood, SearchScope, Tab, ViewMode};

// -- Compose --

#[derive(Debug, Deserialize)]
pub struct SubmitMessageForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub mood: Mood,
    /// Checkbox: present (any value) when ticked.
    pub anonymous: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectTabForm {
    pub tab: Tab,
}

// -- Browse controls --

#[derive(Debug, Deserialize)]
pub struct BrowseControlsForm {
    pub view_mode: Option<ViewMode>,
    pub mood: Option<String>,
    pub search: Option<String>,
    pub search_by: Option<SearchScope>,
}

#[derive(Debug, Deserialize)]
pub struct WordCloudForm {
    /// Checkbox: present when the word cloud should be shown.
    pub show: Option<String>,
}

// -- JSON --

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodCount {
    pub mood: String,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub headers: Vec<String>,
    pub messages: Vec<MessageRecord>,
    pub moods: Vec<MoodCount>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThemeResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub liked: bool,
}
