use std::collections::HashSet;

use rand::Rng;
use serde::Serialize;

use guestbook_types::models::{MessageId, MessageRecord, ViewMode};

/// Shown when a record has no mood cell.
const DEFAULT_EMOJI: &str = "😊";
const DEFAULT_ANIMATION: &str = "mood-happy";
const MISSING_TIME: &str = "N/A";

const CARDS_PER_ROW: usize = 2;
const NOTES_PER_ROW: usize = 3;

pub const LIKED_LABEL: &str = "❤️ 已讚";
pub const NOT_LIKED_LABEL: &str = "🤍 讚";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Right,
}

/// Everything the templates need to draw one message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageBlock {
    pub id: MessageId,
    pub author: String,
    pub content: String,
    pub emoji: String,
    pub animation_class: Option<&'static str>,
    pub time_label: String,
    pub liked: bool,
    pub like_label: &'static str,
    /// Form action of the like toggle.
    pub like_action: String,
    /// Inline style of the block's box.
    pub style: String,
    /// Timeline only.
    pub align: Option<Align>,
    pub arrow: Option<&'static str>,
    pub arrow_style: Option<&'static str>,
}

/// One visual row: a line of cards or notes, or a single timeline entry.
#[derive(Debug, Clone, Serialize)]
pub struct BlockRow {
    pub blocks: Vec<MessageBlock>,
    /// Draw the vertical timeline connector below this row.
    pub connector_after: bool,
}

/// Lay the records out for the chosen view mode.
///
/// Colors and rotations come from `rng`, so a seeded generator gives a
/// reproducible page.
pub fn render_blocks<R: Rng + ?Sized>(
    records: &[&MessageRecord],
    mode: ViewMode,
    liked: &HashSet<MessageId>,
    rng: &mut R,
) -> Vec<BlockRow> {
    match mode {
        ViewMode::Card => records
            .chunks(CARDS_PER_ROW)
            .map(|chunk| BlockRow {
                blocks: chunk.iter().map(|r| card(r, liked, rng)).collect(),
                connector_after: false,
            })
            .collect(),
        ViewMode::Timeline => {
            let last = records.len().saturating_sub(1);
            records
                .iter()
                .enumerate()
                .map(|(i, r)| BlockRow {
                    blocks: vec![timeline_entry(r, i, liked)],
                    connector_after: i < last,
                })
                .collect()
        }
        ViewMode::Grid => records
            .chunks(NOTES_PER_ROW)
            .map(|chunk| BlockRow {
                blocks: chunk.iter().map(|r| sticky_note(r, liked, rng)).collect(),
                connector_after: false,
            })
            .collect(),
    }
}

fn card<R: Rng + ?Sized>(record: &MessageRecord, liked: &HashSet<MessageId>, rng: &mut R) -> MessageBlock {
    let (r, g, b) = (
        rng.random_range(200..=255u8),
        rng.random_range(200..=255u8),
        rng.random_range(200..=255u8),
    );
    let mut block = base_block(record, liked, time_label(record));
    block.style = format!("background-color: rgba({}, {}, {}, 0.3);", r, g, b);
    block
}

fn timeline_entry(record: &MessageRecord, index: usize, liked: &HashSet<MessageId>) -> MessageBlock {
    let align = if index % 2 == 0 { Align::Right } else { Align::Left };
    let mut block = base_block(record, liked, time_label(record));

    let (background, border) = match align {
        Align::Right => ("#E3F2FD", "#2196F3"),
        Align::Left => ("#F5F5F5", "#9E9E9E"),
    };
    block.style = format!("background-color: {}; border-left: 5px solid {};", background, border);
    block.align = Some(align);
    block.arrow = Some(match align {
        Align::Right => "◀️",
        Align::Left => "▶️",
    });
    block.arrow_style = Some(match align {
        Align::Right => "position: absolute; left: -25px; top: 15px;",
        Align::Left => "position: absolute; right: -25px; top: 15px;",
    });
    block
}

fn sticky_note<R: Rng + ?Sized>(record: &MessageRecord, liked: &HashSet<MessageId>, rng: &mut R) -> MessageBlock {
    let hue = rng.random_range(0..=360u16);
    let rotation = rng.random_range(-3..=3i8);

    let date = time_label(record);
    let date = date.split(' ').next().unwrap_or_default().to_string();

    let mut block = base_block(record, liked, date);
    block.style = format!(
        "background-color: hsla({hue}, 70%, 85%, 0.9); border: 1px solid hsla({hue}, 70%, 60%, 1); transform: rotate({rotation}deg);"
    );
    block
}

fn base_block(record: &MessageRecord, liked: &HashSet<MessageId>, time_label: String) -> MessageBlock {
    let (emoji, animation_class) = mood_display(record.mood.as_deref());
    let is_liked = liked.contains(&record.id);

    MessageBlock {
        id: record.id,
        author: record.author_or_anonymous().to_string(),
        content: record.content.clone(),
        emoji,
        animation_class,
        time_label,
        liked: is_liked,
        like_label: like_label(is_liked),
        like_action: format!("/messages/{}/like", record.id),
        style: String::new(),
        align: None,
        arrow: None,
        arrow_style: None,
    }
}

fn time_label(record: &MessageRecord) -> String {
    match record.timestamp.as_deref() {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => MISSING_TIME.to_string(),
    }
}

pub fn like_label(liked: bool) -> &'static str {
    if liked { LIKED_LABEL } else { NOT_LIKED_LABEL }
}

/// Display emoji (first space-separated token) and animation class of a mood
/// cell. A missing cell shows as a happy face.
pub fn mood_display(cell: Option<&str>) -> (String, Option<&'static str>) {
    let cell = match cell {
        Some(c) if !c.is_empty() => c,
        _ => return (DEFAULT_EMOJI.to_string(), Some(DEFAULT_ANIMATION)),
    };
    let class = guestbook_types::models::Mood::from_cell(cell).map(|m| m.animation_class());
    let emoji = cell.split(' ').next().unwrap_or(cell).to_string();
    (emoji, class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn record(row: usize, author: &str, mood: Option<&str>, ts: Option<&str>) -> MessageRecord {
        MessageRecord {
            id: MessageId(row),
            author: Some(author.to_string()),
            content: format!("message {}", row),
            mood: mood.map(str::to_string),
            timestamp: ts.map(str::to_string),
        }
    }

    fn five() -> Vec<MessageRecord> {
        (2..7)
            .map(|row| record(row, "Alice", Some("😢 難過"), Some("2024-05-01 10:00:00")))
            .collect()
    }

    #[test]
    fn cards_come_two_per_row() {
        let records = five();
        let refs: Vec<&MessageRecord> = records.iter().collect();
        let rows = render_blocks(&refs, ViewMode::Card, &HashSet::new(), &mut StdRng::seed_from_u64(7));

        let sizes: Vec<usize> = rows.iter().map(|r| r.blocks.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        let first = &rows[0].blocks[0];
        assert!(first.style.starts_with("background-color: rgba("));
        assert!(first.style.ends_with(", 0.3);"));
        assert_eq!(first.emoji, "😢");
        assert_eq!(first.animation_class, Some("mood-sad"));
        assert_eq!(first.time_label, "2024-05-01 10:00:00");
    }

    #[test]
    fn timeline_alternates_and_connects_all_but_last() {
        let records = five();
        let refs: Vec<&MessageRecord> = records.iter().collect();
        let rows = render_blocks(&refs, ViewMode::Timeline, &HashSet::new(), &mut StdRng::seed_from_u64(7));

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].blocks[0].align, Some(Align::Right));
        assert_eq!(rows[0].blocks[0].arrow, Some("◀️"));
        assert_eq!(rows[1].blocks[0].align, Some(Align::Left));
        assert_eq!(rows[1].blocks[0].arrow, Some("▶️"));
        assert!(rows[0].blocks[0].style.contains("#2196F3"));

        let connectors: Vec<bool> = rows.iter().map(|r| r.connector_after).collect();
        assert_eq!(connectors, vec![true, true, true, true, false]);
    }

    #[test]
    fn single_timeline_entry_has_no_connector() {
        let records = vec![record(2, "Bob", None, None)];
        let refs: Vec<&MessageRecord> = records.iter().collect();
        let rows = render_blocks(&refs, ViewMode::Timeline, &HashSet::new(), &mut StdRng::seed_from_u64(1));
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].connector_after);
        assert_eq!(rows[0].blocks[0].time_label, MISSING_TIME);
    }

    #[test]
    fn grid_notes_show_date_only_and_small_rotation() {
        let records = five();
        let refs: Vec<&MessageRecord> = records.iter().collect();
        let rows = render_blocks(&refs, ViewMode::Grid, &HashSet::new(), &mut StdRng::seed_from_u64(3));

        let sizes: Vec<usize> = rows.iter().map(|r| r.blocks.len()).collect();
        assert_eq!(sizes, vec![3, 2]);
        for block in rows.iter().flat_map(|r| &r.blocks) {
            assert_eq!(block.time_label, "2024-05-01");
            assert!(block.style.contains("70%, 85%, 0.9)"));
            let deg: i32 = block
                .style
                .split("rotate(")
                .nth(1)
                .and_then(|s| s.split("deg").next())
                .and_then(|s| s.parse().ok())
                .unwrap();
            assert!((-3..=3).contains(&deg));
        }
    }

    #[test]
    fn like_state_follows_message_id() {
        let records = vec![
            record(2, "Alice", Some("😊 開心"), Some("2024-05-01 10:00:00")),
            // same author and second: only the row number tells them apart
            record(3, "Alice", Some("😊 開心"), Some("2024-05-01 10:00:00")),
        ];
        let refs: Vec<&MessageRecord> = records.iter().collect();
        let liked: HashSet<MessageId> = [MessageId(3)].into_iter().collect();

        for mode in ViewMode::ALL {
            let rows = render_blocks(&refs, mode, &liked, &mut StdRng::seed_from_u64(9));
            let blocks: Vec<&MessageBlock> = rows.iter().flat_map(|r| &r.blocks).collect();
            assert_eq!(blocks[0].like_label, NOT_LIKED_LABEL);
            assert_eq!(blocks[1].like_label, LIKED_LABEL);
            assert!(blocks[1].liked);
        }
    }

    #[test]
    fn mood_display_rules() {
        assert_eq!(mood_display(None), ("😊".to_string(), Some("mood-happy")));
        assert_eq!(mood_display(Some("🥰 感動")), ("🥰".to_string(), Some("mood-love")));
        assert_eq!(mood_display(Some("🤔")), ("🤔".to_string(), Some("mood-thinking")));
        assert_eq!(mood_display(Some("meh so-so")), ("meh".to_string(), None));
    }

    #[test]
    fn empty_input_renders_nothing() {
        for mode in ViewMode::ALL {
            assert!(render_blocks(&[], mode, &HashSet::new(), &mut StdRng::seed_from_u64(0)).is_empty());
        }
    }
}
