use anyhow::Result;
use plotters::prelude::*;
use serde::Serialize;

use guestbook_types::api::MoodCount;
use guestbook_types::models::{MessageRecord, UNKNOWN_MOOD};

/// Bar colors, the usual ten-category scheme.
const CATEGORY10: [(u8, u8, u8); 10] = [
    (31, 119, 180),
    (255, 127, 14),
    (44, 160, 44),
    (214, 39, 40),
    (148, 103, 189),
    (140, 86, 75),
    (227, 119, 194),
    (127, 127, 127),
    (188, 189, 34),
    (23, 190, 207),
];

const CHART_SIZE: (u32, u32) = (600, 300);

/// Message count per mood cell value, in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoodTally {
    counts: Vec<MoodCount>,
}

impl MoodTally {
    pub fn get(&self, mood: &str) -> usize {
        self.counts
            .iter()
            .find(|c| c.mood == mood)
            .map(|c| c.count)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|c| c.count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoodCount> {
        self.counts.iter()
    }

    pub fn into_vec(self) -> Vec<MoodCount> {
        self.counts
    }

    fn bump(&mut self, mood: &str) {
        match self.counts.iter_mut().find(|c| c.mood == mood) {
            Some(entry) => entry.count += 1,
            None => self.counts.push(MoodCount {
                mood: mood.to_string(),
                count: 1,
            }),
        }
    }
}

/// Count records by mood. Rows without a mood land under `未知`.
pub fn aggregate<'a, I>(records: I) -> MoodTally
where
    I: IntoIterator<Item = &'a MessageRecord>,
{
    let mut tally = MoodTally::default();
    for record in records {
        let mood = match record.mood.as_deref() {
            Some(m) if !m.trim().is_empty() => m,
            _ => UNKNOWN_MOOD,
        };
        tally.bump(mood);
    }
    tally
}

/// One row of the legend printed under the chart.
#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub mood: String,
    pub count: usize,
    pub color: String,
}

fn bar_color(index: usize) -> (u8, u8, u8) {
    CATEGORY10[index % CATEGORY10.len()]
}

pub fn legend(tally: &MoodTally) -> Vec<LegendEntry> {
    tally
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let (r, g, b) = bar_color(i);
            LegendEntry {
                mood: c.mood.clone(),
                count: c.count,
                color: format!("#{:02x}{:02x}{:02x}", r, g, b),
            }
        })
        .collect()
}

/// Bar chart of the tally as an inline SVG document. Labels live in the
/// HTML legend, so the chart draws shapes only. `None` for an empty tally.
pub fn mood_chart_svg(tally: &MoodTally) -> Result<Option<String>> {
    if tally.is_empty() {
        return Ok(None);
    }

    let bars = tally.len() as f64;
    let max = tally.iter().map(|c| c.count).max().unwrap_or(1) as f64;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(0f64..bars, 0f64..max * 1.1)?;

        chart.draw_series(tally.iter().enumerate().map(|(i, c)| {
            let (r, g, b) = bar_color(i);
            let x = i as f64;
            Rectangle::new(
                [(x + 0.15, 0.0), (x + 0.85, c.count as f64)],
                RGBColor(r, g, b).filled(),
            )
        }))?;

        root.present()?;
    }

    Ok(Some(svg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestbook_types::models::MessageId;

    fn record(row: usize, mood: Option<&str>) -> MessageRecord {
        MessageRecord {
            id: MessageId(row),
            author: None,
            content: "hi".into(),
            mood: mood.map(str::to_string),
            timestamp: None,
        }
    }

    #[test]
    fn counts_each_mood_once() {
        let records = vec![record(2, Some("😊")), record(3, Some("😢"))];
        let tally = aggregate(&records);
        assert_eq!(tally.len(), 2);
        assert_eq!(tally.get("😊"), 1);
        assert_eq!(tally.get("😢"), 1);
        assert_eq!(tally.total(), 2);
    }

    #[test]
    fn missing_moods_are_unknown() {
        let records = vec![
            record(2, None),
            record(3, Some("")),
            record(4, Some("😡 生氣")),
            record(5, Some("😡 生氣")),
        ];
        let tally = aggregate(&records);
        assert_eq!(tally.get(UNKNOWN_MOOD), 2);
        assert_eq!(tally.get("😡 生氣"), 2);
        // first appearance order
        let order: Vec<&str> = tally.iter().map(|c| c.mood.as_str()).collect();
        assert_eq!(order, vec![UNKNOWN_MOOD, "😡 生氣"]);
    }

    #[test]
    fn empty_input_gives_empty_tally_and_no_chart() {
        let tally = aggregate(&Vec::new());
        assert!(tally.is_empty());
        assert!(mood_chart_svg(&tally).unwrap().is_none());
    }

    #[test]
    fn chart_is_svg_with_one_bar_per_mood() {
        let records = vec![record(2, Some("😊 開心")), record(3, Some("😢 難過")), record(4, Some("😊 開心"))];
        let tally = aggregate(&records);
        let svg = mood_chart_svg(&tally).unwrap().unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));

        let legend = legend(&tally);
        assert_eq!(legend.len(), 2);
        assert_eq!(legend[0].color, "#1f77b4");
        assert_eq!(legend[0].count, 2);
    }
}
