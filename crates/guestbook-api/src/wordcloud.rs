use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use guestbook_types::models::MessageRecord;

const MAX_WORDS: usize = 100;
const MIN_SIZE_EM: f32 = 0.8;
const SIZE_SPREAD_EM: f32 = 2.2;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w[\w']+").expect("static regex"));

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "because", "been", "before", "being", "but", "by", "can", "could", "did", "do", "does", "doing",
    "for", "from", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how",
    "i", "i'm", "if", "in", "into", "is", "it", "it's", "its", "just", "me", "more", "most", "my",
    "no", "not", "of", "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "would", "you", "your", "yours",
];

/// Sampled from the viridis colormap, dark to light.
const VIRIDIS: [&str; 8] = [
    "#440154", "#46327e", "#365c8d", "#277f8e", "#1fa187", "#4ac16d", "#a0da39", "#fde725",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CloudWord {
    pub text: String,
    pub count: usize,
    pub size_em: f32,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WordCloud {
    /// Most frequent first.
    pub words: Vec<CloudWord>,
}

/// Word frequencies across every message's content, sized for display.
///
/// `None` when the messages hold no usable words.
pub fn word_cloud<'a, I>(records: I) -> Option<WordCloud>
where
    I: IntoIterator<Item = &'a MessageRecord>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        let content = record.content.to_lowercase();
        for token in WORD.find_iter(&content) {
            let word = token.as_str();
            if STOPWORDS.contains(&word) {
                continue;
            }
            *counts.entry(word.to_string()).or_default() += 1;
        }
    }

    if counts.is_empty() {
        return None;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(MAX_WORDS);

    let max = ranked.first().map(|w| w.1).unwrap_or(1);
    let min = ranked.last().map(|w| w.1).unwrap_or(1);
    let total = ranked.len();

    let words = ranked
        .into_iter()
        .enumerate()
        .map(|(rank, (text, count))| {
            let size_em = if max == min {
                MIN_SIZE_EM + SIZE_SPREAD_EM / 2.0
            } else {
                let scaled = (count - min) as f32 / (max - min) as f32;
                MIN_SIZE_EM + SIZE_SPREAD_EM * scaled
            };
            CloudWord {
                text,
                count,
                size_em,
                color: VIRIDIS[rank * VIRIDIS.len() / total],
            }
        })
        .collect();

    Some(WordCloud { words })
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestbook_types::models::MessageId;

    fn record(content: &str) -> MessageRecord {
        MessageRecord {
            id: MessageId(2),
            author: None,
            content: content.to_string(),
            mood: None,
            timestamp: None,
        }
    }

    #[test]
    fn no_words_no_cloud() {
        assert!(word_cloud(&Vec::new()).is_none());
        assert!(word_cloud(&[record("  "), record("a I")]).is_none());
        assert!(word_cloud(&[record("the and of")]).is_none());
    }

    #[test]
    fn counts_lowercased_words_and_skips_stopwords() {
        let records = vec![record("Hello world"), record("hello AGAIN, world! hello")];
        let cloud = word_cloud(&records).unwrap();

        let texts: Vec<&str> = cloud.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "world"]);
        assert_eq!(cloud.words[0].count, 3);
        assert_eq!(cloud.words[1].count, 2);
        assert!(cloud.words[0].size_em > cloud.words[1].size_em);
        assert_eq!(cloud.words[0].color, VIRIDIS[0]);
    }

    #[test]
    fn keeps_at_most_a_hundred_words() {
        let text: Vec<String> = (0..150).map(|i| format!("word{}", i)).collect();
        let cloud = word_cloud(&[record(&text.join(" "))]).unwrap();
        assert_eq!(cloud.words.len(), MAX_WORDS);
        assert!(cloud.words.iter().all(|w| (w.size_em - 1.9).abs() < 1e-6));
    }

    #[test]
    fn cjk_runs_are_words_too() {
        let cloud = word_cloud(&[record("今天 天氣 很好"), record("天氣")]).unwrap();
        assert_eq!(cloud.words[0].text, "天氣");
        assert_eq!(cloud.words[0].count, 2);
    }
}
