//! Mapping of oracle items to song records and run-wide title dedup.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::text::{collapse_whitespace, title_key};
use crate::urls::UrlFilter;
use crate::websearch::ExtractedSong;

fn text_field(item: &Map<String, Value>, key: &str) -> Option<String> {
    let value = match item.get(key)? {
        Value::String(s) => collapse_whitespace(s),
        Value::Number(n) => n.to_string(),
        Value::Array(parts) => collapse_whitespace(
            &parts
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => return None,
    };
    let lowered = value.to_ascii_lowercase();
    if value.is_empty() || lowered == "null" || lowered == "unknown" || lowered == "n/a" {
        return None;
    }
    Some(value)
}

fn links_field(item: &Map<String, Value>) -> Vec<String> {
    match item.get("links") {
        Some(Value::Array(links)) => links
            .iter()
            .filter_map(|link| match link {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(o) => o
                    .get("url")
                    .or_else(|| o.get("href"))
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Maps one oracle item to a song, or `None` when it has no usable title.
///
/// Lyricist, performer, source and context are folded into `notes`; the
/// first link on a video host becomes `youtube_link`.
#[must_use]
pub fn song_from_item(
    item: &Map<String, Value>,
    source_url: &str,
    filter: &UrlFilter,
) -> Option<ExtractedSong> {
    let title = text_field(item, "title")?;

    let notes: Vec<String> = [
        ("Lyricist", "lyricist"),
        ("Performer", "performer"),
        ("Source", "source"),
        ("Context", "context"),
    ]
    .iter()
    .filter_map(|(label, key)| text_field(item, key).map(|v| format!("{label}: {v}")))
    .collect();

    let youtube_link = links_field(item)
        .into_iter()
        .find(|link| filter.is_video_host(link));

    Some(ExtractedSong {
        title,
        composer: text_field(item, "composer"),
        notes: (!notes.is_empty()).then(|| notes.join("; ")),
        youtube_link,
        source_url: source_url.to_string(),
    })
}

#[derive(Debug, Default)]
struct CollectorState {
    keys: HashSet<String>,
    songs: Vec<ExtractedSong>,
}

/// Run-wide song list, unique by case-folded, whitespace-normalized title.
///
/// The first record for a title wins; later ones are dropped.
#[derive(Debug, Default)]
pub struct SongCollector {
    state: Mutex<CollectorState>,
}

impl SongCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `song` unless its title was already collected.
    pub fn insert(&self, song: ExtractedSong) -> bool {
        let key = title_key(&song.title);
        if key.is_empty() {
            return false;
        }
        let mut state = self.state.lock();
        if !state.keys.insert(key) {
            return false;
        }
        state.songs.push(song);
        true
    }

    /// Number of songs collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().songs.len()
    }

    /// Whether nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().songs.is_empty()
    }

    /// Copies of the collected songs in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ExtractedSong> {
        self.state.lock().songs.clone()
    }
}
