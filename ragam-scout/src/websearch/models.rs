//! Data models exchanged between the discovery stages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A candidate URL produced by the search stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscoveredUrl {
    /// Origin plus path, fragment and trailing slashes removed.
    pub normalized_key: String,
    /// The first raw URL seen for this key.
    pub original_url: String,
}

impl DiscoveredUrl {
    /// Creates a new discovered URL.
    #[must_use]
    pub fn new(normalized_key: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            normalized_key: normalized_key.into(),
            original_url: original_url.into(),
        }
    }
}

/// Result of fetching one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFetchResult {
    /// Response body.
    pub html: String,
    /// URL after transport-level redirects.
    pub final_url: String,
    /// HTTP status code.
    pub status: u16,
}

impl PageFetchResult {
    /// Creates a new fetch result.
    #[must_use]
    pub fn new(html: impl Into<String>, final_url: impl Into<String>, status: u16) -> Self {
        Self {
            html: html.into(),
            final_url: final_url.into(),
            status,
        }
    }

    /// Whether the fetch was successful (2xx status).
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A song record extracted from one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSong {
    /// Song title, never empty.
    pub title: String,
    /// Composer, if named.
    pub composer: Option<String>,
    /// Free-form notes (lyricist, performer, source, context).
    pub notes: Option<String>,
    /// First associated video link.
    pub youtube_link: Option<String>,
    /// Page the record was extracted from.
    pub source_url: String,
}

impl ExtractedSong {
    /// Creates a song with only the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            composer: None,
            notes: None,
            youtube_link: None,
            source_url: source_url.into(),
        }
    }

    /// Sets the composer.
    #[must_use]
    pub fn with_composer(mut self, composer: impl Into<String>) -> Self {
        self.composer = Some(composer.into());
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets the video link.
    #[must_use]
    pub fn with_youtube_link(mut self, link: impl Into<String>) -> Self {
        self.youtube_link = Some(link.into());
        self
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut dict = HashMap::new();
        dict.insert("title".to_string(), serde_json::json!(self.title));
        dict.insert("composer".to_string(), serde_json::json!(self.composer));
        dict.insert("notes".to_string(), serde_json::json!(self.notes));
        dict.insert("youtube_link".to_string(), serde_json::json!(self.youtube_link));
        dict.insert("source_url".to_string(), serde_json::json!(self.source_url));
        dict
    }
}

/// One request to a search engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchJob {
    /// Engine identifier.
    pub engine_id: String,
    /// Keywords to search.
    pub keywords: Vec<String>,
    /// Result pages to read per keyword.
    pub page_count: usize,
}

impl SearchJob {
    /// Creates a single-keyword job.
    #[must_use]
    pub fn new(engine_id: impl Into<String>, keyword: impl Into<String>, page_count: usize) -> Self {
        Self {
            engine_id: engine_id.into(),
            keywords: vec![keyword.into()],
            page_count: page_count.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_result_is_success() {
        assert!(PageFetchResult::new("", "https://a.com", 200).is_success());
        assert!(PageFetchResult::new("", "https://a.com", 204).is_success());
        assert!(!PageFetchResult::new("", "https://a.com", 301).is_success());
        assert!(!PageFetchResult::new("", "https://a.com", 404).is_success());
    }

    #[test]
    fn test_song_builder_and_dict() {
        let song = ExtractedSong::new("Enduku Nirdaya", "https://a.com/songs")
            .with_composer("Thyagaraja")
            .with_youtube_link("https://youtu.be/x");

        let dict = song.to_dict();
        assert_eq!(dict.get("title"), Some(&serde_json::json!("Enduku Nirdaya")));
        assert_eq!(dict.get("composer"), Some(&serde_json::json!("Thyagaraja")));
        assert_eq!(dict.get("notes"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn test_search_job_page_floor() {
        let job = SearchJob::new("bing", "todi ragam songs", 0);
        assert_eq!(job.page_count, 1);
        assert_eq!(job.keywords, vec!["todi ragam songs".to_string()]);
    }
}
