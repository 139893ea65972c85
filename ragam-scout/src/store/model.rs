//! Stored record type and the store protocol.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ScoutError;
use crate::text::strip_diacritics_and_noise;
use crate::websearch::ExtractedSong;

/// Placeholder source for songs with no known page.
const UNKNOWN_SOURCE: &str = "N/A";

/// A song as kept by a [`SongStore`], unique by `(title, source_url)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSong {
    /// Store-assigned identifier; zero until stored.
    #[serde(default)]
    pub id: u64,
    /// Title with diacritics and punctuation removed.
    pub title: String,
    /// Composer, if known.
    pub composer: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Video link, if any.
    pub youtube_link: Option<String>,
    /// Page the song was extracted from.
    pub source_url: String,
    /// Ragam searched for when the song was found.
    pub ragam: String,
    /// When the song was first stored.
    pub discovered_at: DateTime<Utc>,
}

impl StoredSong {
    /// Builds a record for `song`, or `None` when its title is blank.
    #[must_use]
    pub fn from_extracted(song: &ExtractedSong, ragam: &str) -> Option<Self> {
        let title = strip_diacritics_and_noise(song.title.trim());
        if title.is_empty() {
            return None;
        }
        let source_url = song.source_url.trim();
        Some(Self {
            id: 0,
            title,
            composer: song.composer.clone(),
            notes: song.notes.clone(),
            youtube_link: song.youtube_link.clone(),
            source_url: if source_url.is_empty() {
                UNKNOWN_SOURCE.to_string()
            } else {
                source_url.to_string()
            },
            ragam: ragam.to_string(),
            discovered_at: Utc::now(),
        })
    }

    /// Whether `other` has the same store key.
    #[must_use]
    pub fn same_key(&self, other: &Self) -> bool {
        self.title == other.title && self.source_url == other.source_url
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new record was stored with this id.
    Inserted(u64),
    /// A record with the same key already existed; it was left unchanged.
    Existing(u64),
}

impl UpsertOutcome {
    /// Id of the stored record.
    #[must_use]
    pub fn id(self) -> u64 {
        match self {
            Self::Inserted(id) | Self::Existing(id) => id,
        }
    }
}

/// Protocol for song persistence.
#[async_trait]
pub trait SongStore: Send + Sync {
    /// Stores `song` unless a record with the same `(title, source_url)` exists.
    async fn upsert(&self, song: StoredSong) -> Result<UpsertOutcome, ScoutError>;

    /// Returns every stored record in insertion order.
    async fn all(&self) -> Result<Vec<StoredSong>, ScoutError>;
}
