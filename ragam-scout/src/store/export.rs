//! Persisting a run's songs and exporting the store as JSON.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::model::{SongStore, StoredSong, UpsertOutcome};
use crate::errors::ScoutError;
use crate::websearch::ExtractedSong;

/// Counts from [`persist_songs`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    /// Songs newly stored or already present.
    pub inserted: usize,
    /// Songs with a blank title or a failed upsert.
    pub skipped: usize,
}

/// Upserts every song found for `ragam` into `store`.
///
/// A song that was already stored counts as inserted. A failing upsert is
/// logged and skipped; it does not stop the remaining songs.
pub async fn persist_songs(
    store: &dyn SongStore,
    ragam: &str,
    songs: &[ExtractedSong],
) -> PersistSummary {
    let mut summary = PersistSummary::default();
    for song in songs {
        let Some(record) = StoredSong::from_extracted(song, ragam) else {
            summary.skipped += 1;
            continue;
        };
        match store.upsert(record).await {
            Ok(UpsertOutcome::Inserted(_) | UpsertOutcome::Existing(_)) => summary.inserted += 1,
            Err(e) => {
                warn!(title = %song.title, source_url = %song.source_url, error = %e, "Failed to store song");
                summary.skipped += 1;
            }
        }
    }
    info!(inserted = summary.inserted, skipped = summary.skipped, "Stored songs");
    summary
}

/// Export file name for `ragam`: lowercased, whitespace runs as `_`.
#[must_use]
pub fn default_export_path(ragam: &str) -> PathBuf {
    let stem = ragam
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    PathBuf::from(format!("{stem}_songs.json"))
}

/// Writes every stored song to `path` as a pretty JSON array, newest first.
///
/// Returns the number of songs written.
pub async fn export_songs(store: &dyn SongStore, path: &Path) -> Result<usize, ScoutError> {
    let mut songs = store.all().await?;
    songs.sort_by(|a, b| {
        b.discovered_at
            .cmp(&a.discovered_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    let body = serde_json::to_string_pretty(&songs)?;
    tokio::fs::write(path, body).await?;
    info!(path = %path.display(), songs = songs.len(), "Exported songs");
    Ok(songs.len())
}
