//! Song store persisted as one JSON file.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::memory::insert_if_absent;
use super::model::{SongStore, StoredSong, UpsertOutcome};
use crate::errors::ScoutError;

/// File used when no store path is configured.
pub const DEFAULT_STORE_FILE: &str = "scraper.json";

/// A [`SongStore`] backed by a JSON array on disk.
///
/// The file is read once on open and rewritten after every insert by writing
/// a sibling temporary file and renaming it over the original.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    songs: Mutex<Vec<StoredSong>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ScoutError> {
        let path = path.into();
        let songs = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                ScoutError::Storage(format!("{} is not a song store: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), songs = songs.len(), "Opened song store");
        Ok(Self {
            path,
            songs: Mutex::new(songs),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, songs: &[StoredSong]) -> Result<(), ScoutError> {
        let temp_path = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(songs)?;
        tokio::fs::write(&temp_path, body).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl SongStore for JsonFileStore {
    async fn upsert(&self, song: StoredSong) -> Result<UpsertOutcome, ScoutError> {
        let mut songs = self.songs.lock().await;
        let outcome = insert_if_absent(&mut songs, song);
        if let UpsertOutcome::Inserted(_) = outcome {
            if let Err(e) = self.write(&songs).await {
                songs.pop();
                return Err(e);
            }
        }
        Ok(outcome)
    }

    async fn all(&self) -> Result<Vec<StoredSong>, ScoutError> {
        Ok(self.songs.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websearch::ExtractedSong;
    use tempfile::TempDir;

    fn stored(title: &str) -> StoredSong {
        StoredSong::from_extracted(&ExtractedSong::new(title, "https://songs.example/p"), "Kalyani").unwrap()
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("songs.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        store.upsert(stored("Nidhi Chala Sukhama")).await.unwrap();
        store.upsert(stored("Vasudevayani")).await.unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let songs = reopened.all().await.unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[1].title, "Vasudevayani");
        assert_eq!(
            reopened.upsert(stored("Vasudevayani")).await.unwrap(),
            UpsertOutcome::Existing(2)
        );
        assert!(!dir.path().join("songs.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let fresh = JsonFileStore::open(dir.path().join("new.json")).await.unwrap();
        assert!(fresh.all().await.unwrap().is_empty());

        let corrupt = dir.path().join("bad.json");
        std::fs::write(&corrupt, "{not json").unwrap();
        let err = JsonFileStore::open(&corrupt).await.unwrap_err();
        assert!(matches!(err, ScoutError::Storage(_)));
    }
}
