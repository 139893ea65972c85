//! In-memory song store.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::model::{SongStore, StoredSong, UpsertOutcome};
use crate::errors::ScoutError;

/// A [`SongStore`] kept in process memory.
#[derive(Debug, Default)]
pub struct MemorySongStore {
    songs: RwLock<Vec<StoredSong>>,
}

impl MemorySongStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.read().is_empty()
    }
}

/// Inserts `song` into `songs` unless its key is present. Ids start at 1.
pub(super) fn insert_if_absent(songs: &mut Vec<StoredSong>, mut song: StoredSong) -> UpsertOutcome {
    if let Some(existing) = songs.iter().find(|s| s.same_key(&song)) {
        return UpsertOutcome::Existing(existing.id);
    }
    song.id = songs.iter().map(|s| s.id).max().unwrap_or(0) + 1;
    let id = song.id;
    songs.push(song);
    UpsertOutcome::Inserted(id)
}

#[async_trait]
impl SongStore for MemorySongStore {
    async fn upsert(&self, song: StoredSong) -> Result<UpsertOutcome, ScoutError> {
        Ok(insert_if_absent(&mut self.songs.write(), song))
    }

    async fn all(&self) -> Result<Vec<StoredSong>, ScoutError> {
        Ok(self.songs.read().clone())
    }
}
