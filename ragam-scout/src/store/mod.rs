//! Durable song storage and JSON export.

mod export;
mod json_file;
mod memory;
mod model;

pub use export::{default_export_path, export_songs, persist_songs, PersistSummary};
pub use json_file::{JsonFileStore, DEFAULT_STORE_FILE};
pub use memory::MemorySongStore;
pub use model::{SongStore, StoredSong, UpsertOutcome};
