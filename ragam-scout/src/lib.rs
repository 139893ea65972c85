//! # Ragam Scout
//!
//! Finds web pages about a Carnatic ragam and extracts the songs they list.
//!
//! A run goes through these steps:
//!
//! - **Variant generation**: alternate transliterations of the ragam name
//! - **Multi-engine search**: every query fanned out to every engine, one query at a time
//! - **URL aggregation**: wrapper unwrapping, normalization and first-seen dedup
//! - **Bounded extraction**: fetch, stub resolution, cleaning and an extraction
//!   oracle under a concurrency cap, deduplicated by title
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ragam_scout::prelude::*;
//!
//! let config = DiscoveryConfig::default().with_max_concurrent(2);
//! let scout = RagamScout::new(
//!     config.clone(),
//!     Arc::new(HttpSearchEngine::new(&config.fetch)?),
//!     Arc::new(HttpFetcher::new(&config.fetch)?),
//!     Arc::new(OllamaOracle::new(&config.oracle)),
//! );
//!
//! let report = scout.discover_and_extract("Shankarabharanam").await?;
//! println!("{} songs", report.songs.len());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cleaner;
pub mod discovery;
pub mod errors;
pub mod extraction;
pub mod observability;
pub mod report;
pub mod search;
pub mod store;
pub mod stub;
pub mod testing;
pub mod text;
pub mod urls;
pub mod variants;
pub mod websearch;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::discovery::{DiscoveryReport, RagamScout};
    pub use crate::errors::{FailureKind, ScoutError};
    pub use crate::extraction::{ExtractionPipeline, ExtractionStats, OllamaOracle};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::report::{DropCollector, DropRecord, DropStage, DropSummary};
    #[cfg(feature = "http")]
    pub use crate::search::HttpSearchEngine;
    pub use crate::search::{ResponseValue, SearchOrchestrator};
    pub use crate::store::{
        default_export_path, export_songs, persist_songs, JsonFileStore, MemorySongStore,
        PersistSummary, SongStore, StoredSong,
    };
    pub use crate::variants::{build_queries, VariantGenerator};
    #[cfg(feature = "http")]
    pub use crate::websearch::HttpFetcher;
    pub use crate::websearch::{
        DiscoveredUrl, DiscoveryConfig, EngineConfig, EngineRegistry, ExtractedSong,
        ExtractionOracle, Fetcher, PageFetchResult, SearchEngine, SearchJob,
    };
    pub use std::sync::Arc;
}
