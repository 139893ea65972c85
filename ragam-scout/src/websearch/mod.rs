//! Collaborator boundary of a discovery run.
//!
//! This module provides:
//! - Configuration for engines, fetching, the oracle and the run itself
//! - Data models exchanged between stages
//! - Protocol traits for pluggable search engines, fetchers and oracles
//! - An HTTP fetcher (feature `http`)

mod config;
#[cfg(feature = "http")]
mod fetcher;
mod models;
mod protocols;

pub use config::{DiscoveryConfig, EngineConfig, EngineRegistry, FetchConfig, OracleConfig};
#[cfg(feature = "http")]
pub use fetcher::HttpFetcher;
#[cfg(feature = "http")]
pub(crate) use fetcher::header_map;
pub use models::{DiscoveredUrl, ExtractedSong, PageFetchResult, SearchJob};
#[cfg(test)]
pub use protocols::MockExtractionOracle;
pub use protocols::{ExtractionOracle, Fetcher, SearchEngine};
