//! Protocol traits for the external collaborators of a discovery run.
//!
//! Search engines, page fetching and the extraction oracle are all reached
//! through these traits so that runs can be driven by test doubles.

use async_trait::async_trait;
use std::time::Duration;

use super::config::EngineConfig;
use super::models::{PageFetchResult, SearchJob};
use crate::errors::ScoutError;
use crate::search::ResponseValue;

/// Protocol for fetching pages.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, following transport-level redirects.
    ///
    /// Non-2xx responses are returned, not raised.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<PageFetchResult, ScoutError>;
}

/// Protocol for running one engine's search.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Runs `job` against the engine described by `config`.
    ///
    /// The response is an arbitrarily nested tree; every HTTP(S) string in it
    /// is treated as a candidate URL.
    async fn search(
        &self,
        job: &SearchJob,
        config: &EngineConfig,
    ) -> Result<ResponseValue, ScoutError>;
}

/// Protocol for the structured-extraction oracle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractionOracle: Send + Sync {
    /// Sends `prompt` to `model` and returns its raw text output.
    async fn extract(&self, prompt: &str, model: &str) -> Result<String, ScoutError>;
}
