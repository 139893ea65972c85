//! Multi-engine search: typed engine responses, the orchestrator and an
//! HTTP engine backend.

#[cfg(feature = "http")]
mod http_engine;
mod orchestrator;
mod response;

#[cfg(feature = "http")]
pub use http_engine::{extract_result_links, HttpSearchEngine};
pub use orchestrator::{EngineOutcome, SearchOrchestrator};
pub use response::{ResponseValue, ResponseVisitor, Scalar, UrlCollector};
