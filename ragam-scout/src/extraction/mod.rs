//! Page extraction: admission gate, oracle prompt, output recovery and the
//! bounded per-candidate pipeline.

mod gate;
mod json_recovery;
mod oracle;
mod pipeline;
mod prompt;
mod records;

pub use gate::{AdmissionGate, GatePermit};
pub use json_recovery::{items_from_value, recover_json, MAX_CLOSER_ATTEMPTS, MAX_OPENER_ATTEMPTS};
pub use oracle::OllamaOracle;
pub use pipeline::{ExtractionPipeline, ExtractionStats};
pub use prompt::{build_extraction_prompt, SONG_SCHEMA_KEYS};
pub use records::{song_from_item, SongCollector};
