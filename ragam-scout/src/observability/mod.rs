//! Logging setup and phase timing.

mod tracing;

pub use tracing::{init_tracing, LogFormat, SpanTimer};
