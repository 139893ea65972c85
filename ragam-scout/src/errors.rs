//! Error types for ragam discovery runs.
//!
//! Every failure raised by a collaborator (search engine, page fetch,
//! extraction oracle, store) is a [`ScoutError`]. Errors are classified into
//! a small taxonomy ([`FailureKind`]) so that the pipeline can decide what to
//! drop and how to report it. Only [`FailureKind::InvalidInput`] is fatal to
//! a run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for ragam-scout operations.
#[derive(Debug, Error)]
pub enum ScoutError {
    /// A search engine or page fetch was unreachable, timed out or answered
    /// with an unusable status.
    #[error("Transport failure for {url}: {message}")]
    Transport {
        /// The URL or engine that failed.
        url: String,
        /// What went wrong.
        message: String,
    },

    /// Content was fetched but could not be used.
    #[error("Malformed content at {url}: {reason}")]
    MalformedContent {
        /// The page the content came from.
        url: String,
        /// Why the content was rejected.
        reason: String,
    },

    /// The extraction oracle failed or timed out.
    #[error("Oracle failure ({model}): {message}")]
    Oracle {
        /// The model that was invoked.
        model: String,
        /// What went wrong.
        message: String,
    },

    /// A required input is missing or invalid.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The song store rejected an operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ScoutError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ScoutError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Failure taxonomy used for logging and drop accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FailureKind {
    /// Search engine or page fetch unreachable or timed out.
    TransportFailure,
    /// Stub without target, sparse page, or unparseable oracle output.
    MalformedContent,
    /// Oracle process error or timeout.
    OracleFailure,
    /// Missing or invalid caller input. The only fatal class.
    InvalidInput,
    /// Storage, serialization and other internal problems.
    Internal,
}

impl FailureKind {
    /// Returns the stable name used in logs and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransportFailure => "transport_failure",
            Self::MalformedContent => "malformed_content",
            Self::OracleFailure => "oracle_failure",
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScoutError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed content error.
    #[must_use]
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedContent {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an oracle error.
    #[must_use]
    pub fn oracle(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Oracle {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Returns the taxonomy class of this error.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::TransportFailure,
            Self::MalformedContent { .. } => FailureKind::MalformedContent,
            Self::Oracle { .. } => FailureKind::OracleFailure,
            Self::InvalidInput(_) | Self::Config(_) => FailureKind::InvalidInput,
            Self::Storage(_) | Self::Internal(_) | Self::Serialization(_) | Self::Io(_) => {
                FailureKind::Internal
            }
        }
    }

    /// Whether this error should abort the whole run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.kind() == FailureKind::InvalidInput
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind().as_str()));

        match self {
            Self::Transport { url, message } => {
                map.insert("url".to_string(), serde_json::json!(url));
                map.insert("reason".to_string(), serde_json::json!(message));
            }
            Self::MalformedContent { url, reason } => {
                map.insert("url".to_string(), serde_json::json!(url));
                map.insert("reason".to_string(), serde_json::json!(reason));
            }
            Self::Oracle { model, message } => {
                map.insert("model".to_string(), serde_json::json!(model));
                map.insert("reason".to_string(), serde_json::json!(message));
            }
            _ => {}
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}
