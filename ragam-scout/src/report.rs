//! Accounting of dropped engines and candidates.
//!
//! Nothing in a discovery run is retried; every failure drops exactly one
//! engine attempt or one candidate page. Each drop is logged once at `warn`
//! and kept in a [`DropCollector`] so the run report can list it.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::errors::{FailureKind, ScoutError};

/// The pipeline step at which something was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropStage {
    /// An engine attempt for one query failed.
    Search,
    /// The page fetch failed or returned a non-2xx status.
    Fetch,
    /// The page or its resolved target is on a video host.
    VideoHost,
    /// A stub page had no recoverable target or its target failed.
    StubResolution,
    /// The page HTML was too short to be useful.
    TooShort,
    /// The oracle failed or timed out.
    Oracle,
    /// The oracle output held no recoverable JSON.
    Parse,
    /// A task panicked or another internal fault occurred.
    Internal,
}

impl DropStage {
    /// Returns the stable name used in logs and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Fetch => "fetch",
            Self::VideoHost => "video_host",
            Self::StubResolution => "stub_resolution",
            Self::TooShort => "too_short",
            Self::Oracle => "oracle",
            Self::Parse => "parse",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for DropStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one dropped engine attempt or candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropRecord {
    /// URL or `engine: query` that was dropped.
    pub subject: String,
    /// Step that dropped it.
    pub stage: DropStage,
    /// Failure class.
    pub kind: FailureKind,
    /// Human-readable reason.
    pub reason: String,
    /// Unix timestamp of the drop.
    pub timestamp: f64,
}

impl DropRecord {
    /// Creates a new drop record.
    #[must_use]
    pub fn new(
        stage: DropStage,
        kind: FailureKind,
        subject: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        Self {
            subject: subject.into(),
            stage,
            kind,
            reason: reason.into(),
            timestamp: now,
        }
    }

    /// Creates a record from a collaborator error.
    #[must_use]
    pub fn from_error(stage: DropStage, subject: impl Into<String>, error: &ScoutError) -> Self {
        Self::new(stage, error.kind(), subject, error.to_string())
    }
}

/// Thread-safe sink for drop records, shared by all tasks of a run.
#[derive(Debug, Default)]
pub struct DropCollector {
    records: Mutex<Vec<DropRecord>>,
}

impl DropCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs and stores a drop.
    pub fn record(&self, record: DropRecord) {
        warn!(
            stage = %record.stage,
            kind = %record.kind,
            subject = %record.subject,
            reason = %record.reason,
            "Dropped"
        );
        self.records.lock().push(record);
    }

    /// Number of drops so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing was dropped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Copies of all records in arrival order.
    #[must_use]
    pub fn records(&self) -> Vec<DropRecord> {
        self.records.lock().clone()
    }

    /// Builds a summary of all drops.
    #[must_use]
    pub fn summary(&self) -> DropSummary {
        DropSummary::from_records(self.records())
    }
}

/// Aggregated view of a run's drops.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DropSummary {
    /// Total drops.
    pub total: usize,
    /// Counts per stage name.
    pub by_stage: BTreeMap<String, usize>,
    /// Counts per failure class.
    pub by_kind: BTreeMap<String, usize>,
    /// Every record, in arrival order.
    pub records: Vec<DropRecord>,
}

impl DropSummary {
    /// Builds a summary from records.
    #[must_use]
    pub fn from_records(records: Vec<DropRecord>) -> Self {
        let mut by_stage = BTreeMap::new();
        let mut by_kind = BTreeMap::new();
        for record in &records {
            *by_stage.entry(record.stage.as_str().to_string()).or_insert(0) += 1;
            *by_kind.entry(record.kind.as_str().to_string()).or_insert(0) += 1;
        }
        Self {
            total: records.len(),
            by_stage,
            by_kind,
            records,
        }
    }

    /// Drops recorded at `stage`.
    #[must_use]
    pub fn count(&self, stage: DropStage) -> usize {
        self.by_stage.get(stage.as_str()).copied().unwrap_or(0)
    }

    /// Converts to dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("total".to_string(), serde_json::json!(self.total));
        map.insert("by_stage".to_string(), serde_json::json!(self.by_stage));
        map.insert("by_kind".to_string(), serde_json::json!(self.by_kind));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_error() {
        let err = ScoutError::transport("https://a.com", "connection reset");
        let record = DropRecord::from_error(DropStage::Fetch, "https://a.com", &err);

        assert_eq!(record.stage, DropStage::Fetch);
        assert_eq!(record.kind, FailureKind::TransportFailure);
        assert!(record.reason.contains("connection reset"));
        assert!(record.timestamp > 0.0);
    }

    #[test]
    fn test_collector_summary() {
        let collector = DropCollector::new();
        assert!(collector.is_empty());

        collector.record(DropRecord::new(
            DropStage::TooShort,
            FailureKind::MalformedContent,
            "https://a.com",
            "html too short",
        ));
        collector.record(DropRecord::new(
            DropStage::TooShort,
            FailureKind::MalformedContent,
            "https://b.com",
            "html too short",
        ));
        collector.record(DropRecord::from_error(
            DropStage::Oracle,
            "https://c.com",
            &ScoutError::oracle("gemma3:4b", "timed out"),
        ));

        let summary = collector.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.count(DropStage::TooShort), 2);
        assert_eq!(summary.count(DropStage::Oracle), 1);
        assert_eq!(summary.count(DropStage::Search), 0);
        assert_eq!(summary.by_kind.get("malformed_content"), Some(&2));
        assert_eq!(summary.records[2].subject, "https://c.com");
    }

    #[test]
    fn test_summary_to_dict() {
        let summary = DropSummary::from_records(vec![DropRecord::new(
            DropStage::Parse,
            FailureKind::MalformedContent,
            "https://a.com",
            "no json",
        )]);
        let dict = summary.to_dict();
        assert_eq!(dict.get("total"), Some(&serde_json::json!(1)));
        assert_eq!(dict.get("by_stage"), Some(&serde_json::json!({"parse": 1})));
    }
}
