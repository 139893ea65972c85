//! One discovery run: term → variants → queries → candidates → songs.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::ScoutError;
use crate::extraction::{ExtractionPipeline, ExtractionStats};
use crate::observability::SpanTimer;
use crate::report::{DropCollector, DropSummary};
use crate::search::SearchOrchestrator;
use crate::variants::{build_queries, normalize_term, VariantGenerator};
use crate::websearch::{
    DiscoveredUrl, DiscoveryConfig, ExtractedSong, ExtractionOracle, Fetcher, SearchEngine,
};

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct DiscoveryReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// The term as given.
    pub term: String,
    /// Spellings searched; the first is canonical.
    pub variants: Vec<String>,
    /// Queries sent to the engines, in order.
    pub queries: Vec<String>,
    /// Deduplicated candidate pages.
    pub candidates: Vec<DiscoveredUrl>,
    /// Songs found, unique by title.
    pub songs: Vec<ExtractedSong>,
    /// Extraction counters.
    pub extraction: ExtractionStats,
    /// Every dropped engine attempt and candidate.
    pub drops: DropSummary,
    /// Phase durations in milliseconds.
    pub durations: BTreeMap<String, f64>,
}

impl DiscoveryReport {
    /// Converts the headline numbers to a dictionary.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("run_id".to_string(), serde_json::json!(self.run_id.to_string()));
        map.insert("started_at".to_string(), serde_json::json!(self.started_at.to_rfc3339()));
        map.insert("term".to_string(), serde_json::json!(self.term));
        map.insert("variants".to_string(), serde_json::json!(self.variants));
        map.insert("queries".to_string(), serde_json::json!(self.queries.len()));
        map.insert("candidates".to_string(), serde_json::json!(self.candidates.len()));
        map.insert("songs".to_string(), serde_json::json!(self.songs.len()));
        map.insert("drops".to_string(), serde_json::json!(self.drops.to_dict()));
        map.insert("durations_ms".to_string(), serde_json::json!(self.durations));
        map
    }
}

/// Discovers pages about a ragam and extracts the songs they mention.
pub struct RagamScout {
    config: DiscoveryConfig,
    variants: VariantGenerator,
    search: SearchOrchestrator,
    extraction: ExtractionPipeline,
}

impl std::fmt::Debug for RagamScout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagamScout")
            .field("search", &self.search)
            .field("extraction", &self.extraction)
            .finish_non_exhaustive()
    }
}

impl RagamScout {
    /// Wires a run from configuration and the three external collaborators.
    #[must_use]
    pub fn new(
        config: DiscoveryConfig,
        engine: Arc<dyn SearchEngine>,
        fetcher: Arc<dyn Fetcher>,
        oracle: Arc<dyn ExtractionOracle>,
    ) -> Self {
        let search = SearchOrchestrator::from_config(&config, engine);
        let extraction = ExtractionPipeline::new(&config, fetcher, oracle);
        Self {
            config,
            variants: VariantGenerator::new(),
            search,
            extraction,
        }
    }

    /// Replaces the variant generator.
    #[must_use]
    pub fn with_variant_generator(mut self, variants: VariantGenerator) -> Self {
        self.variants = variants;
        self
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Runs discovery and extraction for `term`.
    ///
    /// Fails only when `term` has no letters or digits or the configuration
    /// is invalid; every other failure drops one engine attempt or candidate
    /// and is listed in the report.
    pub async fn discover_and_extract(&self, term: &str) -> Result<DiscoveryReport, ScoutError> {
        if normalize_term(term).is_empty() {
            return Err(ScoutError::InvalidInput(format!(
                "ragam name {term:?} has no letters or digits"
            )));
        }
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let span = info_span!("discovery", run_id = %run_id, term = %term);
        self.run(run_id, term).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, term: &str) -> Result<DiscoveryReport, ScoutError> {
        let started_at = Utc::now();
        let drops = Arc::new(DropCollector::new());
        let mut durations = BTreeMap::new();

        let timer = SpanTimer::start("variants");
        let variants = self.variants.generate(term);
        let queries = build_queries(&variants, self.config.max_queries);
        durations.insert(timer.name().to_string(), timer.finish());
        info!(variants = ?variants, queries = queries.len(), "Generated queries");

        let timer = SpanTimer::start("search");
        let candidates = self.search.discover(&queries, &drops).await;
        durations.insert(timer.name().to_string(), timer.finish());
        info!(candidates = candidates.len(), "Search finished");

        let timer = SpanTimer::start("extraction");
        let (songs, extraction) = self.extraction.run(&candidates, &variants, &drops).await;
        durations.insert(timer.name().to_string(), timer.finish());

        let drops = drops.summary();
        info!(
            songs = songs.len(),
            candidates = candidates.len(),
            dropped = drops.total,
            "Discovery finished"
        );

        Ok(DiscoveryReport {
            run_id,
            started_at,
            term: term.to_string(),
            variants,
            queries,
            candidates,
            songs,
            extraction,
            drops,
            durations,
        })
    }
}
