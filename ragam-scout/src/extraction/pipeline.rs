//! Bounded fetch, clean, extract and dedupe stage.
//!
//! Every candidate runs as its own task holding one [`AdmissionGate`] slot
//! for its whole lifetime. A task either contributes songs or ends in exactly
//! one [`DropRecord`]; nothing is retried and no task affects another.

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

use super::gate::AdmissionGate;
use super::json_recovery::{items_from_value, recover_json};
use super::prompt::build_extraction_prompt;
use super::records::{song_from_item, SongCollector};
use crate::cleaner::ContentCleaner;
use crate::errors::{FailureKind, ScoutError};
use crate::report::{DropCollector, DropRecord, DropStage};
use crate::stub::{looks_like_redirect_stub, StubResolver};
use crate::urls::{unwrap_redirect_wrapper, UrlFilter};
use crate::websearch::{
    DiscoveredUrl, DiscoveryConfig, ExtractedSong, ExtractionOracle, Fetcher, PageFetchResult,
};

/// Summary of one extraction stage run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Candidates processed.
    pub candidates: usize,
    /// Candidates that reached the oracle and parsed.
    pub extracted_pages: usize,
    /// Candidates dropped.
    pub dropped: usize,
    /// Highest number of candidates in flight at once.
    pub peak_concurrency: usize,
}

struct Shared {
    fetcher: Arc<dyn Fetcher>,
    oracle: Arc<dyn ExtractionOracle>,
    resolver: StubResolver,
    cleaner: ContentCleaner,
    filter: UrlFilter,
    wrapper_params: Vec<String>,
    fetch_timeout: Duration,
    oracle_timeout: Duration,
    model: String,
    min_html_chars: usize,
    max_input_chars: usize,
}

/// Runs candidates through the extraction oracle under a concurrency cap.
pub struct ExtractionPipeline {
    shared: Arc<Shared>,
    max_concurrent: usize,
}

impl std::fmt::Debug for ExtractionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionPipeline")
            .field("model", &self.shared.model)
            .field("max_concurrent", &self.max_concurrent)
            .finish_non_exhaustive()
    }
}

impl ExtractionPipeline {
    /// Creates a pipeline from configuration and collaborators.
    #[must_use]
    pub fn new(
        config: &DiscoveryConfig,
        fetcher: Arc<dyn Fetcher>,
        oracle: Arc<dyn ExtractionOracle>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                fetcher,
                oracle,
                resolver: StubResolver::default_chain(&config.wrapper_params),
                cleaner: ContentCleaner::new(config.min_block_length),
                filter: config.url_filter(),
                wrapper_params: config.wrapper_params.clone(),
                fetch_timeout: config.fetch.timeout(),
                oracle_timeout: config.oracle.timeout(),
                model: config.oracle.model.clone(),
                min_html_chars: config.min_html_length,
                max_input_chars: config.oracle.max_input_chars,
            }),
            max_concurrent: config.max_concurrent.max(1),
        }
    }

    /// Processes every candidate and returns the deduplicated songs.
    ///
    /// `variants[0]` is the canonical ragam spelling handed to the oracle.
    pub async fn run(
        &self,
        candidates: &[DiscoveredUrl],
        variants: &[String],
        drops: &Arc<DropCollector>,
    ) -> (Vec<ExtractedSong>, ExtractionStats) {
        let gate = AdmissionGate::new(self.max_concurrent);
        let songs = Arc::new(SongCollector::new());
        let variants: Arc<[String]> = Arc::from(variants);

        let mut tasks = FuturesUnordered::new();
        for candidate in candidates {
            let shared = Arc::clone(&self.shared);
            let gate = gate.clone();
            let songs = Arc::clone(&songs);
            let variants = Arc::clone(&variants);
            let url = candidate.original_url.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = gate
                    .acquire()
                    .await
                    .map_err(|e| DropRecord::from_error(DropStage::Internal, &url, &e))?;
                process_candidate(&shared, &url, &variants, &songs).await
            }));
        }

        let mut stats = ExtractionStats {
            candidates: candidates.len(),
            ..ExtractionStats::default()
        };
        while let Some(joined) = tasks.next().await {
            match joined {
                Ok(Ok(_)) => stats.extracted_pages += 1,
                Ok(Err(record)) => {
                    stats.dropped += 1;
                    drops.record(record);
                }
                Err(e) => {
                    stats.dropped += 1;
                    drops.record(DropRecord::new(
                        DropStage::Internal,
                        FailureKind::Internal,
                        "extraction task",
                        e.to_string(),
                    ));
                }
            }
        }
        stats.peak_concurrency = gate.peak();

        let songs = songs.snapshot();
        info!(
            candidates = stats.candidates,
            extracted_pages = stats.extracted_pages,
            dropped = stats.dropped,
            songs = songs.len(),
            "Extraction finished"
        );
        (songs, stats)
    }
}

fn malformed(stage: DropStage, url: &str, reason: impl Into<String>) -> DropRecord {
    DropRecord::new(stage, FailureKind::MalformedContent, url, reason)
}

async fn fetch_page(shared: &Shared, url: &str) -> Result<PageFetchResult, ScoutError> {
    let page = shared.fetcher.fetch(url, shared.fetch_timeout).await?;
    if !page.is_success() {
        return Err(ScoutError::transport(url, format!("status {}", page.status)));
    }
    Ok(page)
}

/// Runs one candidate. Returns the number of new songs, or the drop.
async fn process_candidate(
    shared: &Shared,
    candidate_url: &str,
    variants: &[String],
    songs: &SongCollector,
) -> Result<usize, DropRecord> {
    let url = unwrap_redirect_wrapper(candidate_url, &shared.wrapper_params);
    if shared.filter.is_video_host(&url) {
        return Err(malformed(DropStage::VideoHost, &url, "video host"));
    }

    let page = fetch_page(shared, &url)
        .await
        .map_err(|e| DropRecord::from_error(DropStage::Fetch, &url, &e))?;
    if shared.filter.is_video_host(&page.final_url) {
        return Err(malformed(DropStage::VideoHost, &page.final_url, "redirected to video host"));
    }

    let (html, effective_url) = if looks_like_redirect_stub(&page.html) {
        let resolution = shared
            .resolver
            .resolve(&page.html, &page.final_url)
            .ok_or_else(|| malformed(DropStage::StubResolution, &url, "no recoverable target"))?;
        debug!(url = %url, target = %resolution.target, strategy = resolution.strategy, "Resolved stub page");

        if shared.filter.is_video_host(&resolution.target) {
            return Err(malformed(DropStage::VideoHost, &resolution.target, "stub target is a video host"));
        }
        let target = fetch_page(shared, &resolution.target)
            .await
            .map_err(|e| DropRecord::from_error(DropStage::StubResolution, &resolution.target, &e))?;
        if shared.filter.is_video_host(&target.final_url) {
            return Err(malformed(DropStage::VideoHost, &target.final_url, "redirected to video host"));
        }
        if looks_like_redirect_stub(&target.html) {
            return Err(malformed(DropStage::StubResolution, &target.final_url, "stub target is another stub"));
        }
        (target.html, target.final_url)
    } else {
        (page.html, page.final_url)
    };

    let html_chars = html.chars().count();
    if html_chars < shared.min_html_chars {
        return Err(malformed(
            DropStage::TooShort,
            &effective_url,
            format!("html has {html_chars} characters"),
        ));
    }

    let cleaned = shared.cleaner.clean(&html);
    if cleaned.is_empty() {
        return Err(malformed(DropStage::TooShort, &effective_url, "no visible text"));
    }

    let prompt = build_extraction_prompt(&cleaned, variants, shared.max_input_chars);
    let raw = match timeout(shared.oracle_timeout, shared.oracle.extract(&prompt, &shared.model)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => return Err(DropRecord::from_error(DropStage::Oracle, &effective_url, &e)),
        Err(_) => {
            let e = ScoutError::oracle(
                &shared.model,
                format!("timed out after {}s", shared.oracle_timeout.as_secs_f64()),
            );
            return Err(DropRecord::from_error(DropStage::Oracle, &effective_url, &e));
        }
    };

    let value = recover_json(&raw)
        .ok_or_else(|| malformed(DropStage::Parse, &effective_url, "no JSON in oracle output"))?;
    let items = items_from_value(value);

    let mut added = 0;
    for item in &items {
        if let Some(song) = song_from_item(item, &effective_url, &shared.filter) {
            if songs.insert(song) {
                added += 1;
            }
        }
    }

    info!(url = %effective_url, items = items.len(), added, "Extracted songs");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockFetcher};
    use crate::websearch::MockExtractionOracle;
    use pretty_assertions::assert_eq;

    fn config() -> DiscoveryConfig {
        DiscoveryConfig::default().with_max_concurrent(2)
    }

    fn candidate(url: &str) -> DiscoveredUrl {
        DiscoveredUrl::new(crate::urls::normalize_key(url).unwrap_or_default(), url)
    }

    fn variants() -> Vec<String> {
        vec!["todi".to_string(), "thodi".to_string()]
    }

    #[tokio::test]
    async fn test_extracts_songs_with_mock_oracle() {
        let fetcher = MockFetcher::new().with_page(
            "https://songs.example/todi",
            fixtures::song_page("Todi songs", &["Kaddanuvariki by Thyagaraja"]),
        );
        let mut oracle = MockExtractionOracle::new();
        oracle
            .expect_extract()
            .withf(|prompt, model| prompt.contains("Kaddanuvariki") && model.to_string() == "gemma3:4b")
            .times(1)
            .returning(|_, _| Ok(r#"[{"title":"Kaddanuvariki","composer":"Thyagaraja"}]"#.to_string()));

        let pipeline = ExtractionPipeline::new(&config(), Arc::new(fetcher), Arc::new(oracle));
        let drops = Arc::new(DropCollector::new());
        let (songs, stats) = pipeline
            .run(&[candidate("https://songs.example/todi")], &variants(), &drops)
            .await;

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].title, "Kaddanuvariki");
        assert_eq!(songs[0].composer.as_deref(), Some("Thyagaraja"));
        assert_eq!(songs[0].source_url, "https://songs.example/todi");
        assert_eq!(stats.extracted_pages, 1);
        assert!(drops.is_empty());
    }

    #[tokio::test]
    async fn test_oracle_error_drops_candidate() {
        let fetcher = MockFetcher::new().with_page(
            "https://songs.example/a",
            fixtures::song_page("Songs", &["Some long enough paragraph about songs"]),
        );
        let mut oracle = MockExtractionOracle::new();
        oracle
            .expect_extract()
            .returning(|_, model| Err(ScoutError::oracle(model.to_string(), "exit status 1")));

        let pipeline = ExtractionPipeline::new(&config(), Arc::new(fetcher), Arc::new(oracle));
        let drops = Arc::new(DropCollector::new());
        let (songs, _) = pipeline
            .run(&[candidate("https://songs.example/a")], &variants(), &drops)
            .await;

        assert!(songs.is_empty());
        let summary = drops.summary();
        assert_eq!(summary.count(DropStage::Oracle), 1);
        assert_eq!(summary.records[0].kind, FailureKind::OracleFailure);
    }

    #[tokio::test]
    async fn test_video_hosts_never_reach_oracle() {
        let fetcher = MockFetcher::new();
        let mut oracle = MockExtractionOracle::new();
        oracle.expect_extract().never();

        let pipeline = ExtractionPipeline::new(&config(), Arc::new(fetcher), Arc::new(oracle));
        let drops = Arc::new(DropCollector::new());
        pipeline
            .run(&[candidate("https://www.youtube.com/watch?v=abc")], &variants(), &drops)
            .await;

        assert_eq!(drops.summary().count(DropStage::VideoHost), 1);
    }

    #[tokio::test]
    async fn test_short_and_failed_pages_are_dropped() {
        let fetcher = MockFetcher::new()
            .with_page("https://short.example/", "<p>tiny</p>")
            .with_status("https://gone.example/", 404);
        let mut oracle = MockExtractionOracle::new();
        oracle.expect_extract().never();

        let pipeline = ExtractionPipeline::new(&config(), Arc::new(fetcher), Arc::new(oracle));
        let drops = Arc::new(DropCollector::new());
        pipeline
            .run(
                &[
                    candidate("https://short.example/"),
                    candidate("https://gone.example/"),
                    candidate("https://missing.example/"),
                ],
                &variants(),
                &drops,
            )
            .await;

        let summary = drops.summary();
        assert_eq!(summary.count(DropStage::TooShort), 1);
        assert_eq!(summary.count(DropStage::Fetch), 2);
    }
}
