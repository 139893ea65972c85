//! Multi-engine fan-out with a barrier between queries.

use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::ScoutError;
use crate::report::{DropCollector, DropRecord, DropStage};
use crate::urls::{unwrap_redirect_wrapper, UrlAggregator, UrlFilter};
use crate::websearch::{DiscoveredUrl, DiscoveryConfig, EngineConfig, EngineRegistry, SearchEngine, SearchJob};

/// Outcome of one engine attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOutcome {
    /// URLs found in the response.
    pub found: usize,
    /// URLs that introduced a new key.
    pub added: usize,
    /// Interstitial URLs filtered out.
    pub filtered: usize,
}

/// Runs queries against every configured engine.
///
/// Queries run one at a time; within a query all engines run concurrently
/// and every attempt settles before the next query starts, so at most
/// `engines.len()` searches are in flight.
pub struct SearchOrchestrator {
    engines: EngineRegistry,
    backend: Arc<dyn SearchEngine>,
    filter: UrlFilter,
    wrapper_params: Vec<String>,
    pages_per_engine: usize,
}

impl std::fmt::Debug for SearchOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchOrchestrator")
            .field("engines", &self.engines.ids())
            .field("pages_per_engine", &self.pages_per_engine)
            .finish_non_exhaustive()
    }
}

impl SearchOrchestrator {
    /// Creates an orchestrator over `engines`, searching through `backend`.
    #[must_use]
    pub fn new(engines: EngineRegistry, backend: Arc<dyn SearchEngine>) -> Self {
        let defaults = DiscoveryConfig::default();
        Self {
            engines,
            backend,
            filter: defaults.url_filter(),
            wrapper_params: defaults.wrapper_params,
            pages_per_engine: defaults.pages_per_engine,
        }
    }

    /// Creates an orchestrator configured from a discovery configuration.
    #[must_use]
    pub fn from_config(config: &DiscoveryConfig, backend: Arc<dyn SearchEngine>) -> Self {
        Self {
            engines: config.engines.clone(),
            backend,
            filter: config.url_filter(),
            wrapper_params: config.wrapper_params.clone(),
            pages_per_engine: config.pages_per_engine.max(1),
        }
    }

    /// Sets pages per engine; values below 1 become 1.
    #[must_use]
    pub fn with_pages_per_engine(mut self, pages: usize) -> Self {
        self.pages_per_engine = pages.max(1);
        self
    }

    /// Sets the domain filter.
    #[must_use]
    pub fn with_filter(mut self, filter: UrlFilter) -> Self {
        self.filter = filter;
        self
    }

    /// The engine table.
    #[must_use]
    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    /// Searches every query on every engine and returns the deduplicated
    /// candidates in first-seen order.
    pub async fn discover(&self, queries: &[String], drops: &DropCollector) -> Vec<DiscoveredUrl> {
        let aggregator = Mutex::new(UrlAggregator::new(self.wrapper_params.clone()));

        for (index, query) in queries.iter().enumerate() {
            let attempts = self
                .engines
                .iter()
                .map(|engine| self.search_engine(query, engine, &aggregator, drops));
            let outcomes = join_all(attempts).await;

            let added: usize = outcomes.iter().map(|o| o.added).sum();
            info!(
                query = %query,
                query_index = index,
                engines = outcomes.len(),
                added,
                total = aggregator.lock().len(),
                "Query settled"
            );
        }

        aggregator.into_inner().into_entries()
    }

    /// Runs one engine attempt. Failures are recorded, never raised.
    async fn search_engine(
        &self,
        query: &str,
        engine: &EngineConfig,
        aggregator: &Mutex<UrlAggregator>,
        drops: &DropCollector,
    ) -> EngineOutcome {
        let job = SearchJob::new(&engine.id, query, self.pages_per_engine);
        let budget = engine.attempt_timeout(job.page_count);

        let result = match tokio::time::timeout(budget, self.backend.search(&job, engine)).await {
            Ok(result) => result,
            Err(_) => Err(ScoutError::transport(
                &engine.id,
                format!("search timed out after {}s", budget.as_secs_f64()),
            )),
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                drops.record(DropRecord::from_error(
                    DropStage::Search,
                    format!("{}: {query}", engine.id),
                    &e,
                ));
                return EngineOutcome::default();
            }
        };

        let urls = response.collect_urls();
        let mut outcome = EngineOutcome {
            found: urls.len(),
            ..EngineOutcome::default()
        };

        let mut aggregator = aggregator.lock();
        for url in &urls {
            let target = unwrap_redirect_wrapper(url, &self.wrapper_params);
            if self.filter.is_interstitial(url) || self.filter.is_interstitial(&target) {
                debug!(engine = %engine.id, url = %url, "Skipping interstitial URL");
                outcome.filtered += 1;
                continue;
            }
            if aggregator.offer(url) {
                outcome.added += 1;
            }
        }
        drop(aggregator);

        debug!(
            engine = %engine.id,
            query = %query,
            found = outcome.found,
            added = outcome.added,
            filtered = outcome.filtered,
            "Engine attempt settled"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ResponseValue;
    use crate::testing::MockSearchEngine;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn engines(ids: &[&str]) -> EngineRegistry {
        EngineRegistry::new(
            ids.iter()
                .map(|id| {
                    EngineConfig::new(*id, format!("https://{id}.test"), format!("https://{id}.test/?q={{query}}"))
                        .with_timeouts(0.5, 0.5)
                })
                .collect(),
        )
    }

    fn queries(items: &[&str]) -> Vec<String> {
        items.iter().map(|q| (*q).to_string()).collect()
    }

    #[tokio::test]
    async fn test_each_engine_contributes() {
        let backend = MockSearchEngine::new()
            .with_urls("alpha", &["https://songs.example/todi"])
            .with_urls("beta", &["https://lyrics.example/todi"]);
        let orchestrator = SearchOrchestrator::new(engines(&["alpha", "beta"]), Arc::new(backend));
        let drops = DropCollector::new();

        let urls = orchestrator.discover(&queries(&["todi ragam songs"]), &drops).await;
        let mut keys: Vec<_> = urls.iter().map(|u| u.normalized_key.clone()).collect();
        keys.sort();
        assert_eq!(keys, vec!["https://lyrics.example/todi", "https://songs.example/todi"]);
        assert!(drops.is_empty());
    }

    #[tokio::test]
    async fn test_identical_urls_collapse() {
        let backend = MockSearchEngine::new()
            .with_urls("alpha", &["https://songs.example/todi/"])
            .with_urls("beta", &["https://songs.example/todi#list"]);
        let orchestrator = SearchOrchestrator::new(engines(&["alpha", "beta"]), Arc::new(backend));

        let urls = orchestrator
            .discover(&queries(&["todi ragam songs"]), &DropCollector::new())
            .await;
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].normalized_key, "https://songs.example/todi");
    }

    #[tokio::test]
    async fn test_failing_engine_does_not_abort_query() {
        let backend = MockSearchEngine::new()
            .with_failure("alpha")
            .with_urls("beta", &["https://songs.example/a"]);
        let orchestrator = SearchOrchestrator::new(engines(&["alpha", "beta"]), Arc::new(backend));
        let drops = DropCollector::new();

        let urls = orchestrator.discover(&queries(&["q1", "q2"]), &drops).await;
        assert_eq!(urls.len(), 1);
        assert_eq!(drops.summary().count(DropStage::Search), 2);
    }

    #[tokio::test]
    async fn test_slow_engine_times_out() {
        let backend = MockSearchEngine::new()
            .with_urls("alpha", &["https://songs.example/a"])
            .with_delay("alpha", Duration::from_secs(5))
            .with_urls("beta", &["https://songs.example/b"]);
        let registry = EngineRegistry::new(vec![
            EngineConfig::new("alpha", "https://alpha.test", "https://alpha.test/?q={query}")
                .with_timeouts(0.05, 0.05),
            EngineConfig::new("beta", "https://beta.test", "https://beta.test/?q={query}")
                .with_timeouts(0.5, 0.5),
        ]);
        let orchestrator = SearchOrchestrator::new(registry, Arc::new(backend)).with_pages_per_engine(1);
        let drops = DropCollector::new();

        let urls = orchestrator.discover(&queries(&["q"]), &drops).await;
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].normalized_key, "https://songs.example/b");
        assert_eq!(drops.len(), 1);
    }

    #[tokio::test]
    async fn test_interstitials_filtered() {
        let backend = MockSearchEngine::new().with_response(
            "alpha",
            ResponseValue::list([
                ResponseValue::from("https://accounts.google.com/ServiceLogin?continue=x"),
                ResponseValue::from("https://consent.youtube.com/m?continue=y"),
                ResponseValue::from("https://songs.example/kalyani"),
            ]),
        );
        let orchestrator = SearchOrchestrator::new(engines(&["alpha"]), Arc::new(backend));

        let urls = orchestrator
            .discover(&queries(&["kalyani ragam songs"]), &DropCollector::new())
            .await;
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].original_url, "https://songs.example/kalyani");
    }

    #[tokio::test]
    async fn test_queries_run_sequentially() {
        let backend = Arc::new(
            MockSearchEngine::new()
                .with_urls("alpha", &["https://a.example/1"])
                .with_urls("beta", &["https://b.example/1"])
                .with_urls("gamma", &["https://c.example/1"])
                .with_default_delay(Duration::from_millis(20)),
        );
        let orchestrator = SearchOrchestrator::new(engines(&["alpha", "beta", "gamma"]), backend.clone());

        orchestrator
            .discover(&queries(&["q1", "q2", "q3", "q4"]), &DropCollector::new())
            .await;

        assert_eq!(backend.call_count(), 12);
        assert!(backend.peak_in_flight() <= 3);
    }
}
