//! Scripted collaborators for testing discovery runs.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ScoutError;
use crate::search::ResponseValue;
use crate::websearch::{
    EngineConfig, ExtractionOracle, Fetcher, PageFetchResult, SearchEngine, SearchJob,
};

/// Tracks how many calls are running and the most seen at once.
#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl InFlight {
    fn enter(&self) -> InFlightGuard<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(self)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlightGuard<'a>(&'a InFlight);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone)]
enum EngineScript {
    Respond(ResponseValue),
    Fail(String),
}

/// A search engine answering from per-engine scripts.
///
/// Engines without a script answer with an empty list.
#[derive(Debug, Default)]
pub struct MockSearchEngine {
    scripts: HashMap<String, EngineScript>,
    delays: HashMap<String, Duration>,
    default_delay: Option<Duration>,
    jobs: Mutex<Vec<SearchJob>>,
    in_flight: InFlight,
}

impl MockSearchEngine {
    /// Creates an engine with no scripts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `engine_id` return `urls` as a flat list.
    #[must_use]
    pub fn with_urls(self, engine_id: &str, urls: &[&str]) -> Self {
        let response = ResponseValue::list(urls.iter().map(|u| ResponseValue::from(*u)));
        self.with_response(engine_id, response)
    }

    /// Makes `engine_id` return `response`.
    #[must_use]
    pub fn with_response(mut self, engine_id: &str, response: ResponseValue) -> Self {
        self.scripts
            .insert(engine_id.to_string(), EngineScript::Respond(response));
        self
    }

    /// Makes `engine_id` fail with a transport error.
    #[must_use]
    pub fn with_failure(mut self, engine_id: &str) -> Self {
        self.scripts.insert(
            engine_id.to_string(),
            EngineScript::Fail("navigation failed".to_string()),
        );
        self
    }

    /// Delays every answer from `engine_id`.
    #[must_use]
    pub fn with_delay(mut self, engine_id: &str, delay: Duration) -> Self {
        self.delays.insert(engine_id.to_string(), delay);
        self
    }

    /// Delays answers from engines without their own delay.
    #[must_use]
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// Number of searches started.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.in_flight.calls()
    }

    /// Highest number of searches running at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }

    /// Jobs received, in arrival order.
    #[must_use]
    pub fn jobs(&self) -> Vec<SearchJob> {
        self.jobs.lock().clone()
    }
}

#[async_trait]
impl SearchEngine for MockSearchEngine {
    async fn search(
        &self,
        job: &SearchJob,
        config: &EngineConfig,
    ) -> Result<ResponseValue, ScoutError> {
        let _guard = self.in_flight.enter();
        self.jobs.lock().push(job.clone());

        if let Some(delay) = self.delays.get(&config.id).copied().or(self.default_delay) {
            tokio::time::sleep(delay).await;
        }

        match self.scripts.get(&config.id) {
            Some(EngineScript::Respond(response)) => Ok(response.clone()),
            Some(EngineScript::Fail(message)) => {
                Err(ScoutError::transport(&config.start_url, message.clone()))
            }
            None => Ok(ResponseValue::list([])),
        }
    }
}

/// A fetcher serving pages from memory.
///
/// Unknown URLs fail with a transport error.
#[derive(Debug, Default)]
pub struct MockFetcher {
    pages: HashMap<String, PageFetchResult>,
    delay: Option<Duration>,
    fetched: Mutex<Vec<String>>,
    in_flight: InFlight,
}

impl MockFetcher {
    /// Creates a fetcher with no pages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` with status 200 at `url`.
    #[must_use]
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages
            .insert(url.to_string(), PageFetchResult::new(html, url, 200));
        self
    }

    /// Serves an empty body with `status` at `url`.
    #[must_use]
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.pages
            .insert(url.to_string(), PageFetchResult::new("", url, status));
        self
    }

    /// Serves `html` at `url` as if the transport followed a redirect to `final_url`.
    #[must_use]
    pub fn with_redirect(mut self, url: &str, final_url: &str, html: impl Into<String>) -> Self {
        self.pages
            .insert(url.to_string(), PageFetchResult::new(html, final_url, 200));
        self
    }

    /// Delays every fetch.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs requested, in arrival order.
    #[must_use]
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }

    /// Highest number of fetches running at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<PageFetchResult, ScoutError> {
        let _guard = self.in_flight.enter();
        self.fetched.lock().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScoutError::transport(url, "connection refused"))
    }
}

#[derive(Debug, Clone)]
enum OracleScript {
    Answer(String),
    Fail(String),
}

/// An extraction oracle answering by prompt content.
///
/// The first rule whose needle occurs in the prompt decides the answer;
/// otherwise the default answer (`[]` unless set) is returned.
#[derive(Debug)]
pub struct MockOracle {
    rules: Vec<(String, OracleScript)>,
    default: OracleScript,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
    in_flight: InFlight,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default: OracleScript::Answer("[]".to_string()),
            delay: None,
            prompts: Mutex::new(Vec::new()),
            in_flight: InFlight::default(),
        }
    }
}

impl MockOracle {
    /// Creates an oracle answering `[]`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `output` to prompts containing `needle`.
    #[must_use]
    pub fn with_answer(mut self, needle: &str, output: impl Into<String>) -> Self {
        self.rules
            .push((needle.to_string(), OracleScript::Answer(output.into())));
        self
    }

    /// Fails prompts containing `needle`.
    #[must_use]
    pub fn with_failure(mut self, needle: &str, message: impl Into<String>) -> Self {
        self.rules
            .push((needle.to_string(), OracleScript::Fail(message.into())));
        self
    }

    /// Sets the answer for prompts no rule matches.
    #[must_use]
    pub fn with_default_answer(mut self, output: impl Into<String>) -> Self {
        self.default = OracleScript::Answer(output.into());
        self
    }

    /// Delays every answer.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of prompts received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.in_flight.calls()
    }

    /// Highest number of prompts being answered at once.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak()
    }

    /// Prompts received, in arrival order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ExtractionOracle for MockOracle {
    async fn extract(&self, prompt: &str, model: &str) -> Result<String, ScoutError> {
        let _guard = self.in_flight.enter();
        self.prompts.lock().push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let script = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map_or(&self.default, |(_, script)| script);
        match script {
            OracleScript::Answer(output) => Ok(output.clone()),
            OracleScript::Fail(message) => Err(ScoutError::oracle(model, message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine(id: &str) -> EngineConfig {
        EngineConfig::new(id, format!("https://{id}.test"), format!("https://{id}.test/?q={{query}}"))
    }

    #[tokio::test]
    async fn test_search_engine_scripts() {
        let engine_double = MockSearchEngine::new()
            .with_urls("alpha", &["https://a.example/"])
            .with_failure("beta");

        let job = SearchJob::new("alpha", "todi ragam songs", 1);
        let urls = engine_double.search(&job, &engine("alpha")).await.unwrap().collect_urls();
        assert_eq!(urls, vec!["https://a.example/"]);

        assert!(engine_double.search(&job, &engine("beta")).await.is_err());
        let empty = engine_double.search(&job, &engine("gamma")).await.unwrap();
        assert!(empty.collect_urls().is_empty());

        assert_eq!(engine_double.call_count(), 3);
        assert_eq!(engine_double.jobs().len(), 3);
    }

    #[tokio::test]
    async fn test_fetcher_pages_and_redirects() {
        let fetcher = MockFetcher::new()
            .with_page("https://a.example/", "<p>hi</p>")
            .with_redirect("https://short.example/x", "https://long.example/x", "<p>moved</p>");

        let page = fetcher.fetch("https://a.example/", Duration::from_secs(1)).await.unwrap();
        assert_eq!(page.status, 200);
        assert_eq!(page.final_url, "https://a.example/");

        let moved = fetcher.fetch("https://short.example/x", Duration::from_secs(1)).await.unwrap();
        assert_eq!(moved.final_url, "https://long.example/x");

        assert!(fetcher.fetch("https://missing.example/", Duration::from_secs(1)).await.is_err());
        assert_eq!(fetcher.fetched().len(), 3);
    }

    #[tokio::test]
    async fn test_oracle_rules_in_order() {
        let oracle = MockOracle::new()
            .with_answer("Kalyani", r#"[{"title":"Nidhi Chala"}]"#)
            .with_failure("broken", "exit status 1");

        assert_eq!(oracle.extract("about Kalyani", "m").await.unwrap(), r#"[{"title":"Nidhi Chala"}]"#);
        assert!(oracle.extract("broken page", "m").await.is_err());
        assert_eq!(oracle.extract("other", "m").await.unwrap(), "[]");
        assert_eq!(oracle.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_in_flight_peak() {
        let oracle = std::sync::Arc::new(MockOracle::new().with_delay(Duration::from_millis(30)));
        let calls: Vec<_> = (0..3)
            .map(|_| {
                let oracle = std::sync::Arc::clone(&oracle);
                tokio::spawn(async move { oracle.extract("p", "m").await })
            })
            .collect();
        for call in calls {
            call.await.unwrap().unwrap();
        }
        assert_eq!(oracle.call_count(), 3);
        assert!(oracle.peak_in_flight() >= 1);
        assert!(oracle.peak_in_flight() <= 3);
    }
}
