//! Configuration types for discovery runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::errors::ScoutError;
use crate::urls::{
    default_wrapper_params, UrlFilter, DEFAULT_INTERSTITIAL_DOMAINS, DEFAULT_VIDEO_HOSTS,
};

/// Longest timeout any configured wait may take, in seconds.
pub const MAX_TIMEOUT_SECONDS: f64 = 86_400.0;

/// Converts configured seconds to a Duration, clamped to `0..=MAX_TIMEOUT_SECONDS`.
/// NaN counts as zero.
fn clamped_duration(seconds: f64) -> Duration {
    let cap = Duration::from_secs_f64(MAX_TIMEOUT_SECONDS);
    Duration::try_from_secs_f64(seconds.max(0.0)).map_or(cap, |d| d.min(cap))
}

fn check_timeout(name: &str, seconds: f64) -> Result<(), ScoutError> {
    if seconds.is_finite() && (0.0..=MAX_TIMEOUT_SECONDS).contains(&seconds) {
        Ok(())
    } else {
        Err(ScoutError::Config(format!(
            "{name} must be between 0 and {MAX_TIMEOUT_SECONDS} seconds, got {seconds}"
        )))
    }
}

/// Static description of one search engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Engine identifier (e.g. "bing").
    pub id: String,
    /// Entry page of the engine.
    pub start_url: String,
    /// Result-page URL template. `{query}` is the encoded keyword, `{page}`
    /// the 1-based page number and `{offset}` the 0-based result offset.
    pub search_url: String,
    /// Extra request headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Navigation timeout in seconds.
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_seconds: f64,
    /// Timeout for result selectors to appear, in seconds.
    #[serde(default = "default_selector_timeout")]
    pub selector_timeout_seconds: f64,
    /// Whether a browser-driven engine runs headless.
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Extra browser arguments for browser-driven engines.
    #[serde(default)]
    pub browser_args: Vec<String>,
    /// Results per page, used to compute `{offset}`.
    #[serde(default = "default_results_per_page")]
    pub results_per_page: usize,
}

fn default_navigation_timeout() -> f64 {
    45.0
}

fn default_selector_timeout() -> f64 {
    30.0
}

fn default_true() -> bool {
    true
}

fn default_results_per_page() -> usize {
    10
}

fn english_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    headers.insert("Accept-Language".to_string(), "en-US,en;q=0.9".to_string());
    headers
}

impl EngineConfig {
    /// Creates an engine description with default timeouts.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        start_url: impl Into<String>,
        search_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start_url: start_url.into(),
            search_url: search_url.into(),
            headers: english_headers(),
            navigation_timeout_seconds: default_navigation_timeout(),
            selector_timeout_seconds: default_selector_timeout(),
            headless: true,
            browser_args: Vec::new(),
            results_per_page: default_results_per_page(),
        }
    }

    /// Sets the navigation and selector timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, navigation_seconds: f64, selector_seconds: f64) -> Self {
        self.navigation_timeout_seconds = navigation_seconds;
        self.selector_timeout_seconds = selector_seconds;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Navigation timeout as a Duration.
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        clamped_duration(self.navigation_timeout_seconds)
    }

    /// Upper bound for one search attempt spanning `page_count` pages.
    #[must_use]
    pub fn attempt_timeout(&self, page_count: usize) -> Duration {
        let per_page = clamped_duration(self.navigation_timeout_seconds)
            .saturating_add(clamped_duration(self.selector_timeout_seconds));
        let pages = u32::try_from(page_count.max(1)).unwrap_or(u32::MAX);
        per_page
            .saturating_mul(pages)
            .min(Duration::from_secs_f64(MAX_TIMEOUT_SECONDS))
    }

    /// Renders the result-page URL for `keyword` and 0-based `page`.
    #[must_use]
    pub fn search_url_for(&self, keyword: &str, page: usize) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(keyword.as_bytes()).collect();
        self.search_url
            .replace("{query}", &encoded)
            .replace("{page}", &(page + 1).to_string())
            .replace("{offset}", &(page * self.results_per_page).to_string())
    }
}

/// Immutable, ordered table of the engines a run searches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EngineRegistry {
    engines: Vec<EngineConfig>,
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

impl EngineRegistry {
    /// Creates a registry from explicit engines.
    #[must_use]
    pub fn new(engines: Vec<EngineConfig>) -> Self {
        Self { engines }
    }

    /// The built-in engine table.
    #[must_use]
    pub fn defaults() -> Self {
        Self::new(vec![
            EngineConfig::new(
                "bing",
                "https://www.bing.com/?mkt=en-US&cc=US",
                "https://www.bing.com/search?q={query}&first={offset}&mkt=en-US",
            ),
            EngineConfig::new(
                "duckduckgo",
                "https://duckduckgo.com/?kl=us-en",
                "https://html.duckduckgo.com/html/?q={query}&s={offset}&kl=us-en",
            ),
            EngineConfig::new(
                "yahoo",
                "https://search.yahoo.com/?ei=UTF-8",
                "https://search.yahoo.com/search?p={query}&b={offset}&ei=UTF-8",
            ),
            EngineConfig::new(
                "yandex",
                "https://yandex.com/?lang=en",
                "https://yandex.com/search/?text={query}&p={page}&lang=en",
            ),
            EngineConfig::new(
                "webcrawler",
                "https://www.webcrawler.com/?language=en",
                "https://www.webcrawler.com/serp?q={query}&page={page}",
            ),
            EngineConfig::new(
                "infospace",
                "https://www.infospace.com/?lang=en",
                "https://www.infospace.com/serp?q={query}&page={page}",
            ),
        ])
    }

    /// Number of engines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Iterates engines in table order.
    pub fn iter(&self) -> impl Iterator<Item = &EngineConfig> {
        self.engines.iter()
    }

    /// Looks up an engine by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&EngineConfig> {
        self.engines.iter().find(|e| e.id == id)
    }

    /// Engine ids in table order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.id.as_str()).collect()
    }
}

/// Configuration for page fetching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_seconds: f64,
    /// Maximum number of HTTP redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Additional headers to include.
    #[serde(default = "english_headers")]
    pub headers: HashMap<String, String>,
}

fn default_fetch_timeout() -> f64 {
    15.0
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_fetch_timeout(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            headers: english_headers(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        clamped_duration(self.timeout_seconds)
    }
}

/// Configuration for the extraction oracle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OracleConfig {
    /// Model identifier handed to the oracle.
    #[serde(default = "default_model")]
    pub model: String,
    /// Executable used to run the local model.
    #[serde(default = "default_command")]
    pub command: String,
    /// Extra arguments placed before `run <model>`.
    #[serde(default)]
    pub args: Vec<String>,
    /// Invocation timeout in seconds.
    #[serde(default = "default_oracle_timeout")]
    pub timeout_seconds: f64,
    /// Maximum characters of cleaned page text embedded in one prompt.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

fn default_model() -> String {
    "gemma3:4b".to_string()
}

fn default_command() -> String {
    "ollama".to_string()
}

fn default_oracle_timeout() -> f64 {
    600.0
}

fn default_max_input_chars() -> usize {
    16_000
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            command: default_command(),
            args: Vec::new(),
            timeout_seconds: default_oracle_timeout(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl OracleConfig {
    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        clamped_duration(self.timeout_seconds)
    }
}

/// Combined configuration for a discovery run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveryConfig {
    /// Result pages requested from each engine per query.
    #[serde(default = "default_pages")]
    pub pages_per_engine: usize,
    /// Upper bound on generated queries.
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,
    /// Maximum concurrent page extractions.
    #[serde(default = "default_concurrent")]
    pub max_concurrent: usize,
    /// Pages with less HTML than this are dropped.
    #[serde(default = "default_min_html")]
    pub min_html_length: usize,
    /// Minimum characters for a cleaned text block.
    #[serde(default = "default_min_block")]
    pub min_block_length: usize,
    /// Login/consent domains filtered out of search results.
    #[serde(default = "default_interstitials")]
    pub interstitial_domains: Vec<String>,
    /// Video-hosting domains never text-extracted.
    #[serde(default = "default_video_hosts")]
    pub video_hosts: Vec<String>,
    /// Query parameters that carry embedded redirect targets.
    #[serde(default = "default_wrapper_params")]
    pub wrapper_params: Vec<String>,
    /// Fetch configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Oracle configuration.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Engines to search.
    #[serde(default)]
    pub engines: EngineRegistry,
}

fn default_pages() -> usize {
    5
}

fn default_max_queries() -> usize {
    60
}

fn default_concurrent() -> usize {
    2
}

fn default_min_html() -> usize {
    200
}

fn default_min_block() -> usize {
    15
}

fn default_interstitials() -> Vec<String> {
    DEFAULT_INTERSTITIAL_DOMAINS.iter().map(|d| (*d).to_string()).collect()
}

fn default_video_hosts() -> Vec<String> {
    DEFAULT_VIDEO_HOSTS.iter().map(|d| (*d).to_string()).collect()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            pages_per_engine: default_pages(),
            max_queries: default_max_queries(),
            max_concurrent: default_concurrent(),
            min_html_length: default_min_html(),
            min_block_length: default_min_block(),
            interstitial_domains: default_interstitials(),
            video_hosts: default_video_hosts(),
            wrapper_params: default_wrapper_params(),
            fetch: FetchConfig::default(),
            oracle: OracleConfig::default(),
            engines: EngineRegistry::defaults(),
        }
    }
}

impl DiscoveryConfig {
    /// Creates a new discovery configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ScoutError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScoutError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            ScoutError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks values that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ScoutError> {
        if self.max_concurrent == 0 {
            return Err(ScoutError::Config(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.max_queries == 0 {
            return Err(ScoutError::Config("max_queries must be at least 1".to_string()));
        }
        check_timeout("fetch.timeout_seconds", self.fetch.timeout_seconds)?;
        check_timeout("oracle.timeout_seconds", self.oracle.timeout_seconds)?;
        for engine in self.engines.iter() {
            check_timeout(
                &format!("{}.navigation_timeout_seconds", engine.id),
                engine.navigation_timeout_seconds,
            )?;
            check_timeout(
                &format!("{}.selector_timeout_seconds", engine.id),
                engine.selector_timeout_seconds,
            )?;
        }
        Ok(())
    }

    /// Sets pages per engine; values below 1 become 1.
    #[must_use]
    pub fn with_pages_per_engine(mut self, pages: usize) -> Self {
        self.pages_per_engine = pages.max(1);
        self
    }

    /// Sets the maximum concurrent extractions; values below 1 become 1.
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Sets the oracle model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.oracle.model = model.into();
        self
    }

    /// Replaces the engine table.
    #[must_use]
    pub fn with_engines(mut self, engines: EngineRegistry) -> Self {
        self.engines = engines;
        self
    }

    /// Sets the fetch configuration.
    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Sets the oracle configuration.
    #[must_use]
    pub fn with_oracle(mut self, oracle: OracleConfig) -> Self {
        self.oracle = oracle;
        self
    }

    /// Builds the domain filter described by this configuration.
    #[must_use]
    pub fn url_filter(&self) -> UrlFilter {
        UrlFilter::new(self.interstitial_domains.clone(), self.video_hosts.clone())
    }
}
