//! Search engine backed by plain HTTP requests to result pages.

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::response::{ResponseValue, Scalar};
use crate::errors::ScoutError;
use crate::urls::{default_wrapper_params, has_wrapper_param, host_of, is_http_url};
use crate::websearch::{header_map, EngineConfig, FetchConfig, SearchEngine, SearchJob};

/// Extracts candidate result links from one result page.
///
/// Relative hrefs are resolved against `page_url`. Links back to the engine's
/// own host are skipped unless they carry a redirect wrapper parameter.
#[must_use]
pub fn extract_result_links(html: &str, page_url: &str, wrapper_params: &[String]) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let engine_host = host_of(page_url);
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(absolute) = base.join(href.trim()) else {
            continue;
        };
        let absolute = absolute.to_string();
        if !is_http_url(&absolute) {
            continue;
        }
        let same_host = engine_host.is_some() && host_of(&absolute) == engine_host;
        if same_host && !has_wrapper_param(&absolute, wrapper_params) {
            continue;
        }
        if !links.contains(&absolute) {
            links.push(absolute);
        }
    }
    links
}

/// Reads engine result pages over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSearchEngine {
    client: reqwest::Client,
    wrapper_params: Vec<String>,
}

impl HttpSearchEngine {
    /// Builds an engine client using the fetch user agent.
    pub fn new(fetch: &FetchConfig) -> Result<Self, ScoutError> {
        let client = reqwest::Client::builder()
            .user_agent(fetch.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(fetch.max_redirects))
            .build()
            .map_err(|e| ScoutError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            wrapper_params: default_wrapper_params(),
        })
    }

    /// Sets the wrapper parameters kept on same-host links.
    #[must_use]
    pub fn with_wrapper_params(mut self, params: Vec<String>) -> Self {
        self.wrapper_params = params;
        self
    }

    async fn fetch_page(&self, url: &str, config: &EngineConfig) -> Result<String, ScoutError> {
        let response = self
            .client
            .get(url)
            .headers(header_map(&config.headers))
            .timeout(config.navigation_timeout())
            .send()
            .await
            .map_err(|e| ScoutError::transport(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::transport(url, format!("status {}", status.as_u16())));
        }
        response
            .text()
            .await
            .map_err(|e| ScoutError::transport(url, format!("reading body: {e}")))
    }
}

#[async_trait]
impl SearchEngine for HttpSearchEngine {
    async fn search(
        &self,
        job: &SearchJob,
        config: &EngineConfig,
    ) -> Result<ResponseValue, ScoutError> {
        let mut results = Vec::new();

        for keyword in &job.keywords {
            for page in 0..job.page_count {
                let url = config.search_url_for(keyword, page);
                let html = match self.fetch_page(&url, config).await {
                    Ok(html) => html,
                    Err(e) if page == 0 => return Err(e),
                    Err(e) => {
                        warn!(engine = %config.id, page, error = %e, "Stopping pagination");
                        break;
                    }
                };

                let links = extract_result_links(&html, &url, &self.wrapper_params);
                debug!(engine = %config.id, keyword = %keyword, page, links = links.len(), "Read result page");
                if links.is_empty() && page > 0 {
                    break;
                }

                results.push(ResponseValue::map([
                    ("keyword", ResponseValue::string(keyword.clone())),
                    ("page", ResponseValue::Scalar(Scalar::Number((page + 1) as f64))),
                    ("links", ResponseValue::list(links.into_iter().map(ResponseValue::String))),
                ]));
            }
        }

        Ok(ResponseValue::map([
            ("engine", ResponseValue::string(config.id.clone())),
            ("results", ResponseValue::List(results)),
        ]))
    }
}
