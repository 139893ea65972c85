//! HTTP implementation of the [`Fetcher`] protocol.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::debug;

use super::config::FetchConfig;
use super::models::PageFetchResult;
use super::protocols::Fetcher;
use crate::errors::ScoutError;

/// Builds a header map, skipping entries that are not valid HTTP headers.
pub(crate) fn header_map<'a>(headers: impl IntoIterator<Item = (&'a String, &'a String)>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            map.insert(name, value);
        }
    }
    map
}

/// Fetches pages with a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher from configuration.
    pub fn new(config: &FetchConfig) -> Result<Self, ScoutError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(header_map(&config.headers))
            .redirect(Policy::limited(config.max_redirects))
            .timeout(config.timeout())
            .build()
            .map_err(|e| ScoutError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<PageFetchResult, ScoutError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ScoutError::transport(url, e.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| ScoutError::transport(url, format!("reading body: {e}")))?;

        debug!(url = %url, final_url = %final_url, status, bytes = html.len(), "Fetched page");
        Ok(PageFetchResult {
            html,
            final_url,
            status,
        })
    }
}
