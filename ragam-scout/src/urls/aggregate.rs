//! Run-wide aggregation of discovered URLs.

use std::collections::HashSet;

use super::normalize::normalize_key;
use super::wrapper::unwrap_redirect_wrapper;
use crate::websearch::DiscoveredUrl;

/// Insertion-ordered map from normalized key to the first URL seen for it.
///
/// Shared by all engines and queries of a run; callers wrap it in a mutex.
#[derive(Debug, Default)]
pub struct UrlAggregator {
    wrapper_params: Vec<String>,
    seen: HashSet<String>,
    entries: Vec<DiscoveredUrl>,
}

impl UrlAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new(wrapper_params: Vec<String>) -> Self {
        Self {
            wrapper_params,
            seen: HashSet::new(),
            entries: Vec::new(),
        }
    }

    /// Offers a raw URL. Returns `true` if it introduced a new key.
    ///
    /// Wrapper URLs are unwrapped before keying, so a tracking link and its
    /// real target collapse to one entry. The stored original is the raw URL
    /// as first seen.
    pub fn offer(&mut self, raw: &str) -> bool {
        let target = unwrap_redirect_wrapper(raw, &self.wrapper_params);
        let Some(key) = normalize_key(&target) else {
            return false;
        };

        if !self.seen.insert(key.clone()) {
            return false;
        }

        self.entries.push(DiscoveredUrl {
            normalized_key: key,
            original_url: raw.to_string(),
        });
        true
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been aggregated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order.
    #[must_use]
    pub fn entries(&self) -> &[DiscoveredUrl] {
        &self.entries
    }

    /// Consumes the aggregator, returning entries in first-seen order.
    #[must_use]
    pub fn into_entries(self) -> Vec<DiscoveredUrl> {
        self.entries
    }
}
