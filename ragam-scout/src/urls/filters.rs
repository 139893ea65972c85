//! Domain filters applied to discovered and resolved URLs.

use serde::{Deserialize, Serialize};

use super::normalize::{host_matches, host_of};

/// Authentication and consent interstitials that never hold content.
pub const DEFAULT_INTERSTITIAL_DOMAINS: &[&str] = &[
    "accounts.google.com",
    "consent.google.com",
    "consent.youtube.com",
    "login.live.com",
    "consent.yahoo.com",
];

/// Video hosts; their pages are not text-extracted.
pub const DEFAULT_VIDEO_HOSTS: &[&str] = &[
    "youtube.com",
    "youtu.be",
    "youtube-nocookie.com",
    "vimeo.com",
    "dailymotion.com",
];

/// Domain lists used to discard URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlFilter {
    /// Login/consent domains filtered out of search results.
    pub interstitial_domains: Vec<String>,
    /// Video-hosting domains dropped before fetching.
    pub video_hosts: Vec<String>,
}

impl UrlFilter {
    /// Creates a filter from explicit domain lists.
    #[must_use]
    pub fn new(interstitial_domains: Vec<String>, video_hosts: Vec<String>) -> Self {
        Self {
            interstitial_domains,
            video_hosts,
        }
    }

    /// Creates a filter with the built-in domain lists.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(
            DEFAULT_INTERSTITIAL_DOMAINS.iter().map(|d| (*d).to_string()).collect(),
            DEFAULT_VIDEO_HOSTS.iter().map(|d| (*d).to_string()).collect(),
        )
    }

    /// Whether `url` points at a login or consent interstitial.
    #[must_use]
    pub fn is_interstitial(&self, url: &str) -> bool {
        Self::matches_any(url, &self.interstitial_domains)
    }

    /// Whether `url` points at a video host.
    #[must_use]
    pub fn is_video_host(&self, url: &str) -> bool {
        Self::matches_any(url, &self.video_hosts)
    }

    fn matches_any(url: &str, domains: &[String]) -> bool {
        host_of(url).is_some_and(|host| domains.iter().any(|d| host_matches(&host, d)))
    }
}
