//! Canonical keys for discovered URLs.

use url::Url;

/// Maps a raw URL to its deduplication key, or `None` when it is not a
/// well-formed absolute HTTP(S) URL.
///
/// The key is `origin + path` with the fragment dropped and trailing slashes
/// stripped. Query strings are left out so that engine-specific tracking
/// parameters collapse onto the same page.
#[must_use]
pub fn normalize_key(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }
    parsed.set_fragment(None);

    let origin = parsed.origin().ascii_serialization();
    let path = parsed.path().trim_end_matches('/');
    Some(format!("{origin}{path}"))
}

/// Returns the lowercase host of `raw`, without a leading `www.`.
#[must_use]
pub fn host_of(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// Whether `host` is `domain` or one of its subdomains.
#[must_use]
pub fn host_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}
