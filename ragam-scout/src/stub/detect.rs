//! Classification of search-engine interstitial pages.

use regex::Regex;
use std::sync::LazyLock;

/// Only the head of a document is inspected.
pub const STUB_SCAN_CHARS: usize = 6000;

/// Documents at most this long count vendor redirect links anywhere.
pub const VENDOR_MARKER_MAX_CHARS: usize = 1500;

static STUB_SIGNATURES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"onload\s*=\s*["'][^"']*(location|redirect)"#,
        r"you are being redirected",
        r"click here if the page does not redirect",
        r"click here to continue",
        r#"<meta[^>]+http-equiv\s*=\s*["']?refresh"#,
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

const VENDOR_MARKERS: &str =
    r"(/ck/a\?|duckduckgo\.com/l/\?|r\.search\.yahoo\.com/|yandex\.[a-z]+/clck/)";

static VENDOR_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(VENDOR_MARKERS).ok());

/// A vendor link used as a redirect target: in a script location change or a refresh URL.
static VENDOR_REDIRECT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(location(\.href)?\s*=|location\.(replace|assign)\s*\(|url\s*=)\s*["']?[^"'<>\s]*{VENDOR_MARKERS}"#
    ))
    .ok()
});

/// Whether `html` looks like a redirect interstitial rather than content.
///
/// Links into a search engine's redirector only count on short documents or
/// when a script or refresh sends the browser there.
#[must_use]
pub fn looks_like_redirect_stub(html: &str) -> bool {
    if html.is_empty() {
        return false;
    }
    let head = crate::text::truncate_chars(html, STUB_SCAN_CHARS).to_lowercase();
    if STUB_SIGNATURES.iter().any(|re| re.is_match(&head)) {
        return true;
    }
    if VENDOR_REDIRECT.as_ref().is_some_and(|re| re.is_match(&head)) {
        return true;
    }
    html.chars().count() <= VENDOR_MARKER_MAX_CHARS
        && VENDOR_MARKER.as_ref().is_some_and(|re| re.is_match(&head))
}
