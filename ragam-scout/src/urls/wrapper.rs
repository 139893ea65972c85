//! Unwrapping of search-engine tracking URLs.
//!
//! Engines often hand out links such as
//! `https://www.bing.com/ck/a?u=a1aHR0cHM6Ly9leGFtcGxlLmNvbQ` or
//! `https://duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com` whose real
//! destination sits in a query parameter, either percent-encoded or as
//! URL-safe base64.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use url::Url;

/// Query parameters that commonly carry an embedded destination.
pub const DEFAULT_WRAPPER_PARAMS: &[&str] = &["u", "url", "r", "RU", "uddg"];

/// Returns [`DEFAULT_WRAPPER_PARAMS`] as owned strings.
#[must_use]
pub fn default_wrapper_params() -> Vec<String> {
    DEFAULT_WRAPPER_PARAMS.iter().map(|p| (*p).to_string()).collect()
}

/// Whether `candidate` starts with an `http://` or `https://` scheme.
#[must_use]
pub fn is_http_url(candidate: &str) -> bool {
    let lower = candidate
        .get(..8)
        .unwrap_or(candidate)
        .to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Parses an absolute URL, or a relative one such as `/l/?uddg=...` against a
/// placeholder base so that its query can still be inspected.
fn parse_lenient(raw: &str) -> Option<Url> {
    Url::parse(raw).ok().or_else(|| {
        Url::parse("http://wrapper.invalid/")
            .ok()
            .and_then(|base| base.join(raw).ok())
    })
}

fn decode_base64_target(value: &str) -> Option<String> {
    let mut attempts = vec![value];
    // Bing prefixes the encoded target with a two-character version tag.
    if let Some(stripped) = value.strip_prefix("a1") {
        attempts.push(stripped);
    }

    attempts.into_iter().find_map(|encoded| {
        URL_SAFE
            .decode(encoded)
            .or_else(|_| URL_SAFE_NO_PAD.decode(encoded))
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .filter(|decoded| is_http_url(decoded))
    })
}

/// Returns the destination embedded in one of `params`, if any.
///
/// Parameter names match case-insensitively. The value is percent-decoded;
/// if it is not an absolute HTTP(S) URL, base64 decoding is attempted.
#[must_use]
pub fn embedded_target(raw: &str, params: &[String]) -> Option<String> {
    let parsed = parse_lenient(raw)?;

    parsed.query_pairs().find_map(|(key, value)| {
        if !params.iter().any(|p| p.eq_ignore_ascii_case(&key)) {
            return None;
        }
        if is_http_url(&value) {
            return Some(value.into_owned());
        }
        decode_base64_target(&value)
    })
}

/// Whether `raw` carries any of the wrapper parameters, decodable or not.
#[must_use]
pub fn has_wrapper_param(raw: &str, params: &[String]) -> bool {
    parse_lenient(raw).is_some_and(|parsed| {
        parsed
            .query_pairs()
            .any(|(key, _)| params.iter().any(|p| p.eq_ignore_ascii_case(&key)))
    })
}

/// Returns the embedded destination of a wrapper URL, or `raw` unchanged.
#[must_use]
pub fn unwrap_redirect_wrapper(raw: &str, params: &[String]) -> String {
    embedded_target(raw, params).unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<String> {
        default_wrapper_params()
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://example.com"));
        assert!(is_http_url("HTTP://EXAMPLE.COM"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("/relative/path"));
        assert!(!is_http_url("http"));
    }

    #[test]
    fn test_unwrap_percent_encoded_param() {
        let wrapped = "https://duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fsongs&rut=abc";
        assert_eq!(
            unwrap_redirect_wrapper(wrapped, &params()),
            "https://example.com/songs"
        );
    }

    #[test]
    fn test_unwrap_relative_wrapper() {
        let wrapped = "/l/?uddg=https%3A%2F%2Fexample.com%2Fa";
        assert_eq!(
            embedded_target(wrapped, &params()),
            Some("https://example.com/a".to_string())
        );
    }

    #[test]
    fn test_unwrap_case_insensitive_param() {
        let wrapped = "https://r.search.yahoo.com/_ylt=x/RU=https%3a%2f%2fexample.com%2f/RK=2?ru=https%3A%2F%2Fexample.org%2Fp";
        assert_eq!(
            unwrap_redirect_wrapper(wrapped, &params()),
            "https://example.org/p"
        );
    }

    #[test]
    fn test_unwrap_base64_param() {
        let encoded = URL_SAFE.encode("https://example.com/raga/todi");
        let wrapped = format!("https://www.bing.com/ck/a?!&&p=123&u=a1{encoded}&ntb=1");
        assert_eq!(
            unwrap_redirect_wrapper(&wrapped, &params()),
            "https://example.com/raga/todi"
        );
    }

    #[test]
    fn test_unwrap_without_target_returns_original() {
        let plain = "https://example.com/page?id=7";
        assert_eq!(unwrap_redirect_wrapper(plain, &params()), plain);

        let junk = "https://tracker.example/?u=not-a-url";
        assert_eq!(unwrap_redirect_wrapper(junk, &params()), junk);
        assert!(has_wrapper_param(junk, &params()));
    }
}
