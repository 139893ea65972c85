//! Recovery of the real destination behind an interstitial page.
//!
//! Resolution runs an ordered chain of [`TargetStrategy`] values over a
//! pre-parsed [`StubPage`] and takes the first absolute HTTP(S) target any
//! of them produces.

use regex::Regex;
use scraper::{Html, Selector};
use std::fmt;
use std::sync::LazyLock;
use url::Url;

use crate::text::collapse_whitespace;
use crate::urls::{embedded_target, has_wrapper_param, host_of, is_http_url};

/// Fallback anchors shorter than this are ignored.
pub const MIN_FALLBACK_HREF_CHARS: usize = 20;

static REFRESH_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)url\s*=\s*['"]?([^'";]+)"#).ok());

/// An anchor found on a stub page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubAnchor {
    /// Absolute href.
    pub href: String,
    /// Lowercased, whitespace-collapsed anchor text.
    pub text: String,
}

/// The parts of a stub page the strategies look at.
///
/// Parsing happens once, up front; the parsed document is not kept.
#[derive(Debug, Clone, Default)]
pub struct StubPage {
    base: Option<Url>,
    refresh_contents: Vec<String>,
    anchors: Vec<StubAnchor>,
}

impl StubPage {
    /// Parses `html` served from `base_url`.
    #[must_use]
    pub fn parse(html: &str, base_url: &str) -> Self {
        let base = Url::parse(base_url).ok();
        let document = Html::parse_document(html);

        let mut refresh_contents = Vec::new();
        if let Ok(selector) = Selector::parse("meta[http-equiv][content]") {
            for meta in document.select(&selector) {
                let is_refresh = meta
                    .value()
                    .attr("http-equiv")
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"));
                if let (true, Some(content)) = (is_refresh, meta.value().attr("content")) {
                    refresh_contents.push(content.to_string());
                }
            }
        }

        let mut anchors = Vec::new();
        if let Ok(selector) = Selector::parse("a[href]") {
            for anchor in document.select(&selector) {
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                if let Some(absolute) = absolutize(base.as_ref(), href) {
                    anchors.push(StubAnchor {
                        href: absolute,
                        text: collapse_whitespace(&anchor.text().collect::<String>()).to_lowercase(),
                    });
                }
            }
        }

        Self {
            base,
            refresh_contents,
            anchors,
        }
    }

    /// The URL the page was served from, if it parsed.
    #[must_use]
    pub fn base(&self) -> Option<&Url> {
        self.base.as_ref()
    }

    /// Contents of every `meta http-equiv="refresh"` tag.
    #[must_use]
    pub fn refresh_contents(&self) -> &[String] {
        &self.refresh_contents
    }

    /// Anchors with absolute HTTP(S) hrefs, in document order.
    #[must_use]
    pub fn anchors(&self) -> &[StubAnchor] {
        &self.anchors
    }

    fn absolutize(&self, raw: &str) -> Option<String> {
        absolutize(self.base.as_ref(), raw)
    }
}

fn absolutize(base: Option<&Url>, raw: &str) -> Option<String> {
    let raw = raw.trim();
    let parsed = match base {
        Some(base) => base.join(raw).ok()?,
        None => Url::parse(raw).ok()?,
    };
    let absolute = parsed.to_string();
    is_http_url(&absolute).then_some(absolute)
}

/// One way of finding the destination of a stub page.
pub trait TargetStrategy: Send + Sync + fmt::Debug {
    /// Stable strategy name for logs.
    fn name(&self) -> &'static str;

    /// Returns an absolute HTTP(S) target, if this strategy finds one.
    fn find_target(&self, page: &StubPage) -> Option<String>;
}

/// Target named by a `meta http-equiv="refresh"` tag.
#[derive(Debug, Clone, Default)]
pub struct MetaRefresh;

impl TargetStrategy for MetaRefresh {
    fn name(&self) -> &'static str {
        "meta_refresh"
    }

    fn find_target(&self, page: &StubPage) -> Option<String> {
        let re = REFRESH_URL.as_ref()?;
        page.refresh_contents().iter().find_map(|content| {
            let captured = re.captures(content)?.get(1)?.as_str().trim();
            page.absolutize(captured)
        })
    }
}

/// Href of a "click here" or "continue" anchor that is not itself a wrapper.
#[derive(Debug, Clone)]
pub struct ContinueAnchor {
    wrapper_params: Vec<String>,
}

impl ContinueAnchor {
    /// Creates the strategy; anchors carrying `wrapper_params` are skipped.
    #[must_use]
    pub fn new(wrapper_params: Vec<String>) -> Self {
        Self { wrapper_params }
    }
}

impl TargetStrategy for ContinueAnchor {
    fn name(&self) -> &'static str {
        "continue_anchor"
    }

    fn find_target(&self, page: &StubPage) -> Option<String> {
        page.anchors()
            .iter()
            .filter(|a| a.text.contains("click here") || a.text.contains("continue"))
            .find(|a| !has_wrapper_param(&a.href, &self.wrapper_params))
            .map(|a| a.href.clone())
    }
}

/// Destination embedded in a wrapper parameter of the page URL or an anchor.
#[derive(Debug, Clone)]
pub struct WrapperParam {
    wrapper_params: Vec<String>,
}

impl WrapperParam {
    /// Creates the strategy for the given parameter names.
    #[must_use]
    pub fn new(wrapper_params: Vec<String>) -> Self {
        Self { wrapper_params }
    }
}

impl TargetStrategy for WrapperParam {
    fn name(&self) -> &'static str {
        "wrapper_param"
    }

    fn find_target(&self, page: &StubPage) -> Option<String> {
        let from_base = page
            .base()
            .and_then(|base| embedded_target(base.as_str(), &self.wrapper_params));

        from_base.or_else(|| {
            page.anchors()
                .iter()
                .find_map(|a| embedded_target(&a.href, &self.wrapper_params))
        })
    }
}

/// First anchor pointing off the stub's own host with a long enough href.
#[derive(Debug, Clone, Default)]
pub struct FirstExternalAnchor;

impl TargetStrategy for FirstExternalAnchor {
    fn name(&self) -> &'static str {
        "first_external_anchor"
    }

    fn find_target(&self, page: &StubPage) -> Option<String> {
        let own_host = page.base().and_then(|b| host_of(b.as_str()));
        page.anchors()
            .iter()
            .filter(|a| a.href.chars().count() >= MIN_FALLBACK_HREF_CHARS)
            .find(|a| match (&own_host, host_of(&a.href)) {
                (Some(own), Some(host)) => *own != host,
                (None, Some(_)) => true,
                _ => false,
            })
            .map(|a| a.href.clone())
    }
}

/// A recovered stub destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Absolute HTTP(S) destination.
    pub target: String,
    /// Name of the strategy that found it.
    pub strategy: &'static str,
}

/// Ordered chain of target strategies.
#[derive(Debug)]
pub struct StubResolver {
    strategies: Vec<Box<dyn TargetStrategy>>,
}

impl StubResolver {
    /// Creates a resolver from an explicit chain.
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn TargetStrategy>>) -> Self {
        Self { strategies }
    }

    /// The standard chain: meta refresh, continue anchor, wrapper parameter,
    /// first external anchor.
    #[must_use]
    pub fn default_chain(wrapper_params: &[String]) -> Self {
        Self::new(vec![
            Box::new(MetaRefresh),
            Box::new(ContinueAnchor::new(wrapper_params.to_vec())),
            Box::new(WrapperParam::new(wrapper_params.to_vec())),
            Box::new(FirstExternalAnchor),
        ])
    }

    /// Strategy names in application order.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Finds the destination of the stub `html` served from `base_url`.
    #[must_use]
    pub fn resolve(&self, html: &str, base_url: &str) -> Option<Resolution> {
        let page = StubPage::parse(html, base_url);
        self.resolve_page(&page)
    }

    /// Runs the chain over an already parsed page.
    #[must_use]
    pub fn resolve_page(&self, page: &StubPage) -> Option<Resolution> {
        self.strategies.iter().find_map(|strategy| {
            strategy
                .find_target(page)
                .filter(|target| is_http_url(target))
                .map(|target| Resolution {
                    target,
                    strategy: strategy.name(),
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urls::default_wrapper_params;
    use base64::engine::general_purpose::URL_SAFE;
    use base64::Engine;

    fn resolver() -> StubResolver {
        StubResolver::default_chain(&default_wrapper_params())
    }

    #[test]
    fn test_meta_refresh_target_is_exact() {
        let html = r#"<html><head><meta http-equiv="refresh" content="0;url=https://real.site/page"></head><body></body></html>"#;
        let resolution = resolver().resolve(html, "https://www.bing.com/ck/a?x=1").unwrap();
        assert_eq!(resolution.target, "https://real.site/page");
        assert_eq!(resolution.strategy, "meta_refresh");
    }

    #[test]
    fn test_meta_refresh_quoted_and_relative() {
        let html = r#"<meta http-equiv="Refresh" content="3; URL='/landing/page'">"#;
        let resolution = resolver().resolve(html, "https://site.example/r").unwrap();
        assert_eq!(resolution.target, "https://site.example/landing/page");
    }

    #[test]
    fn test_continue_anchor() {
        let html = r#"<body><p>You are being redirected.</p>
            <a href="https://songs.example/todi">Click here to continue</a></body>"#;
        let resolution = resolver().resolve(html, "https://stub.example/x").unwrap();
        assert_eq!(resolution.target, "https://songs.example/todi");
        assert_eq!(resolution.strategy, "continue_anchor");
    }

    #[test]
    fn test_wrapped_continue_anchor_falls_through_to_wrapper_param() {
        let html = r#"<body><a href="https://r.search.yahoo.com/cbclk?RU=https%3A%2F%2Fsongs.example%2Fkalyani">Continue</a></body>"#;
        let resolution = resolver().resolve(html, "https://r.search.yahoo.com/x").unwrap();
        assert_eq!(resolution.target, "https://songs.example/kalyani");
        assert_eq!(resolution.strategy, "wrapper_param");
    }

    #[test]
    fn test_wrapper_param_on_page_url_base64() {
        let encoded = URL_SAFE.encode("https://songs.example/mohanam");
        let base = format!("https://www.bing.com/ck/a?!&&p=9&u=a1{encoded}&ntb=1");
        let resolution = resolver().resolve("<body>redirecting</body>", &base).unwrap();
        assert_eq!(resolution.target, "https://songs.example/mohanam");
    }

    #[test]
    fn test_first_external_anchor_fallback() {
        let html = r#"<body>
            <a href="/help">help</a>
            <a href="https://x.io">short</a>
            <a href="https://songs.example/ragam/todi">songs</a>
        </body>"#;
        let resolution = resolver().resolve(html, "https://stub.example/r").unwrap();
        assert_eq!(resolution.target, "https://songs.example/ragam/todi");
        assert_eq!(resolution.strategy, "first_external_anchor");
    }

    #[test]
    fn test_unresolvable_stub() {
        let html = r#"<body><p>You are being redirected</p><a href="/same/host/link/that/is/long">x</a></body>"#;
        assert!(resolver().resolve(html, "https://stub.example/r").is_none());
    }

    #[test]
    fn test_strategy_order() {
        assert_eq!(
            resolver().strategy_names(),
            vec!["meta_refresh", "continue_anchor", "wrapper_param", "first_external_anchor"]
        );
    }
}
