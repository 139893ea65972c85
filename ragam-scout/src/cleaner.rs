//! Reduction of raw HTML to the text blocks handed to the extraction oracle.
//!
//! Non-visible elements and elements whose tag, id or class suggests
//! navigation, advertising or other boilerplate are skipped along with their
//! whole subtree. Paragraph-like elements with enough text become blocks;
//! when none qualify the whole visible text is used instead.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

use crate::text::collapse_whitespace;

/// Default minimum characters for a block to be kept.
pub const DEFAULT_MIN_BLOCK_CHARS: usize = 15;

const HIDDEN_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "canvas", "meta", "link", "template",
    "object", "embed", "video", "audio",
];

const KEEP_TAGS: &[&str] = &[
    "p", "div", "li", "article", "section", "h1", "h2", "h3", "h4", "h5", "h6",
];

const SEPARATED_TAGS: &[&str] = &[
    "p", "div", "li", "article", "section", "h1", "h2", "h3", "h4", "h5", "h6", "br", "tr",
    "td", "th", "ul", "ol", "table", "main", "blockquote", "pre", "dd", "dt",
];

static BOILERPLATE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(header|nav|footer|menu|aside|sidebar|advert|sponsor|subscribe|cookie|banner)",
        r"(?i)(^|[\s_-])ads?([\s_-]|$)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

fn is_excluded(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    let tag = value.name();
    if HIDDEN_TAGS.contains(&tag) {
        return true;
    }
    let haystack = format!(
        "{tag} {} {}",
        value.id().unwrap_or_default(),
        value.attr("class").unwrap_or_default()
    );
    BOILERPLATE.iter().any(|re| re.is_match(&haystack))
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_excluded(&child) {
                    continue;
                }
                let separated = SEPARATED_TAGS.contains(&child.value().name());
                if separated {
                    out.push(' ');
                }
                push_visible_text(child, out);
                if separated {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_visible_text(element, &mut out);
    collapse_whitespace(&out)
}

fn collect_blocks(element: ElementRef<'_>, min_chars: usize, blocks: &mut Vec<String>) {
    for child in element.children() {
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        if is_excluded(&child) {
            continue;
        }
        if KEEP_TAGS.contains(&child.value().name()) {
            let text = visible_text(child);
            if text.chars().count() >= min_chars {
                blocks.push(text);
            }
        }
        collect_blocks(child, min_chars, blocks);
    }
}

/// Extracts text blocks from HTML.
#[derive(Debug, Clone)]
pub struct ContentCleaner {
    min_block_chars: usize,
}

impl Default for ContentCleaner {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_BLOCK_CHARS)
    }
}

impl ContentCleaner {
    /// Creates a cleaner keeping blocks of at least `min_block_chars`.
    #[must_use]
    pub fn new(min_block_chars: usize) -> Self {
        Self { min_block_chars }
    }

    /// Returns the cleaned blocks in document order.
    ///
    /// Nested qualifying elements each yield a block; immediately repeated
    /// blocks are collapsed.
    #[must_use]
    pub fn clean_blocks(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let root = Selector::parse("body")
            .ok()
            .and_then(|selector| document.select(&selector).next())
            .unwrap_or_else(|| document.root_element());

        let mut blocks = Vec::new();
        collect_blocks(root, self.min_block_chars, &mut blocks);

        if blocks.is_empty() {
            let text = visible_text(root);
            if !text.is_empty() {
                blocks.push(text);
            }
        }

        blocks.dedup();
        blocks
    }

    /// Returns the cleaned blocks joined by blank lines.
    #[must_use]
    pub fn clean(&self, html: &str) -> String {
        self.clean_blocks(html).join("\n\n")
    }
}

/// Cleans `html` with the default block threshold.
#[must_use]
pub fn clean_visible_text(html: &str) -> String {
    ContentCleaner::default().clean(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_removes_hidden_and_boilerplate() {
        let html = r#"<html><body>
            <nav><p>Home About Contact Us Today</p></nav>
            <div class="sidebar"><p>Popular posts this week</p></div>
            <div class="ad-slot"><p>Buy the best headphones now</p></div>
            <script>var tracking = "should never appear";</script>
            <article><p>Enduku Nirdaya is a kriti by Thyagaraja.</p></article>
            <footer><p>Copyright 2024 Songs Site</p></footer>
        </body></html>"#;

        let text = clean_visible_text(html);
        assert!(text.contains("Enduku Nirdaya is a kriti by Thyagaraja."));
        assert!(!text.contains("Home About"));
        assert!(!text.contains("Popular posts"));
        assert!(!text.contains("headphones"));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_short_blocks_dropped_and_duplicates_collapsed() {
        let html = r#"<body>
            <div><p>Enduku Nirdaya by Thyagaraja</p></div>
            <p>Too short</p>
            <li>Sri Raghuvara in Kambhoji ragam</li>
        </body>"#;

        let blocks = ContentCleaner::default().clean_blocks(html);
        assert_eq!(
            blocks,
            vec![
                "Enduku Nirdaya by Thyagaraja".to_string(),
                "Sri Raghuvara in Kambhoji ragam".to_string(),
            ]
        );
    }

    #[test]
    fn test_word_bounded_ads_pattern() {
        let html = r#"<body><div class="loaded-content"><p>Kalyani ragam film songs list</p></div></body>"#;
        let text = clean_visible_text(html);
        assert!(text.contains("Kalyani ragam film songs list"));
    }

    #[test]
    fn test_fallback_to_whole_text() {
        let html = "<html><body><span>Todi</span> <b>songs</b></body></html>";
        assert_eq!(clean_visible_text(html), "Todi songs");
    }

    #[test]
    fn test_blocks_joined_with_blank_lines() {
        let html = "<body><h2>Songs in Mohanam ragam</h2><p>Ninnu Kori by Ramnad Srinivasa Iyengar</p></body>";
        assert_eq!(
            clean_visible_text(html),
            "Songs in Mohanam ragam\n\nNinnu Kori by Ramnad Srinivasa Iyengar"
        );
    }

    #[test]
    fn test_block_children_are_separated() {
        let html = "<body><ul><li>Ninnu Kori varnam</li><li>Nannu Palimpa kriti</li></ul></body>";
        let blocks = ContentCleaner::new(5).clean_blocks(html);
        assert_eq!(blocks, vec!["Ninnu Kori varnam".to_string(), "Nannu Palimpa kriti".to_string()]);
    }
}
