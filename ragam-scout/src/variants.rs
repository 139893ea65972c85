//! Spelling variants and search queries for a ragam name.
//!
//! Ragam names are transliterated from several scripts and are spelled
//! inconsistently across the web ("Shankarabharanam", "Sankarabharanam",
//! "Shankarabharana"). The generator produces a small ordered set of
//! alternate spellings so that searches reach more of those pages.

use std::collections::HashSet;

use crate::text::{collapse_non_alphanumeric, strip_diacritics};

/// Query templates; `{variant}` is replaced with each spelling.
pub const QUERY_TEMPLATES: &[&str] = &[
    "{variant} ragam songs carnatic",
    "{variant} ragam film songs",
    "{variant} ragam songs",
    "{variant} raga songs",
];

/// Default cap on the number of spelling variants.
pub const DEFAULT_MAX_VARIANTS: usize = 16;

/// A single orthographic simplification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionRule {
    /// Replace every occurrence of `from` with `to`.
    Replace {
        /// Text to replace.
        from: &'static str,
        /// Replacement.
        to: &'static str,
    },
    /// Replace a trailing suffix on every word.
    Suffix {
        /// Suffix to look for.
        from: &'static str,
        /// Replacement suffix.
        to: &'static str,
    },
    /// Join a multi-word term into one word.
    JoinWords,
}

impl SubstitutionRule {
    /// Applies the rule, returning `None` when the input is unchanged.
    #[must_use]
    pub fn apply(&self, input: &str) -> Option<String> {
        let output = match self {
            Self::Replace { from, to } => input.replace(from, to),
            Self::Suffix { from, to } => input
                .split(' ')
                .map(|word| match word.strip_suffix(from) {
                    Some(stem) if !stem.is_empty() => format!("{stem}{to}"),
                    _ => word.to_string(),
                })
                .collect::<Vec<_>>()
                .join(" "),
            Self::JoinWords => input.replace(' ', ""),
        };

        (output != input && !output.is_empty()).then_some(output)
    }
}

fn default_rules() -> Vec<SubstitutionRule> {
    use SubstitutionRule::{JoinWords, Replace, Suffix};

    vec![
        Replace { from: "sh", to: "s" },
        Replace { from: "th", to: "t" },
        Replace { from: "dh", to: "d" },
        Replace { from: "bh", to: "b" },
        Replace { from: "kh", to: "k" },
        Replace { from: "ch", to: "c" },
        Replace { from: "aa", to: "a" },
        Replace { from: "ee", to: "i" },
        Replace { from: "oo", to: "u" },
        Replace { from: "ii", to: "i" },
        Replace { from: "uu", to: "u" },
        Suffix { from: "am", to: "a" },
        JoinWords,
    ]
}

/// Normalizes a ragam name: diacritics stripped, lowercased, and every run
/// of non-alphanumeric characters collapsed to one space.
///
/// Digits are kept as word characters, so "Raga 29" stays "raga 29" rather
/// than losing its number.
#[must_use]
pub fn normalize_term(term: &str) -> String {
    collapse_non_alphanumeric(&strip_diacritics(term).to_lowercase())
}

/// Produces alternate spellings of a ragam name.
#[derive(Debug, Clone)]
pub struct VariantGenerator {
    rules: Vec<SubstitutionRule>,
    max_variants: usize,
}

impl Default for VariantGenerator {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            max_variants: DEFAULT_MAX_VARIANTS,
        }
    }
}

impl VariantGenerator {
    /// Creates a generator with the default rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the rule set.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<SubstitutionRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Sets the maximum number of variants returned.
    #[must_use]
    pub fn with_max_variants(mut self, max: usize) -> Self {
        self.max_variants = max.max(1);
        self
    }

    /// Generates spellings for `term`.
    ///
    /// The first entry is always the normalized term itself. Each rule may
    /// add one candidate, and one more candidate applies every rule in
    /// sequence. Duplicates are removed, keeping first-seen order.
    #[must_use]
    pub fn generate(&self, term: &str) -> Vec<String> {
        let base = normalize_term(term);
        let mut seen = HashSet::new();
        let mut variants = Vec::new();

        seen.insert(base.clone());
        variants.push(base.clone());

        if base.is_empty() {
            return variants;
        }

        let mut folded = base.clone();
        for rule in &self.rules {
            if let Some(candidate) = rule.apply(&base) {
                if seen.insert(candidate.clone()) {
                    variants.push(candidate);
                }
            }
            if let Some(next) = rule.apply(&folded) {
                folded = next;
            }
        }

        if seen.insert(folded.clone()) {
            variants.push(folded);
        }

        variants.truncate(self.max_variants);
        variants
    }
}

/// Expands spellings into search queries, variant-major, capped at
/// `max_queries`.
#[must_use]
pub fn build_queries(variants: &[String], max_queries: usize) -> Vec<String> {
    variants
        .iter()
        .flat_map(|variant| {
            QUERY_TEMPLATES
                .iter()
                .map(move |template| template.replace("{variant}", variant))
        })
        .take(max_queries)
        .collect()
}
