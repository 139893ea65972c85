//! Text normalization helpers shared by variant generation, song
//! deduplication and storage.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Removes combining marks after canonical decomposition.
///
/// `"Śaṅkarābharaṇam"` becomes `"Sankarabharanam"`.
#[must_use]
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Collapses every whitespace run into one space and trims the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replaces every run of characters that are neither letters nor digits with
/// a single space.
#[must_use]
pub fn collapse_non_alphanumeric(text: &str) -> String {
    let spaced: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    collapse_whitespace(&spaced)
}

/// Strips diacritics and punctuation noise but keeps the original casing.
///
/// Used for the titles that are handed to the song store.
#[must_use]
pub fn strip_diacritics_and_noise(text: &str) -> String {
    collapse_non_alphanumeric(&strip_diacritics(text))
}

/// Key used to decide whether two song titles are the same song.
///
/// Case-folded and whitespace-normalized; punctuation is kept.
#[must_use]
pub fn title_key(title: &str) -> String {
    collapse_whitespace(&title.to_lowercase())
}

/// Truncates `text` to at most `max_chars` characters on a char boundary.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
