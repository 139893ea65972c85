//! Instruction template for the extraction oracle.

use crate::text::truncate_chars;

/// Keys every song object in the oracle's answer must carry.
pub const SONG_SCHEMA_KEYS: &[&str] = &[
    "title",
    "ragam",
    "identified_ragam",
    "composer",
    "lyricist",
    "source",
    "performer",
    "context",
    "links",
];

/// Builds the extraction request for one cleaned page.
///
/// `variants[0]` is the canonical ragam spelling. Page text longer than
/// `max_chars` characters is cut at a character boundary.
#[must_use]
pub fn build_extraction_prompt(cleaned_text: &str, variants: &[String], max_chars: usize) -> String {
    let canonical = variants.first().map_or("", String::as_str);
    let spellings = variants
        .iter()
        .map(|v| format!("\"{v}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let keys = SONG_SCHEMA_KEYS.join(", ");
    let text = truncate_chars(cleaned_text, max_chars);

    format!(
        "You extract Carnatic and film songs from web page text.\n\
         \n\
         Target ragam: \"{canonical}\". Accepted spellings: [{spellings}].\n\
         \n\
         Return ONLY a JSON array. Each element is an object with exactly these keys: {keys}.\n\
         - \"title\": the song title as written on the page (required, non-empty).\n\
         - \"ragam\": \"{canonical}\".\n\
         - \"identified_ragam\": the ragam spelling the page itself uses for this song.\n\
         - \"composer\", \"lyricist\", \"performer\", \"source\" (film or album): strings or null.\n\
         - \"context\": a short snippet (at most 200 characters) showing where the song is mentioned.\n\
         - \"links\": array of URLs associated with the song, possibly empty.\n\
         Only include songs the page says are set in the target ragam (any accepted spelling).\n\
         Do not repeat a song: (title, ragam) pairs must be unique.\n\
         If there are no such songs, return [].\n\
         Do not add explanations, markdown or code fences.\n\
         \n\
         PAGE TEXT:\n\
         {text}\n"
    )
}
