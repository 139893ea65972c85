//! Recovery of a JSON value from free-form oracle output.
//!
//! Local models often wrap their answer in prose or code fences, or stop
//! mid-answer. The whole output is tried first; failing that, each `[` or
//! `{` in order is taken as a start, and the span up to each matching closer
//! is tried, last closer first.

use serde_json::{Map, Value};

/// Closers tried per opener before moving to the next opener.
pub const MAX_CLOSER_ATTEMPTS: usize = 64;

/// Openers tried before giving up.
pub const MAX_OPENER_ATTEMPTS: usize = 64;

/// Keys under which some models nest the song array.
const WRAPPER_KEYS: &[&str] = &["songs", "results", "items", "data"];

/// Parses the JSON array or object embedded in `raw`, if any.
#[must_use]
pub fn recover_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(value @ (Value::Array(_) | Value::Object(_))) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    trimmed
        .match_indices(['[', '{'])
        .take(MAX_OPENER_ATTEMPTS)
        .find_map(|(start, opener)| {
            let closer = if opener == "[" { ']' } else { '}' };
            parse_from(trimmed, start, closer)
        })
}

fn parse_from(text: &str, start: usize, closer: char) -> Option<Value> {
    let mut end = text.len();
    for _ in 0..MAX_CLOSER_ATTEMPTS {
        let close = text[start..end].rfind(closer)? + start;
        if let Ok(value) = serde_json::from_str::<Value>(&text[start..=close]) {
            return Some(value);
        }
        end = close;
    }
    None
}

/// Flattens a recovered value into song objects.
///
/// Accepts an array of objects, an object wrapping such an array under a
/// common key, or a single song object.
#[must_use]
pub fn items_from_value(value: Value) -> Vec<Map<String, Value>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        Value::Object(mut map) => {
            let wrapped = WRAPPER_KEYS
                .iter()
                .find(|key| map.get(**key).is_some_and(Value::is_array))
                .and_then(|key| map.remove(*key));
            match wrapped {
                Some(inner) => items_from_value(inner),
                None if map.contains_key("title") => vec![map],
                None => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}
