//! Typed view of the loosely structured values search engines return.

use serde::{Deserialize, Serialize};

use crate::urls::is_http_url;

/// Leaf values that are not strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Any number.
    Number(f64),
}

/// An arbitrarily nested engine response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponseValue {
    /// A string leaf.
    String(String),
    /// An ordered list.
    List(Vec<ResponseValue>),
    /// An ordered map.
    Map(Vec<(String, ResponseValue)>),
    /// A non-string leaf.
    Scalar(Scalar),
}

/// Visitor over the leaves of a [`ResponseValue`], in document order.
pub trait ResponseVisitor {
    /// Called for every string leaf.
    fn visit_string(&mut self, value: &str);

    /// Called for every non-string leaf.
    fn visit_scalar(&mut self, _value: &Scalar) {}
}

impl ResponseValue {
    /// Creates a string leaf.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Creates a list from values.
    #[must_use]
    pub fn list(values: impl IntoIterator<Item = ResponseValue>) -> Self {
        Self::List(values.into_iter().collect())
    }

    /// Creates a map from key/value pairs.
    #[must_use]
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, ResponseValue)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Walks the tree depth-first; map keys are not visited.
    pub fn walk<V: ResponseVisitor + ?Sized>(&self, visitor: &mut V) {
        let mut stack = vec![self];
        while let Some(value) = stack.pop() {
            match value {
                Self::String(s) => visitor.visit_string(s),
                Self::Scalar(s) => visitor.visit_scalar(s),
                Self::List(items) => stack.extend(items.iter().rev()),
                Self::Map(entries) => stack.extend(entries.iter().rev().map(|(_, v)| v)),
            }
        }
    }

    /// Every string leaf that is an absolute HTTP(S) URL, in document order.
    #[must_use]
    pub fn collect_urls(&self) -> Vec<String> {
        let mut collector = UrlCollector::default();
        self.walk(&mut collector);
        collector.urls
    }
}

/// Collects HTTP(S) string leaves.
#[derive(Debug, Default)]
pub struct UrlCollector {
    /// URLs found so far.
    pub urls: Vec<String>,
}

impl ResponseVisitor for UrlCollector {
    fn visit_string(&mut self, value: &str) {
        let trimmed = value.trim();
        if is_http_url(trimmed) {
            self.urls.push(trimmed.to_string());
        }
    }
}

impl From<serde_json::Value> for ResponseValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Scalar(Scalar::Null),
            serde_json::Value::Bool(b) => Self::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => Self::Scalar(Scalar::Number(n.as_f64().unwrap_or(0.0))),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for ResponseValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ResponseValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}
