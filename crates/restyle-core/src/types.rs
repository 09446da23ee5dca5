use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder rendered for style fields the profile does not contain.
pub const UNKNOWN_FIELD: &str = "Unknown";

/// A single style dimension value: free text or a list of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StyleValue {
    Text(String),
    List(Vec<String>),
}

impl StyleValue {
    /// Normalize an arbitrary JSON value produced by the model.
    ///
    /// Strings stay as-is, arrays become lists of strings, `null` becomes
    /// empty text and every other value keeps its compact JSON rendering.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(text) => StyleValue::Text(text),
            Value::Null => StyleValue::Text(String::new()),
            Value::Array(items) => StyleValue::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(text) => text,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            other => StyleValue::Text(other.to_string()),
        }
    }

    pub fn render(&self) -> String {
        match self {
            StyleValue::Text(text) => text.clone(),
            StyleValue::List(items) => items.join(", "),
        }
    }
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for StyleValue {
    fn from(value: &str) -> Self {
        StyleValue::Text(value.to_string())
    }
}

/// Style dimensions learned from a transcript (tone, vocabulary, hooks, ...).
///
/// Keys are whatever the model or the fallback parser produced. A profile is
/// never empty: construction fails for an empty mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StyleProfile(BTreeMap<String, StyleValue>);

impl StyleProfile {
    pub fn new(fields: BTreeMap<String, StyleValue>) -> Option<Self> {
        if fields.is_empty() {
            None
        } else {
            Some(Self(fields))
        }
    }

    pub fn get(&self, key: &str) -> Option<&StyleValue> {
        self.0.get(key)
    }

    /// Rendered value for `key`, or [`UNKNOWN_FIELD`] when absent.
    pub fn field_or_unknown(&self, key: &str) -> String {
        self.get(key)
            .map(StyleValue::render)
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}
