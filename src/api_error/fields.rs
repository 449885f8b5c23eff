//! Field-level validation errors
//!
//! Decomposes backend validation payloads into per-field message lists.

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::LazyLock;

/// Synthetic key for errors that are not tied to a single input field
pub const NON_FIELD_KEY: &str = "_non_field";

/// Separator between items of a stringified list: `', '`, `", "`, `', "` or `", '`
static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"],\s*['"]"#).expect("valid list separator regex"));

/// Per-field error messages, keyed in the order they first appeared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    /// Create an empty set of field errors
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages for a field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(key, _)| key == field)
            .map(|(_, messages)| messages.as_slice())
    }

    /// Messages not tied to a single field
    pub fn non_field(&self) -> Option<&[String]> {
        self.get(NON_FIELD_KEY)
    }

    /// Append a message to a field, creating the entry if needed
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.entry(field).push(message.into());
    }

    /// Number of fields with an entry
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(field, messages)` in arrival order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, messages)| (key.as_str(), messages.as_slice()))
    }

    fn entry(&mut self, field: &str) -> &mut Vec<String> {
        let idx = match self.entries.iter().position(|(key, _)| key == field) {
            Some(idx) => idx,
            None => {
                self.entries.push((field.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<String>)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (K, Vec<String>)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (key, messages) in iter {
            let key = key.into();
            out.entry(&key).extend(messages);
        }
        out
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, messages) in &self.entries {
            map.serialize_entry(key, messages)?;
        }
        map.end()
    }
}

/// Parse a backend error payload into per-field messages
///
/// - a string becomes a single non-field message
/// - an array becomes non-field messages
/// - an object maps each key to its messages, with `non_field_errors` and
///   `detail` folded into the non-field key
///
/// Anything else (null, numbers, booleans) yields no entries.
pub fn parse_fields(payload: &Value) -> FieldErrors {
    let mut out = FieldErrors::new();

    match payload {
        Value::String(s) => out.push(NON_FIELD_KEY, s.clone()),
        Value::Array(items) => {
            let messages = out.entry(NON_FIELD_KEY);
            messages.extend(items.iter().map(stringify));
        }
        Value::Object(map) => {
            for (key, val) in map {
                let messages = out.entry(field_key(key));
                match val {
                    Value::Array(items) => {
                        for item in items {
                            push_message(messages, item);
                        }
                    }
                    other => push_message(messages, other),
                }
            }
        }
        _ => {}
    }

    out
}

/// Flatten field errors into one human-readable line
///
/// Non-field messages are kept as-is; field messages are prefixed with the
/// capitalized field name (`"Email: Enter a valid email."`).
pub fn humanize_fields(fields: &FieldErrors) -> String {
    let mut parts = Vec::new();
    for (key, messages) in fields.iter() {
        for message in messages {
            if key == NON_FIELD_KEY {
                parts.push(message.clone());
            } else {
                parts.push(format!("{}: {message}", capitalize(key)));
            }
        }
    }
    parts.join(" ")
}

fn field_key(key: &str) -> &str {
    match key {
        "non_field_errors" | "detail" => NON_FIELD_KEY,
        other => other,
    }
}

fn push_message(messages: &mut Vec<String>, value: &Value) {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if is_stringified_list(s) {
                messages.extend(split_stringified_list(s));
            } else {
                messages.push(s.to_string());
            }
        }
        other => messages.push(stringify(other)),
    }
}

/// Some backend serializers emit list-valued errors as a literal
/// `"['a', 'b']"` string. Only exact bracket-quoted forms are recognized.
fn is_stringified_list(s: &str) -> bool {
    (s.starts_with("['") && s.ends_with("']")) || (s.starts_with("[\"") && s.ends_with("\"]"))
}

fn split_stringified_list(s: &str) -> Vec<String> {
    let inner = &s[1..s.len() - 1];
    LIST_SEPARATOR
        .split(inner)
        .map(|part| strip_quote(part).trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

fn strip_quote(part: &str) -> &str {
    let part = part
        .strip_prefix('\'')
        .or_else(|| part.strip_prefix('"'))
        .unwrap_or(part);
    part.strip_suffix('\'')
        .or_else(|| part.strip_suffix('"'))
        .unwrap_or(part)
}

/// Render a JSON value as a message string
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
