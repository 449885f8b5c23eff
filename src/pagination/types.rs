//! Page normalization and cursor extraction
//!
//! The backend answers list requests in several shapes. Everything is
//! reduced to a [`Page`] before it reaches the engine.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use url::Url;

/// Name of the query parameter carrying the cursor
pub const CURSOR_PARAM: &str = "cursor";

/// Fallback for `next` values that are not absolute URLs
static CURSOR_IN_QUERY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[?&])cursor=([^&]+)").expect("valid cursor regex"));

/// One page of results plus the cursor for the following page
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T = JsonValue> {
    /// Results in server order
    pub results: Vec<T>,
    /// Cursor for the next page; `None` when this is the last page
    pub next: Option<String>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            next: None,
        }
    }
}

impl<T> Page<T> {
    /// Check if more pages follow
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

impl Page<JsonValue> {
    /// Decode every result into `T`
    ///
    /// A single undecodable item fails the whole page.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Page<T>> {
        let results = self
            .results
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item).map_err(|e| Error::decode(format!("item {i}: {e}")))
            })
            .collect::<Result<Vec<T>>>()?;
        Ok(Page {
            results,
            next: self.next,
        })
    }
}

/// Reduce a raw list response to a [`Page`]
///
/// Recognized shapes:
/// - `[..]`
/// - `{"results": [..], "next": ".."}`
/// - `{"data": [..]}`
/// - `{"data": {"results": [..], "next": ".."}}`
///
/// Anything else is an empty last page.
pub fn normalize_page(raw: &JsonValue) -> Page {
    match raw {
        JsonValue::Array(items) => Page {
            results: items.clone(),
            next: None,
        },
        JsonValue::Object(map) => {
            if map.contains_key("results") {
                return results_page(raw);
            }
            match map.get("data") {
                Some(JsonValue::Array(items)) => Page {
                    results: items.clone(),
                    next: None,
                },
                Some(data @ JsonValue::Object(inner)) if inner.contains_key("results") => {
                    results_page(data)
                }
                _ => Page::default(),
            }
        }
        _ => Page::default(),
    }
}

fn results_page(obj: &JsonValue) -> Page {
    let results = match obj.get("results") {
        Some(JsonValue::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    Page {
        results,
        next: extract_cursor(obj.get("next").and_then(JsonValue::as_str)),
    }
}

/// Pull the cursor out of a `next` link
///
/// Absolute URLs are parsed and their `cursor` query parameter returned.
/// Relative URLs and bare `cursor=<value>` strings go through a pattern
/// match instead. Values are percent-decoded either way; `+` is kept as is.
/// An empty value means there is no next page.
pub fn extract_cursor(next: Option<&str>) -> Option<String> {
    let next = next.filter(|s| !s.is_empty())?;

    let raw = match Url::parse(next) {
        Ok(url) => url
            .query()?
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find_map(|(key, value)| (key == CURSOR_PARAM).then_some(value))?
            .to_owned(),
        Err(_) => CURSOR_IN_QUERY.captures(next)?.get(1)?.as_str().to_owned(),
    };
    Some(percent_decode_str(&raw).decode_utf8_lossy().into_owned()).filter(|v| !v.is_empty())
}
