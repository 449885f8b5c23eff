//! Normalization of failed requests into [`ApiError`]

use super::fields::{humanize_fields, parse_fields, stringify, FieldErrors};
use crate::error::Error;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;

/// Message used when nothing better can be extracted
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

const UNAUTHORIZED_MESSAGE: &str = "Authentication required. Please log in.";
const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";
const NOT_FOUND_MESSAGE: &str = "The requested resource was not found.";
const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please wait a moment before trying again.";
const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";

/// A failed request as seen by the transport
///
/// `FailedRequest::default()` describes a failure with no information at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailedRequest {
    /// Response status code, if a response was received
    pub status: Option<u16>,
    /// Response body, if any
    pub body: Option<Value>,
    /// Raw `Retry-After` header value
    pub retry_after: Option<String>,
    /// Transport-level message
    pub message: Option<String>,
}

impl FailedRequest {
    /// A failure where the server responded
    pub fn response(status: u16, body: Value) -> Self {
        Self {
            status: Some(status),
            body: Some(body),
            ..Default::default()
        }
    }

    /// A failure where no response was received
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Set the `Retry-After` header value
    #[must_use]
    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    /// Set the transport message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Canonical error shape consumed by every caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    /// Human-readable message
    pub message: String,
    /// HTTP status code, 0 if no response was received
    pub status: u16,
    /// Raw response body, `{}` when there was none
    pub details: Value,
    /// Per-field validation messages
    pub fields: FieldErrors,
}

impl ApiError {
    /// Create an error from a bare message
    pub fn from_message(message: impl Into<String>, status: u16) -> Self {
        let message = message.into();
        Self {
            details: json!({ "message": message }),
            message,
            status,
            fields: FieldErrors::new(),
        }
    }

    /// Field messages flattened into one line, or the message if there are none
    pub fn summary(&self) -> String {
        let flat = humanize_fields(&self.fields);
        if flat.is_empty() {
            self.message.clone()
        } else {
            flat
        }
    }

    /// Check if no response was received
    pub fn is_transport(&self) -> bool {
        self.status == 0
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<&Error> for ApiError {
    fn from(err: &Error) -> Self {
        match err {
            Error::Api(api) => (**api).clone(),
            other => {
                let status = other.status();
                normalize(&FailedRequest {
                    status: (status != 0).then_some(status),
                    message: Some(other.to_string()),
                    ..Default::default()
                })
            }
        }
    }
}

/// Normalize a failed request
///
/// The message is taken from, in order: `detail`, `message`,
/// `non_field_errors`, parsed non-field errors, the transport message.
/// Well-known status codes then override it with a fixed message.
pub fn normalize(failed: &FailedRequest) -> ApiError {
    let status = failed.status.unwrap_or(0);
    let details = match &failed.body {
        Some(body) if is_truthy(body) => body.clone(),
        _ => Value::Object(Map::new()),
    };
    let fields = parse_fields(&details);

    let mut message = pick_message(&details, &fields, failed.message.as_deref());

    match status {
        401 => message = UNAUTHORIZED_MESSAGE.to_string(),
        403 => message = FORBIDDEN_MESSAGE.to_string(),
        404 => message = NOT_FOUND_MESSAGE.to_string(),
        429 => {
            message = match failed.retry_after.as_deref().filter(|v| !v.is_empty()) {
                Some(seconds) => format!(
                    "Too many requests. Please wait {seconds} seconds before trying again."
                ),
                None => RATE_LIMITED_MESSAGE.to_string(),
            };
        }
        s if s >= 500 => message = SERVER_ERROR_MESSAGE.to_string(),
        _ => {}
    }

    ApiError {
        message,
        status,
        details,
        fields,
    }
}

/// User-facing message for any crate error
pub fn error_message(err: &Error) -> String {
    let message = match err {
        Error::Api(api) => api.message.clone(),
        other => other.to_string(),
    };
    if message.is_empty() {
        UNKNOWN_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}

fn pick_message(details: &Value, fields: &FieldErrors, transport: Option<&str>) -> String {
    if let Some(detail) = details.get("detail").filter(|v| is_truthy(v)) {
        return as_text(detail);
    }
    if let Some(message) = details.get("message").filter(|v| is_truthy(v)) {
        return as_text(message);
    }
    if let Some(Value::Array(items)) = details.get("non_field_errors") {
        return items.iter().map(stringify).collect::<Vec<_>>().join(" ");
    }
    if let Some(messages) = fields.non_field().filter(|m| !m.is_empty()) {
        return messages.join(" ");
    }
    match transport.filter(|m| !m.is_empty()) {
        Some(message) => message.to_string(),
        None => UNKNOWN_ERROR_MESSAGE.to_string(),
    }
}

/// Strings are used verbatim; anything else is rendered as JSON
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
