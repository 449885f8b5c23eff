//! Error types for the Jarcode client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs that can fail return `Result<T, Error>` where Error is
//! defined here. Backend failures are carried as a normalized [`ApiError`].

use crate::api_error::ApiError;
use thiserror::Error;

/// The main error type for the Jarcode client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({}): {}", .0.status, .0.message)]
    Api(Box<ApiError>),

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Self::Api(Box::new(err))
    }
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Normalized backend error, if this is one
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of the failure, 0 when no response was received
    pub fn status(&self) -> u16 {
        match self {
            Error::Api(err) => err.status,
            Error::Http(e) => e.status().map_or(0, |s| s.as_u16()),
            _ => 0,
        }
    }

    /// No response was received from the server
    pub fn is_network(&self) -> bool {
        match self {
            Error::Http(e) => e.status().is_none() && (e.is_connect() || e.is_request()),
            Error::Timeout { .. } => true,
            _ => false,
        }
    }

    /// The request timed out
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::Http(e) => e.is_timeout(),
            Error::Api(err) => err.message.contains("timeout"),
            _ => false,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout(),
            Error::Timeout { .. } => true,
            Error::Api(err) => is_retryable_status(err.status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(
        status,
        500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

/// Result type alias for the Jarcode client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.with_context(|| message.into())
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| match e.into() {
            Error::JsonParse(inner) => Error::decode(format!("{}: {inner}", f())),
            Error::Decode { message } => Error::decode(format!("{}: {message}", f())),
            other => Error::Other(format!("{}: {other}", f())),
        })
    }
}
