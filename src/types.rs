//! Common types used throughout the Jarcode client
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl Method {
    /// Mutating verbs carry the CSRF token and are never retried
    pub fn is_mutating(self) -> bool {
        !matches!(self, Method::GET)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Problem Catalogue
// ============================================================================

/// Programming language a problem is solved in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    Python,
    Cpp,
    Java,
}

impl Language {
    /// Value sent to the API
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "PYTHON",
            Language::Cpp => "CPP",
            Language::Java => "JAVA",
        }
    }
}

/// Problem difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Value sent to the API
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_conversion() {
        let get: reqwest::Method = Method::GET.into();
        assert_eq!(reqwest::Method::GET, get);
        let patch: reqwest::Method = Method::PATCH.into();
        assert_eq!(reqwest::Method::PATCH, patch);
    }

    #[test]
    fn test_method_is_mutating() {
        assert!(!Method::GET.is_mutating());
        assert!(Method::POST.is_mutating());
        assert!(Method::PUT.is_mutating());
        assert!(Method::PATCH.is_mutating());
        assert!(Method::DELETE.is_mutating());
    }

    #[test]
    fn test_language_serde() {
        let lang: Language = serde_json::from_str("\"CPP\"").unwrap();
        assert_eq!(lang, Language::Cpp);
        assert_eq!(serde_json::to_string(&Language::Python).unwrap(), "\"PYTHON\"");
        assert_eq!(Language::Java.as_str(), "JAVA");
    }

    #[test]
    fn test_difficulty_as_str() {
        assert_eq!(Difficulty::Easy.as_str(), "EASY");
        assert_eq!(Difficulty::Hard.as_str(), "HARD");
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
        assert_eq!(String::new().none_if_empty(), None);
    }
}
