//! Client configuration
//!
//! YAML configuration for the API client, with environment and command-line
//! overrides layered on top.
//!
//! ```yaml
//! base_url: https://jarcode.example.com/api
//! timeout_secs: 15
//! max_retries: 3
//! backoff:
//!   type: exponential
//!   initial_ms: 200
//!   max_ms: 5000
//! rate_limit:
//!   requests_per_second: 5
//! headers:
//!   X-Client: cli
//! ```

use crate::error::{Error, Result};
use crate::http::{ApiClientConfig, RateLimiterConfig};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "JARCODE_BASE_URL";

// ============================================================================
// Client Config
// ============================================================================

/// Configuration file contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the API, including the `/api` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries for GET requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Client-side rate limit; unlimited when absent
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffConfig::default(),
            rate_limit: None,
            headers: HashMap::new(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::default(),
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    10_000
}

// ============================================================================
// Loading
// ============================================================================

impl ClientConfig {
    /// Load and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate YAML
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply `JARCODE_BASE_URL` if set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        let base_url = std::env::var(ENV_BASE_URL).ok();
        self.with_base_url(base_url)
    }

    /// Replace the base URL when one is given
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        self
    }

    /// Check values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;

        if self.timeout_secs == 0 {
            return Err(Error::invalid_value("timeout_secs", "must be positive"));
        }
        if self.backoff.initial_ms > self.backoff.max_ms {
            return Err(Error::invalid_value(
                "backoff",
                "initial_ms must not exceed max_ms",
            ));
        }
        if let Some(limit) = &self.rate_limit {
            if limit.requests_per_second == 0 {
                return Err(Error::invalid_value(
                    "rate_limit.requests_per_second",
                    "must be positive",
                ));
            }
        }
        Ok(())
    }

    /// Convert into the HTTP client's configuration
    pub fn into_api_config(self) -> ApiClientConfig {
        let mut builder = ApiClientConfig::builder()
            .base_url(self.base_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .backoff(
                self.backoff.backoff_type,
                Duration::from_millis(self.backoff.initial_ms),
                Duration::from_millis(self.backoff.max_ms),
            );
        if let Some(limit) = self.rate_limit {
            builder = builder.rate_limit(limit);
        }
        for (key, value) in self.headers {
            builder = builder.header(key, value);
        }
        builder.build()
    }
}
