//! Session-aware API client
//!
//! Wraps `reqwest` with:
//! - a shared cookie jar holding the session and `csrftoken` cookies
//! - `X-CSRFToken` on every mutating request
//! - retries with backoff for idempotent requests
//! - normalization of every error response into an [`ApiError`]

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::api_error::{normalize, ApiError, FailedRequest};
use crate::error::{is_retryable_status, Error, Result, ResultExt};
use crate::types::{BackoffType, JsonValue, Method};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

/// Cookie the backend stores its CSRF token in
pub const CSRF_COOKIE: &str = "csrftoken";

/// Header the backend expects the CSRF token in
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Endpoint that sets the CSRF cookie
const CSRF_INIT_PATH: &str = "/users/csrf-init/";

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the API, including the `/api` prefix
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum number of retries for idempotent requests
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    /// Type of backoff strategy
    pub backoff_type: BackoffType,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        default_headers.insert("Content-Type".to_string(), "application/json".to_string());

        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_type: BackoffType::Exponential,
            rate_limit: None,
            default_headers,
            user_agent: format!("jarcode-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ApiClientConfig {
    /// Create a new config builder
    pub fn builder() -> ApiClientConfigBuilder {
        ApiClientConfigBuilder::default()
    }
}

/// Builder for API client config
#[derive(Default)]
pub struct ApiClientConfigBuilder {
    config: ApiClientConfig,
}

impl ApiClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> ApiClientConfig {
        self.config
    }
}

/// Configuration for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters, sent in insertion order
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body (JSON)
    pub body: Option<JsonValue>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create a new request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP client for the Jarcode API
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiClientConfig,
    cookies: Arc<Jar>,
    base_url: Url,
    rate_limiter: Option<RateLimiter>,
}

impl ApiClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ApiClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ApiClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let cookies = Arc::new(Jar::default());

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .cookie_provider(Arc::clone(&cookies))
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            cookies,
            base_url,
            rate_limiter,
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client configuration
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Store a cookie as if the server had set it
    pub fn set_cookie(&self, cookie: &str) {
        self.cookies.add_cookie_str(cookie, &self.base_url);
    }

    /// Current CSRF token from the cookie jar
    pub fn csrf_token(&self) -> Option<String> {
        self.cookie_for(&self.base_url, CSRF_COOKIE)
    }

    /// Ask the backend to set the CSRF cookie
    ///
    /// Failures are logged and swallowed: later mutating requests simply go
    /// out without the header and the backend rejects them.
    pub async fn init_csrf(&self) {
        if let Err(e) = self.send(Method::GET, CSRF_INIT_PATH, RequestConfig::new()).await {
            error!("Error initializing CSRF token: {e}");
        }
    }

    /// Initialize CSRF only if no token is present yet
    pub async fn ensure_csrf(&self) {
        if self.csrf_token().is_none() {
            self.init_csrf().await;
        }
    }

    /// GET and decode JSON
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json(Method::GET, path, RequestConfig::new())
            .await
    }

    /// GET with query parameters and decode JSON
    pub async fn get_with_config<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> Result<T> {
        self.request_json(Method::GET, path, config).await
    }

    /// POST a JSON body and decode the response
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.request_json(Method::POST, path, RequestConfig::new().json(body))
            .await
    }

    /// PUT a JSON body and decode the response
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.request_json(Method::PUT, path, RequestConfig::new().json(body))
            .await
    }

    /// PATCH a JSON body and decode the response
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.request_json(Method::PATCH, path, RequestConfig::new().json(body))
            .await
    }

    /// DELETE, ignoring any response body
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, RequestConfig::new()).await?;
        Ok(())
    }

    /// Make a request and decode the JSON response
    ///
    /// An empty body decodes as JSON `null`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<T> {
        let label = format!("{method} {path}");
        let response = self.send(method, path, config).await?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return serde_json::from_value(JsonValue::Null).context(label);
        }
        serde_json::from_slice(&bytes).context(label)
    }

    /// Make a request, returning the successful response
    ///
    /// Error responses are normalized into [`Error::Api`]. Only GET requests
    /// are retried.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let full_url = self.build_url(path)?;
        let max_retries = if method.is_mutating() {
            0
        } else {
            self.config.max_retries
        };
        let timeout = config.timeout.unwrap_or(self.config.timeout);

        let mut attempt = 0;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let mut req = self.client.request(method.into(), full_url.clone());

            for (key, value) in &self.config.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }
            for (key, value) in &config.headers {
                req = req.header(key.as_str(), value.as_str());
            }

            if method.is_mutating() {
                if let Some(token) = self.cookie_for(&full_url, CSRF_COOKIE) {
                    req = req.header(CSRF_HEADER, token);
                }
            }

            if !config.query.is_empty() {
                req = req.query(&config.query);
            }

            if let Some(ref body) = config.body {
                req = req.json(body);
            }

            req = req.timeout(timeout);

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        debug!("{} {} -> {}", method, full_url, status.as_u16());
                        return Ok(response);
                    }

                    if status != StatusCode::TOO_MANY_REQUESTS
                        && is_retryable_status(status.as_u16())
                        && attempt < max_retries
                    {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {:?}",
                            status.as_u16(),
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let err = error_from_response(response).await;
                    error!("API Error: {} {} -> {} {}", method, full_url, err.status, err.details);
                    return Err(err.into());
                }
                Err(e) => {
                    if (e.is_timeout() || e.is_connect()) && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Transport error ({e}), attempt {}/{}, retrying in {:?}",
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    error!("API Error: {} {} -> {e}", method, full_url);
                    if e.is_timeout() {
                        return Err(Error::Timeout {
                            timeout_ms: timeout.as_millis() as u64,
                        });
                    }
                    return Err(Error::Http(e));
                }
            }
        }
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }

    /// Resolve a path against the base URL
    ///
    /// Absolute URLs are used as-is; everything else is appended to the base
    /// path, so `/courses/` becomes `<base>/courses/`.
    pub fn build_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    fn cookie_for(&self, url: &Url, name: &str) -> Option<String> {
        let header = self.cookies.cookies(url)?;
        let header = header.to_str().ok()?;
        find_cookie(header, name)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Find a cookie value in a `Cookie` header (`a=1; csrftoken=xyz`)
pub(crate) fn find_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| value.to_string())
        })
        .filter(|value| !value.is_empty())
}

/// Build a normalized error from an error response
async fn error_from_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(retry_after_seconds);

    let text = response.text().await.unwrap_or_default();
    let body = if text.trim().is_empty() {
        None
    } else {
        Some(serde_json::from_str(&text).unwrap_or(JsonValue::String(text)))
    };

    normalize(&FailedRequest {
        status: Some(status),
        body,
        retry_after,
        message: Some(format!("Request failed with status code {status}")),
    })
}

/// `Retry-After` as seconds
///
/// Delta-seconds are passed through; an HTTP-date is converted to the number
/// of seconds from now (never negative). Anything else is kept verbatim.
pub(crate) fn retry_after_seconds(value: &str) -> String {
    let value = value.trim();
    if value.parse::<u64>().is_ok() {
        return value.to_string();
    }
    match chrono::DateTime::parse_from_rfc2822(value) {
        Ok(at) => {
            let secs = (at.with_timezone(&chrono::Utc) - chrono::Utc::now()).num_seconds();
            secs.max(0).to_string()
        }
        Err(_) => value.to_string(),
    }
}
