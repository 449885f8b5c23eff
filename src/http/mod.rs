//! HTTP transport
//!
//! Provides the session-aware client every service call goes through.
//!
//! # Features
//!
//! - **Session cookies**: a shared cookie jar keeps the session and CSRF cookies
//! - **CSRF**: `X-CSRFToken` is attached to POST/PUT/PATCH/DELETE
//! - **Automatic Retries**: idempotent requests retry with backoff
//! - **Rate Limiting**: optional token bucket throttle using governor
//! - **Error normalization**: error responses become [`crate::api_error::ApiError`]

mod client;
mod rate_limit;

pub use client::{
    ApiClient, ApiClientConfig, ApiClientConfigBuilder, RequestConfig, CSRF_COOKIE, CSRF_HEADER,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
