// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Jarcode Client
//!
//! Async client for the Jarcode learning platform API, built around
//! cursor-paginated lists.
//!
//! ## Features
//!
//! - **Cursor Pagination**: Accumulate pages from any list endpoint with
//!   overlap-safe `load_more`, `reset` and `refresh`
//! - **Infinite Scroll**: Trigger loads from scroll geometry or sentinel
//!   visibility, and keep filling short viewports
//! - **Error Normalization**: Turn any backend failure into one
//!   user-presentable message plus per-field validation errors
//! - **Session HTTP**: Cookie session with CSRF, retry and rate limiting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jarcode_client::http::ApiClient;
//! use jarcode_client::pagination::{CursorPagination, PaginationOptions};
//! use jarcode_client::services::{ProblemFilters, ProblemService};
//!
//! #[tokio::main]
//! async fn main() -> jarcode_client::Result<()> {
//!     let problems = ProblemService::new(ApiClient::new()?);
//!     let fetcher = problems.fetcher(&ProblemFilters::default());
//!
//!     let list: CursorPagination =
//!         CursorPagination::load(fetcher, PaginationOptions::default()).await;
//!     while list.has_next() {
//!         list.load_more().await;
//!     }
//!     if let Some(message) = list.error_message() {
//!         eprintln!("{message}");
//!     }
//!     println!("{} problems", list.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 InfiniteScroll (scroll)                   │
//! │  on_scroll / on_intersection / fill_if_no_scroll          │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               │ LoadSource
//! ┌─────────────────────────────┴─────────────────────────────┐
//! │              CursorPagination (pagination)                │
//! │  fetch_page / load_more / reset / refresh                 │
//! └─────────────────────────────┬─────────────────────────────┘
//!                               │ PageFetcher
//! ┌──────────────┬──────────────┴───────────┬────────────────┐
//! │   services   │           http           │   api_error    │
//! ├──────────────┼──────────────────────────┼────────────────┤
//! │ Courses      │ Cookies + CSRF           │ parse_fields   │
//! │ Problems     │ Retry / Backoff          │ normalize      │
//! │ Submissions  │ Rate Limit               │ humanize       │
//! │ Users        │                          │                │
//! └──────────────┴──────────────────────────┴────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Backend error normalization
pub mod api_error;

/// HTTP client with cookies, CSRF, retry and rate limiting
pub mod http;

/// Cursor pagination engine
pub mod pagination;

/// Infinite-scroll driver
pub mod scroll;

/// Typed endpoint wrappers
pub mod services;

/// Client configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result, ResultExt};
pub use types::*;

// Re-export commonly used types
pub use api_error::{error_message, ApiError};
pub use config::ClientConfig;
pub use http::ApiClient;
pub use pagination::{CursorPagination, PageFetcher, PaginationOptions};
pub use scroll::{InfiniteScroll, ScrollOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
