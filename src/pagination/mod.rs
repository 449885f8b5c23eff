//! Pagination module
//!
//! Cursor-based pagination for list endpoints.
//!
//! # Overview
//!
//! - [`normalize_page`] reduces the raw list shapes the backend produces to
//!   a [`Page`], pulling the cursor out of the `next` link with
//!   [`extract_cursor`]
//! - [`CursorPagination`] accumulates pages for one consumer and exposes
//!   `fetch_page`, `load_more`, `reset` and `refresh` plus observable
//!   loading flags

mod engine;
mod types;

pub use engine::{CursorPagination, LoadStatus, PageFetcher, PaginationOptions, PaginationState};
pub use types::{extract_cursor, normalize_page, Page, CURSOR_PARAM};
