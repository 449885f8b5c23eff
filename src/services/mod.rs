//! Services module
//!
//! Thin typed wrappers over the backend's REST endpoints.
//!
//! # Overview
//!
//! - [`CourseService`]: courses, chapters and lessons
//! - [`ProblemService`]: problem CRUD and filtered listing
//! - [`SubmissionService`]: submissions for one problem
//! - [`UserService`]: CSRF setup, session login and profile
//!
//! Every list endpoint also hands out a [`ListFetcher`] that plugs straight
//! into [`CursorPagination`](crate::pagination::CursorPagination).

mod courses;
mod problems;
mod submissions;
mod users;

pub use courses::CourseService;
pub use problems::{ProblemFilters, ProblemService};
pub use submissions::SubmissionService;
pub use users::{AccountToken, Credentials, PasswordChange, Registration, UserService};

use crate::error::Result;
use crate::http::{ApiClient, RequestConfig};
use crate::pagination::{PageFetcher, CURSOR_PARAM};
use crate::types::JsonValue;
use async_trait::async_trait;
use tracing::debug;

/// Fetches pages of one list endpoint
///
/// Fixed query parameters go out with every page; the cursor is added as
/// the `cursor` parameter when present.
#[derive(Debug, Clone)]
pub struct ListFetcher {
    client: ApiClient,
    path: String,
    query: Vec<(String, String)>,
}

impl ListFetcher {
    /// Create a fetcher for `path`
    pub fn new(client: ApiClient, path: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            client,
            path: path.into(),
            query,
        }
    }

    /// Endpoint path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fixed query parameters
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }
}

#[async_trait]
impl PageFetcher for ListFetcher {
    async fn fetch(&self, cursor: Option<String>) -> Result<JsonValue> {
        debug!(path = %self.path, cursor = ?cursor, "Fetching page");
        self.client
            .get_with_config(&self.path, list_request(&self.query, cursor.as_deref()))
            .await
    }
}

fn list_request(query: &[(String, String)], cursor: Option<&str>) -> RequestConfig {
    let mut config = query
        .iter()
        .fold(RequestConfig::new(), |config, (key, value)| {
            config.query(key.as_str(), value.as_str())
        });
    if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
        config = config.query(CURSOR_PARAM, cursor);
    }
    config
}
