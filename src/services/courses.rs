//! Course endpoints

use super::ListFetcher;
use crate::error::Result;
use crate::http::ApiClient;
use crate::pagination::PageFetcher;
use crate::types::{JsonValue, OptionStringExt};

/// Courses, their chapters and lessons
#[derive(Debug, Clone)]
pub struct CourseService {
    client: ApiClient,
}

impl CourseService {
    /// Create a service on a shared client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// One page of courses whose title matches `search`
    pub async fn list(&self, search: &str, cursor: Option<String>) -> Result<JsonValue> {
        self.fetcher(search).fetch(cursor).await
    }

    /// Page fetcher for the course list
    pub fn fetcher(&self, search: &str) -> ListFetcher {
        let query = search
            .to_string()
            .none_if_empty()
            .map(|title| vec![("title".to_string(), title)])
            .unwrap_or_default();
        ListFetcher::new(self.client.clone(), "/courses/", query)
    }

    /// Course detail
    pub async fn detail(&self, course_id: u64) -> Result<JsonValue> {
        self.client.get(&format!("/courses/{course_id}/")).await
    }

    /// Chapters of a course
    pub async fn chapters(&self, course_id: u64) -> Result<JsonValue> {
        self.client
            .get(&format!("/courses/{course_id}/chapters/"))
            .await
    }

    /// Lessons of a chapter
    pub async fn lessons(&self, course_id: u64, chapter_id: u64) -> Result<JsonValue> {
        self.client
            .get(&format!(
                "/courses/{course_id}/chapters/{chapter_id}/lessons/"
            ))
            .await
    }
}
