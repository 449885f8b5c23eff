//! Submission endpoints

use super::ListFetcher;
use crate::error::Result;
use crate::http::ApiClient;
use crate::pagination::PageFetcher;
use crate::types::JsonValue;

fn base(problem_id: u64) -> String {
    format!("/problems/{problem_id}/submissions/")
}

/// Submissions for a problem
#[derive(Debug, Clone)]
pub struct SubmissionService {
    client: ApiClient,
}

impl SubmissionService {
    /// Create a service on a shared client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// One page of submissions, newest first as the backend orders them
    pub async fn list(&self, problem_id: u64, cursor: Option<String>) -> Result<JsonValue> {
        self.fetcher(problem_id).fetch(cursor).await
    }

    /// Submit code for a problem
    pub async fn create(&self, problem_id: u64, payload: &JsonValue) -> Result<JsonValue> {
        self.client.ensure_csrf().await;
        self.client.post(&base(problem_id), payload).await
    }

    /// Page fetcher for a problem's submissions
    pub fn fetcher(&self, problem_id: u64) -> ListFetcher {
        ListFetcher::new(self.client.clone(), base(problem_id), Vec::new())
    }
}
