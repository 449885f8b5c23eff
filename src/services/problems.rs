//! Problem endpoints

use super::ListFetcher;
use crate::error::Result;
use crate::http::ApiClient;
use crate::pagination::PageFetcher;
use crate::types::{Difficulty, JsonValue, Language, OptionStringExt};
use serde::{Deserialize, Serialize};

const BASE: &str = "/problems/";

/// Filters for the problem list
///
/// Unset and empty values are left out of the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemFilters {
    /// Title search, sent as `title`
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Author user id
    #[serde(default)]
    pub author: Option<u64>,
    #[serde(default)]
    pub is_solved: Option<bool>,
}

impl ProblemFilters {
    /// Query parameters in a stable order
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(search) = self.search.clone().none_if_empty() {
            query.push(("title".to_string(), search));
        }
        if let Some(language) = self.language {
            query.push(("language".to_string(), language.as_str().to_string()));
        }
        if let Some(difficulty) = self.difficulty {
            query.push(("difficulty".to_string(), difficulty.as_str().to_string()));
        }
        if let Some(author) = self.author.filter(|id| *id != 0) {
            query.push(("author".to_string(), author.to_string()));
        }
        if let Some(solved) = self.is_solved {
            query.push(("is_solved".to_string(), solved.to_string()));
        }
        query
    }
}

/// Problem CRUD and listing
#[derive(Debug, Clone)]
pub struct ProblemService {
    client: ApiClient,
}

impl ProblemService {
    /// Create a service on a shared client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Create a problem
    pub async fn create(&self, payload: &JsonValue) -> Result<JsonValue> {
        self.client.ensure_csrf().await;
        self.client.post(BASE, payload).await
    }

    /// Fetch one problem
    pub async fn get(&self, id: u64) -> Result<JsonValue> {
        self.client.get(&format!("{BASE}{id}/")).await
    }

    /// Replace a problem
    pub async fn update(&self, id: u64, payload: &JsonValue) -> Result<JsonValue> {
        self.client.ensure_csrf().await;
        self.client.put(&format!("{BASE}{id}/"), payload).await
    }

    /// Delete a problem
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.client.ensure_csrf().await;
        self.client.delete(&format!("{BASE}{id}/")).await
    }

    /// One page of problems matching `filters`
    pub async fn list(&self, filters: &ProblemFilters, cursor: Option<String>) -> Result<JsonValue> {
        self.fetcher(filters).fetch(cursor).await
    }

    /// Page fetcher for the filtered list
    pub fn fetcher(&self, filters: &ProblemFilters) -> ListFetcher {
        ListFetcher::new(self.client.clone(), BASE, filters.to_query())
    }
}
