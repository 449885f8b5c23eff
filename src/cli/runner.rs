//! CLI runner - executes commands

use crate::api_error::ApiError;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::ApiClient;
use crate::pagination::{CursorPagination, PageFetcher, PaginationOptions};
use crate::services::{CourseService, ProblemFilters, ProblemService, SubmissionService};
use crate::types::JsonValue;
use futures::future::try_join_all;
use std::time::Instant;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command and print its output
    pub async fn run(&self) -> Result<()> {
        let items = self.collect().await?;
        for item in &items {
            self.output(item);
        }
        Ok(())
    }

    /// Run the CLI command and return what it would print
    pub async fn collect(&self) -> Result<Vec<JsonValue>> {
        if self.cli.max_pages == Some(0) {
            return Err(Error::config("--max-pages must be at least 1"));
        }
        let client = self.client()?;

        match &self.cli.command {
            Commands::Courses { search } => {
                let fetcher = CourseService::new(client).fetcher(search);
                self.walk(fetcher).await
            }
            Commands::Problems {
                search,
                language,
                difficulty,
                author,
                solved,
            } => {
                let filters = ProblemFilters {
                    search: search.clone(),
                    language: *language,
                    difficulty: *difficulty,
                    author: *author,
                    is_solved: *solved,
                };
                let fetcher = ProblemService::new(client).fetcher(&filters);
                self.walk(fetcher).await
            }
            Commands::Problem { ids } => {
                let problems = ProblemService::new(client);
                try_join_all(ids.iter().map(|id| problems.get(*id))).await
            }
            Commands::Submissions { problem_id } => {
                let fetcher = SubmissionService::new(client).fetcher(*problem_id);
                self.walk(fetcher).await
            }
        }
    }

    /// Build the client from the config file, environment and flags
    fn client(&self) -> Result<ApiClient> {
        let config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        let config = config
            .with_env_overrides()
            .with_base_url(self.cli.base_url.clone());
        config.validate()?;

        debug!(base_url = %config.base_url, "Using API");
        ApiClient::with_config(config.into_api_config())
    }

    /// Collect pages until the list ends or `--max-pages` is reached
    async fn walk(&self, fetcher: impl PageFetcher + 'static) -> Result<Vec<JsonValue>> {
        let start = Instant::now();
        let engine: CursorPagination = CursorPagination::load(fetcher, PaginationOptions::default()).await;
        let mut pages = 1;

        loop {
            if let Some(err) = engine.error() {
                return Err(Error::from(ApiError::from(err.as_ref())));
            }
            if !engine.has_next() || self.cli.max_pages.is_some_and(|max| pages >= max) {
                break;
            }
            engine.load_more().await;
            pages += 1;
        }

        info!(
            items = engine.len(),
            pages,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Listing complete"
        );
        Ok(engine.items())
    }

    /// Print one item
    fn output(&self, item: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(item).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(item).unwrap_or_default());
            }
        }
    }
}
