//! CLI commands and argument parsing

use crate::config::ENV_BASE_URL;
use crate::types::{Difficulty, Language};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Jarcode API client
#[derive(Parser, Debug)]
#[command(name = "jarcode")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, including the /api prefix
    #[arg(long, global = true, env = ENV_BASE_URL)]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Stop after this many pages (lists only)
    #[arg(long, global = true)]
    pub max_pages: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List courses
    Courses {
        /// Title search
        #[arg(long, default_value = "")]
        search: String,
    },

    /// List problems
    Problems {
        /// Title search
        #[arg(long)]
        search: Option<String>,

        /// Language filter
        #[arg(long, value_enum)]
        language: Option<Language>,

        /// Difficulty filter
        #[arg(long, value_enum)]
        difficulty: Option<Difficulty>,

        /// Author user id
        #[arg(long)]
        author: Option<u64>,

        /// Only solved (true) or unsolved (false) problems
        #[arg(long)]
        solved: Option<bool>,
    },

    /// Show problems by id
    Problem {
        /// Problem ids
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// List submissions for a problem
    Submissions {
        /// Problem id
        problem_id: u64,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one item per line)
    Json,
    /// Human-readable output
    Pretty,
}
