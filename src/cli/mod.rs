//! CLI module
//!
//! Command-line interface for browsing a Jarcode backend.
//!
//! # Commands
//!
//! - `courses` - List courses, optionally filtered by title
//! - `problems` - List problems with filters
//! - `problem` - Show problems by id
//! - `submissions` - List submissions for a problem

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
