// Allow common clippy pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! Jarcode CLI
//!
//! Command-line interface for browsing a Jarcode backend

use clap::Parser;
use jarcode_client::api_error::error_message;
use jarcode_client::cli::{Cli, Runner};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging on stderr
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        eprintln!("Error: {}", error_message(&e));
        std::process::exit(1);
    }
}
