mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use argo_ingest::config::ArgoConfig;

#[derive(Parser)]
#[command(
    name = "argo-ingest",
    version,
    about = "Ingest ARGO float profiles into SQLite and search them by text"
)]
struct Cli {
    /// Config file (defaults to ~/.argo-ingest/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter stored measurements, e.g. '{"region": "North Atlantic"}'
    Query {
        #[arg(default_value = "{}")]
        params: String,
    },
    /// Rank profiles by similarity to a text, e.g. '{"query": "cold", "top_k": 3}'
    SemanticSearch {
        #[arg(default_value = "{}")]
        params: String,
    },
    /// Ingest every matching file in a directory
    ProcessDirectory { dir: PathBuf },
    /// Show store statistics
    Stats,
    /// Refit the text vectorizer on all indexed profiles
    Refit,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let output = match run(cli).await {
        Ok(payload) => cli::success(payload),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            cli::failure(&e)
        }
    };
    let ok = output["success"] == Value::Bool(true);

    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("failed to serialize output: {e}");
            return ExitCode::FAILURE;
        }
    }
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run(cli: Cli) -> Result<Value> {
    let config = match &cli.config {
        Some(path) => ArgoConfig::load_from(path)?,
        None => ArgoConfig::load()?,
    };

    // Log to stderr so stdout stays a single JSON document.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Query { params } => {
            blocking(move || cli::query::run(&config, &params)).await
        }
        Command::SemanticSearch { params } => {
            blocking(move || cli::search::run(&config, &params)).await
        }
        Command::ProcessDirectory { dir } => cli::process::run(config, dir).await,
        Command::Stats => blocking(move || cli::stats::run(&config)).await,
        Command::Refit => blocking(move || cli::refit::run(&config)).await,
    }
}

async fn blocking<F>(f: F) -> Result<Value>
where
    F: FnOnce() -> Result<Value> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .context("command task panicked")?
}
