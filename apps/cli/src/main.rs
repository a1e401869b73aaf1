//! Hearth CLI - inspect and warm up models on a local Ollama server
//!
//! This CLI provides a `hearth` command over the local model status layer in
//! `hearth-models`.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::{models, ping, status, types::ModelsCommand, watch};

/// Hearth CLI - local model discovery and status
///
/// Lists the models installed on a local Ollama server, reports which are
/// resident in memory, and forces models to load ahead of use.
#[derive(Parser, Debug)]
#[command(
    name = "hearth",
    author,
    version,
    about = "Hearth - local model discovery and status",
    long_about = "Hearth talks to a local Ollama server to list installed models, report which are resident in memory, and warm models up before use.\nStatuses are cached briefly so repeated queries do not hammer the server."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error). RUST_LOG overrides it.
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Ollama address (overrides OLLAMA_HOST and the config file)
    #[arg(short, long, global = true)]
    base_url: Option<String>,

    /// Config file (defaults to the platform config dir, e.g. ~/.config/hearth/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every installed model with its residency status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Query and control individual models
    #[command(subcommand)]
    Models(ModelsCommand),

    /// Check whether the Ollama server is reachable
    Ping,

    /// Poll model statuses until interrupted
    ///
    /// Re-renders the status table every interval. Statuses younger than the
    /// cache freshness window are served without contacting the server.
    Watch {
        /// Seconds between refreshes
        #[arg(short, long, default_value_t = 5)]
        interval: u64,

        /// Stop after this many refreshes
        #[arg(short = 'n', long)]
        iterations: Option<u64>,

        /// Output each refresh as a JSON line
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing on stderr so JSON output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("hearth={0},hearth_models={0}", args.log_level))),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();

    let service_config = config::resolve(args.config.as_deref(), args.base_url.as_deref())?;
    let service = hearth_models::LocalModelService::new(&service_config);

    match args.command {
        Command::Status { json } => status::execute(&service, json).await,
        Command::Models(command) => models::execute(&service, command).await,
        Command::Ping => ping::execute(&service).await,
        Command::Watch { interval, iterations, json } => {
            watch::execute(&service, interval, iterations, json).await
        }
    }
}
