//! Trainyard CLI — run the training pipeline from the terminal.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Trainyard: sequential ML training with gated model promotion
#[derive(Parser, Debug)]
#[command(name = "trainyard", version, about, long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./trainyard.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Execute one full pipeline run
    Run,
    /// Fetch records and validate them against the schema, without training
    Validate,
    /// Show the currently registered model
    Registry,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "trainyard", "trainyard")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "trainyard.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    // Resolve configuration: explicit flag, else workspace file, else
    // defaults plus environment.
    let config_file = cli.config.or_else(|| {
        let workspace_config = PathBuf::from("trainyard.toml");
        workspace_config.exists().then_some(workspace_config)
    });
    let config = trainyard_core::load_config(config_file.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;

    match cli.command {
        Commands::Run => commands::run(config).await,
        Commands::Validate => commands::validate(config).await,
        Commands::Registry => commands::registry(config),
    }
}
