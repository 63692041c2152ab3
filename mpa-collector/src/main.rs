//! Analytics replay (mpa-replay) - Main entry point
//!
//! Feeds a scripted playback session through the analytics collector and prints every
//! delivered event as one JSON line on stdout. Logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mpa_collector::replay::{ReplaySession, Script};
use mpa_common::config::CollectorConfig;
use mpa_common::SystemClock;

/// Command-line arguments for mpa-replay
#[derive(Parser, Debug)]
#[command(name = "mpa-replay")]
#[command(about = "Replay a scripted playback session through the analytics collector")]
#[command(version)]
struct Args {
    /// Session script (TOML)
    #[arg(short, long)]
    script: PathBuf,

    /// Config file (overrides MPA_CONFIG and the platform config file)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, overrides the configured level (RUST_LOG still wins)
    #[arg(long, env = "MPA_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = CollectorConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    let default_filter = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Replaying {}", args.script.display());

    let script = Script::from_file(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;

    let session = ReplaySession::new(&script, config, Arc::new(SystemClock), std::io::stdout())
        .context("Failed to set up replay session")?;
    let summary = session
        .run(&script.steps)
        .await
        .context("Replay failed")?;

    info!(
        "Replay complete: {} steps, {} listener failures",
        summary.steps, summary.listener_failures
    );
    Ok(())
}
