//! gm
//!
//! Terminal dashboard for GitHub Actions workflow runs.
//!
//! Architecture:
//! - Configuration: TOML file, environment and command-line overrides
//! - Monitor: the poll scheduler from `gm-monitor`, fed by the GitHub client
//! - Dashboard: redraws the latest snapshot and forwards refresh/quit keys
//!
//! With `--once` a single cycle runs and its result is printed instead.

mod config;
mod dashboard;
mod input;
mod logging;
mod render;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use gm_client::GitHubClient;
use gm_monitor::Poller;

#[derive(Parser)]
#[command(name = "gm", version)]
#[command(about = "Terminal dashboard for GitHub Actions workflow runs", long_about = None)]
struct Cli {
    /// Path to the configuration file (default: ~/.config/gm/config.toml)
    #[arg(short, long, env = "GM_CONFIG")]
    config: Option<PathBuf>,

    /// Poll interval in seconds, overriding the configuration file
    #[arg(short, long)]
    interval: Option<u64>,

    /// Append logs to this file instead of printing warnings to stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Poll once, print the result and exit
    #[arg(long)]
    once: bool,

    /// Print the snapshot as JSON (with --once)
    #[arg(long, requires = "once")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.log_file.as_deref())?;

    info!("Starting gm {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(interval) = cli.interval {
        config.general.polling_interval_seconds = interval;
    }
    config.validate().context("Invalid configuration")?;

    let monitor_config = config.monitor_config();
    monitor_config.validate()?;

    info!(
        "Watching {} repositories every {}s",
        config.watches.len(),
        config.general.polling_interval_seconds
    );

    let client = GitHubClient::new(config.client_options())
        .context("Failed to initialize GitHub client")?;
    if !client.has_token() {
        warn!(
            "No GitHub token configured (set {} or github.token); requests are unauthenticated",
            config::TOKEN_ENV
        );
    }

    let poller = Poller::new(monitor_config, config.watch_targets(), Arc::new(client));

    if cli.once {
        return run_once(poller, cli.json).await;
    }

    dashboard::run(poller.spawn(), config.general.notifications_enabled).await?;

    info!("gm stopped");
    Ok(())
}

/// Poll once and print the snapshot
///
/// Fails when any repository could not be fetched, so scripts can check the
/// exit status.
async fn run_once(poller: Poller, json: bool) -> Result<()> {
    let snapshot = poller.poll_once().await;

    if json {
        let output =
            serde_json::to_string_pretty(&*snapshot).context("Failed to serialize snapshot")?;
        println!("{}", output);
    } else {
        print!("{}", render::render(&snapshot, Utc::now(), None));
    }

    let errors = snapshot.error_count();
    if errors > 0 {
        anyhow::bail!("{} of {} repositories failed to update", errors, snapshot.repositories.len());
    }

    Ok(())
}
