//! EnCh - entity checker for Home Assistant
//!
//! Periodically scans the hub's entities for low batteries, unavailable or
//! unknown states and stale updates, and sends a notification per check.

mod banner;
mod scheduler;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ench_checks::CheckEngine;
use ench_config::{load_config, EnchConfig, DEFAULT_CONFIG_FILE};
use ench_hub::{DryRunHub, RestHub, SharedHub};
use scheduler::Scheduler;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command line options
#[derive(Parser, Debug)]
#[command(name = "ench", version, about = "Entity checker for Home Assistant")]
struct Cli {
    /// Configuration directory
    #[arg(short, long, default_value = ".")]
    config: PathBuf,

    /// Configuration file name inside the configuration directory
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    file: PathBuf,

    /// Run every configured check once and exit
    #[arg(long)]
    once: bool,

    /// Log notifications instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_target(true)
        .init();

    let config = load_config(&cli.config, &cli.file).with_context(|| {
        format!(
            "loading configuration {}",
            cli.config.join(&cli.file).display()
        )
    })?;
    let config = Arc::new(config);

    banner::log(&config, cli.dry_run);

    if !config.has_checks() {
        warn!("No checks configured, nothing to do");
        return Ok(());
    }

    let hub = connect(&config, cli.dry_run)?;
    let engine = Arc::new(CheckEngine::new(config.clone(), hub)?);

    if cli.once {
        let failed = scheduler::run_once(&engine).await;
        if failed > 0 {
            bail!("{} check(s) failed", failed);
        }
        return Ok(());
    }

    let scheduler = Scheduler::new(engine);
    scheduler.start().await;
    info!("EnCh is running");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    scheduler.stop();
    scheduler.join().await;

    Ok(())
}

/// Build the hub client, wrapped for dry runs
fn connect(config: &EnchConfig, dry_run: bool) -> Result<SharedHub> {
    let rest = RestHub::new(&config.hub.url, config.hub.token.clone(), config.hub.timeout)
        .context("creating hub client")?;
    info!(url = %rest.base_url(), dry_run, "Connecting to hub");

    if dry_run {
        Ok(Arc::new(DryRunHub::new(rest)))
    } else {
        Ok(Arc::new(rest))
    }
}
