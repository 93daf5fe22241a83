//! Connection Pilot - scheduled connection health checks with self-healing
//!
//! # Usage
//!
//! ```bash
//! # Run a single health check and print its notifications as JSON
//! connection-pilot check
//!
//! # Run hourly (per config) until Ctrl-C
//! connection-pilot --config /etc/connection-pilot/pilot.toml watch
//!
//! # Show the last-known-good snapshot
//! connection-pilot status
//! ```
//!
//! # Environment Variables
//!
//! - `PILOT_CONFIG`: Path to the TOML config (default: ./pilot.toml)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use connection_pilot::{
    ConnectionPilot, HealthStateStore, HttpConnectionProber, LogSink, PilotConfig,
    SledOptionStore, StaticHost, WebhookSink,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "connection-pilot")]
#[command(about = "Self-healing health monitor for a mandatory service connection")]
#[command(version)]
struct CliArgs {
    /// Path to the pilot TOML config (overrides PILOT_CONFIG and ./pilot.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Run one health check and print the resulting notifications as JSON
    Check,
    /// Run health checks on the configured interval until interrupted
    Watch,
    /// Print the stored last-known-good snapshot
    Status,
    /// Print the effective configuration as TOML
    Config,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn open_store(config: &PilotConfig) -> Result<HealthStateStore> {
    let options = SledOptionStore::open(&config.storage.path).with_context(|| {
        format!(
            "Failed to open option store at {}",
            config.storage.path.display()
        )
    })?;
    Ok(HealthStateStore::new(Arc::new(options)))
}

fn build_pilot(config: &PilotConfig) -> Result<ConnectionPilot> {
    let store = open_store(config)?;

    let prober = HttpConnectionProber::new(
        &config.probe.base_url,
        config.probe.api_token.clone(),
        config.probe.timeout(),
    )
    .context("Failed to build connection prober")?;

    let host = StaticHost::new(config.site.url.clone(), config.tenant_metadata());

    let mut pilot = ConnectionPilot::new(store, Arc::new(prober), Arc::new(host))
        .with_policy(config.evaluation_policy())
        .with_interval(config.run_interval());

    if config.notify.log {
        pilot = pilot.with_sink(Arc::new(LogSink));
    }
    if let Some(url) = &config.notify.webhook_url {
        let webhook = WebhookSink::new(url, config.probe.timeout())
            .context("Failed to build webhook sink")?;
        pilot = pilot.with_sink(Arc::new(webhook));
    }

    Ok(pilot)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    let config = PilotConfig::load(args.config.as_deref()).context("Failed to load pilot config")?;

    match args.command {
        SubCommand::Config => {
            print!("{}", config.to_toml()?);
        }
        SubCommand::Status => {
            let store = open_store(&config)?;
            match store.get().context("Failed to read health snapshot")? {
                Some(snapshot) => println!("{}", serde_json::to_string_pretty(&snapshot)?),
                None => println!("No successful health check recorded"),
            }
        }
        SubCommand::Check => {
            if !config.pilot.enabled {
                info!("Connection pilot disabled in config, nothing to do");
                return Ok(());
            }
            let pilot = build_pilot(&config)?;
            let report = pilot.run_once().await.context("Connection pilot run failed")?;
            println!("{}", serde_json::to_string_pretty(&report.notifications)?);
        }
        SubCommand::Watch => {
            if !config.pilot.enabled {
                info!("Connection pilot disabled in config, nothing to do");
                return Ok(());
            }
            let pilot = build_pilot(&config)?;
            let cancel = CancellationToken::new();

            let shutdown = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Shutdown signal received");
                }
                shutdown.cancel();
            });

            pilot.run(cancel).await;
        }
    }

    Ok(())
}
