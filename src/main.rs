//! Endpoint Sentinel
//!
//! Periodic HTTP endpoint health monitor.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌────────────┐  tick   ┌──────────────────┐  probe ×N   ┌──────────────┐
//!   │ Scheduler  │────────▶│ HealthAggregator │────────────▶│  HttpProber  │──▶ endpoints
//!   └────────────┘         │  (single-flight) │◀────────────│  (reqwest)   │
//!                          └────────┬─────────┘   results   └──────────────┘
//!                                   │ publish
//!                                   ▼
//!                          ┌──────────────────┐   load      ┌──────────────┐
//!                          │ Snapshot/ArcSwap │◀───────────│  HTTP server │◀── GET /health
//!                          └──────────────────┘             └──────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use endpoint_sentinel::config::load_config;
use endpoint_sentinel::health::{HealthAggregator, Scheduler};
use endpoint_sentinel::http::{AppState, HttpServer};
use endpoint_sentinel::lifecycle::{wait_for_shutdown, Shutdown};
use endpoint_sentinel::observability::{logging, metrics};

/// How long the scheduler may take to notice shutdown before it is aborted.
const SCHEDULER_STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "endpoint-sentinel", version)]
#[command(about = "Periodic HTTP endpoint health monitor", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config/sentinel.toml")]
    config: PathBuf,

    /// Run a single check cycle, print the report and exit (non-zero when degraded)
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config errors are fatal and reported before logging exists.
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("endpoint-sentinel: {}: {}", cli.config.display(), e);
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "endpoint-sentinel starting");

    tracing::info!(
        config = %cli.config.display(),
        endpoints = config.endpoints.len(),
        interval_secs = config.schedule.interval_secs,
        threshold = config.alerting.threshold,
        cooldown_secs = config.alerting.cooldown_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let aggregator = Arc::new(HealthAggregator::from_config(&config)?);

    if cli.once {
        let report = aggregator.run_cycle().await;
        println!("{}", serde_json::to_string_pretty(&report.snapshot.report())?);
        if !report.snapshot.is_healthy() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let shutdown = Shutdown::new();

    let server_task = if config.server.enabled {
        let listener = HttpServer::bind(&config.server.bind_address).await?;
        let state = AppState {
            snapshots: aggregator.snapshots(),
            endpoints: aggregator.endpoints().into(),
            started_at: chrono::Utc::now(),
            check_interval: config.schedule.interval(),
        };
        let server = HttpServer::new(&config.server, state);
        Some(tokio::spawn(server.run(listener, shutdown.subscribe())))
    } else {
        tracing::info!("HTTP server disabled");
        None
    };

    let scheduler = Scheduler::from_config(&config.schedule);
    let mut scheduler_task = tokio::spawn(scheduler.run(aggregator.clone(), shutdown.subscribe()));

    wait_for_shutdown().await;
    shutdown.trigger();

    if let Some(task) = server_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "HTTP server exited with error"),
            Err(e) => tracing::error!(error = %e, "HTTP server task failed"),
        }
    }

    // A cycle in flight is abandoned rather than waited out.
    if tokio::time::timeout(SCHEDULER_STOP_GRACE, &mut scheduler_task).await.is_err() {
        scheduler_task.abort();
        tracing::warn!("Scheduler did not stop in time, in-flight cycle abandoned");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
