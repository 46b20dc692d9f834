//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sentinel_cycles_total` (counter): completed check cycles
//! - `sentinel_failed_checks_total` (counter): unhealthy probe results
//! - `sentinel_cycle_duration_seconds` (histogram): wall time per cycle
//! - `sentinel_endpoint_healthy` (gauge): 1=healthy, 0=unhealthy, by endpoint
//! - `sentinel_consecutive_failures` (gauge): unhealthy endpoints in the last cycle
//! - `sentinel_alerts_total` (counter): alerts actually emitted

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Duration;

use crate::health::snapshot::Snapshot;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed cycle from its published snapshot.
pub fn record_cycle(snapshot: &Snapshot, failed: usize, elapsed: Duration) {
    ::metrics::counter!("sentinel_cycles_total").increment(1);
    ::metrics::counter!("sentinel_failed_checks_total").increment(failed as u64);
    ::metrics::histogram!("sentinel_cycle_duration_seconds").record(elapsed.as_secs_f64());
    ::metrics::gauge!("sentinel_consecutive_failures")
        .set(snapshot.metrics.consecutive_failures as f64);

    for (endpoint, state) in snapshot.entries() {
        let value = if state.healthy { 1.0 } else { 0.0 };
        ::metrics::gauge!("sentinel_endpoint_healthy", "endpoint" => endpoint.name.clone())
            .set(value);
    }
}

pub fn record_alert() {
    ::metrics::counter!("sentinel_alerts_total").increment(1);
}
