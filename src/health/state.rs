//! Live health state owned by the aggregator.
//!
//! # Invariants
//! - Exactly one [`EndpointState`] per configured endpoint, same order
//! - `consecutive_failures` equals the unhealthy count of the most recently
//!   completed cycle (reset to 0 by a fully healthy cycle)
//! - Mutated only by the aggregator's cycle-completion step

use chrono::{DateTime, Utc};

use crate::health::prober::{ProbeOutcome, ProbeResult};

/// Rolling record for one endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EndpointState {
    pub healthy: bool,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_outcome: Option<ProbeOutcome>,
    pub last_latency_ms: Option<u64>,
}

impl EndpointState {
    /// Replace the state with a fresh probe result.
    pub fn apply(&mut self, result: &ProbeResult) {
        self.healthy = result.healthy;
        self.last_checked = Some(result.checked_at);
        self.last_outcome = Some(result.outcome.clone());
        self.last_latency_ms = Some(result.latency.as_millis() as u64);
    }
}

/// Process-wide counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    /// Completed cycles.
    pub total_cycles: u64,
    /// Unhealthy results summed across endpoints and cycles.
    pub failed_checks: u64,
    /// Unhealthy endpoints in the most recent cycle.
    pub consecutive_failures: usize,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

impl Metrics {
    /// `(1 - failed/total) * 100`, or 100 before the first cycle.
    ///
    /// `failed_checks` counts endpoints while `total_cycles` counts cycles, so
    /// the raw ratio can exceed 1 in a multi-endpoint outage; the result is
    /// clamped to `[0, 100]`.
    pub fn success_rate(&self) -> f64 {
        if self.total_cycles == 0 {
            return 100.0;
        }
        let rate = (1.0 - self.failed_checks as f64 / self.total_cycles as f64) * 100.0;
        rate.clamp(0.0, 100.0)
    }

    /// Fold one completed cycle into the counters.
    pub fn record_cycle(&mut self, failed: usize, at: DateTime<Utc>) {
        self.total_cycles += 1;
        self.failed_checks += failed as u64;
        self.consecutive_failures = failed;
        self.last_cycle_at = Some(at);
    }
}

/// Alert suppression bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertState {
    pub last_alert_at: Option<DateTime<Utc>>,
}

/// Everything a cycle mutates, guarded as one unit.
#[derive(Debug, Clone)]
pub struct LiveState {
    pub endpoints: Vec<EndpointState>,
    pub metrics: Metrics,
    pub alert: AlertState,
}

impl LiveState {
    pub fn new(endpoint_count: usize) -> Self {
        Self {
            endpoints: vec![EndpointState::default(); endpoint_count],
            metrics: Metrics::default(),
            alert: AlertState::default(),
        }
    }
}
