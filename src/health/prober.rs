//! Endpoint prober.
//!
//! # Responsibilities
//! - Issue one bounded GET against a single endpoint
//! - Classify the outcome as healthy (2xx) or unhealthy
//! - Capture transport failures as data, never as errors
//!
//! # Design Decisions
//! - Probes share no mutable state, so any number can run concurrently
//! - Connect and read phases have separate budgets; the client's overall
//!   timeout is their sum

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::time::{Duration, Instant};

use crate::config::ProbeConfig;
use crate::health::endpoint::Endpoint;

/// How a probe ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The endpoint answered with this HTTP status.
    Status { code: u16 },
    /// No usable response: DNS, connect, TLS, timeout, or a cycle-level fault.
    Failed { reason: String },
}

impl ProbeOutcome {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProbeOutcome::Status { code } => Some(*code),
            ProbeOutcome::Failed { .. } => None,
        }
    }
}

/// Result of a single probe. Produced fresh every cycle, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    /// Index of the probed endpoint.
    pub endpoint: usize,
    pub healthy: bool,
    pub outcome: ProbeOutcome,
    pub checked_at: DateTime<Utc>,
    pub latency: Duration,
}

impl ProbeResult {
    /// A response was received; healthy iff the status is in [200, 300).
    pub fn from_status(
        endpoint: usize,
        code: u16,
        checked_at: DateTime<Utc>,
        latency: Duration,
    ) -> Self {
        Self {
            endpoint,
            healthy: (200..300).contains(&code),
            outcome: ProbeOutcome::Status { code },
            checked_at,
            latency,
        }
    }

    pub fn failed(
        endpoint: usize,
        reason: impl Into<String>,
        checked_at: DateTime<Utc>,
        latency: Duration,
    ) -> Self {
        Self {
            endpoint,
            healthy: false,
            outcome: ProbeOutcome::Failed {
                reason: reason.into(),
            },
            checked_at,
            latency,
        }
    }
}

/// A single liveness check against one endpoint.
///
/// Implementations must resolve within their own timeout and must not panic
/// on network failure; a failure is reported through [`ProbeResult`].
pub trait Probe: Send + Sync + 'static {
    fn probe(&self, endpoint: &Endpoint) -> impl Future<Output = ProbeResult> + Send;
}

/// HTTP GET prober backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    total_timeout: Duration,
}

impl HttpProber {
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.total_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            total_timeout: config.total_timeout(),
        })
    }

    fn classify(&self, error: &reqwest::Error) -> String {
        if error.is_timeout() {
            format!("timed out after {}s", self.total_timeout.as_secs())
        } else if error.is_connect() {
            format!("connection failed: {}", root_cause(error))
        } else {
            format!("request failed: {}", root_cause(error))
        }
    }
}

impl Probe for HttpProber {
    async fn probe(&self, endpoint: &Endpoint) -> ProbeResult {
        let start = Instant::now();
        let result = self.client.get(endpoint.url.clone()).send().await;
        let latency = start.elapsed();
        let checked_at = Utc::now();

        match result {
            Ok(response) => {
                let status = response.status();
                let code = status.as_u16();
                let probe = ProbeResult::from_status(endpoint.index, code, checked_at, latency);
                if probe.healthy {
                    tracing::debug!(
                        endpoint = %endpoint.name,
                        status = %status,
                        latency_ms = latency.as_millis() as u64,
                        "Probe healthy"
                    );
                } else {
                    tracing::warn!(
                        endpoint = %endpoint.name,
                        url = %endpoint.url,
                        status = %status,
                        "Probe failed: non-success status"
                    );
                }
                probe
            }
            Err(e) => {
                let reason = self.classify(&e);
                tracing::warn!(
                    endpoint = %endpoint.name,
                    url = %endpoint.url,
                    reason = %reason,
                    "Probe failed: transport error"
                );
                ProbeResult::failed(endpoint.index, reason, checked_at, latency)
            }
        }
    }
}

fn root_cause(error: &reqwest::Error) -> String {
    let mut cause: &dyn std::error::Error = error;
    while let Some(next) = cause.source() {
        cause = next;
    }
    cause.to_string()
}
