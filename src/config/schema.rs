//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the health monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Endpoints to monitor, in display order.
    pub endpoints: Vec<EndpointConfig>,

    /// Per-request probe settings.
    pub probe: ProbeConfig,

    /// Check cycle scheduling.
    pub schedule: ScheduleConfig,

    /// Outage detection and alert suppression.
    pub alerting: AlertingConfig,

    /// HTTP reporting surface.
    pub server: ServerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// A single monitored endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Stable identifier used in reports and alerts.
    pub name: String,

    /// Absolute http(s) URL probed with GET.
    pub url: String,
}

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Response timeout in seconds, counted after the connection is up.
    pub read_timeout_secs: u64,

    /// User-Agent header sent with every probe.
    pub user_agent: String,
}

impl ProbeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Worst-case duration of a single probe.
    pub fn total_timeout(&self) -> Duration {
        self.connect_timeout() + self.read_timeout()
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 10,
            user_agent: concat!("endpoint-sentinel/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Cycle scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Interval between cycle starts in seconds (fixed rate).
    pub interval_secs: u64,

    /// Extra time on top of the read timeout before a cycle stops waiting
    /// for stragglers.
    pub deadline_grace_secs: u64,

    /// Run one cycle immediately at startup instead of waiting a full interval.
    pub initial_check: bool,

    /// Maximum probes in flight at once. Defaults to the endpoint count.
    pub max_concurrency: Option<usize>,
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            deadline_grace_secs: 5,
            initial_check: true,
            max_concurrency: None,
        }
    }
}

/// Alerting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertingConfig {
    /// Unhealthy endpoints in one cycle needed to raise an alert.
    pub threshold: usize,

    /// Minimum seconds between two alerts.
    pub cooldown_secs: u64,

    /// Optional webhook receiving alert events as JSON.
    pub webhook_url: Option<String>,
}

impl AlertingConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            threshold: 3,
            cooldown_secs: 300,
            webhook_url: None,
        }
    }
}

/// HTTP reporting server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Serve the snapshot over HTTP.
    pub enabled: bool,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Per-request timeout for the reporting routes in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: MonitorConfig = toml::from_str(
            r#"
            [[endpoints]]
            name = "endpoint_1"
            url = "https://example.com/health"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoints.len(), 1);
        assert_eq!(config.probe.total_timeout(), Duration::from_secs(20));
        assert_eq!(config.schedule.interval(), Duration::from_secs(30));
        assert_eq!(config.alerting.threshold, 3);
        assert_eq!(config.alerting.cooldown(), Duration::from_secs(300));
        assert!(config.server.enabled);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config: MonitorConfig = toml::from_str(
            r#"
            [schedule]
            interval_secs = 10
            max_concurrency = 2

            [alerting]
            threshold = 1
            webhook_url = "http://hooks.local/alert"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.schedule.interval_secs, 10);
        assert_eq!(config.schedule.max_concurrency, Some(2));
        assert!(config.schedule.initial_check);
        assert_eq!(config.alerting.threshold, 1);
        assert_eq!(config.alerting.cooldown_secs, 300);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
