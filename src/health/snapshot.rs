//! Published health snapshots and their JSON views.
//!
//! A [`Snapshot`] is an immutable copy of the live state taken at the end of
//! a cycle. Readers share it through an `Arc` and never observe a cycle in
//! progress.

use arc_swap::ArcSwap;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::sync::Arc;

use crate::health::endpoint::Endpoint;
use crate::health::prober::ProbeOutcome;
use crate::health::state::{AlertState, EndpointState, LiveState, Metrics};

/// Aggregate health across all endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

/// Health of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointHealth {
    Healthy,
    Unhealthy,
}

impl From<bool> for EndpointHealth {
    fn from(healthy: bool) -> Self {
        if healthy {
            EndpointHealth::Healthy
        } else {
            EndpointHealth::Unhealthy
        }
    }
}

/// Point-in-time view of every endpoint plus metrics and alert state.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub endpoints: Arc<[Endpoint]>,
    pub states: Vec<EndpointState>,
    pub metrics: Metrics,
    pub alert: AlertState,
    pub alert_threshold: usize,
}

impl Snapshot {
    /// The "no checks run yet" view: every endpoint unhealthy, zero metrics.
    pub fn initial(endpoints: Arc<[Endpoint]>, alert_threshold: usize, now: DateTime<Utc>) -> Self {
        let live = LiveState::new(endpoints.len());
        Self::capture(endpoints, &live, alert_threshold, now)
    }

    /// Copy the live state into a new snapshot.
    pub fn capture(
        endpoints: Arc<[Endpoint]>,
        live: &LiveState,
        alert_threshold: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            generated_at: now,
            endpoints,
            states: live.endpoints.clone(),
            metrics: live.metrics.clone(),
            alert: live.alert,
            alert_threshold,
        }
    }

    /// Endpoints paired with their state, in configured order.
    pub fn entries(&self) -> impl Iterator<Item = (&Endpoint, &EndpointState)> {
        self.endpoints.iter().zip(self.states.iter())
    }

    /// True when at least one endpoint is configured and all are healthy.
    pub fn is_healthy(&self) -> bool {
        !self.states.is_empty() && self.states.iter().all(|s| s.healthy)
    }

    pub fn overall_status(&self) -> OverallStatus {
        if self.is_healthy() {
            OverallStatus::Healthy
        } else {
            OverallStatus::Degraded
        }
    }

    pub fn success_rate(&self) -> f64 {
        self.metrics.success_rate()
    }

    pub fn service_down_detected(&self) -> bool {
        self.metrics.consecutive_failures >= self.alert_threshold
    }

    pub fn unhealthy_count(&self) -> usize {
        self.states.iter().filter(|s| !s.healthy).count()
    }

    /// Look up an endpoint by name or 1-based position.
    pub fn find(&self, selector: &str) -> Option<(&Endpoint, &EndpointState)> {
        self.entries().find(|(endpoint, _)| endpoint.matches(selector))
    }

    /// Health of one endpoint; unknown selectors read as unhealthy.
    pub fn is_endpoint_healthy(&self, selector: &str) -> bool {
        self.find(selector).map(|(_, state)| state.healthy).unwrap_or(false)
    }

    /// Full report served on `/health`.
    pub fn report(&self) -> HealthReport {
        HealthReport {
            timestamp: iso8601(self.generated_at),
            status: self.overall_status(),
            endpoints: EndpointEntries(
                self.entries()
                    .map(|(endpoint, state)| {
                        (
                            endpoint.name.clone(),
                            EndpointEntry {
                                url: endpoint.url.to_string(),
                                status: state.healthy.into(),
                                healthy: state.healthy,
                            },
                        )
                    })
                    .collect(),
            ),
            metrics: MetricsReport {
                total_checks: self.metrics.total_cycles,
                failed_checks: self.metrics.failed_checks,
                success_rate: round2(self.success_rate()),
                consecutive_failures: self.metrics.consecutive_failures,
                last_check_time: iso8601_or_never(self.metrics.last_cycle_at),
            },
            alerts: AlertsReport {
                service_down_detected: self.service_down_detected(),
                last_alert_time: iso8601_or_never(self.alert.last_alert_at),
            },
        }
    }

    /// Compact per-endpoint booleans.
    pub fn summary(&self) -> HealthSummary {
        HealthSummary {
            endpoints: BoolEntries(
                self.entries()
                    .map(|(endpoint, state)| (endpoint.name.clone(), state.healthy))
                    .collect(),
            ),
            all_healthy: self.is_healthy(),
            timestamp: iso8601(self.generated_at),
        }
    }

    /// Detail for one endpoint, if the selector matches.
    pub fn endpoint_report(&self, selector: &str) -> Option<EndpointReport> {
        self.find(selector).map(|(endpoint, state)| EndpointReport {
            endpoint: endpoint.name.clone(),
            position: endpoint.index + 1,
            url: endpoint.url.to_string(),
            status: state.healthy.into(),
            healthy: state.healthy,
            last_checked: iso8601_or_never(state.last_checked),
            outcome: state.last_outcome.clone(),
            latency_ms: state.last_latency_ms,
        })
    }
}

/// Cloneable, lock-free read handle onto the published snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    inner: Arc<ArcSwap<Snapshot>>,
}

impl SnapshotReader {
    pub fn new(inner: Arc<ArcSwap<Snapshot>>) -> Self {
        Self { inner }
    }

    pub fn load(&self) -> Arc<Snapshot> {
        self.inner.load_full()
    }
}

/// JSON body of `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub timestamp: String,
    pub status: OverallStatus,
    pub endpoints: EndpointEntries,
    pub metrics: MetricsReport,
    pub alerts: AlertsReport,
}

/// Endpoint map that serializes in configured order.
#[derive(Debug, Clone)]
pub struct EndpointEntries(pub Vec<(String, EndpointEntry)>);

impl Serialize for EndpointEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ordered_map(&self.0, serializer)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointEntry {
    pub url: String,
    pub status: EndpointHealth,
    pub healthy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub total_checks: u64,
    pub failed_checks: u64,
    pub success_rate: f64,
    pub consecutive_failures: usize,
    pub last_check_time: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertsReport {
    pub service_down_detected: bool,
    pub last_alert_time: String,
}

/// JSON body of `/health/summary`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSummary {
    pub endpoints: BoolEntries,
    pub all_healthy: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct BoolEntries(pub Vec<(String, bool)>);

impl Serialize for BoolEntries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ordered_map(&self.0, serializer)
    }
}

/// JSON body of `/health/{endpoint}`.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointReport {
    pub endpoint: String,
    pub position: usize,
    pub url: String,
    pub status: EndpointHealth,
    pub healthy: bool,
    pub last_checked: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<ProbeOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

fn ordered_map<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut map = serializer.serialize_map(Some(entries.len()))?;
    for (key, value) in entries {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn iso8601_or_never(at: Option<DateTime<Utc>>) -> String {
    at.map(iso8601).unwrap_or_else(|| "never".to_string())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::prober::ProbeResult;
    use chrono::TimeZone;
    use std::time::Duration;
    use url::Url;

    fn endpoints(n: usize) -> Arc<[Endpoint]> {
        (0..n)
            .map(|i| {
                let url = format!("https://prod.example.io/endpoint_{}/health_check", i + 1);
                Endpoint::new(i, format!("endpoint_{}", i + 1), Url::parse(&url).unwrap())
            })
            .collect()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_initial_snapshot_is_degraded_with_zero_metrics() {
        let snapshot = Snapshot::initial(endpoints(3), 3, at(0));
        assert_eq!(snapshot.states.len(), 3);
        assert!(snapshot.states.iter().all(|s| !s.healthy));
        assert_eq!(snapshot.overall_status(), OverallStatus::Degraded);
        assert_eq!(snapshot.metrics, Metrics::default());
        assert!(!snapshot.service_down_detected());

        let json = serde_json::to_value(snapshot.report()).unwrap();
        assert_eq!(json["metrics"]["last_check_time"], "never");
        assert_eq!(json["metrics"]["success_rate"], 100.0);
        assert_eq!(json["alerts"]["last_alert_time"], "never");
    }

    #[test]
    fn test_report_shape() {
        let eps = endpoints(3);
        let mut live = LiveState::new(3);
        live.endpoints[0].apply(&ProbeResult::from_status(0, 200, at(5), Duration::ZERO));
        live.endpoints[1].apply(&ProbeResult::from_status(1, 500, at(5), Duration::ZERO));
        live.endpoints[2].apply(&ProbeResult::from_status(2, 204, at(5), Duration::ZERO));
        live.metrics.record_cycle(1, at(5));
        live.alert.last_alert_at = Some(at(2));

        let snapshot = Snapshot::capture(eps, &live, 3, at(6));
        let json = serde_json::to_value(snapshot.report()).unwrap();

        assert_eq!(json["timestamp"], "2025-10-09T08:53:26Z");
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["endpoints"]["endpoint_1"]["status"], "healthy");
        assert_eq!(json["endpoints"]["endpoint_1"]["healthy"], true);
        assert_eq!(json["endpoints"]["endpoint_2"]["status"], "unhealthy");
        assert_eq!(
            json["endpoints"]["endpoint_3"]["url"],
            "https://prod.example.io/endpoint_3/health_check"
        );
        assert_eq!(json["metrics"]["total_checks"], 1);
        assert_eq!(json["metrics"]["failed_checks"], 1);
        assert_eq!(json["metrics"]["success_rate"], 0.0);
        assert_eq!(json["metrics"]["consecutive_failures"], 1);
        assert_eq!(json["metrics"]["last_check_time"], "2025-10-09T08:53:25Z");
        assert_eq!(json["alerts"]["service_down_detected"], false);
        assert_eq!(json["alerts"]["last_alert_time"], "2025-10-09T08:53:22Z");
    }

    #[test]
    fn test_endpoint_map_keeps_configured_order() {
        let eps: Arc<[Endpoint]> = vec![
            Endpoint::new(0, "zeta", Url::parse("https://z.example/").unwrap()),
            Endpoint::new(1, "alpha", Url::parse("https://a.example/").unwrap()),
        ]
        .into();
        let snapshot = Snapshot::initial(eps, 3, at(0));
        let text = serde_json::to_string(&snapshot.report()).unwrap();
        assert!(text.find("\"zeta\"").unwrap() < text.find("\"alpha\"").unwrap());
    }

    #[test]
    fn test_lookup_by_name_or_position() {
        let mut live = LiveState::new(3);
        live.endpoints[1].healthy = true;
        let snapshot = Snapshot::capture(endpoints(3), &live, 3, at(0));

        assert!(snapshot.is_endpoint_healthy("endpoint_2"));
        assert!(snapshot.is_endpoint_healthy("2"));
        assert!(!snapshot.is_endpoint_healthy("1"));
        assert!(!snapshot.is_endpoint_healthy("missing"));
        assert!(snapshot.endpoint_report("4").is_none());

        let report = snapshot.endpoint_report("endpoint_2").unwrap();
        assert_eq!(report.position, 2);
        assert_eq!(report.status, EndpointHealth::Healthy);
        assert_eq!(report.last_checked, "never");
    }

    #[test]
    fn test_summary() {
        let mut live = LiveState::new(2);
        live.endpoints.iter_mut().for_each(|s| s.healthy = true);
        let snapshot = Snapshot::capture(endpoints(2), &live, 3, at(0));

        let json = serde_json::to_value(snapshot.summary()).unwrap();
        assert_eq!(json["all_healthy"], true);
        assert_eq!(json["endpoints"]["endpoint_1"], true);
        assert_eq!(json["endpoints"]["endpoint_2"], true);
    }

    #[test]
    fn test_service_down_follows_threshold() {
        let mut live = LiveState::new(3);
        live.metrics.record_cycle(2, at(0));
        assert!(!Snapshot::capture(endpoints(3), &live, 3, at(0)).service_down_detected());
        assert!(Snapshot::capture(endpoints(3), &live, 2, at(0)).service_down_detected());
    }
}
