//! Outage alerting.
//!
//! # Responsibilities
//! - Decide whether a completed cycle warrants an alert (threshold + cooldown)
//! - Describe the outage as an [`AlertEvent`]
//! - Hand events to pluggable sinks (log line, broadcast channel, webhook)
//!
//! # Design Decisions
//! - Cooldown is measured from the last alert that actually fired; suppressed
//!   cycles do not extend it
//! - Sinks must not block the cycle; network delivery is spawned

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Threshold and cooldown governing alert emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    /// Unhealthy endpoints in one cycle needed to alert.
    pub threshold: usize,
    /// Minimum time between two alerts.
    pub cooldown: Duration,
}

impl AlertPolicy {
    pub fn new(threshold: usize, cooldown: Duration) -> Self {
        Self { threshold, cooldown }
    }

    pub fn is_breached(&self, failures: usize) -> bool {
        failures >= self.threshold
    }

    pub fn should_fire(
        &self,
        failures: usize,
        last_alert: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.is_breached(failures) {
            return false;
        }
        match last_alert {
            None => true,
            // A clock that stepped backwards reads as "still cooling down".
            Some(last) => now
                .signed_duration_since(last)
                .to_std()
                .map(|elapsed| elapsed >= self.cooldown)
                .unwrap_or(false),
        }
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(300))
    }
}

/// A service-down alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub fired_at: DateTime<Utc>,
    pub cycle: u64,
    pub failed_count: usize,
    pub total_endpoints: usize,
    pub failed_endpoints: Vec<String>,
}

impl AlertEvent {
    pub fn summary(&self) -> String {
        format!(
            "SERVICE DOWN: {}/{} endpoints unhealthy ({})",
            self.failed_count,
            self.total_endpoints,
            self.failed_endpoints.join(", ")
        )
    }
}

/// Receiver of alert events.
pub trait AlertSink: Send + Sync {
    fn notify(&self, event: &AlertEvent);
}

/// Writes alerts to the log at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn notify(&self, event: &AlertEvent) {
        tracing::error!(
            alert_id = %event.id,
            cycle = event.cycle,
            failed = event.failed_count,
            total = event.total_endpoints,
            endpoints = ?event.failed_endpoints,
            "ALERT: service down detected"
        );
    }
}

/// Publishes alerts on a broadcast channel for in-process relays.
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    tx: broadcast::Sender<AlertEvent>,
}

impl ChannelAlertSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.tx.subscribe()
    }
}

impl AlertSink for ChannelAlertSink {
    fn notify(&self, event: &AlertEvent) {
        // No subscribers is not an error.
        let _ = self.tx.send(event.clone());
    }
}

/// POSTs alerts as JSON to a webhook. Delivery is fire-and-forget.
#[derive(Debug, Clone)]
pub struct WebhookAlertSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookAlertSink {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl AlertSink for WebhookAlertSink {
    fn notify(&self, event: &AlertEvent) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(url = %self.url, "No runtime available, alert webhook skipped");
            return;
        };

        let client = self.client.clone();
        let url = self.url.clone();
        let payload = serde_json::json!({
            "text": event.summary(),
            "event": event,
        });

        handle.spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(res) if res.status().is_success() => {
                    tracing::debug!(url = %url, "Alert webhook delivered");
                }
                Ok(res) => {
                    tracing::warn!(url = %url, status = %res.status(), "Alert webhook rejected");
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Alert webhook failed");
                }
            }
        });
    }
}

/// Forwards every alert to each inner sink in order.
#[derive(Default, Clone)]
pub struct FanoutAlertSink {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl FanoutAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl AlertSink for FanoutAlertSink {
    fn notify(&self, event: &AlertEvent) {
        for sink in &self.sinks {
            sink.notify(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> AlertEvent {
        AlertEvent {
            id: Uuid::new_v4(),
            fired_at: Utc::now(),
            cycle: 4,
            failed_count: 3,
            total_endpoints: 3,
            failed_endpoints: vec!["a".into(), "b".into(), "c".into()],
        }
    }

    #[test]
    fn test_below_threshold_never_fires() {
        let policy = AlertPolicy::new(3, Duration::from_secs(300));
        assert!(!policy.should_fire(2, None, Utc::now()));
        assert!(!policy.should_fire(0, None, Utc::now()));
    }

    #[test]
    fn test_first_breach_fires() {
        let policy = AlertPolicy::new(3, Duration::from_secs(300));
        assert!(policy.should_fire(3, None, Utc::now()));
        assert!(policy.should_fire(5, None, Utc::now()));
    }

    #[test]
    fn test_cooldown_suppresses_until_elapsed() {
        let policy = AlertPolicy::new(1, Duration::from_secs(300));
        let last = Utc::now();

        assert!(!policy.should_fire(1, Some(last), last + chrono::Duration::seconds(299)));
        assert!(policy.should_fire(1, Some(last), last + chrono::Duration::seconds(300)));
        assert!(policy.should_fire(1, Some(last), last + chrono::Duration::seconds(900)));
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let sink = ChannelAlertSink::new(4);
        let mut rx = sink.subscribe();
        let event = event();

        sink.notify(&event);
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_fanout_reaches_every_sink() {
        let first = Arc::new(ChannelAlertSink::new(4));
        let second = Arc::new(ChannelAlertSink::new(4));
        let mut rx1 = first.subscribe();
        let mut rx2 = second.subscribe();

        let fanout = FanoutAlertSink::new()
            .with(first.clone())
            .with(second.clone())
            .with(Arc::new(LogAlertSink));
        assert_eq!(fanout.len(), 3);

        fanout.notify(&event());
        assert_eq!(rx1.recv().await.unwrap().failed_count, 3);
        assert_eq!(rx2.recv().await.unwrap().cycle, 4);
    }

    #[test]
    fn test_summary_lists_failed_endpoints() {
        assert_eq!(event().summary(), "SERVICE DOWN: 3/3 endpoints unhealthy (a, b, c)");
    }
}
