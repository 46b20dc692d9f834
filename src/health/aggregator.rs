//! Health aggregation.
//!
//! # Responsibilities
//! - Own the monitored endpoint set and its live state
//! - Fan out one probe per endpoint per cycle on a bounded worker pool
//! - Fold results into metrics, evaluate the alert policy, publish a snapshot
//!
//! # Cycle
//! ```text
//! run_cycle()
//!     → lock live state (one cycle at a time)
//!     → spawn probes, join under the cycle deadline
//!     → apply results, update metrics
//!     → threshold + cooldown → AlertSink
//!     → publish Snapshot (ArcSwap store)
//! ```
//!
//! # Design Decisions
//! - A probe failure is data, never an error; nothing here aborts a cycle
//! - Stragglers past the deadline are recorded as failed and aborted so they
//!   stop holding a worker slot
//! - A probe still queued for a worker at the deadline never ran; it is
//!   skipped, keeps its previous state and does not count as a failure
//! - Readers load the last published snapshot and never wait on a cycle

use arc_swap::ArcSwap;
use futures_util::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{timeout_at, Instant};
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::health::alert::{
    AlertEvent, AlertPolicy, AlertSink, FanoutAlertSink, LogAlertSink, WebhookAlertSink,
};
use crate::health::clock::{Clock, SystemClock};
use crate::health::endpoint::Endpoint;
use crate::health::prober::{HttpProber, Probe, ProbeResult};
use crate::health::snapshot::{Snapshot, SnapshotReader};
use crate::health::state::LiveState;
use crate::observability::metrics;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while assembling an aggregator from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no endpoints configured")]
    NoEndpoints,

    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Tunables for a single aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// Probes allowed in flight at once.
    pub max_concurrency: usize,
    /// How long a cycle waits for its probes.
    pub cycle_deadline: Duration,
    pub alert_policy: AlertPolicy,
}

impl AggregatorSettings {
    pub fn from_config(config: &MonitorConfig, endpoint_count: usize) -> Self {
        Self {
            max_concurrency: config.schedule.max_concurrency.unwrap_or(endpoint_count).max(1),
            cycle_deadline: config.probe.read_timeout()
                + Duration::from_secs(config.schedule.deadline_grace_secs),
            alert_policy: AlertPolicy::new(config.alerting.threshold, config.alerting.cooldown()),
        }
    }
}

/// Outcome of one completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    pub total: usize,
    pub failed: usize,
    /// Endpoints still waiting for a worker when the deadline passed.
    pub skipped: usize,
    /// Alert emitted by this cycle, if any.
    pub alert: Option<AlertEvent>,
    pub elapsed: Duration,
    /// Snapshot published at the end of the cycle.
    pub snapshot: Arc<Snapshot>,
}

/// Owns the monitored set and produces snapshots.
pub struct HealthAggregator<P: Probe = HttpProber> {
    endpoints: Arc<[Endpoint]>,
    prober: Arc<P>,
    workers: Arc<Semaphore>,
    cycle_deadline: Duration,
    policy: AlertPolicy,
    clock: Arc<dyn Clock>,
    alerts: Arc<dyn AlertSink>,
    live: Mutex<LiveState>,
    published: Arc<ArcSwap<Snapshot>>,
}

impl HealthAggregator<HttpProber> {
    /// Build an HTTP-probing aggregator with log (and optional webhook) alerting.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, BuildError> {
        let endpoints = Endpoint::from_configs(&config.endpoints)?;
        if endpoints.is_empty() {
            return Err(BuildError::NoEndpoints);
        }

        let prober = HttpProber::new(&config.probe)?;
        let settings = AggregatorSettings::from_config(config, endpoints.len());

        let mut sink = FanoutAlertSink::new().with(Arc::new(LogAlertSink));
        if let Some(url) = &config.alerting.webhook_url {
            let client = reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
            sink = sink.with(Arc::new(WebhookAlertSink::new(client, url.clone())));
        }

        Ok(Self::new(endpoints, prober, settings).with_alert_sink(Arc::new(sink)))
    }
}

impl<P: Probe> HealthAggregator<P> {
    pub fn new(endpoints: Vec<Endpoint>, prober: P, settings: AggregatorSettings) -> Self {
        let endpoints: Arc<[Endpoint]> = endpoints.into();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let threshold = settings.alert_policy.threshold;
        let initial = Snapshot::initial(endpoints.clone(), threshold, clock.now());

        Self {
            live: Mutex::new(LiveState::new(endpoints.len())),
            published: Arc::new(ArcSwap::from_pointee(initial)),
            endpoints,
            prober: Arc::new(prober),
            workers: Arc::new(Semaphore::new(settings.max_concurrency.max(1))),
            cycle_deadline: settings.cycle_deadline,
            policy: settings.alert_policy,
            clock,
            alerts: Arc::new(LogAlertSink),
        }
    }

    /// Replace the time source. Resets the pre-cycle snapshot timestamp.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        let initial = Snapshot::initial(self.endpoints.clone(), self.policy.threshold, clock.now());
        self.published.store(Arc::new(initial));
        self.clock = clock;
        self
    }

    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alerts = sink;
        self
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn alert_policy(&self) -> AlertPolicy {
        self.policy
    }

    /// Latest published snapshot. Never triggers a cycle.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.published.load_full()
    }

    /// Health of one endpoint by name or 1-based position, per the latest snapshot.
    pub fn individual_status(&self, selector: &str) -> bool {
        self.published.load().is_endpoint_healthy(selector)
    }

    /// Cloneable read handle for consumers that outlive a borrow.
    pub fn snapshots(&self) -> SnapshotReader {
        SnapshotReader::new(self.published.clone())
    }

    /// Run one full check cycle. Concurrent callers are serialized.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut live = self.live.lock().await;
        let started = Instant::now();
        let deadline = started + self.cycle_deadline;

        let mut handles = Vec::with_capacity(self.endpoints.len());
        let mut running = Vec::with_capacity(self.endpoints.len());
        for endpoint in self.endpoints.iter() {
            let prober = Arc::clone(&self.prober);
            let workers = Arc::clone(&self.workers);
            let endpoint = endpoint.clone();
            let has_worker = Arc::new(AtomicBool::new(false));
            running.push(has_worker.clone());
            handles.push(tokio::spawn(async move {
                // The semaphore is never closed; a failed acquire only
                // means running unthrottled.
                let _permit = workers.acquire_owned().await.ok();
                has_worker.store(true, Ordering::SeqCst);
                prober.probe(&endpoint).await
            }));
        }
        let aborts: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        let joined = join_all(handles.into_iter().map(|h| timeout_at(deadline, h))).await;
        let now = self.clock.now();

        // `None` marks an endpoint that never got a worker.
        let results: Vec<Option<ProbeResult>> = joined
            .into_iter()
            .zip(self.endpoints.iter())
            .zip(aborts.iter().zip(&running))
            .map(|((joined, endpoint), (abort, has_worker))| match joined {
                Ok(Ok(result)) => Some(result),
                Ok(Err(e)) => {
                    tracing::error!(endpoint = %endpoint.name, error = %e, "Probe task failed");
                    let reason = format!("probe task failed: {}", e);
                    Some(ProbeResult::failed(endpoint.index, reason, now, started.elapsed()))
                }
                Err(_) if !has_worker.load(Ordering::SeqCst) => {
                    abort.abort();
                    tracing::warn!(
                        endpoint = %endpoint.name,
                        "Probe skipped: no worker free before cycle deadline"
                    );
                    None
                }
                Err(_) => {
                    abort.abort();
                    tracing::warn!(
                        endpoint = %endpoint.name,
                        deadline_secs = self.cycle_deadline.as_secs(),
                        "Probe exceeded cycle deadline"
                    );
                    let reason = "cycle deadline exceeded";
                    Some(ProbeResult::failed(endpoint.index, reason, now, self.cycle_deadline))
                }
            })
            .collect();

        let skipped = results.iter().filter(|r| r.is_none()).count();
        let failed = results.iter().flatten().filter(|r| !r.healthy).count();
        for (state, result) in live.endpoints.iter_mut().zip(&results) {
            if let Some(result) = result {
                state.apply(result);
            }
        }
        live.metrics.record_cycle(failed, now);
        let cycle = live.metrics.total_cycles;

        let alert = if self.policy.should_fire(failed, live.alert.last_alert_at, now) {
            live.alert.last_alert_at = Some(now);
            let event = AlertEvent {
                id: Uuid::new_v4(),
                fired_at: now,
                cycle,
                failed_count: failed,
                total_endpoints: self.endpoints.len(),
                failed_endpoints: results
                    .iter()
                    .flatten()
                    .filter(|r| !r.healthy)
                    .map(|r| self.endpoints[r.endpoint].name.clone())
                    .collect(),
            };
            self.alerts.notify(&event);
            metrics::record_alert();
            Some(event)
        } else {
            if self.policy.is_breached(failed) {
                tracing::info!(cycle, failed, "Alert suppressed: cooldown active");
            }
            None
        };

        let snapshot = Arc::new(Snapshot::capture(
            self.endpoints.clone(),
            &live,
            self.policy.threshold,
            now,
        ));
        self.published.store(snapshot.clone());
        drop(live);

        let elapsed = started.elapsed();
        let success_rate = (snapshot.success_rate() * 100.0).round() / 100.0;
        metrics::record_cycle(&snapshot, failed, elapsed);
        tracing::info!(
            cycle,
            total = results.len(),
            failed,
            skipped,
            consecutive_failures = snapshot.metrics.consecutive_failures,
            success_rate,
            status = ?snapshot.overall_status(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Check cycle completed"
        );

        CycleReport {
            cycle,
            total: results.len(),
            failed,
            skipped,
            alert,
            elapsed,
            snapshot,
        }
    }
}
