//! Periodic cycle scheduling.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::ScheduleConfig;
use crate::health::aggregator::HealthAggregator;
use crate::health::prober::Probe;

/// Drives an aggregator at a fixed rate until shutdown.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    interval: Duration,
    initial_check: bool,
}

impl Scheduler {
    pub fn new(interval: Duration, initial_check: bool) -> Self {
        Self {
            interval,
            initial_check,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.interval(), config.initial_check)
    }

    /// Run cycles until the shutdown signal fires. Shutdown is observed
    /// between cycles; a running cycle is bounded by its own deadline.
    pub async fn run<P: Probe>(
        self,
        aggregator: Arc<HealthAggregator<P>>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            endpoints = aggregator.endpoints().len(),
            "Health monitor starting"
        );

        if self.initial_check {
            aggregator.run_cycle().await;
        }

        // Fixed rate; a cycle that overruns skips the ticks it missed rather
        // than bursting to catch up.
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    aggregator.run_cycle().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::aggregator::AggregatorSettings;
    use crate::health::alert::AlertPolicy;
    use crate::health::endpoint::Endpoint;
    use crate::health::prober::ProbeResult;
    use crate::lifecycle::Shutdown;
    use chrono::Utc;
    use url::Url;

    struct AlwaysUp;

    impl Probe for AlwaysUp {
        async fn probe(&self, endpoint: &Endpoint) -> ProbeResult {
            ProbeResult::from_status(endpoint.index, 200, Utc::now(), Duration::ZERO)
        }
    }

    fn aggregator() -> Arc<HealthAggregator<AlwaysUp>> {
        let url = Url::parse("https://up.example/health").unwrap();
        let endpoints = vec![Endpoint::new(0, "only", url)];
        let settings = AggregatorSettings {
            max_concurrency: 1,
            cycle_deadline: Duration::from_secs(15),
            alert_policy: AlertPolicy::default(),
        };
        Arc::new(HealthAggregator::new(endpoints, AlwaysUp, settings))
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_check_then_fixed_rate() {
        let aggregator = aggregator();
        let shutdown = Shutdown::new();
        let scheduler = Scheduler::new(Duration::from_secs(30), true);
        let task = tokio::spawn(scheduler.run(aggregator.clone(), shutdown.subscribe()));

        // Let the initial cycle run.
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(aggregator.current_snapshot().metrics.total_cycles, 1);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(aggregator.current_snapshot().metrics.total_cycles, 2);

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(aggregator.current_snapshot().metrics.total_cycles, 4);

        shutdown.trigger();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_initial_check_waits_one_interval() {
        let aggregator = aggregator();
        let shutdown = Shutdown::new();
        let scheduler = Scheduler::new(Duration::from_secs(10), false);
        let task = tokio::spawn(scheduler.run(aggregator.clone(), shutdown.subscribe()));

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(aggregator.current_snapshot().metrics.total_cycles, 0);

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(aggregator.current_snapshot().metrics.total_cycles, 1);

        shutdown.trigger();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_scheduling() {
        let aggregator = aggregator();
        let shutdown = Shutdown::new();
        let scheduler = Scheduler::new(Duration::from_secs(10), true);
        let task = tokio::spawn(scheduler.run(aggregator.clone(), shutdown.subscribe()));

        time::sleep(Duration::from_secs(1)).await;
        shutdown.trigger();
        task.await.unwrap();

        time::sleep(Duration::from_secs(100)).await;
        assert_eq!(aggregator.current_snapshot().metrics.total_cycles, 1);
    }
}
