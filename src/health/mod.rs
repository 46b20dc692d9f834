//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Scheduler (scheduler.rs):
//!     Fixed-rate ticker
//!     → HealthAggregator::run_cycle
//!
//! Cycle (aggregator.rs):
//!     Fan out one probe per endpoint (prober.rs), bounded worker pool
//!     → Join under the cycle deadline
//!     → Fold results into live state (state.rs)
//!     → Evaluate alert policy (alert.rs)
//!     → Publish an immutable Snapshot (snapshot.rs)
//!
//! Readers (HTTP handlers, CLI):
//!     SnapshotReader::load → report / summary / endpoint view
//! ```
//!
//! # Design Decisions
//! - Probes never fail a cycle: transport errors become unhealthy results
//! - One cycle at a time; overlapping callers queue behind the live-state lock
//! - Readers never block on a running cycle (copy-on-publish via arc-swap)

pub mod aggregator;
pub mod alert;
pub mod clock;
pub mod endpoint;
pub mod prober;
pub mod scheduler;
pub mod snapshot;
pub mod state;

pub use aggregator::{AggregatorSettings, BuildError, CycleReport, HealthAggregator};
pub use alert::{
    AlertEvent, AlertPolicy, AlertSink, ChannelAlertSink, FanoutAlertSink, LogAlertSink,
    WebhookAlertSink,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use endpoint::Endpoint;
pub use prober::{HttpProber, Probe, ProbeOutcome, ProbeResult};
pub use scheduler::Scheduler;
pub use snapshot::{EndpointHealth, OverallStatus, Snapshot, SnapshotReader};
