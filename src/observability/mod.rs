//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for log shippers)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Metric updates are no-ops until a recorder is installed
//! - `RUST_LOG` overrides the configured log level

pub mod logging;
pub mod metrics;
