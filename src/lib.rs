//! Endpoint Sentinel Library
//!
//! Periodic HTTP endpoint health monitoring: probe a fixed set of endpoints
//! on a schedule, aggregate the results into metrics and alerts, and publish
//! an immutable snapshot that the HTTP surface serves as JSON.

// Core subsystems
pub mod config;
pub mod health;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::MonitorConfig;
pub use health::{HealthAggregator, Snapshot, SnapshotReader};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
