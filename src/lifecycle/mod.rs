//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → wait_for_shutdown() returns
//!
//! Shutdown (shutdown.rs):
//!     trigger() → scheduler loop exits
//!               → HTTP server stops accepting, drains in-flight requests
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the stop signal out to every long-running task
//! - The scheduler stops between cycles; a cycle still running after a short
//!   grace is aborted and its probes abandoned

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown;
