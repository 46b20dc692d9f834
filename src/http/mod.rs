//! HTTP reporting surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, CORS, tracing)
//!     → handlers.rs (load the published snapshot, pick a view)
//!     → response.rs (status code mapping, error bodies)
//!     → Send to client
//! ```
//!
//! Handlers only read snapshots; they never trigger or wait on a check cycle.

pub mod handlers;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer, ServeError};
