//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → handed to the aggregator, scheduler and HTTP surface at startup
//! ```
//!
//! # Design Decisions
//! - Config is static for the lifetime of the process
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A bad config is the only fatal error; it fails before scheduling starts

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AlertingConfig, EndpointConfig, LogFormat, MonitorConfig, ObservabilityConfig, ProbeConfig,
    ScheduleConfig, ServerConfig,
};
pub use validation::{validate_config, ValidationError};
