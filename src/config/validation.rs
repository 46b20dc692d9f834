//! Configuration validation.
//!
//! Serde handles syntax; this pass checks semantics and returns every
//! problem it finds rather than stopping at the first one. It runs before
//! the config is accepted into the system.

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::MonitorConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no endpoints configured")]
    NoEndpoints,

    #[error("endpoint #{index} has an empty name")]
    BlankName { index: usize },

    #[error("duplicate endpoint name '{name}'")]
    DuplicateName { name: String },

    #[error("endpoint name '{name}' is all digits and would clash with positional lookup")]
    NumericName { name: String },

    #[error("endpoint '{name}' has an invalid url '{url}': {reason}")]
    InvalidUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    }

    let mut seen = HashSet::new();
    for (index, endpoint) in config.endpoints.iter().enumerate() {
        let name = endpoint.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::BlankName { index });
        } else if name.bytes().all(|b| b.is_ascii_digit()) {
            errors.push(ValidationError::NumericName {
                name: name.to_string(),
            });
        } else if !seen.insert(name) {
            errors.push(ValidationError::DuplicateName {
                name: name.to_string(),
            });
        }

        if let Err(reason) = check_http_url(&endpoint.url) {
            errors.push(ValidationError::InvalidUrl {
                name: endpoint.name.clone(),
                url: endpoint.url.clone(),
                reason,
            });
        }
    }

    let nonzero = [
        ("probe.connect_timeout_secs", config.probe.connect_timeout_secs),
        ("probe.read_timeout_secs", config.probe.read_timeout_secs),
        ("schedule.interval_secs", config.schedule.interval_secs),
        ("server.request_timeout_secs", config.server.request_timeout_secs),
        ("alerting.threshold", config.alerting.threshold as u64),
    ];
    for (field, value) in nonzero {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }
    if config.schedule.max_concurrency == Some(0) {
        errors.push(ValidationError::Zero {
            field: "schedule.max_concurrency",
        });
    }

    if config.server.enabled {
        check_socket_addr("server.bind_address", &config.server.bind_address, &mut errors);
    }
    if config.observability.metrics_enabled {
        check_socket_addr(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if let Some(webhook) = &config.alerting.webhook_url {
        if let Err(reason) = check_http_url(webhook) {
            errors.push(ValidationError::InvalidUrl {
                name: "alerting.webhook_url".to_string(),
                url: webhook.clone(),
                reason,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(url)
}

fn check_socket_addr(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
