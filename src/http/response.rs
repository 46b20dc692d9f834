//! Response status mapping and error bodies.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::health::Snapshot;

/// 200 when healthy, 503 otherwise.
pub fn health_status(healthy: bool) -> StatusCode {
    if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Serialize `body` with the health-derived status code.
pub fn with_health_status<T: Serialize>(healthy: bool, body: T) -> Response {
    (health_status(healthy), Json(body)).into_response()
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<String>,
}

/// 404 for a selector that names no monitored endpoint.
pub fn unknown_endpoint(selector: &str, snapshot: &Snapshot) -> Response {
    let body = ErrorBody {
        error: format!("unknown endpoint: {}", selector),
        available: snapshot.endpoints.iter().map(|e| e.name.clone()).collect(),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
