use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Serialize;

use crate::health::snapshot::{iso8601, HealthSummary};
use crate::http::response;
use crate::http::server::AppState;

#[derive(Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub started_at: String,
    pub check_interval_secs: u64,
    pub routes: Vec<&'static str>,
    pub endpoints: Vec<MonitoredEndpoint>,
}

#[derive(Serialize)]
pub struct MonitoredEndpoint {
    pub name: String,
    pub url: String,
}

pub async fn get_index(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        started_at: iso8601(state.started_at),
        check_interval_secs: state.check_interval.as_secs(),
        routes: vec!["/health", "/health/summary", "/health/{endpoint}"],
        endpoints: state
            .endpoints
            .iter()
            .map(|e| MonitoredEndpoint {
                name: e.name.clone(),
                url: e.url.to_string(),
            })
            .collect(),
    })
}

pub async fn get_health(State(state): State<AppState>) -> Response {
    let snapshot = state.snapshots.load();
    response::with_health_status(snapshot.is_healthy(), snapshot.report())
}

pub async fn get_summary(State(state): State<AppState>) -> Json<HealthSummary> {
    Json(state.snapshots.load().summary())
}

pub async fn get_endpoint(State(state): State<AppState>, Path(selector): Path<String>) -> Response {
    let snapshot = state.snapshots.load();
    match snapshot.endpoint_report(&selector) {
        Some(report) => response::with_health_status(report.healthy, report),
        None => response::unknown_endpoint(&selector, &snapshot),
    }
}
