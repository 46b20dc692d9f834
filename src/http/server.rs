//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the health handlers
//! - Wire up middleware (request ID, timeout, CORS, tracing)
//! - Bind and serve until shutdown, draining in-flight requests

use axum::{
    http::{HeaderName, Method},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::health::{Endpoint, SnapshotReader};
use crate::http::handlers;

const X_REQUEST_ID: &str = "x-request-id";

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub snapshots: SnapshotReader,
    pub endpoints: Arc<[Endpoint]>,
    pub started_at: DateTime<Utc>,
    pub check_interval: Duration,
}

/// HTTP server exposing the health snapshot.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ServerConfig, state: AppState) -> Self {
        let router = Self::build_router(state, Duration::from_secs(config.request_timeout_secs));
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);
        let cors = CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]);

        Router::new()
            .route("/", get(handlers::get_index))
            .route("/health", get(handlers::get_health))
            .route("/health/summary", get(handlers::get_summary))
            .route("/health/{endpoint}", get(handlers::get_endpoint))
            .with_state(state)
            .layer(cors)
            .layer(TimeoutLayer::new(request_timeout))
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    /// The router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind a listener for `address`.
    pub async fn bind(address: &str) -> Result<TcpListener, ServeError> {
        TcpListener::bind(address).await.map_err(|source| ServeError::Bind {
            address: address.to_string(),
            source,
        })
    }

    /// Serve until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServeError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
