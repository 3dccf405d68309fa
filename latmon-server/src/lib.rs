use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use latmon_common::{ErrorResponse, MetricsRequest, MAX_REGIONS_PER_REQUEST};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

pub mod config;
pub mod stats;
pub mod store;

use config::MAX_BODY_SIZE;
use stats::compute_stats;
use store::TelemetryStore;

/// Shared request-handling state. The store is built once at startup and
/// never mutated, so clones share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TelemetryStore>,
}

impl AppState {
    pub fn new(store: Arc<TelemetryStore>) -> Self {
        Self { store }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
    /// JSON file holding the telemetry records; `None` starts an empty store.
    pub data_path: Option<PathBuf>,
}

/// Latmon Server
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Get the server's configured address
    pub fn address(&self) -> SocketAddr {
        self.config.address
    }

    /// Create the application router with the given state.
    /// The dashboard frontend is served from another origin and only POSTs,
    /// so CORS admits any origin for POST.
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/api/metrics", post(handle_metrics))
            .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([Method::POST])
                    .allow_headers(Any),
            )
            .with_state(state)
    }

    /// Run the server, signalling `ready_tx` with the bound address once accepting connections
    pub async fn run(self, ready_tx: tokio::sync::oneshot::Sender<SocketAddr>) -> Result<(), Box<dyn std::error::Error>> {
        let store = match &self.config.data_path {
            Some(path) => TelemetryStore::load_from_file(path),
            None => TelemetryStore::default(),
        };
        if store.is_empty() {
            tracing::warn!("no telemetry loaded, all regions will report as absent");
        } else {
            tracing::info!(
                records = store.record_count(),
                dropped = store.dropped_count(),
                "telemetry store built"
            );
        }

        let state = AppState::new(Arc::new(store));
        let app = Self::create_router(state);
        let listener = tokio::net::TcpListener::bind(self.config.address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "listening");
        ready_tx.send(local_addr).ok();
        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: message.into() })).into_response()
}

/// Handler for POST /api/metrics — aggregates the requested regions against
/// the loaded telemetry and returns one entry per region, `null` where no
/// telemetry exists. Malformed bodies are rejected here; the aggregation
/// itself cannot fail.
pub async fn handle_metrics(
    State(state): State<AppState>,
    payload: Result<Json<MetricsRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", rejection))
        }
    };

    if request.regions.len() > MAX_REGIONS_PER_REQUEST {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Request exceeds maximum of {} regions", MAX_REGIONS_PER_REQUEST),
        );
    }

    tracing::debug!(
        regions = request.regions.len(),
        threshold_ms = request.threshold_ms,
        "metrics query"
    );

    let report = compute_stats(&state.store, &request.regions, request.threshold_ms);
    (StatusCode::OK, Json(report)).into_response()
}
