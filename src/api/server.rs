//! Axum server for the gateway API.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{ParrotError, Result};
use crate::service::QueryService;

/// Shared state for all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueryService>,
}

impl AppState {
    pub fn new(service: Arc<QueryService>) -> Self {
        Self { service }
    }
}

/// Handler for `GET /` — service info and endpoint map.
async fn service_info(State(_state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/": "GET - service info",
            "/chat": "POST - submit a query",
            "/health": "GET - health check",
            "/cache/stats": "GET - cache statistics",
            "/cache/clear": "DELETE - drop all cached answers",
        }
    }))
}

/// Build the axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(service_info))
        .route("/chat", post(super::routes::chat::chat))
        .route("/health", get(super::routes::health::get_health))
        .route("/cache/stats", get(super::routes::cache::get_stats))
        .route("/cache/clear", delete(super::routes::cache::clear_cache))
        // Queries are short strings; 64 KiB is generous.
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}

/// Bind and serve until the process is stopped.
pub async fn start_server(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParrotError::Internal(format!("cannot bind {addr}: {e}")))?;
    tracing::info!("Gateway listening on {addr}");
    axum::serve(listener, app)
        .await
        .map_err(|e| ParrotError::Internal(format!("server error: {e}")))
}
