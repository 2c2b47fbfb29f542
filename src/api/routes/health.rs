//! Health route.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::api::server::AppState;

/// GET /health — liveness plus store reachability.
///
/// Always returns 200: the gateway keeps answering (uncached) when the store
/// is down, so a down store degrades rather than fails the probe. The
/// generation provider is never touched here.
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let store_reachable = state.service.store_reachable().await;
    Json(json!({
        "status": if store_reachable { "healthy" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": {
            "backend": state.service.store_name(),
            "reachable": store_reachable,
        }
    }))
}
