//! Cache administration routes.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::api::server::AppState;
use crate::error::ParrotError;
use crate::service::CacheReport;

/// GET /cache/stats — store counters and hit rate.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CacheReport>, ParrotError> {
    Ok(Json(state.service.cache_report().await?))
}

/// DELETE /cache/clear — drop every cached answer.
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ParrotError> {
    state.service.clear_cache().await?;
    Ok(Json(json!({ "message": "cache cleared" })))
}
