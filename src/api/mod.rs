//! HTTP transport for the gateway.
//!
//! Thin wiring over [`crate::service::QueryService`]: route handlers parse
//! and serialize, the service decides. Error statuses follow the service's
//! taxonomy — only `InvalidInput` maps to a client error; store and provider
//! degradations never reach here as errors.

pub mod routes;
pub mod server;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::ParrotError;

impl IntoResponse for ParrotError {
    fn into_response(self) -> Response {
        let status = match self {
            ParrotError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_maps_to_400() {
        let response = ParrotError::InvalidInput("query cannot be empty".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_other_errors_map_to_500() {
        let response = ParrotError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
