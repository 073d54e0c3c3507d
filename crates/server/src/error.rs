use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coin_dashboard_core::errors::CoreError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Coin not found")]
    NotFound,

    #[error("Unable to fetch price")]
    Upstream(String),
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::CoinNotFound(_) => ApiError::NotFound,
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Coin not found" })),
            )
                .into_response(),
            ApiError::Upstream(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Unable to fetch price", "details": details })),
            )
                .into_response(),
        }
    }
}
