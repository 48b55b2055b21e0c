//! REST API endpoints.
//!
//! Axum-based HTTP API for managing users and sleep records and for
//! querying derived statistics and generated advice.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::advice::AdviceError;
use crate::service::ServiceError;

pub mod routes;
pub mod state;

use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Conflict(msg) => ApiError::Conflict(msg),
            ServiceError::InvalidInput(msg) => ApiError::BadRequest(msg),
            ServiceError::Upstream(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<AdviceError> for ApiError {
    fn from(err: AdviceError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/users",
            post(routes::users::register_user).get(routes::users::list_users),
        )
        .route(
            "/api/users/by-nickname/:nickname",
            get(routes::users::get_user_by_nickname),
        )
        .route(
            "/api/users/:id",
            get(routes::users::get_user).delete(routes::users::delete_user),
        )
        .route("/api/records", post(routes::records::create_record))
        .route(
            "/api/records/list/:user_id",
            get(routes::records::list_records),
        )
        .route(
            "/api/records/by-date/:user_id/:sleep_date",
            get(routes::records::get_record_by_date),
        )
        .route(
            "/api/records/:id",
            get(routes::records::get_record)
                .put(routes::records::update_record)
                .delete(routes::records::delete_record),
        )
        .route("/api/stats/recent/:user_id", get(routes::stats::recent_stats))
        .route(
            "/api/stats/weekday-avg/:user_id",
            get(routes::stats::weekday_averages),
        )
        .route("/api/advice", post(routes::advice::generate_advice))
        .with_state(state)
}

/// Build a CORS layer from the configured origin. `*` allows any origin.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let origin = origin.trim();
    if origin == "*" {
        return CorsLayer::permissive();
    }

    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            tracing::warn!("Invalid cors_origin {:?}, falling back to permissive", origin);
            CorsLayer::permissive()
        }
    }
}
