//! API route handlers

pub mod fixed_rate;
pub mod health;
pub mod node;

use axum::{http::StatusCode, routing::get, Json, Router};
use fixrate_core::ProtocolError;

use crate::dto::ApiError;
use crate::AppState;

/// Handler result: JSON body or an error status with `{code, message}`
pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/node", node::router())
        .nest("/fixed-rate", fixed_rate::router())
        .with_state(state)
}

pub(crate) fn protocol_error(e: ProtocolError) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ApiError::from(&e)),
    )
}
