//! Observability HTTP Routes
//!
//! Health check and counters.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use crate::catalog::CatalogStats;

use super::errors::ApiResult;
use super::server::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub catalog: CatalogStats,
}

pub fn observability_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
}

async fn health_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog: state.catalog.stats()?,
    };

    Ok((StatusCode::OK, Json(response)))
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.metrics.snapshot()))
}
