use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    models::{DatabaseHealth, HealthResponse},
    AppState,
};

/// Health check endpoint
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database is unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    debug!("Health check requested");

    let database = match state.db.ping().await {
        Ok(()) => DatabaseHealth {
            connected: true,
            message: "Database connection successful".to_string(),
        },
        Err(e) => {
            warn!("Health check could not reach the database: {}", e);
            DatabaseHealth {
                connected: false,
                message: format!("Database connection failed: {}", e),
            }
        }
    };

    let (status, label) = if database.connected {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let response = HealthResponse {
        status: label.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        database,
    };

    (status, Json(response))
}
