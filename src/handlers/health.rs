use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use sea_orm::{ConnectionTrait, Statement};
use serde_json::{Value, json};
use tracing::{error, trace};

use crate::schemas::{AppState, HealthResponse};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    trace!("Entering health_check function");

    let ping = state
        .db
        .execute(Statement::from_string(
            state.db.get_database_backend(),
            "SELECT 1".to_string(),
        ))
        .await;

    match ping {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                database: "connected".to_string(),
            }),
        ),
        Err(e) => {
            error!("Database health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    database: "disconnected".to_string(),
                }),
            )
        }
    }
}

/// Discovery document listing the top-level API collections.
pub async fn api_root() -> Json<Value> {
    Json(json!({
        "message": "Placement Tracking API",
        "endpoints": {
            "auth": "/api/auth/",
            "students": "/api/students/",
            "companies": "/api/companies/",
            "stages": "/api/stages/",
            "placement_progress": "/api/placement-progress/",
            "stage_progress": "/api/stage-progress/",
            "important_dates": "/api/important-dates/",
            "documentation": "/swagger-ui",
            "health": "/health"
        }
    }))
}

/// Browsers ask for this unprompted; answer without a body.
pub async fn favicon() -> StatusCode {
    StatusCode::NO_CONTENT
}
