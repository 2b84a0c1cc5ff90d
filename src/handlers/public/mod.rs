// handlers/public/mod.rs - Unauthenticated endpoints

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET / - Service descriptor
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Project Service API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health (public)",
            "projects": "/projects/, /projects/:project_id, /projects/:project_id/sources (protected)",
            "configs": "/projects/configs/, /projects/configs/by-project/:project_id, /projects/configs/:config_id/fields (protected)",
        }
    }))
}

/// GET /health - Liveness plus storage reachability
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.stores.health_check().await.map_err(|e| {
        tracing::warn!("Health check failed: {}", e);
        ApiError::service_unavailable(format!("database unavailable: {}", e))
    })?;

    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "database": "ok"
    })))
}
