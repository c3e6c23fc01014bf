use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthData {
    pub message: String,
    pub status: String,
    pub storage: String,
    pub backend: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and storage are up", body = HealthData),
        (status = 503, description = "Storage is unreachable", body = HealthData),
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthData>) {
    let backend = state.store.backend().to_string();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthData {
                message: "Health check".to_string(),
                status: "ok".to_string(),
                storage: "up".to_string(),
                backend,
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "storage ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData {
                    message: err.to_string(),
                    status: "degraded".to_string(),
                    storage: "down".to_string(),
                    backend,
                }),
            )
        }
    }
}
