use axum::{extract::State, Json};
use tracing::warn;

use crate::models::{AppState, HealthResponse};

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.metadata.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            warn!("Health check could not reach the metadata store: {:#}", e);
            "unavailable"
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database: database.to_string(),
    })
}
