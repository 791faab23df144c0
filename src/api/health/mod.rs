use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{schema::HealthResponse, state::AppState};

pub async fn health_check(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let classifier = &app_state.classifier;
    Json(HealthResponse {
        status: classifier.status(),
        model_loaded: classifier.model_loaded(),
        strategy: classifier.active_strategy().to_string(),
        timestamp: chrono::Utc::now(),
    })
}
