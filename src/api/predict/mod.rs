use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use chrono::Local;
use log::info;
use serde_json::Value;

use crate::{
    error::AppError,
    models::TaskFeatures,
    schema::{PredictRequest, PredictResponse},
    state::AppState,
};

pub async fn predict_priority(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    let Json(body) = payload?;
    if !body.is_object() {
        return Err(AppError::bad_request("request body must be a JSON object"));
    }
    let req: PredictRequest = serde_json::from_value(body).map_err(AppError::bad_request)?;

    let features = TaskFeatures::from_request(req, &Local::now())?;
    let result = app_state.classifier.classify(&features);

    info!(
        "Prediction: {} (category={:?}, urgency={:?}, deadline_hours={}, strategy={})",
        result.priority,
        features.category,
        features.urgency,
        features.deadline_hours,
        result.strategy
    );
    Ok(Json(PredictResponse {
        priority: result.priority,
    }))
}
