use std::{any::Any, sync::Arc};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{error::AppError, state::AppState};

pub mod health;
pub mod predict;

pub fn router(shared_state: Arc<AppState>) -> Router {
    let body_limit = shared_state.config.max_body_bytes;

    let routes = Router::new()
        .route(
            "/predict",
            post(predict::predict_priority).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/health", get(health::health_check))
        .with_state(shared_state);

    with_middleware(routes)
}

/// Wraps routes so a panicking handler still answers with a JSON 500.
fn with_middleware(routes: Router) -> Router {
    routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}
