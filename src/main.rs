use std::sync::Arc;

use log::{info, warn};
use priority_classifier::{
    api,
    classifier::{PriorityClassifier, PriorityStrategy, model::ModelStrategy, rules::RuleStrategy},
    config::AppConfig,
    state::AppState,
};
use tokio::{net::TcpListener, signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = AppConfig::from_env()?;

    info!("Starting priority classifier with config:");
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);
    info!("  Model path: {:?}", config.model_path);
    info!(
        "  Rule thresholds: High below {}h, Medium below {}h",
        config.thresholds.high_below_hours, config.thresholds.medium_below_hours
    );
    info!("  Max body bytes: {}", config.max_body_bytes);

    let model = load_model(&config.model_path);
    let classifier = PriorityClassifier::new(model, RuleStrategy::new(config.thresholds));
    info!(
        "Classifier status: {:?} (strategy: {})",
        classifier.status(),
        classifier.active_strategy()
    );

    let shared_state = Arc::new(AppState::new(config.clone(), classifier));
    let app = api::router(shared_state);

    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address).await?;
    info!("Server starting on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Loads the model once; any failure leaves the service on the rules.
fn load_model(path: &str) -> Option<Arc<dyn PriorityStrategy>> {
    if path.is_empty() {
        info!("MODEL_PATH is empty, using rule-based priorities only");
        return None;
    }
    match ModelStrategy::from_path(path) {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            warn!("Model package not loaded, using fallback rules: {}", e);
            None
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
