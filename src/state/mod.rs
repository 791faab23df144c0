use std::sync::Arc;

use crate::{classifier::PriorityClassifier, config::AppConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub classifier: Arc<PriorityClassifier>,
}

impl AppState {
    pub fn new(config: AppConfig, classifier: PriorityClassifier) -> Self {
        Self {
            config: Arc::new(config),
            classifier: Arc::new(classifier),
        }
    }
}
