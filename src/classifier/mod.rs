use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    models::TaskFeatures,
    schema::{Priority, ServiceStatus},
};

pub mod encoder;
pub mod forest;
pub mod model;
pub mod rules;

use rules::RuleStrategy;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("{encoder} {label:?} is unseen and so is its substitute {substitute:?}")]
    UnseenLabel {
        encoder: &'static str,
        label: String,
        substitute: String,
    },

    #[error("code {code} is outside the {encoder} encoder's {len} classes")]
    UnknownCode {
        encoder: &'static str,
        code: i64,
        len: usize,
    },

    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse model artifact: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for ClassifierError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Anything that can turn normalized task features into a priority.
pub trait PriorityStrategy: Send + Sync {
    fn predict(&self, features: &TaskFeatures) -> Result<Priority, ClassifierError>;

    /// Short name used in logs and the health report.
    fn name(&self) -> &str;
}

/// Outcome of a single classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub priority: Priority,
    /// Name of the strategy that produced `priority`.
    pub strategy: String,
    /// True when a loaded model failed and the rules answered instead.
    pub fell_back: bool,
}

/// Chooses between the optional model and the rules.
///
/// Built once at startup; the model slot is never swapped afterwards.
pub struct PriorityClassifier {
    model: Option<Arc<dyn PriorityStrategy>>,
    rules: RuleStrategy,
}

impl PriorityClassifier {
    pub fn new(model: Option<Arc<dyn PriorityStrategy>>, rules: RuleStrategy) -> Self {
        Self { model, rules }
    }

    pub fn rules_only(rules: RuleStrategy) -> Self {
        Self::new(None, rules)
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn status(&self) -> ServiceStatus {
        if self.model_loaded() {
            ServiceStatus::Ready
        } else {
            ServiceStatus::DegradedToRules
        }
    }

    /// Name of the strategy that answers when nothing goes wrong.
    pub fn active_strategy(&self) -> &str {
        match &self.model {
            Some(model) => model.name(),
            None => self.rules.name(),
        }
    }

    /// Never fails: model errors degrade to the rule strategy.
    pub fn classify(&self, features: &TaskFeatures) -> Classification {
        debug!("Classifying {:?}", features);

        if let Some(model) = &self.model {
            match model.predict(features) {
                Ok(priority) => {
                    return Classification {
                        priority,
                        strategy: model.name().to_string(),
                        fell_back: false,
                    };
                }
                Err(e) => {
                    warn!(
                        "Strategy {} failed ({}), falling back to {}",
                        model.name(),
                        e,
                        self.rules.name()
                    );
                }
            }
        }

        let priority = self.rules.decide(features);
        let classification = Classification {
            priority,
            strategy: self.rules.name().to_string(),
            fell_back: self.model.is_some(),
        };
        if classification.fell_back {
            info!("Rules answered {} after model failure", priority);
        }
        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStrategy(Priority);

    impl PriorityStrategy for FixedStrategy {
        fn predict(&self, _features: &TaskFeatures) -> Result<Priority, ClassifierError> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct BrokenStrategy;

    impl PriorityStrategy for BrokenStrategy {
        fn predict(&self, _features: &TaskFeatures) -> Result<Priority, ClassifierError> {
            Err(ClassifierError::MalformedOutput("label \"Urgent\"".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn test_rules_only() {
        let classifier = PriorityClassifier::rules_only(RuleStrategy::default());
        assert!(!classifier.model_loaded());
        assert_eq!(classifier.status(), ServiceStatus::DegradedToRules);
        assert_eq!(classifier.active_strategy(), "rules");

        let result = classifier.classify(&TaskFeatures::new("General", "Low", 200.0));
        assert_eq!(result.priority, Priority::Low);
        assert_eq!(result.strategy, "rules");
        assert!(!result.fell_back);
    }

    #[test]
    fn test_model_answer_is_used() {
        let classifier = PriorityClassifier::new(
            Some(Arc::new(FixedStrategy(Priority::Low))),
            RuleStrategy::default(),
        );
        assert_eq!(classifier.status(), ServiceStatus::Ready);
        assert_eq!(classifier.active_strategy(), "fixed");

        // the rules would say High here
        let result = classifier.classify(&TaskFeatures::new("General", "High", 1.0));
        assert_eq!(result.priority, Priority::Low);
        assert_eq!(result.strategy, "fixed");
        assert!(!result.fell_back);
    }

    #[test]
    fn test_model_failure_falls_back_to_rules() {
        let classifier =
            PriorityClassifier::new(Some(Arc::new(BrokenStrategy)), RuleStrategy::default());
        assert_eq!(classifier.status(), ServiceStatus::Ready);

        let result = classifier.classify(&TaskFeatures::new("General", "High", 100.0));
        assert_eq!(result.priority, Priority::High);
        assert_eq!(result.strategy, "rules");
        assert!(result.fell_back);
    }
}
