use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::TaskFeatures,
    schema::Priority,
};

/// Deadline cut-offs for the rule strategy, in hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// Deadlines strictly below this are High.
    pub high_below_hours: f64,
    /// Deadlines strictly below this (and not High) are Medium.
    pub medium_below_hours: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            high_below_hours: 24.0,
            medium_below_hours: 72.0,
        }
    }
}

impl RuleThresholds {
    pub fn new(high_below_hours: f64, medium_below_hours: f64) -> AppResult<Self> {
        if high_below_hours > medium_below_hours {
            return Err(AppError::Config(format!(
                "High threshold {high_below_hours}h exceeds Medium threshold {medium_below_hours}h"
            )));
        }
        Ok(Self {
            high_below_hours,
            medium_below_hours,
        })
    }
}

/// The deterministic fallback policy.
///
/// Urgency "High" wins outright; otherwise the deadline thresholds decide,
/// with urgency "Medium" lifting anything that would be Low.
#[derive(Debug, Clone, Default)]
pub struct RuleStrategy {
    thresholds: RuleThresholds,
}

impl RuleStrategy {
    pub fn new(thresholds: RuleThresholds) -> Self {
        Self { thresholds }
    }

    pub fn name(&self) -> &'static str {
        "rules"
    }

    pub fn decide(&self, features: &TaskFeatures) -> Priority {
        let urgency = features.urgency.as_str();
        let hours = features.deadline_hours;

        if urgency == "High" || hours < self.thresholds.high_below_hours {
            Priority::High
        } else if urgency == "Medium" || hours < self.thresholds.medium_below_hours {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}
