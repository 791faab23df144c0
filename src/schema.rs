//! src/schema.rs
//!
//! Contains all public-facing API data structures.
//! These structs define the JSON contracts for requests and responses
//! between callers and the priority classifier service.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

//=============================================================================
//  Enums & Common Types
//=============================================================================

/// The sole output of the service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Priority::Low),
            "Medium" => Ok(Priority::Medium),
            "High" => Ok(Priority::High),
            other => Err(format!("not a priority label: {other:?}")),
        }
    }
}

/// Process readiness as reported by `/health`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceStatus {
    /// A trained classifier is loaded and answers predictions.
    Ready,
    /// No classifier could be loaded; every prediction uses the rules.
    DegradedToRules,
}

//=============================================================================
//  Prediction API
//=============================================================================

/// Body of `POST /predict`.
///
/// Every field is optional and loosely typed: values are kept as raw JSON so
/// the normalizer can apply defaults and coercions itself instead of the
/// deserializer rejecting the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub category: Option<Value>,
    #[serde(default)]
    pub urgency: Option<Value>,
    /// Hours left until the task is due.
    #[serde(default)]
    pub deadline_hours: Option<Value>,
    /// Calendar due date (`YYYY-MM-DD`), used when `deadline_hours` is absent.
    #[serde(default)]
    pub deadline: Option<Value>,
}

/// Successful prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub priority: Priority,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

//=============================================================================
//  Health API
//=============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub model_loaded: bool,
    /// Name of the strategy answering predictions.
    pub strategy: String,
    pub timestamp: DateTime<Utc>,
}
