use std::env;

use dotenvy::dotenv;

use crate::{
    classifier::rules::RuleThresholds,
    error::{AppError, AppResult},
};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Empty means "do not try to load a model".
    pub model_path: String,
    pub thresholds: RuleThresholds,
    pub max_body_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            model_path: "random_forest_model.json".to_string(),
            thresholds: RuleThresholds::default(),
            max_body_bytes: 64 * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, falling back to defaults
    /// for anything unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("HOST").unwrap_or(defaults.host);

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| AppError::Config(format!("PORT={raw:?}: {e}")))?,
            None => defaults.port,
        };

        let model_path = lookup("MODEL_PATH")
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.model_path);

        let high_below_hours = parse_hours(&lookup, "RULE_HIGH_BELOW_HOURS")?
            .unwrap_or(defaults.thresholds.high_below_hours);
        let medium_below_hours = parse_hours(&lookup, "RULE_MEDIUM_BELOW_HOURS")?
            .unwrap_or(defaults.thresholds.medium_below_hours);
        let thresholds = RuleThresholds::new(high_below_hours, medium_below_hours)?;

        let max_body_bytes = match lookup("MAX_BODY_BYTES") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| AppError::Config(format!("MAX_BODY_BYTES={raw:?}: {e}")))?,
            None => defaults.max_body_bytes,
        };

        Ok(Self {
            host,
            port,
            model_path,
            thresholds,
            max_body_bytes,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_hours<F>(lookup: &F, key: &str) -> AppResult<Option<f64>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let hours = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| AppError::Config(format!("{key}={raw:?}: {e}")))?;
    if !hours.is_finite() || hours < 0.0 {
        return Err(AppError::Config(format!(
            "{key} must be a non-negative number of hours, got {raw:?}"
        )));
    }
    Ok(Some(hours))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
        assert_eq!(config.model_path, "random_forest_model.json");
        assert_eq!(config.thresholds.high_below_hours, 24.0);
        assert_eq!(config.thresholds.medium_below_hours, 72.0);
        assert_eq!(config.max_body_bytes, 65536);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("MODEL_PATH", " models/rf.yaml "),
            ("RULE_HIGH_BELOW_HOURS", "6"),
            ("RULE_MEDIUM_BELOW_HOURS", "24"),
            ("MAX_BODY_BYTES", "1024"),
        ])
        .unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.model_path, "models/rf.yaml");
        assert_eq!(config.thresholds.high_below_hours, 6.0);
        assert_eq!(config.thresholds.medium_below_hours, 24.0);
        assert_eq!(config.max_body_bytes, 1024);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(config_from(&[("PORT", "http")]), Err(AppError::Config(_))));
        assert!(matches!(config_from(&[("PORT", "70000")]), Err(AppError::Config(_))));
        assert!(matches!(
            config_from(&[("RULE_HIGH_BELOW_HOURS", "-1")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("RULE_MEDIUM_BELOW_HOURS", "inf")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("RULE_HIGH_BELOW_HOURS", "100")]),
            Err(AppError::Config(_))
        ));
    }
}
