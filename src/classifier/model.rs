use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    classifier::{ClassifierError, PriorityStrategy, encoder::LabelEncoder, forest::RandomForest},
    models::TaskFeatures,
    schema::Priority,
};

fn default_category() -> String {
    "Others".to_string()
}

fn default_urgency() -> String {
    "Medium".to_string()
}

/// On-disk form of a trained classifier and the encoders it was fit with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPackage {
    pub category_encoder: LabelEncoder,
    pub urgency_encoder: LabelEncoder,
    pub priority_encoder: LabelEncoder,
    /// Substituted for categories the encoder never saw.
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Substituted for urgencies the encoder never saw.
    #[serde(default = "default_urgency")]
    pub default_urgency: String,
    pub forest: RandomForest,
}

impl ModelPackage {
    /// Reads a package from JSON, or YAML when the extension says so.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let package: Self = if is_yaml {
            serde_yaml::from_str(&raw)?
        } else {
            serde_json::from_str(&raw)?
        };
        package.validate()?;
        Ok(package)
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        self.category_encoder.validate("category_encoder")?;
        self.urgency_encoder.validate("urgency_encoder")?;
        self.priority_encoder.validate("priority_encoder")?;
        self.forest.validate()?;

        if self.forest.n_features != 3 {
            return Err(ClassifierError::InvalidArtifact(format!(
                "forest expects {} features, the service supplies 3",
                self.forest.n_features
            )));
        }
        for class in &self.forest.classes {
            let label = self.priority_encoder.inverse_transform("priority", *class)?;
            label
                .parse::<Priority>()
                .map_err(ClassifierError::InvalidArtifact)?;
        }
        Ok(())
    }
}

/// Priority strategy backed by a trained tree ensemble.
pub struct ModelStrategy {
    package: ModelPackage,
}

impl ModelStrategy {
    pub fn new(package: ModelPackage) -> Result<Self, ClassifierError> {
        package.validate()?;
        Ok(Self { package })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let package = ModelPackage::load(path)?;
        info!(
            "Loaded model from {} ({} trees, {} categories)",
            path.display(),
            package.forest.trees.len(),
            package.category_encoder.classes.len()
        );
        Ok(Self { package })
    }

    /// `[category_code, urgency_code, deadline_hours]`
    pub fn encode(&self, features: &TaskFeatures) -> Result<[f64; 3], ClassifierError> {
        let p = &self.package;
        let category = p.category_encoder.transform_or(
            "category",
            &features.category,
            &p.default_category,
        )?;
        let urgency =
            p.urgency_encoder
                .transform_or("urgency", &features.urgency, &p.default_urgency)?;
        Ok([category as f64, urgency as f64, features.deadline_hours])
    }
}

impl PriorityStrategy for ModelStrategy {
    fn predict(&self, features: &TaskFeatures) -> Result<Priority, ClassifierError> {
        let x = self.encode(features)?;
        let code = self.package.forest.predict(&x)?;
        let label = self.package.priority_encoder.inverse_transform("priority", code)?;
        label.parse::<Priority>().map_err(ClassifierError::MalformedOutput)
    }

    fn name(&self) -> &str {
        "random-forest"
    }
}
