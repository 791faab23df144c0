use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

/// A fitted string-to-code mapping; a label's code is its index in `classes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self, name: &str) -> Result<(), ClassifierError> {
        if self.classes.is_empty() {
            return Err(ClassifierError::InvalidArtifact(format!("{name} has no classes")));
        }
        let mut seen = HashSet::new();
        for class in &self.classes {
            if !seen.insert(class.as_str()) {
                return Err(ClassifierError::InvalidArtifact(format!(
                    "{name} lists {class:?} twice"
                )));
            }
        }
        Ok(())
    }

    pub fn transform(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }

    /// Encodes `label`, substituting `fallback` when the label was never seen
    /// during fitting.
    pub fn transform_or(
        &self,
        encoder: &'static str,
        label: &str,
        fallback: &str,
    ) -> Result<usize, ClassifierError> {
        self.transform(label)
            .or_else(|| self.transform(fallback))
            .ok_or_else(|| ClassifierError::UnseenLabel {
                encoder,
                label: label.to_string(),
                substitute: fallback.to_string(),
            })
    }

    pub fn inverse_transform(
        &self,
        encoder: &'static str,
        code: i64,
    ) -> Result<&str, ClassifierError> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
            .ok_or(ClassifierError::UnknownCode {
                encoder,
                code,
                len: self.classes.len(),
            })
    }
}
