use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

/// Marker used in `children_left`/`children_right` for leaf nodes.
pub const LEAF: i64 = -1;

/// A fitted binary decision tree stored as parallel node arrays.
///
/// Node `i` is a leaf when `children_left[i] == LEAF`. Internal nodes send a
/// sample left when `x[feature[i]] <= threshold[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class weights, one row per node.
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn validate(
        &self,
        idx: usize,
        n_features: usize,
        n_classes: usize,
    ) -> Result<(), ClassifierError> {
        let invalid = |msg: String| ClassifierError::InvalidArtifact(format!("tree {idx}: {msg}"));

        let n_nodes = self.children_left.len();
        if n_nodes == 0 {
            return Err(invalid("has no nodes".to_string()));
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != n_nodes)
        {
            return Err(invalid("node arrays differ in length".to_string()));
        }

        for node in 0..n_nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF {
                let row = &self.value[node];
                if row.len() != n_classes {
                    return Err(invalid(format!(
                        "leaf {node} has {} class weights, expected {n_classes}",
                        row.len()
                    )));
                }
                if row.iter().any(|w| !w.is_finite() || *w < 0.0) {
                    return Err(invalid(format!("leaf {node} has an invalid weight")));
                }
                continue;
            }
            // children always come after their parent, which also rules out cycles
            for child in [left, right] {
                if child <= node as i64 || child >= n_nodes as i64 {
                    return Err(invalid(format!("node {node} points at node {child}")));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(invalid(format!("node {node} splits on feature {feature}")));
            }
            if self.threshold[node].is_nan() {
                return Err(invalid(format!("node {node} has a NaN threshold")));
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf `x` lands in.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        let malformed = |msg: String| ClassifierError::MalformedOutput(msg);

        let mut node = 0usize;
        // a valid tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.children_left.len() {
            let left = *self
                .children_left
                .get(node)
                .ok_or_else(|| malformed(format!("node {node} does not exist")))?;

            if left == LEAF {
                let row = self
                    .value
                    .get(node)
                    .ok_or_else(|| malformed(format!("leaf {node} has no value")))?;
                let total: f64 = row.iter().sum();
                if total <= 0.0 {
                    return Err(malformed(format!("leaf {node} carries no weight")));
                }
                return Ok(row.iter().map(|w| w / total).collect());
            }

            let feature = self.feature.get(node).copied().unwrap_or(-1);
            let sample = usize::try_from(feature)
                .ok()
                .and_then(|f| x.get(f))
                .ok_or_else(|| {
                    malformed(format!("node {node} splits on missing feature {feature}"))
                })?;
            let threshold = self.threshold.get(node).copied().unwrap_or(f64::NAN);

            let next = if *sample <= threshold {
                left
            } else {
                self.children_right.get(node).copied().unwrap_or(LEAF)
            };
            node = usize::try_from(next)
                .map_err(|_| malformed(format!("node {node} has no child on that side")))?;
        }
        Err(malformed("tree walk did not reach a leaf".to_string()))
    }
}

/// An ensemble of trees voting by averaged class probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    /// Encoded class for each probability column.
    pub classes: Vec<i64>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.n_features == 0 {
            return Err(ClassifierError::InvalidArtifact("forest has no features".to_string()));
        }
        if self.classes.is_empty() {
            return Err(ClassifierError::InvalidArtifact("forest has no classes".to_string()));
        }
        if self.trees.is_empty() {
            return Err(ClassifierError::InvalidArtifact("forest has no trees".to_string()));
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx, self.n_features, self.classes.len())?;
        }
        Ok(())
    }

    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        if x.len() != self.n_features {
            return Err(ClassifierError::MalformedOutput(format!(
                "expected {} features, got {}",
                self.n_features,
                x.len()
            )));
        }

        let mut sum = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let proba = tree.predict_proba(x)?;
            if proba.len() != sum.len() {
                return Err(ClassifierError::MalformedOutput(format!(
                    "tree returned {} probabilities for {} classes",
                    proba.len(),
                    sum.len()
                )));
            }
            sum.iter_mut().zip(proba).for_each(|(acc, p)| *acc += p);
        }
        let n_trees = self.trees.len() as f64;
        Ok(sum.into_iter().map(|p| p / n_trees).collect())
    }

    /// Encoded class with the highest mean probability; the first wins ties.
    pub fn predict(&self, x: &[f64]) -> Result<i64, ClassifierError> {
        let proba = self.predict_proba(x)?;
        let best = proba
            .iter()
            .enumerate()
            .fold(None::<(usize, f64)>, |best, (idx, &p)| match best {
                Some((_, top)) if p <= top => best,
                _ => Some((idx, p)),
            })
            .map(|(idx, _)| idx)
            .ok_or_else(|| ClassifierError::MalformedOutput("no class probabilities".to_string()))?;
        self.classes
            .get(best)
            .copied()
            .ok_or_else(|| {
                ClassifierError::MalformedOutput(format!("class column {best} is unmapped"))
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Splits on deadline (feature 2): <= 24h leans class 0, else class 2.
    pub(crate) fn deadline_stump() -> DecisionTree {
        DecisionTree {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![2, -2, -2],
            threshold: vec![24.0, -2.0, -2.0],
            value: vec![vec![5.0, 5.0, 5.0], vec![8.0, 1.0, 1.0], vec![1.0, 2.0, 7.0]],
        }
    }

    /// Splits on urgency code (feature 1): code 1 leans class 1.
    pub(crate) fn urgency_stump() -> DecisionTree {
        DecisionTree {
            children_left: vec![1, LEAF, 3, LEAF, LEAF],
            children_right: vec![2, LEAF, 4, LEAF, LEAF],
            feature: vec![1, -2, 1, -2, -2],
            threshold: vec![0.5, -2.0, 1.5, -2.0, -2.0],
            value: vec![
                vec![1.0, 1.0, 1.0],
                vec![1.0, 0.0, 0.0],
                vec![1.0, 1.0, 1.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
        }
    }

    fn forest(trees: Vec<DecisionTree>) -> RandomForest {
        RandomForest {
            n_features: 3,
            classes: vec![0, 1, 2],
            trees,
        }
    }

    #[test]
    fn test_tree_walk() {
        let tree = deadline_stump();
        assert_eq!(tree.predict_proba(&[0.0, 0.0, 24.0]).unwrap(), vec![0.8, 0.1, 0.1]);
        assert_eq!(tree.predict_proba(&[0.0, 0.0, 30.0]).unwrap(), vec![0.1, 0.2, 0.7]);
    }

    #[test]
    fn test_forest_averages_trees() {
        let rf = forest(vec![deadline_stump(), urgency_stump()]);
        rf.validate().unwrap();

        // deadline tree says [0.8, 0.1, 0.1], urgency tree (code 1) says [0, 1, 0]
        let proba = rf.predict_proba(&[0.0, 1.0, 10.0]).unwrap();
        assert!((proba[0] - 0.4).abs() < 1e-9);
        assert!((proba[1] - 0.55).abs() < 1e-9);
        assert_eq!(rf.predict(&[0.0, 1.0, 10.0]).unwrap(), 1);

        // both lean class 2
        assert_eq!(rf.predict(&[0.0, 2.0, 100.0]).unwrap(), 2);
    }

    #[test]
    fn test_ties_pick_first_class() {
        let tie = DecisionTree {
            children_left: vec![LEAF],
            children_right: vec![LEAF],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![vec![0.0, 3.0, 3.0]],
        };
        let rf = RandomForest {
            n_features: 3,
            classes: vec![4, 7, 9],
            trees: vec![tie],
        };
        assert_eq!(rf.predict(&[0.0, 0.0, 0.0]).unwrap(), 7);
    }

    #[test]
    fn test_wrong_feature_count() {
        let rf = forest(vec![deadline_stump()]);
        assert!(matches!(
            rf.predict(&[1.0, 2.0]),
            Err(ClassifierError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_validation_rejects_broken_trees() {
        let mut cyclic = deadline_stump();
        cyclic.children_left[0] = 0;
        assert!(forest(vec![cyclic]).validate().is_err());

        let mut short = deadline_stump();
        short.threshold.pop();
        assert!(forest(vec![short]).validate().is_err());

        let mut bad_feature = deadline_stump();
        bad_feature.feature[0] = 3;
        assert!(forest(vec![bad_feature]).validate().is_err());

        let mut narrow_leaf = deadline_stump();
        narrow_leaf.value[1] = vec![1.0, 1.0];
        assert!(forest(vec![narrow_leaf]).validate().is_err());

        assert!(forest(vec![]).validate().is_err());
    }
}
