//! Flattened decision trees shared by the tree-ensemble regressor and the
//! random-forest fault classifier.

use serde::{Deserialize, Serialize};

use super::ModelError;

/// One node of a flattened binary tree.
///
/// Splits send `x[feature] < threshold` to `left`, everything else
/// (including NaN) to `right`. Child indices point into the same node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Decision tree with the root at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Structural checks: non-empty, children strictly after their parent
    /// (so evaluation always terminates), features below `n_features`.
    pub fn validate(&self, n_features: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidArtifact("tree has no nodes".into()));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(ModelError::InvalidArtifact(format!(
                            "node {idx} splits on feature {feature}, model has {n_features}"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelError::InvalidArtifact(format!(
                            "node {idx} has a non-finite threshold"
                        )));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(ModelError::InvalidArtifact(format!(
                                "node {idx} points to invalid child {child}"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ModelError::InvalidArtifact(format!(
                            "leaf {idx} has a non-finite value"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk the tree for one feature vector and return the leaf value.
    pub fn evaluate(&self, x: &[f64]) -> Result<f64, ModelError> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).ok_or(ModelError::ShapeMismatch {
                        expected: feature + 1,
                        actual: x.len(),
                    })?;
                    idx = if *v < *threshold { *left } else { *right };
                }
                None => {
                    return Err(ModelError::Prediction(format!(
                        "tree walked to missing node {idx}"
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x0 < 1.0 → (x1 < 0.0 → -1 : 1) : 5
    fn sample_tree() -> DecisionTree {
        serde_json::from_str(
            r#"{"nodes": [
                {"feature": 0, "threshold": 1.0, "left": 1, "right": 4},
                {"feature": 1, "threshold": 0.0, "left": 2, "right": 3},
                {"value": -1.0},
                {"value": 1.0},
                {"value": 5.0}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_evaluate_follows_splits() {
        let tree = sample_tree();
        assert!(tree.validate(2).is_ok());
        assert_eq!(tree.evaluate(&[0.0, -3.0]).unwrap(), -1.0);
        assert_eq!(tree.evaluate(&[0.0, 3.0]).unwrap(), 1.0);
        assert_eq!(tree.evaluate(&[1.0, -3.0]).unwrap(), 5.0);
        // NaN goes right
        assert_eq!(tree.evaluate(&[f64::NAN, 0.0]).unwrap(), 5.0);
    }

    #[test]
    fn test_validate_rejects_bad_structure() {
        let tree = sample_tree();
        assert!(tree.validate(1).is_err(), "feature 1 out of range");

        let cyclic = DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                left: 0,
                right: 0,
            }],
        };
        assert!(cyclic.validate(1).is_err());
        assert!(DecisionTree { nodes: vec![] }.validate(1).is_err());
    }

    #[test]
    fn test_short_feature_vector_is_an_error() {
        let tree = sample_tree();
        assert!(matches!(
            tree.evaluate(&[0.0]),
            Err(ModelError::ShapeMismatch { .. })
        ));
    }
}
