//! Pre-trained weather risk classifier.
//!
//! The model is a JSON export of a binary scikit-learn estimator. Two
//! estimator kinds are understood:
//!
//! ```json
//! { "kind": "logistic_regression",
//!   "feature_names": ["temp", "wind_speed", "humidity"],
//!   "coefficients": [0.08, 0.21, 0.03], "intercept": -6.4 }
//!
//! { "kind": "random_forest", "n_features": 3,
//!   "trees": [ { "nodes": [
//!       { "feature": 1, "threshold": 15.0, "left": 1, "right": 2 },
//!       { "value": [40.0, 2.0] },
//!       { "value": [3.0, 25.0] } ] } ] }
//! ```
//!
//! Tree splits follow scikit-learn: go left when `x[feature] <= threshold`.

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::services::metrics;

/// Score reported when no model is loaded or prediction fails.
pub const DEFAULT_RISK_SCORE: f64 = 0.5;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to read model file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    Invalid(String),

    #[error("Expected {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("Model produced an invalid probability: {0}")]
    InvalidProbability(f64),
}

/// A loaded classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskModel {
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(flatten)]
    estimator: Estimator,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Estimator {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

#[derive(Debug, Clone, Deserialize)]
struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct RandomForest {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

#[derive(Debug, Clone, Deserialize)]
struct DecisionTree {
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class weights `[negative, positive]`.
        value: [f64; 2],
    },
}

impl RiskModel {
    /// Read and validate a model file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ModelError> {
        let model: RiskModel = serde_json::from_str(raw)?;
        model.validate()?;
        Ok(model)
    }

    /// Number of features the estimator was trained on.
    pub fn n_features(&self) -> usize {
        match &self.estimator {
            Estimator::LogisticRegression(lr) => lr.coefficients.len(),
            Estimator::RandomForest(rf) => rf.n_features,
        }
    }

    pub fn kind(&self) -> &'static str {
        match &self.estimator {
            Estimator::LogisticRegression(_) => "logistic_regression",
            Estimator::RandomForest(_) => "random_forest",
        }
    }

    /// Probability of the positive (high risk) class.
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        let expected = self.n_features();
        if features.len() != expected {
            return Err(ModelError::FeatureMismatch {
                expected,
                actual: features.len(),
            });
        }

        let probability = match &self.estimator {
            Estimator::LogisticRegression(lr) => lr.predict_proba(features),
            Estimator::RandomForest(rf) => rf.predict_proba(features)?,
        };

        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ModelError::InvalidProbability(probability));
        }
        Ok(probability)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if !self.feature_names.is_empty() && self.feature_names.len() != self.n_features() {
            return Err(ModelError::Invalid(format!(
                "{} feature names for {} features",
                self.feature_names.len(),
                self.n_features()
            )));
        }

        match &self.estimator {
            Estimator::LogisticRegression(lr) => {
                if lr.coefficients.is_empty() {
                    return Err(ModelError::Invalid("no coefficients".to_string()));
                }
                if !lr.intercept.is_finite() || lr.coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(ModelError::Invalid("non-finite coefficient".to_string()));
                }
            }
            Estimator::RandomForest(rf) => {
                if rf.n_features == 0 {
                    return Err(ModelError::Invalid("n_features must be positive".to_string()));
                }
                if rf.trees.is_empty() {
                    return Err(ModelError::Invalid("forest has no trees".to_string()));
                }
                for (i, tree) in rf.trees.iter().enumerate() {
                    tree.validate(rf.n_features)
                        .map_err(|msg| ModelError::Invalid(format!("tree {}: {}", i, msg)))?;
                }
            }
        }
        Ok(())
    }
}

impl LogisticRegression {
    fn predict_proba(&self, features: &[f64]) -> f64 {
        let z = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>();
        sigmoid(z)
    }
}

impl RandomForest {
    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.predict_proba(features)?;
        }
        Ok(total / self.trees.len() as f64)
    }
}

impl DecisionTree {
    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on feature {}", i, feature));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {} has a NaN threshold", i));
                    }
                    if *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {} has a child out of range", i));
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0)
                        || value[0] + value[1] <= 0.0
                    {
                        return Err(format!("node {} has invalid class weights", i));
                    }
                }
            }
        }
        Ok(())
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..self.nodes.len() {
            match &self.nodes[index] {
                TreeNode::Leaf { value } => return Ok(value[1] / (value[0] + value[1])),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
        Err(ModelError::Invalid("tree contains a cycle".to_string()))
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Where a risk score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskSource {
    Model,
    Default,
}

impl RiskSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskSource::Model => "model",
            RiskSource::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    pub score: f64,
    pub source: RiskSource,
}

/// Scores forecasts with the loaded model, or the default when there is none.
#[derive(Clone, Default)]
pub struct RiskScorer {
    model: Option<Arc<RiskModel>>,
}

impl RiskScorer {
    pub fn new(model: Option<RiskModel>) -> Self {
        Self {
            model: model.map(Arc::new),
        }
    }

    /// Load the model at `path`; failures are logged and yield a scorer
    /// without a model.
    pub fn load_or_default(path: &str) -> Self {
        match RiskModel::load(path) {
            Ok(model) => {
                tracing::info!(
                    path = %path,
                    kind = model.kind(),
                    n_features = model.n_features(),
                    "Loaded risk model"
                );
                Self::new(Some(model))
            }
            Err(e) => {
                tracing::warn!(
                    path = %path,
                    error = %e,
                    "Failed to load risk model, using default risk score"
                );
                Self::new(None)
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn score(&self, features: &[f64]) -> RiskAssessment {
        let assessment = match &self.model {
            Some(model) => match model.predict_proba(features) {
                Ok(score) => RiskAssessment {
                    score,
                    source: RiskSource::Model,
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Error calculating risk score");
                    RiskAssessment {
                        score: DEFAULT_RISK_SCORE,
                        source: RiskSource::Default,
                    }
                }
            },
            None => RiskAssessment {
                score: DEFAULT_RISK_SCORE,
                source: RiskSource::Default,
            },
        };

        metrics::record_risk_prediction(assessment.source.as_str());
        assessment
    }
}
