use serde::{Deserialize, Serialize};

use super::features::FeatureValue;

/// Narrow view of an externally trained binary classifier.
///
/// `predict` is mandatory; `predict_proba` is optional and reports
/// [`ClassifierError::Unsupported`] unless a model overrides it.
pub trait Classifier: Send + Sync {
    fn predict(&self, row: &[FeatureValue]) -> Result<bool, ClassifierError>;

    /// Probability of the positive class.
    fn predict_proba(&self, _row: &[FeatureValue]) -> Result<f64, ClassifierError> {
        Err(ClassifierError::Unsupported("predict_proba"))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("feature {index} is not numeric: {value}")]
    NonNumeric { index: usize, value: String },
    #[error("model does not support {0}")]
    Unsupported(&'static str),
    #[error("model produced a non-finite score")]
    NonFinite,
    #[error("rule reads column {column} but the model is {width} columns wide")]
    ColumnOutOfRange { column: usize, width: usize },
}

fn numeric_row(row: &[FeatureValue], width: usize) -> Result<Vec<f64>, ClassifierError> {
    if row.len() != width {
        return Err(ClassifierError::ShapeMismatch {
            expected: width,
            actual: row.len(),
        });
    }

    row.iter()
        .enumerate()
        .map(|(index, value)| {
            value.as_number().ok_or_else(|| ClassifierError::NonNumeric {
                index,
                value: value.to_string(),
            })
        })
        .collect()
}

fn default_threshold() -> f64 {
    0.5
}

/// Logistic regression over a dense numeric row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticClassifier {
    pub weights: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticClassifier {
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self {
            weights,
            intercept,
            threshold: default_threshold(),
        }
    }

    fn probability(&self, row: &[FeatureValue]) -> Result<f64, ClassifierError> {
        let values = numeric_row(row, self.weights.len())?;
        let margin = self
            .weights
            .iter()
            .zip(&values)
            .fold(self.intercept, |acc, (weight, value)| acc + weight * value);
        let probability = 1.0 / (1.0 + (-margin).exp());
        if probability.is_finite() {
            Ok(probability)
        } else {
            Err(ClassifierError::NonFinite)
        }
    }
}

impl Classifier for LogisticClassifier {
    fn predict(&self, row: &[FeatureValue]) -> Result<bool, ClassifierError> {
        Ok(self.probability(row)? >= self.threshold)
    }

    fn predict_proba(&self, row: &[FeatureValue]) -> Result<f64, ClassifierError> {
        self.probability(row)
    }
}

/// Single threshold condition on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub column: usize,
    pub min: f64,
}

/// Conjunction of column thresholds; exposes no probability estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetClassifier {
    pub width: usize,
    pub rules: Vec<ThresholdRule>,
}

impl Classifier for RuleSetClassifier {
    fn predict(&self, row: &[FeatureValue]) -> Result<bool, ClassifierError> {
        let values = numeric_row(row, self.width)?;
        for rule in &self.rules {
            let value = values.get(rule.column).ok_or(ClassifierError::ShapeMismatch {
                expected: rule.column.saturating_add(1),
                actual: values.len(),
            })?;
            if *value < rule.min {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Primary on-disk encoding: a JSON document tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelDocument {
    Logistic(LogisticClassifier),
    Rules(RuleSetClassifier),
}

impl ModelDocument {
    /// Build the classifier, rejecting rules that read past the declared width.
    pub fn into_classifier(self) -> Result<std::sync::Arc<dyn Classifier>, ClassifierError> {
        match self {
            ModelDocument::Logistic(model) => Ok(std::sync::Arc::new(model)),
            ModelDocument::Rules(model) => {
                if let Some(rule) = model.rules.iter().find(|rule| rule.column >= model.width) {
                    return Err(ClassifierError::ColumnOutOfRange {
                        column: rule.column,
                        width: model.width,
                    });
                }
                Ok(std::sync::Arc::new(model))
            }
        }
    }
}
