use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::prediction::classifier::{Classifier, ClassifierError};
use crate::prediction::features::{FeatureSpec, FeatureValue, RawApplication};
use crate::prediction::form::EligibilityForm;
use crate::prediction::ModelArtifact;

/// Classifier returning a fixed answer, optionally with a probability.
pub(super) struct FixedClassifier {
    pub(super) answer: bool,
    pub(super) probability: Option<f64>,
    pub(super) calls: AtomicUsize,
}

impl FixedClassifier {
    pub(super) fn new(answer: bool, probability: Option<f64>) -> Self {
        Self {
            answer,
            probability,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Classifier for FixedClassifier {
    fn predict(&self, _row: &[FeatureValue]) -> Result<bool, ClassifierError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.answer)
    }

    fn predict_proba(&self, _row: &[FeatureValue]) -> Result<f64, ClassifierError> {
        self.probability
            .ok_or(ClassifierError::Unsupported("predict_proba"))
    }
}

/// Classifier that fails every call, as a mis-shaped model would.
pub(super) struct BrokenClassifier;

impl Classifier for BrokenClassifier {
    fn predict(&self, row: &[FeatureValue]) -> Result<bool, ClassifierError> {
        Err(ClassifierError::ShapeMismatch {
            expected: row.len() + 1,
            actual: row.len(),
        })
    }
}

/// Records the last row it was asked to score.
#[derive(Default)]
pub(super) struct RecordingClassifier {
    pub(super) last_row: std::sync::Mutex<Vec<FeatureValue>>,
}

impl Classifier for RecordingClassifier {
    fn predict(&self, row: &[FeatureValue]) -> Result<bool, ClassifierError> {
        *self.last_row.lock().expect("row mutex poisoned") = row.to_vec();
        Ok(true)
    }
}

pub(super) fn artifact_with(
    classifier: Arc<dyn Classifier>,
    features: Option<FeatureSpec>,
) -> ModelArtifact {
    ModelArtifact::new(Some(classifier), features)
}

pub(super) fn raw(pairs: &[(&str, FeatureValue)]) -> RawApplication {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

pub(super) fn canonical_columns() -> FeatureSpec {
    FeatureSpec::new([
        "Gender",
        "Married",
        "Dependents",
        "Education",
        "Self_Employed",
        "ApplicantIncome",
        "CoapplicantIncome",
        "LoanAmount",
        "Loan_Amount_Term",
        "Credit_History",
        "Property_Area_Rural",
        "Property_Area_Semiurban",
        "Property_Area_Urban",
        "Age",
    ])
}

pub(super) fn sample_form() -> EligibilityForm {
    EligibilityForm {
        gender: Some("Male".to_string()),
        married: Some("Yes".to_string()),
        dependents: Some("0".to_string()),
        education: Some("Graduate".to_string()),
        self_employed: Some("No".to_string()),
        applicant_income: Some("5000".to_string()),
        coapplicant_income: Some("0".to_string()),
        loan_amount: Some("100".to_string()),
        loan_term: Some("360".to_string()),
        credit_score: Some("1".to_string()),
        property_area: Some("Urban".to_string()),
        age: Some("30".to_string()),
    }
}
