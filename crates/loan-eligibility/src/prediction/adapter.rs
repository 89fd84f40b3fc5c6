use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::artifact::ModelArtifact;
use super::classifier::{Classifier, ClassifierError};
use super::features::{vectorize, FeatureValue, FeatureVector, RawApplication};

/// Minimum credit score accepted by the fallback rule.
pub const FALLBACK_MIN_CREDIT_SCORE: f64 = 600.0;
/// Minimum applicant income accepted by the fallback rule.
pub const FALLBACK_MIN_APPLICANT_INCOME: f64 = 15_000.0;
/// Probability reported whenever the fallback rule decided.
pub const FALLBACK_PROBABILITY: f64 = 0.5;

const ASSUMED_PROBABILITY_ELIGIBLE: f64 = 0.75;
const ASSUMED_PROBABILITY_INELIGIBLE: f64 = 0.25;

/// Binary verdict with a confidence in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub eligible: bool,
    pub probability: f64,
}

/// Where a verdict came from, for logging and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    Model,
    Fallback,
}

/// Lenient numeric read for the fallback rule: anything unreadable counts as zero.
fn lenient_number(raw: &RawApplication, key: &str) -> f64 {
    raw.get(key)
        .and_then(FeatureValue::as_number)
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Deterministic heuristic used when the classifier is absent or fails.
pub fn fallback_decision(raw: &RawApplication) -> PredictionResult {
    let credit = lenient_number(raw, "CreditScore");
    let income = lenient_number(raw, "ApplicantIncome");
    PredictionResult {
        eligible: credit >= FALLBACK_MIN_CREDIT_SCORE && income >= FALLBACK_MIN_APPLICANT_INCOME,
        probability: FALLBACK_PROBABILITY,
    }
}

fn model_decision(
    classifier: &dyn Classifier,
    row: &FeatureVector,
) -> Result<PredictionResult, ClassifierError> {
    let eligible = classifier.predict(row.as_slice())?;
    let probability = match classifier
        .predict_proba(row.as_slice())
        .and_then(|probability| {
            if probability.is_nan() {
                Err(ClassifierError::NonFinite)
            } else {
                Ok(probability)
            }
        }) {
        Ok(probability) => probability.clamp(0.0, 1.0),
        Err(err) => {
            debug!(error = %err, eligible, "class probability unavailable, using fixed estimate");
            if eligible {
                ASSUMED_PROBABILITY_ELIGIBLE
            } else {
                ASSUMED_PROBABILITY_INELIGIBLE
            }
        }
    };
    Ok(PredictionResult {
        eligible,
        probability,
    })
}

/// Generic-lookup prediction. Never fails: model problems resolve to the fallback rule.
pub fn predict(artifact: &ModelArtifact, raw: &RawApplication) -> PredictionResult {
    predict_with_source(artifact, raw).0
}

pub fn predict_with_source(
    artifact: &ModelArtifact,
    raw: &RawApplication,
) -> (PredictionResult, VerdictSource) {
    let spec = artifact.feature_spec();
    let row = vectorize(&spec, raw);

    let Some(classifier) = artifact.classifier() else {
        warn!("no model loaded, applying fallback rule");
        return (fallback_decision(raw), VerdictSource::Fallback);
    };

    match model_decision(classifier.as_ref(), &row) {
        Ok(result) => (result, VerdictSource::Model),
        Err(err) => {
            warn!(error = %err, columns = spec.len(), "model invocation failed, applying fallback rule");
            (fallback_decision(raw), VerdictSource::Fallback)
        }
    }
}
