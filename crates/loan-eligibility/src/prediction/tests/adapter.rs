use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::common::*;
use crate::prediction::adapter::{fallback_decision, predict, predict_with_source};
use crate::prediction::features::{FeatureSpec, FeatureValue, RawApplication};
use crate::prediction::{LogisticClassifier, ModelArtifact, PredictionResult, VerdictSource};

#[test]
fn absent_model_uses_fallback_rule() {
    let artifact = ModelArtifact::empty();
    let approved = raw(&[
        ("CreditScore", FeatureValue::Number(650.0)),
        ("ApplicantIncome", FeatureValue::Number(20_000.0)),
    ]);
    let declined = raw(&[
        ("CreditScore", FeatureValue::Number(500.0)),
        ("ApplicantIncome", FeatureValue::Number(20_000.0)),
    ]);

    assert_eq!(
        predict(&artifact, &approved),
        PredictionResult {
            eligible: true,
            probability: 0.5
        }
    );
    assert_eq!(
        predict(&artifact, &declined),
        PredictionResult {
            eligible: false,
            probability: 0.5
        }
    );
}

#[test]
fn fallback_rule_is_inclusive_at_the_thresholds() {
    let edge = raw(&[
        ("CreditScore", FeatureValue::text("600")),
        ("ApplicantIncome", FeatureValue::text("15000")),
    ]);

    assert!(fallback_decision(&edge).eligible);
}

#[test]
fn fallback_rule_treats_unreadable_values_as_zero() {
    let garbage = raw(&[
        ("CreditScore", FeatureValue::text("excellent")),
        ("ApplicantIncome", FeatureValue::Flag(true)),
    ]);

    let result = fallback_decision(&garbage);
    assert!(!result.eligible);
    assert_eq!(result.probability, 0.5);
    assert!(!fallback_decision(&RawApplication::new()).eligible);
}

#[test]
fn failing_model_resolves_to_fallback() {
    let artifact = artifact_with(Arc::new(BrokenClassifier), None);
    let raw = raw(&[
        ("CreditScore", FeatureValue::text("700")),
        ("ApplicantIncome", FeatureValue::text("30000")),
    ]);

    let (result, source) = predict_with_source(&artifact, &raw);

    assert_eq!(source, VerdictSource::Fallback);
    assert!(result.eligible);
    assert_eq!(result.probability, 0.5);
}

#[test]
fn blank_columns_make_a_numeric_model_fall_back() {
    let artifact = artifact_with(
        Arc::new(LogisticClassifier::new(vec![0.0; 12], 5.0)),
        None,
    );
    let raw = raw(&[("CreditScore", FeatureValue::Number(300.0))]);

    let (result, source) = predict_with_source(&artifact, &raw);

    assert_eq!(source, VerdictSource::Fallback);
    assert!(!result.eligible);
}

#[test]
fn missing_probability_uses_fixed_estimates() {
    let spec = FeatureSpec::new(["Age"]);
    let yes = artifact_with(Arc::new(FixedClassifier::new(true, None)), Some(spec.clone()));
    let no = artifact_with(Arc::new(FixedClassifier::new(false, None)), Some(spec));
    let raw = raw(&[("Age", FeatureValue::Number(30.0))]);

    assert_eq!(
        predict(&yes, &raw),
        PredictionResult {
            eligible: true,
            probability: 0.75
        }
    );
    assert_eq!(
        predict(&no, &raw),
        PredictionResult {
            eligible: false,
            probability: 0.25
        }
    );
}

#[test]
fn model_probability_is_reported_and_clamped() {
    let spec = FeatureSpec::new(["Age"]);
    let raw = raw(&[("Age", FeatureValue::Number(30.0))]);
    let calibrated = Arc::new(FixedClassifier::new(true, Some(0.91)));
    let artifact = artifact_with(calibrated.clone(), Some(spec.clone()));

    let (result, source) = predict_with_source(&artifact, &raw);
    assert_eq!(source, VerdictSource::Model);
    assert_eq!(result.probability, 0.91);
    assert_eq!(calibrated.calls.load(Ordering::Relaxed), 1);

    let overshoot = artifact_with(Arc::new(FixedClassifier::new(true, Some(1.4))), Some(spec));
    assert_eq!(predict(&overshoot, &raw).probability, 1.0);
}

#[test]
fn logistic_model_scores_loaded_columns() {
    let spec = FeatureSpec::new(["CreditScore", "ApplicantIncome"]);
    let model = LogisticClassifier::new(vec![0.01, 0.0001], -8.0);
    let artifact = artifact_with(Arc::new(model), Some(spec));
    let raw = raw(&[
        ("CreditScore", FeatureValue::text("750")),
        ("ApplicantIncome", FeatureValue::text("20000")),
    ]);

    let (result, source) = predict_with_source(&artifact, &raw);

    assert_eq!(source, VerdictSource::Model);
    assert!(result.eligible);
    assert!(result.probability > 0.5 && result.probability <= 1.0);
}
