//! Prediction adapter scenarios driven through the public API with artifact files on disk.

use std::io::Write;

use loan_eligibility::prediction::{
    check_eligibility, predict, predict_with_source, EligibilityForm, FeatureSpec, FeatureValue,
    ModelArtifact, PredictionResult, RawApplication, VerdictSource,
};
use tempfile::NamedTempFile;

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

fn application(pairs: &[(&str, &str)]) -> RawApplication {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), FeatureValue::text(*value)))
        .collect()
}

#[test]
fn json_logistic_model_scores_generic_applications() {
    let model = temp_file(
        r#"{"kind":"logistic","weights":[0.02,0.0002],"intercept":-16.0,"threshold":0.5}"#,
    );
    let features = temp_file(r#"["CreditScore","ApplicantIncome"]"#);
    let artifact = ModelArtifact::load(model.path(), features.path());

    let strong = application(&[("CreditScore", "780"), ("ApplicantIncome", "40000")]);
    let weak = application(&[("CreditScore", "400"), ("ApplicantIncome", "10000")]);

    let (strong_result, source) = predict_with_source(&artifact, &strong);
    assert_eq!(source, VerdictSource::Model);
    assert!(strong_result.eligible);
    assert!(strong_result.probability > 0.9);

    let weak_result = predict(&artifact, &weak);
    assert!(!weak_result.eligible);
    assert!(weak_result.probability < 0.5);
    assert!((0.0..=1.0).contains(&weak_result.probability));
}

#[test]
fn lower_case_keys_resolve_through_case_folding() {
    let model = temp_file(r#"{"kind":"logistic","weights":[1.0],"intercept":-0.5}"#);
    let features = temp_file(r#"["Age"]"#);
    let artifact = ModelArtifact::load(model.path(), features.path());

    let (result, source) = predict_with_source(&artifact, &application(&[("age", "1")]));

    assert_eq!(source, VerdictSource::Model);
    assert!(result.eligible);
}

#[test]
fn width_mismatch_between_model_and_columns_falls_back() {
    let model = temp_file(r#"{"kind":"logistic","weights":[1.0,1.0,1.0],"intercept":0.0}"#);
    let features = temp_file(r#"["CreditScore","ApplicantIncome"]"#);
    let artifact = ModelArtifact::load(model.path(), features.path());

    let result = predict(
        &artifact,
        &application(&[("CreditScore", "650"), ("ApplicantIncome", "20000")]),
    );

    assert_eq!(
        result,
        PredictionResult {
            eligible: true,
            probability: 0.5
        }
    );
}

#[test]
fn corrupt_feature_list_uses_default_columns() {
    let features = temp_file("not json");
    let artifact = ModelArtifact::load("/nonexistent/model.bin", features.path());

    assert_eq!(artifact.feature_spec(), FeatureSpec::default_columns());
}

#[test]
fn fixed_path_and_generic_path_stay_independent() {
    let model = temp_file("term,weight\nintercept,-1.0\nCredit_History,2.0\n");
    let features = temp_file(r#"["Credit_History"]"#);
    let artifact = ModelArtifact::load(model.path(), features.path());

    let form = EligibilityForm {
        gender: Some("Female".to_string()),
        married: Some("No".to_string()),
        dependents: Some("2".to_string()),
        education: Some("Not Graduate".to_string()),
        self_employed: Some("Yes".to_string()),
        applicant_income: Some("3200".to_string()),
        coapplicant_income: Some("1500.5".to_string()),
        loan_amount: Some("120".to_string()),
        loan_term: Some("180".to_string()),
        credit_score: Some("1".to_string()),
        property_area: Some("Semiurban".to_string()),
        age: Some("41".to_string()),
    };
    let verdict = check_eligibility(&artifact, &form).expect("form parses");
    assert!(verdict.is_eligible());

    // The generic path only sees what the caller keyed; `credit_score` never maps to Credit_History.
    let generic = predict(&artifact, &application(&[("credit_score", "1")]));
    assert_eq!(generic.probability, 0.5);
    assert!(!generic.eligible);
}
