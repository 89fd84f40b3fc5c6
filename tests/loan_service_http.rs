//! End-to-end checks through the public router with artifacts loaded from disk.

use std::io::Write;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use loan_eligibility::accounts::{AccountService, PasswordDigest, SqliteLoanStore};
use loan_eligibility::prediction::ModelArtifact;
use loan_eligibility_api::{loan_router, ServiceState};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt;

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

fn router(artifact: ModelArtifact) -> axum::Router {
    let store = Arc::new(SqliteLoanStore::open_in_memory().expect("in-memory store"));
    let accounts = AccountService::new(store, PasswordDigest::new("integration-secret"));
    loan_router(Arc::new(ServiceState::new(artifact, accounts)))
}

async fn post_form(router: &axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router.clone().oneshot(request).await.expect("route executes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).expect("json payload"))
}

async fn post_json(router: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = router.clone().oneshot(request).await.expect("route executes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).expect("json payload"))
}

const FORM: &str = "gender=Male&married=Yes&dependents=0&education=Graduate&self_employed=No&applicant_income=5000&coapplicant_income=0&loan_amount=100&loan_term=360&credit_score=1&property_area=Urban&age=30";

#[tokio::test]
async fn rule_model_from_disk_drives_the_form_endpoint() {
    let model = temp_file(r#"{"kind":"rules","width":14,"rules":[{"column":9,"min":1.0}]}"#);
    let features = temp_file(
        r#"["Gender","Married","Dependents","Education","Self_Employed","ApplicantIncome",
            "CoapplicantIncome","LoanAmount","Loan_Amount_Term","Credit_History",
            "Property_Area_Rural","Property_Area_Semiurban","Property_Area_Urban","Age"]"#,
    );
    let router = router(ModelArtifact::load(model.path(), features.path()));

    let (status, body) = post_form(&router, "/predict", FORM).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Eligible");
    assert_eq!(body["eligible_banks"].as_array().map(Vec::len), Some(3));

    // Rule models have no probability estimate, so the generic path reports the fixed 0.75.
    let (_, generic) = post_json(
        &router,
        "/api/v1/eligibility",
        json!({ "Credit_History": "1", "Gender": "1", "Married": "1", "Dependents": "0",
                "Education": "1", "Self_Employed": "0", "ApplicantIncome": "5000",
                "CoapplicantIncome": "0", "LoanAmount": "100", "Loan_Amount_Term": "360",
                "Property_Area_Rural": "0", "Property_Area_Semiurban": "0",
                "Property_Area_Urban": "1", "Age": "30" }),
    )
    .await;
    assert_eq!(generic, json!({ "eligible": true, "probability": 0.75 }));
}

#[tokio::test]
async fn weight_table_model_with_default_columns_falls_back_on_blank_fields() {
    let model = temp_file("term,weight\nintercept,0.0\nMarried,1.0\nGender,1.0\nDependents,0.0\nEducation,0.0\nSelf_Employed,0.0\nApplicantIncome,0.0\nCoapplicantIncome,0.0\nLoanAmount,0.0\nLoan_Amount_Term,0.0\nCreditScore,0.0\nProperty_Area,0.0\nAge,0.0\n");
    let router = router(ModelArtifact::load(model.path(), "/nonexistent/model_features.json"));

    // snake_case keys never reach the PascalCase default columns, so the model sees blanks.
    let (status, body) = post_json(
        &router,
        "/api/v1/eligibility",
        json!({ "credit_score": 750, "applicant_income": 50000 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "eligible": false, "probability": 0.5 }));
}

#[tokio::test]
async fn missing_artifacts_still_answer_the_form() {
    let router = router(ModelArtifact::load(
        "/nonexistent/loan_model.bin",
        "/nonexistent/model_features.json",
    ));

    let (status, body) = post_form(&router, "/predict", FORM).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Not Eligible");

    let bad = FORM.replace("applicant_income=5000", "applicant_income=lots");
    let (status, body) = post_form(&router, "/predict", &bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .expect("message")
        .contains("applicant_income"));
}
