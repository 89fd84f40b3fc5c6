use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use loan_eligibility::accounts::{AccountService, PasswordDigest, SqliteLoanStore};
use loan_eligibility::prediction::{
    FeatureSpec, LogisticClassifier, ModelArtifact, RuleSetClassifier, ThresholdRule,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::routes::{loan_router, ServiceState};

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

/// Approves whenever `Credit_History` is at least 1.
pub(super) fn credit_history_model() -> ModelArtifact {
    let rules = RuleSetClassifier {
        width: 14,
        rules: vec![ThresholdRule {
            column: 9,
            min: 1.0,
        }],
    };
    ModelArtifact::new(Some(Arc::new(rules)), Some(canonical_columns()))
}

pub(super) fn scoring_model() -> ModelArtifact {
    let spec = FeatureSpec::new(["CreditScore", "ApplicantIncome"]);
    let model = LogisticClassifier::new(vec![0.01, 0.0001], -8.0);
    ModelArtifact::new(Some(Arc::new(model)), Some(spec))
}

pub(super) fn router_with(artifact: ModelArtifact) -> axum::Router {
    let store = Arc::new(SqliteLoanStore::open_in_memory().expect("in-memory store"));
    let accounts = AccountService::new(store, PasswordDigest::new("test-secret"));
    loan_router(Arc::new(ServiceState::new(artifact, accounts)))
}

pub(super) fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub(super) fn json_request(uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub(super) fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub(super) async fn send(router: &axum::Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("route executes")
}

pub(super) async fn read_json_body(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Sign up and log in, returning the `Cookie` header value for the session.
pub(super) async fn logged_in(router: &axum::Router) -> String {
    let signup = send(
        router,
        form_request(
            "/signup",
            "name=Asha&email=asha%40example.com&password=hunter2",
            None,
        ),
    )
    .await;
    assert_eq!(signup.status(), 201);

    let login = send(
        router,
        form_request("/login", "email=asha%40example.com&password=hunter2", None),
    )
    .await;
    assert_eq!(login.status(), 200);

    let set_cookie = login
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie set")
        .to_str()
        .expect("ascii cookie");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

pub(super) const ELIGIBLE_FORM: &str = "gender=Male&married=Yes&dependents=0&education=Graduate&self_employed=No&applicant_income=5000&coapplicant_income=0&loan_amount=100&loan_term=360&credit_score=1&property_area=Urban&age=30";
