use std::sync::Arc;

use axum::async_trait;
use axum::extract::{Form, FromRequest, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use loan_eligibility::accounts::{
    AccountService, ContactMessage, InterestKey, InterestedLoan, LoanStore, LoginRequest,
    SignupRequest,
};
use loan_eligibility::error::AppError;
use loan_eligibility::prediction::{
    check_eligibility_with_source, predict_with_source, EligibilityForm, LoanVerdict,
    ModelArtifact, PredictionResult, RawApplication,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::infra::{expired_session_cookie, session_cookie, AppState, RecentCheck, SessionStore};

/// Everything the loan handlers share: the read-only model, accounts, and sessions.
pub struct ServiceState<S> {
    pub(crate) artifact: Arc<ModelArtifact>,
    pub(crate) accounts: Arc<AccountService<S>>,
    pub(crate) sessions: SessionStore,
}

impl<S> ServiceState<S>
where
    S: LoanStore + 'static,
{
    pub fn new(artifact: ModelArtifact, accounts: AccountService<S>) -> Self {
        Self {
            artifact: Arc::new(artifact),
            accounts: Arc::new(accounts),
            sessions: SessionStore::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardSummary {
    pub(crate) eligible_count: usize,
    pub(crate) not_eligible_count: usize,
    pub(crate) interested_count: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct DashboardResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) user: Option<String>,
    pub(crate) summary: DashboardSummary,
    pub(crate) recent_checks: Vec<RecentCheck>,
    pub(crate) interested_loans: Vec<InterestedLoan>,
}

/// Body decoded as JSON when the request says so, otherwise as a url-encoded form.
pub(crate) struct FormOrJson<T>(pub(crate) T);

#[async_trait]
impl<S, T> FromRequest<S> for FormOrJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send + 'static,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim_start().starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        }
    }
}

/// Router exposing account, eligibility, and interest-list endpoints.
pub fn loan_router<S>(state: Arc<ServiceState<S>>) -> Router
where
    S: LoanStore + 'static,
{
    Router::new()
        .route("/signup", post(signup_handler::<S>))
        .route("/login", post(login_handler::<S>))
        .route("/logout", get(logout_handler::<S>))
        .route("/contact", post(contact_handler::<S>))
        .route("/predict", post(predict_handler::<S>))
        .route("/api/v1/eligibility", post(eligibility_handler::<S>))
        .route("/add_interest", post(add_interest_handler::<S>))
        .route("/interested", get(interested_handler::<S>))
        .route("/remove_interest", post(remove_interest_handler::<S>))
        .route("/dashboard", get(dashboard_handler::<S>))
        .with_state(state)
}

pub(crate) fn with_operational_routes(router: Router) -> Router {
    router
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn signup_handler<S>(
    State(state): State<Arc<ServiceState<S>>>,
    Form(request): Form<SignupRequest>,
) -> Result<Response, AppError>
where
    S: LoanStore + 'static,
{
    let user = state.accounts.signup(request)?;
    let payload = json!({
        "message": "Account created! Please log in.",
        "user": user,
    });
    Ok((StatusCode::CREATED, Json(payload)).into_response())
}

pub(crate) async fn login_handler<S>(
    State(state): State<Arc<ServiceState<S>>>,
    Form(request): Form<LoginRequest>,
) -> Result<Response, AppError>
where
    S: LoanStore + 'static,
{
    let user = state.accounts.login(request)?;
    let token = state.sessions.create(&user);
    info!(user_id = user.id, "user logged in");

    let payload = json!({
        "message": format!("Welcome back, {}", user.name),
        "user": user,
    });
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(payload),
    )
        .into_response())
}

pub(crate) async fn logout_handler<S>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: LoanStore + 'static,
{
    if let Some((token, _)) = state.sessions.session_for(&headers) {
        state.sessions.remove(&token);
    }
    (
        StatusCode::OK,
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(json!({ "message": "You have been logged out." })),
    )
        .into_response()
}

pub(crate) async fn contact_handler<S>(
    State(state): State<Arc<ServiceState<S>>>,
    Form(message): Form<ContactMessage>,
) -> Result<Response, AppError>
where
    S: LoanStore + 'static,
{
    state.accounts.contact(message)?;
    let payload = json!({ "message": "Your message has been sent successfully!" });
    Ok((StatusCode::CREATED, Json(payload)).into_response())
}

/// Fixed-mapping eligibility form; malformed numbers are a 400, model trouble is not.
pub(crate) async fn predict_handler<S>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    FormOrJson(form): FormOrJson<EligibilityForm>,
) -> Result<Json<LoanVerdict>, AppError>
where
    S: LoanStore + 'static,
{
    let (verdict, source) = check_eligibility_with_source(&state.artifact, &form)?;
    info!(result = %verdict.result, ?source, "eligibility form scored");

    if let Some((token, _)) = state.sessions.session_for(&headers) {
        state.sessions.record_check(&token, &verdict);
    }
    Ok(Json(verdict))
}

/// Generic-lookup prediction over an arbitrary JSON object; always yields a result.
pub(crate) async fn eligibility_handler<S>(
    State(state): State<Arc<ServiceState<S>>>,
    Json(raw): Json<RawApplication>,
) -> Json<PredictionResult>
where
    S: LoanStore + 'static,
{
    let (result, source) = predict_with_source(&state.artifact, &raw);
    info!(eligible = result.eligible, probability = result.probability, ?source, "application scored");
    Json(result)
}

pub(crate) async fn add_interest_handler<S>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Json(loan): Json<InterestedLoan>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: LoanStore + 'static,
{
    let (_, session) = state
        .sessions
        .session_for(&headers)
        .ok_or(AppError::Unauthenticated)?;
    state.accounts.add_interest(&session.email, loan)?;
    Ok(Json(json!({ "message": "Loan added to your interests!" })))
}

pub(crate) async fn interested_handler<S>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: LoanStore + 'static,
{
    let (_, session) = state
        .sessions
        .session_for(&headers)
        .ok_or(AppError::Unauthenticated)?;
    let loans = state.accounts.interests(&session.email)?;
    Ok(Json(json!({ "interested_loans": loans })))
}

pub(crate) async fn remove_interest_handler<S>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
    Form(key): Form<InterestKey>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: LoanStore + 'static,
{
    let (_, session) = state
        .sessions
        .session_for(&headers)
        .ok_or(AppError::Unauthenticated)?;
    let removed = state.accounts.remove_interest(&session.email, &key)?;
    Ok(Json(json!({
        "message": "Loan removed from your interests.",
        "removed": removed,
    })))
}

pub(crate) async fn dashboard_handler<S>(
    State(state): State<Arc<ServiceState<S>>>,
    headers: HeaderMap,
) -> Result<Json<DashboardResponse>, AppError>
where
    S: LoanStore + 'static,
{
    let Some((_, session)) = state.sessions.session_for(&headers) else {
        return Ok(Json(DashboardResponse {
            user: None,
            summary: DashboardSummary {
                eligible_count: 0,
                not_eligible_count: 0,
                interested_count: 0,
            },
            recent_checks: Vec::new(),
            interested_loans: Vec::new(),
        }));
    };

    let recent_checks: Vec<RecentCheck> = session.recent_checks.iter().cloned().collect();
    let eligible_count = recent_checks
        .iter()
        .filter(|check| check.result == LoanVerdict::ELIGIBLE)
        .count();
    let summary = DashboardSummary {
        eligible_count,
        not_eligible_count: recent_checks.len() - eligible_count,
        interested_count: state.accounts.interest_count(&session.email)?,
    };
    let interested_loans = state.accounts.interests(&session.email)?;

    Ok(Json(DashboardResponse {
        user: Some(session.name),
        summary,
        recent_checks,
        interested_loans,
    }))
}
