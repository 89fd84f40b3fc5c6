use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::{loan_router, with_operational_routes, ServiceState};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_eligibility::accounts::{AccountService, PasswordDigest, SqliteLoanStore};
use loan_eligibility::config::AppConfig;
use loan_eligibility::error::AppError;
use loan_eligibility::prediction::ModelArtifact;
use loan_eligibility::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let artifact = ModelArtifact::load(&config.model.model_path, &config.model.features_path);
    let store = Arc::new(SqliteLoanStore::open(&config.storage.database_path)?);
    let accounts = AccountService::new(store, PasswordDigest::new(&config.storage.secret_key));
    let service_state = Arc::new(ServiceState::new(artifact, accounts));

    let app = with_operational_routes(loan_router(service_state))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "loan eligibility service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
