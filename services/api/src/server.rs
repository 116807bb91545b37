use crate::cli::ServeArgs;
use crate::infra::{AppState, Services};
use crate::routes::with_workflow_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use trinity_audit::config::AppConfig;
use trinity_audit::error::AppError;
use trinity_audit::telemetry;

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

    let services = Services::in_memory(&config.audit, &config.sessions);
    if config.sessions.is_empty() {
        warn!("APP_SESSION_TOKENS is empty; every authenticated route will answer 401");
    }

    let app = with_workflow_routes(&services, config.environment.exposes_diagnostics())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        completeness = ?config.audit.completeness,
        "academic audit portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
