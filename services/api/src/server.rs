use crate::cli::ServeArgs;
use crate::infra::{analysis_service, AppState};
use crate::routes::with_analysis_routes;
use association_pulse::config::AppConfig;
use association_pulse::error::AppError;
use association_pulse::scoring::QuestionFilter;
use association_pulse::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let service = Arc::new(analysis_service(&config, QuestionFilter::All)?);
    let completion_mode = if service.manager().has_completion_client() {
        "completion-service"
    } else {
        "fallback-only"
    };

    let app = with_analysis_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        completion_mode,
        cache_ttl_secs = config.cache.ttl.as_secs(),
        "association pulse service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
