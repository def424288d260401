use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryIntakeBackend};
use crate::routes::with_intake_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use civic_intake::backend::{HttpIntakeBackend, IntakeBackend};
use civic_intake::config::{normalize_base_url, AppConfig};
use civic_intake::error::AppError;
use civic_intake::telemetry;
use civic_intake::workflows::IntakeServices;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(base_url) = args.backend_url.take() {
        config.backend.base_url = normalize_base_url(&base_url)?;
    }

    telemetry::init(&config.telemetry)?;

    if args.in_memory {
        warn!("serving from the in-memory backend; nothing is persisted");
        serve(config, Arc::new(InMemoryIntakeBackend::default())).await
    } else {
        let backend = HttpIntakeBackend::new(&config.backend)?;
        info!(base_url = %config.backend.base_url, "using backend REST API");
        serve(config, Arc::new(backend)).await
    }
}

async fn serve<B>(config: AppConfig, backend: Arc<B>) -> Result<(), AppError>
where
    B: IntakeBackend + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = Arc::new(IntakeServices::new(backend, config.default_locale));
    let app = with_intake_routes(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, locale = %config.default_locale, "civic intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
