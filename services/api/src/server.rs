use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_assistance_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use scheme_assist::assistance::{AssistanceService, InMemoryRepository, Validator};
use scheme_assist::config::AppConfig;
use scheme_assist::error::AppError;
use scheme_assist::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let validator = config
        .validation
        .reference_date
        .map_or_else(Validator::new, Validator::as_of);
    let repository = Arc::new(InMemoryRepository::new());
    let assistance_service = Arc::new(AssistanceService::with_validator(repository, validator));

    let app = with_assistance_routes(assistance_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "scheme assist api ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(readiness_flag))
        .await?;

    info!("scheme assist api stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM and drops readiness before in-flight requests drain.
async fn shutdown_signal(readiness: Arc<AtomicBool>) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    readiness.store(false, Ordering::Release);
    info!("shutdown signal received; draining connections");
}
