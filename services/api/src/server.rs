use crate::cli::ServeArgs;
use crate::infra::{seed_store, AppState};
use crate::routes::with_inspection_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use fire_inspection::config::AppConfig;
use fire_inspection::error::AppError;
use fire_inspection::telemetry;
use fire_inspection::workflows::inspection::{
    InspectionError, InspectionService, MemoryInspectionStore,
};
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(MemoryInspectionStore::new());
    if args.no_seed {
        warn!("starting with an empty inspection store");
    } else {
        seed_store(&store, Local::now().date_naive())
            .map_err(InspectionError::from)?;
    }
    let inspection_service = Arc::new(InspectionService::new(store, config.inspection));

    let app = with_inspection_routes(inspection_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "fire inspection service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
