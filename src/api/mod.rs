pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::db::Store;
use crate::state::LiveState;
use crate::telemetry::TelemetryService;
use handlers::ApiDoc;

/// Shared handler state: storage adapter, live mirror, and the ingestion
/// pipeline built on top of both.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub live: LiveState,
    pub telemetry: TelemetryService,
}

impl AppState {
    pub fn new(store: Store, live: LiveState) -> Self {
        let telemetry = TelemetryService::new(store.clone(), live.clone());
        Self { store, live, telemetry }
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route(
            "/api/sensor-data",
            post(handlers::ingest_sensor_data).get(handlers::get_sensor_data),
        )
        .route("/api/current-data", get(handlers::get_current_data))
        .route("/api/historical-data", get(handlers::get_historical_data))
        .route("/api/sensor-stats", get(handlers::get_sensor_stats))
        .route(
            "/api/controls",
            get(handlers::get_controls).post(handlers::update_controls),
        )
        .route("/api/alerts", get(handlers::get_alerts))
        .route("/api/health", get(handlers::health))
        .with_state(state)
        .split_for_parts();

    router.route(
        "/api-docs/openapi.json",
        get(move || async move { axum::Json(api) }),
    )
}
