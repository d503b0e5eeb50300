use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use utoipa::OpenApi;

use super::dto::{
    validate_threshold_bands, AlertDto, ControlSettingsUpdate, CurrentDataResponse,
    DeviceStatusDto, IngestResponse, ReadingDto, SensorDataBody, StatusMessage,
};
use super::errors::AppError;
use super::AppState;
use crate::db::models::{AlertType, ControlSettings, Metric, Severity};
use crate::db::store::{MetricPoint, MetricStats};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub hours: Option<i64>,
    pub limit: Option<i64>,
    pub sensor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub hours: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AlertsParams {
    pub limit: Option<i64>,
}

// `?hours` is client-controlled; clamped so the timestamp subtraction
// stays in range for chrono.
const MAX_WINDOW_HOURS: i64 = 24 * 365 * 100;

fn window_start(hours: i64) -> chrono::DateTime<Utc> {
    Utc::now() - Duration::hours(hours.clamp(0, MAX_WINDOW_HOURS))
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// Receive one sensor reading from the device. Persists it, refreshes the
/// live cache and heartbeat, evaluates thresholds, and runs automatic
/// control.
#[utoipa::path(
    post,
    path = "/api/sensor-data",
    request_body = SensorDataBody,
    responses(
        (status = 200, description = "Reading accepted", body = IngestResponse),
        (status = 400, description = "Missing mandatory metric"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "telemetry"
)]
pub async fn ingest_sensor_data(
    State(state): State<AppState>,
    Json(body): Json<SensorDataBody>,
) -> Result<Json<IngestResponse>, AppError> {
    let new = body.validate()?;
    let id = state.telemetry.ingest(new).await?;

    Ok(Json(IngestResponse {
        status: "success".to_owned(),
        message: "Data received successfully".to_owned(),
        id,
    }))
}

/// Latest reading plus device status. Falls back to the in-memory live state
/// when the storage read fails, so dashboards keep working through a
/// database hiccup.
#[utoipa::path(
    get,
    path = "/api/current-data",
    responses(
        (status = 200, description = "Latest reading and device status", body = CurrentDataResponse),
    ),
    tag = "telemetry"
)]
pub async fn get_current_data(State(state): State<AppState>) -> Json<CurrentDataResponse> {
    let from_db = async {
        let latest = state.store.latest_reading().await?;
        let status = state.store.device_status().await?;
        anyhow::Ok((latest, status))
    }
    .await;

    let (sensor_data, device_status) = match from_db {
        Ok((latest, status)) => (latest.map(ReadingDto::from), DeviceStatusDto::from(status)),
        Err(e) => {
            warn!(error = %e, "storage read failed; serving cached current data");
            let (latest, status) = state.live.snapshot().await;
            (latest.map(ReadingDto::from), DeviceStatusDto::from(status))
        }
    };

    Json(CurrentDataResponse {
        sensor_data,
        device_status,
        timestamp: Utc::now(),
    })
}

/// Alias for `/api/current-data`, kept for the device firmware's polling
/// path.
#[utoipa::path(
    get,
    path = "/api/sensor-data",
    responses(
        (status = 200, description = "Latest reading and device status", body = CurrentDataResponse),
    ),
    tag = "telemetry"
)]
pub async fn get_sensor_data(state: State<AppState>) -> Json<CurrentDataResponse> {
    get_current_data(state).await
}

/// Historical readings for charts: `?hours=<24>&limit=<100>`, chronological.
/// With `?sensor=<name>` returns a single-metric `{timestamp, value}`
/// series; an unknown sensor name is a 404.
#[utoipa::path(
    get,
    path = "/api/historical-data",
    params(
        ("hours" = Option<i64>, Query, description = "Time window in hours (default 24)"),
        ("limit" = Option<i64>, Query, description = "Maximum rows (default 100)"),
        ("sensor" = Option<String>, Query, description = "Single metric to return"),
    ),
    responses(
        (status = 200, description = "Readings or single-metric series"),
        (status = 404, description = "Unknown sensor name"),
    ),
    tag = "telemetry"
)]
pub async fn get_historical_data(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Response, AppError> {
    let limit = params.limit.unwrap_or(100).max(0);
    let since = window_start(params.hours.unwrap_or(24));

    match params.sensor {
        Some(name) => {
            let metric: Metric = name
                .parse()
                .map_err(|_| AppError::NotFound(format!("unknown sensor: {name}")))?;
            let series = state.store.metric_series(metric, since, limit).await?;
            Ok(Json(series).into_response())
        }
        None => {
            let readings = state.store.historical_readings(since, limit).await?;
            let dtos: Vec<ReadingDto> = readings.into_iter().map(Into::into).collect();
            Ok(Json(dtos).into_response())
        }
    }
}

/// Per-metric `{avg, min, max, data_points}` over the window.
#[utoipa::path(
    get,
    path = "/api/sensor-stats",
    params(
        ("hours" = Option<i64>, Query, description = "Time window in hours (default 24)"),
    ),
    responses(
        (status = 200, description = "Aggregates keyed by metric name", body = BTreeMap<String, MetricStats>),
    ),
    tag = "telemetry"
)]
pub async fn get_sensor_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<BTreeMap<String, MetricStats>>, AppError> {
    let since = window_start(params.hours.unwrap_or(24));
    Ok(Json(state.store.metric_stats(since).await?))
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Current control settings (thresholds, auto-mode flags, actuator state).
#[utoipa::path(
    get,
    path = "/api/controls",
    responses(
        (status = 200, description = "Current control settings", body = ControlSettings),
        (status = 404, description = "Settings row missing"),
    ),
    tag = "controls"
)]
pub async fn get_controls(State(state): State<AppState>) -> Result<Json<ControlSettings>, AppError> {
    let settings = state
        .store
        .control_settings()
        .await?
        .ok_or_else(|| AppError::NotFound("control settings not initialised".to_owned()))?;
    Ok(Json(settings))
}

/// Partial update of the control settings. Omitted fields keep their
/// current values; a resulting pair with min > max is rejected.
#[utoipa::path(
    post,
    path = "/api/controls",
    request_body = ControlSettingsUpdate,
    responses(
        (status = 200, description = "Settings updated", body = StatusMessage),
        (status = 400, description = "Inverted threshold pair"),
    ),
    tag = "controls"
)]
pub async fn update_controls(
    State(state): State<AppState>,
    Json(update): Json<ControlSettingsUpdate>,
) -> Result<Json<StatusMessage>, AppError> {
    let mut settings = state
        .store
        .control_settings()
        .await?
        .ok_or_else(|| AppError::NotFound("control settings not initialised".to_owned()))?;

    update.apply(&mut settings);
    validate_threshold_bands(&settings)?;

    let affected = state.store.save_control_settings(&settings).await?;
    if affected == 0 {
        warn!("control settings row missing during update");
    }

    Ok(Json(StatusMessage {
        status: "success".to_owned(),
        message: "Controls updated successfully".to_owned(),
    }))
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// Recent alerts, most recent first. `?limit=<50>`.
#[utoipa::path(
    get,
    path = "/api/alerts",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum rows (default 50)"),
    ),
    responses(
        (status = 200, description = "Recent alerts", body = Vec<AlertDto>),
    ),
    tag = "alerts"
)]
pub async fn get_alerts(
    State(state): State<AppState>,
    Query(params): Query<AlertsParams>,
) -> Result<Json<Vec<AlertDto>>, AppError> {
    let limit = params.limit.unwrap_or(50).max(0);
    let alerts = state.store.recent_alerts(limit).await?;
    Ok(Json(alerts.into_iter().map(Into::into).collect()))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Liveness plus a database round-trip.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service and database healthy"),
        (status = 503, description = "Database unreachable"),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => Json(json!({
            "status": "healthy",
            "database": "connected",
            "timestamp": Utc::now(),
        }))
        .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unhealthy",
                "database": "disconnected",
                "error": e.to_string(),
                "timestamp": Utc::now(),
            })),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        ingest_sensor_data,
        get_sensor_data,
        get_current_data,
        get_historical_data,
        get_sensor_stats,
        get_controls,
        update_controls,
        get_alerts,
        health,
    ),
    components(schemas(
        SensorDataBody,
        IngestResponse,
        ReadingDto,
        DeviceStatusDto,
        CurrentDataResponse,
        ControlSettings,
        ControlSettingsUpdate,
        StatusMessage,
        AlertDto,
        AlertType,
        Severity,
        MetricPoint,
        MetricStats,
    )),
    tags(
        (name = "telemetry", description = "Sensor ingestion and query endpoints"),
        (name = "controls", description = "Threshold and actuator settings"),
        (name = "alerts", description = "Threshold breach log"),
        (name = "system", description = "System endpoints"),
    ),
    info(
        title = "Greenhouse Telemetry API",
        version = "0.1.0",
        description = "REST API for greenhouse sensor ingestion, alerts, and actuator control"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
