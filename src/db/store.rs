use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::models::{Alert, AlertType, ControlSettings, DeviceStatus, Metric, NewReading, Reading, Severity};
use super::DbPool;

const READING_COLUMNS: &str = "id, recorded_at, temperature, humidity, ph, tds, \
                               light_intensity, co2, soil_moisture, water_level";

/// One point of a single-metric time series.
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct MetricPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Aggregate statistics for one metric over a time window.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub data_points: i64,
}

/// Storage adapter. The only component that touches durable state; every
/// write commits independently (no transaction spans reading + alerts +
/// settings).
#[derive(Clone)]
pub struct Store {
    pool: DbPool,
}

impl Store {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    // ----------------------------
    // Readings
    // ----------------------------

    pub async fn insert_reading(&self, r: &NewReading, at: DateTime<Utc>) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sensor_readings
              (recorded_at, temperature, humidity, ph, tds, light_intensity, co2,
               soil_moisture, water_level)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(at)
        .bind(r.temperature)
        .bind(r.humidity)
        .bind(r.ph)
        .bind(r.tds)
        .bind(r.light_intensity)
        .bind(r.co2)
        .bind(r.soil_moisture)
        .bind(r.water_level)
        .execute(&self.pool)
        .await
        .context("insert_reading failed")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn latest_reading(&self) -> Result<Option<Reading>> {
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM sensor_readings ORDER BY recorded_at DESC, id DESC LIMIT 1"
        );
        sqlx::query_as::<_, Reading>(&sql)
            .fetch_optional(&self.pool)
            .await
            .context("latest_reading failed")
    }

    /// Readings since `since`, chronological, at most `limit` rows.
    pub async fn historical_readings(
        &self,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Reading>> {
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM sensor_readings \
             WHERE recorded_at >= ? ORDER BY recorded_at ASC, id ASC LIMIT ?"
        );
        sqlx::query_as::<_, Reading>(&sql)
            .bind(since)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("historical_readings failed")
    }

    /// Single-metric series since `since`, chronological, at most `limit` points.
    pub async fn metric_series(
        &self,
        metric: Metric,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<MetricPoint>> {
        let sql = format!(
            "SELECT recorded_at AS timestamp, {col} AS value FROM sensor_readings \
             WHERE recorded_at >= ? ORDER BY recorded_at ASC, id ASC LIMIT ?",
            col = metric.column()
        );
        sqlx::query_as::<_, MetricPoint>(&sql)
            .bind(since)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("metric_series failed")
    }

    /// Per-metric avg/min/max/count over the window starting at `since`.
    pub async fn metric_stats(
        &self,
        since: DateTime<Utc>,
    ) -> Result<BTreeMap<String, MetricStats>> {
        let mut stats = BTreeMap::new();

        for metric in Metric::ALL {
            let sql = format!(
                "SELECT AVG({col}), MIN({col}), MAX({col}), COUNT({col}) \
                 FROM sensor_readings WHERE recorded_at >= ?",
                col = metric.column()
            );
            let (avg, min, max, data_points) =
                sqlx::query_as::<_, (Option<f64>, Option<f64>, Option<f64>, i64)>(&sql)
                    .bind(since)
                    .fetch_one(&self.pool)
                    .await
                    .context("metric_stats failed")?;

            stats.insert(
                metric.column().to_owned(),
                MetricStats {
                    avg: (avg.unwrap_or(0.0) * 100.0).round() / 100.0,
                    min: min.unwrap_or(0.0),
                    max: max.unwrap_or(0.0),
                    data_points,
                },
            );
        }

        Ok(stats)
    }

    // ----------------------------
    // Control settings
    // ----------------------------

    pub async fn control_settings(&self) -> Result<Option<ControlSettings>> {
        sqlx::query_as::<_, ControlSettings>(
            "SELECT * FROM control_settings ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("control_settings failed")
    }

    /// Writes the full settings record back, stamping `updated_at`. Returns
    /// the affected row count (0 when the row vanished underneath us).
    pub async fn save_control_settings(&self, s: &ControlSettings) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE control_settings SET
              pump_auto = ?, fan_auto = ?, curtain_auto = ?,
              pump_status = ?, fan_status = ?, curtain_status = ?,
              temp_threshold_min = ?, temp_threshold_max = ?,
              humidity_threshold_min = ?, humidity_threshold_max = ?,
              ph_threshold_min = ?, ph_threshold_max = ?,
              tds_threshold_min = ?, tds_threshold_max = ?,
              soil_moisture_threshold_min = ?, soil_moisture_threshold_max = ?,
              water_level_threshold_min = ?, water_level_threshold_max = ?,
              updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(s.pump_auto)
        .bind(s.fan_auto)
        .bind(s.curtain_auto)
        .bind(s.pump_status)
        .bind(s.fan_status)
        .bind(s.curtain_status)
        .bind(s.temp_threshold_min)
        .bind(s.temp_threshold_max)
        .bind(s.humidity_threshold_min)
        .bind(s.humidity_threshold_max)
        .bind(s.ph_threshold_min)
        .bind(s.ph_threshold_max)
        .bind(s.tds_threshold_min)
        .bind(s.tds_threshold_max)
        .bind(s.soil_moisture_threshold_min)
        .bind(s.soil_moisture_threshold_max)
        .bind(s.water_level_threshold_min)
        .bind(s.water_level_threshold_max)
        .bind(Utc::now())
        .bind(s.id)
        .execute(&self.pool)
        .await
        .context("save_control_settings failed")?;

        Ok(result.rows_affected())
    }

    // ----------------------------
    // Alerts
    // ----------------------------

    pub async fn insert_alert(
        &self,
        alert_type: AlertType,
        message: &str,
        severity: Severity,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO alerts (created_at, alert_type, message, severity) VALUES (?, ?, ?, ?)",
        )
        .bind(Utc::now())
        .bind(alert_type)
        .bind(message)
        .bind(severity)
        .execute(&self.pool)
        .await
        .context("insert_alert failed")?;

        Ok(result.last_insert_rowid())
    }

    pub async fn recent_alerts(&self, limit: i64) -> Result<Vec<Alert>> {
        sqlx::query_as::<_, Alert>(
            "SELECT id, created_at, alert_type, message, severity FROM alerts \
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("recent_alerts failed")
    }

    // ----------------------------
    // Device status
    // ----------------------------

    pub async fn record_heartbeat(
        &self,
        battery_level: f64,
        solar_power: f64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE device_status SET connected = 1, last_heartbeat = ?, \
             battery_level = ?, solar_power = ?, updated_at = ? WHERE id = 1",
        )
        .bind(at)
        .bind(battery_level)
        .bind(solar_power)
        .bind(at)
        .execute(&self.pool)
        .await
        .context("record_heartbeat failed")?;
        Ok(())
    }

    pub async fn device_status(&self) -> Result<DeviceStatus> {
        sqlx::query_as::<_, DeviceStatus>("SELECT * FROM device_status WHERE id = 1")
            .fetch_one(&self.pool)
            .await
            .context("device_status failed")
    }

    pub async fn set_connected(&self, connected: bool) -> Result<()> {
        sqlx::query("UPDATE device_status SET connected = ?, updated_at = ? WHERE id = 1")
            .bind(connected)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .context("set_connected failed")?;
        Ok(())
    }

    // ----------------------------
    // Health
    // ----------------------------

    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database ping failed")?;
        Ok(())
    }
}
