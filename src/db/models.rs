use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Alert severity, stored as uppercase TEXT.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Metric a threshold alert refers to, stored as uppercase TEXT.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertType {
    Temperature,
    Humidity,
    Ph,
}

/// One persisted sensor snapshot. Immutable once written.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub recorded_at: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub tds: f64,
    pub light_intensity: f64,
    pub co2: f64,
    pub soil_moisture: f64,
    pub water_level: f64,
}

/// Validated ingestion payload, ready to persist. Optional metrics have
/// already been defaulted (soil moisture / water level to 0, battery to 100,
/// solar to 0), matching the device's reporting contract.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReading {
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub tds: f64,
    pub light_intensity: f64,
    pub co2: f64,
    pub soil_moisture: f64,
    pub water_level: f64,
    pub battery_level: f64,
    pub solar_power: f64,
}

/// Per-device thresholds plus actuator and auto-mode state. The latest row
/// by id is the current settings record.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct ControlSettings {
    pub id: i64,
    pub pump_auto: bool,
    pub fan_auto: bool,
    pub curtain_auto: bool,
    pub pump_status: bool,
    pub fan_status: bool,
    /// `true` means the curtain is closed.
    pub curtain_status: bool,
    pub temp_threshold_min: f64,
    pub temp_threshold_max: f64,
    pub humidity_threshold_min: f64,
    pub humidity_threshold_max: f64,
    pub ph_threshold_min: f64,
    pub ph_threshold_max: f64,
    pub tds_threshold_min: f64,
    pub tds_threshold_max: f64,
    pub soil_moisture_threshold_min: f64,
    pub soil_moisture_threshold_max: f64,
    pub water_level_threshold_min: f64,
    pub water_level_threshold_max: f64,
    pub updated_at: DateTime<Utc>,
}

impl Default for ControlSettings {
    /// Mirrors the seeded row in the initial migration.
    fn default() -> Self {
        Self {
            id: 1,
            pump_auto: true,
            fan_auto: true,
            curtain_auto: true,
            pump_status: false,
            fan_status: false,
            curtain_status: false,
            temp_threshold_min: 20.0,
            temp_threshold_max: 30.0,
            humidity_threshold_min: 60.0,
            humidity_threshold_max: 80.0,
            ph_threshold_min: 5.5,
            ph_threshold_max: 6.5,
            tds_threshold_min: 400.0,
            tds_threshold_max: 1200.0,
            soil_moisture_threshold_min: 40.0,
            soil_moisture_threshold_max: 70.0,
            water_level_threshold_min: 20.0,
            water_level_threshold_max: 100.0,
            updated_at: Utc::now(),
        }
    }
}

/// An immutable threshold-breach log entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub alert_type: AlertType,
    pub message: String,
    pub severity: Severity,
}

/// Singleton connectivity/power row (id 1), refreshed on every ingestion and
/// re-projected by the connectivity monitor.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub id: i64,
    pub connected: bool,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub battery_level: f64,
    pub solar_power: f64,
    pub updated_at: DateTime<Utc>,
}

/// The eight reading metrics, used to address a single column in the
/// historical and stats queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Temperature,
    Humidity,
    Ph,
    Tds,
    LightIntensity,
    Co2,
    SoilMoisture,
    WaterLevel,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::Ph,
        Metric::Tds,
        Metric::LightIntensity,
        Metric::Co2,
        Metric::SoilMoisture,
        Metric::WaterLevel,
    ];

    /// The `sensor_readings` column this metric lives in.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::Ph => "ph",
            Metric::Tds => "tds",
            Metric::LightIntensity => "light_intensity",
            Metric::Co2 => "co2",
            Metric::SoilMoisture => "soil_moisture",
            Metric::WaterLevel => "water_level",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(Metric::Temperature),
            "humidity" => Ok(Metric::Humidity),
            "ph" => Ok(Metric::Ph),
            "tds" => Ok(Metric::Tds),
            "light_intensity" => Ok(Metric::LightIntensity),
            "co2" => Ok(Metric::Co2),
            "soil_moisture" => Ok(Metric::SoilMoisture),
            "water_level" => Ok(Metric::WaterLevel),
            other => Err(anyhow::anyhow!("unknown sensor: {other:?}")),
        }
    }
}
