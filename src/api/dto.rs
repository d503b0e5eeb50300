use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::AppError;
use crate::db::models::{Alert, AlertType, ControlSettings, DeviceStatus, NewReading, Reading, Severity};
use crate::state::LiveDeviceStatus;

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Request body for `POST /api/sensor-data`. All fields arrive optional so
/// that a missing mandatory metric yields a 400 with a field name instead of
/// a generic deserialization error.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SensorDataBody {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub ph: Option<f64>,
    pub tds: Option<f64>,
    pub light_intensity: Option<f64>,
    pub co2: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub water_level: Option<f64>,
    pub battery_level: Option<f64>,
    pub solar_power: Option<f64>,
}

impl SensorDataBody {
    /// Checks the mandatory metrics and applies the documented defaults to
    /// the optional ones (soil moisture / water level 0, battery 100,
    /// solar 0).
    pub fn validate(self) -> Result<NewReading, AppError> {
        fn require(value: Option<f64>, name: &str) -> Result<f64, AppError> {
            value.ok_or_else(|| AppError::Validation(format!("Missing required field: {name}")))
        }

        Ok(NewReading {
            temperature: require(self.temperature, "temperature")?,
            humidity: require(self.humidity, "humidity")?,
            ph: require(self.ph, "ph")?,
            tds: require(self.tds, "tds")?,
            light_intensity: require(self.light_intensity, "light_intensity")?,
            co2: require(self.co2, "co2")?,
            soil_moisture: self.soil_moisture.unwrap_or(0.0),
            water_level: self.water_level.unwrap_or(0.0),
            battery_level: self.battery_level.unwrap_or(100.0),
            solar_power: self.solar_power.unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub status: String,
    pub message: String,
    pub id: i64,
}

// ---------------------------------------------------------------------------
// Current data
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingDto {
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

impl From<Reading> for ReadingDto {
    fn from(r: Reading) -> Self {
        Self {
            id: r.id,
            recorded_at: r.recorded_at,
            temperature: r.temperature,
            humidity: r.humidity,
            ph: r.ph,
            tds: r.tds,
            light_intensity: r.light_intensity,
            co2: r.co2,
            soil_moisture: r.soil_moisture,
            water_level: r.water_level,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceStatusDto {
    pub connected: bool,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub battery_level: f64,
    pub solar_power: f64,
}

impl From<DeviceStatus> for DeviceStatusDto {
    fn from(s: DeviceStatus) -> Self {
        Self {
            connected: s.connected,
            last_heartbeat: s.last_heartbeat,
            battery_level: s.battery_level,
            solar_power: s.solar_power,
        }
    }
}

impl From<LiveDeviceStatus> for DeviceStatusDto {
    fn from(s: LiveDeviceStatus) -> Self {
        Self {
            connected: s.connected,
            last_heartbeat: s.last_heartbeat,
            battery_level: s.battery_level,
            solar_power: s.solar_power,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentDataResponse {
    pub sensor_data: Option<ReadingDto>,
    pub device_status: DeviceStatusDto,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Partial update for `POST /api/controls`; omitted fields keep their
/// current values.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ControlSettingsUpdate {
    pub pump_auto: Option<bool>,
    pub fan_auto: Option<bool>,
    pub curtain_auto: Option<bool>,
    pub pump_status: Option<bool>,
    pub fan_status: Option<bool>,
    pub curtain_status: Option<bool>,
    pub temp_threshold_min: Option<f64>,
    pub temp_threshold_max: Option<f64>,
    pub humidity_threshold_min: Option<f64>,
    pub humidity_threshold_max: Option<f64>,
    pub ph_threshold_min: Option<f64>,
    pub ph_threshold_max: Option<f64>,
    pub tds_threshold_min: Option<f64>,
    pub tds_threshold_max: Option<f64>,
    pub soil_moisture_threshold_min: Option<f64>,
    pub soil_moisture_threshold_max: Option<f64>,
    pub water_level_threshold_min: Option<f64>,
    pub water_level_threshold_max: Option<f64>,
}

impl ControlSettingsUpdate {
    /// Merge into the current settings record.
    pub fn apply(&self, settings: &mut ControlSettings) {
        macro_rules! merge {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(v) = self.$field { settings.$field = v; })+
            };
        }
        merge!(
            pump_auto,
            fan_auto,
            curtain_auto,
            pump_status,
            fan_status,
            curtain_status,
            temp_threshold_min,
            temp_threshold_max,
            humidity_threshold_min,
            humidity_threshold_max,
            ph_threshold_min,
            ph_threshold_max,
            tds_threshold_min,
            tds_threshold_max,
            soil_moisture_threshold_min,
            soil_moisture_threshold_max,
            water_level_threshold_min,
            water_level_threshold_max,
        );
    }
}

/// Rejects any threshold pair where min exceeds max.
pub fn validate_threshold_bands(settings: &ControlSettings) -> Result<(), AppError> {
    let pairs = [
        ("temp", settings.temp_threshold_min, settings.temp_threshold_max),
        ("humidity", settings.humidity_threshold_min, settings.humidity_threshold_max),
        ("ph", settings.ph_threshold_min, settings.ph_threshold_max),
        ("tds", settings.tds_threshold_min, settings.tds_threshold_max),
        (
            "soil_moisture",
            settings.soil_moisture_threshold_min,
            settings.soil_moisture_threshold_max,
        ),
        (
            "water_level",
            settings.water_level_threshold_min,
            settings.water_level_threshold_max,
        ),
    ];

    for (name, min, max) in pairs {
        if min > max {
            return Err(AppError::Validation(format!(
                "{name}_threshold_min ({min}) must not exceed {name}_threshold_max ({max})"
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertDto {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub alert_type: AlertType,
    pub message: String,
    pub severity: Severity,
}

impl From<Alert> for AlertDto {
    fn from(a: Alert) -> Self {
        Self {
            id: a.id,
            created_at: a.created_at,
            alert_type: a.alert_type,
            message: a.message,
            severity: a.severity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_body() -> SensorDataBody {
        SensorDataBody {
            temperature: Some(25.0),
            humidity: Some(65.0),
            ph: Some(6.0),
            tds: Some(500.0),
            light_intensity: Some(800.0),
            co2: Some(400.0),
            soil_moisture: Some(45.0),
            water_level: Some(80.0),
            battery_level: Some(90.0),
            solar_power: Some(11.5),
        }
    }

    #[test]
    fn full_payload_validates() {
        let new = full_body().validate().unwrap();
        assert_eq!(new.temperature, 25.0);
        assert_eq!(new.battery_level, 90.0);
    }

    #[test]
    fn missing_mandatory_field_is_named() {
        let mut body = full_body();
        body.co2 = None;
        let err = body.validate().unwrap_err();
        assert!(err.to_string().contains("Missing required field: co2"));
    }

    #[test]
    fn optional_metrics_default() {
        let body = SensorDataBody {
            soil_moisture: None,
            water_level: None,
            battery_level: None,
            solar_power: None,
            ..full_body()
        };
        let new = body.validate().unwrap();
        assert_eq!(new.soil_moisture, 0.0);
        assert_eq!(new.water_level, 0.0);
        assert_eq!(new.battery_level, 100.0);
        assert_eq!(new.solar_power, 0.0);
    }

    #[test]
    fn threshold_band_validation_rejects_inverted_pair() {
        let mut settings = ControlSettings::default();
        settings.humidity_threshold_min = 90.0;
        let err = validate_threshold_bands(&settings).unwrap_err();
        assert!(err.to_string().contains("humidity_threshold_min"));
    }

    #[test]
    fn partial_update_keeps_unmentioned_fields() {
        let mut settings = ControlSettings::default();
        let update = ControlSettingsUpdate {
            temp_threshold_max: Some(35.0),
            pump_auto: Some(false),
            ..Default::default()
        };
        update.apply(&mut settings);

        assert_eq!(settings.temp_threshold_max, 35.0);
        assert!(!settings.pump_auto);
        // untouched fields keep defaults
        assert_eq!(settings.temp_threshold_min, 20.0);
        assert!(settings.fan_auto);
    }
}
