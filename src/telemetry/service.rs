use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::control::policy;
use crate::db::models::{ControlSettings, NewReading, Reading};
use crate::db::Store;
use crate::state::LiveState;
use crate::thresholds;

/// Ingestion pipeline for device telemetry.
///
/// Each call runs strictly sequentially: persist the reading, refresh the
/// live mirror and heartbeat, evaluate thresholds, run the control policy.
/// Every write commits independently, so a failure partway through leaves
/// the earlier writes durable; after the reading itself is stored, follow-up
/// failures are logged rather than surfaced to the device.
#[derive(Clone)]
pub struct TelemetryService {
    store: Store,
    live: LiveState,
}

impl TelemetryService {
    pub fn new(store: Store, live: LiveState) -> Self {
        Self { store, live }
    }

    /// Persists one validated reading and returns its generated id.
    pub async fn ingest(&self, new: NewReading) -> Result<i64> {
        let now = Utc::now();

        let id = self.store.insert_reading(&new, now).await?;

        let reading = Reading {
            id,
            recorded_at: now,
            temperature: new.temperature,
            humidity: new.humidity,
            ph: new.ph,
            tds: new.tds,
            light_intensity: new.light_intensity,
            co2: new.co2,
            soil_moisture: new.soil_moisture,
            water_level: new.water_level,
        };

        self.live.record_reading(reading.clone()).await;
        self.live
            .record_heartbeat(new.battery_level, new.solar_power, now)
            .await;

        self.store
            .record_heartbeat(new.battery_level, new.solar_power, now)
            .await?;

        let settings = match self.store.control_settings().await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                warn!("no control settings row; using defaults for this reading");
                ControlSettings::default()
            }
            Err(e) => {
                error!(error = %e, "failed to load control settings; skipping alerts and auto control");
                return Ok(id);
            }
        };

        self.check_thresholds(&reading, &settings).await;
        self.run_auto_control(&reading, &settings).await;

        Ok(id)
    }

    async fn check_thresholds(&self, reading: &Reading, settings: &ControlSettings) {
        for breach in thresholds::evaluate(reading, settings) {
            info!(
                alert_type = ?breach.alert_type,
                severity = ?breach.severity,
                message = %breach.message,
                "threshold alert"
            );
            if let Err(e) = self
                .store
                .insert_alert(breach.alert_type, &breach.message, breach.severity)
                .await
            {
                // The reading is already durable; an unsent alert is the
                // documented gap, not a request failure.
                error!(error = %e, "failed to persist alert");
            }
        }
    }

    async fn run_auto_control(&self, reading: &Reading, settings: &ControlSettings) {
        let decision = policy::decide(reading, settings);
        if !decision.changed {
            return;
        }

        info!(
            pump = decision.settings.pump_status,
            fan = decision.settings.fan_status,
            curtain_closed = decision.settings.curtain_status,
            "automatic control transition"
        );

        // A failed write is logged but the decision is not rolled back; the
        // in-memory view may diverge from storage until the next successful
        // write.
        match self.store.save_control_settings(&decision.settings).await {
            Ok(0) => warn!("control settings row missing; transition not persisted"),
            Ok(_) => {}
            Err(e) => error!(error = %e, "failed to persist control settings transition"),
        }
    }
}
