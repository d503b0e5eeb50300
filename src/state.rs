use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::db::models::Reading;

/// Live connectivity/power snapshot, mirrored from the `device_status` row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LiveDeviceStatus {
    pub connected: bool,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub battery_level: f64,
    pub solar_power: f64,
}

impl Default for LiveDeviceStatus {
    fn default() -> Self {
        Self {
            connected: false,
            last_heartbeat: None,
            battery_level: 100.0,
            solar_power: 0.0,
        }
    }
}

#[derive(Default)]
struct Inner {
    latest: Option<Reading>,
    status: LiveDeviceStatus,
}

/// Process-wide in-memory mirror of the most recent reading and the device
/// status. Serves the current-data endpoint when storage reads fail.
///
/// Wrapped in `Arc` so it can be cheaply cloned and shared across tasks.
/// Last-writer-wins; no consistency guarantee relative to storage.
#[derive(Clone, Default)]
pub struct LiveState {
    inner: Arc<RwLock<Inner>>,
}

impl LiveState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the cached latest reading.
    pub async fn record_reading(&self, reading: Reading) {
        self.inner.write().await.latest = Some(reading);
    }

    /// Refresh heartbeat, battery, and solar; flips connected on.
    pub async fn record_heartbeat(&self, battery_level: f64, solar_power: f64, at: DateTime<Utc>) {
        let mut inner = self.inner.write().await;
        inner.status.connected = true;
        inner.status.last_heartbeat = Some(at);
        inner.status.battery_level = battery_level;
        inner.status.solar_power = solar_power;
    }

    /// Set the connectivity flag (connectivity monitor projection).
    pub async fn set_connected(&self, connected: bool) {
        self.inner.write().await.status.connected = connected;
    }

    pub async fn latest(&self) -> Option<Reading> {
        self.inner.read().await.latest.clone()
    }

    pub async fn status(&self) -> LiveDeviceStatus {
        self.inner.read().await.status.clone()
    }

    /// Consistent snapshot of both halves under one read lock.
    pub async fn snapshot(&self) -> (Option<Reading>, LiveDeviceStatus) {
        let inner = self.inner.read().await;
        (inner.latest.clone(), inner.status.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_reading(id: i64, temperature: f64) -> Reading {
        Reading {
            id,
            recorded_at: Utc::now(),
            temperature,
            humidity: 65.0,
            ph: 6.0,
            tds: 500.0,
            light_intensity: 800.0,
            co2: 400.0,
            soil_moisture: 45.0,
            water_level: 80.0,
        }
    }

    #[tokio::test]
    async fn starts_empty_and_offline() {
        let live = LiveState::new();
        assert!(live.latest().await.is_none());
        let status = live.status().await;
        assert!(!status.connected);
        assert!(status.last_heartbeat.is_none());
        assert_eq!(status.battery_level, 100.0);
    }

    #[tokio::test]
    async fn record_reading_overwrites_previous() {
        let live = LiveState::new();
        live.record_reading(make_reading(1, 21.0)).await;
        live.record_reading(make_reading(2, 25.0)).await;

        let latest = live.latest().await.unwrap();
        assert_eq!(latest.id, 2);
        assert_eq!(latest.temperature, 25.0);
    }

    #[tokio::test]
    async fn heartbeat_marks_connected() {
        let live = LiveState::new();
        let at = Utc::now();
        live.record_heartbeat(87.5, 12.0, at).await;

        let status = live.status().await;
        assert!(status.connected);
        assert_eq!(status.last_heartbeat, Some(at));
        assert_eq!(status.battery_level, 87.5);
        assert_eq!(status.solar_power, 12.0);
    }

    #[tokio::test]
    async fn monitor_can_flip_connectivity_off() {
        let live = LiveState::new();
        live.record_heartbeat(90.0, 0.0, Utc::now()).await;
        live.set_connected(false).await;

        let status = live.status().await;
        assert!(!status.connected);
        // Heartbeat details survive the flip.
        assert!(status.last_heartbeat.is_some());
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let live = LiveState::new();
        let clone = live.clone();

        live.record_reading(make_reading(7, 30.0)).await;
        assert_eq!(clone.latest().await.unwrap().id, 7);
    }
}
