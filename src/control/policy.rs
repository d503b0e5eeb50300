//! Automatic actuator control.
//!
//! Pure decision logic: settings are passed in already loaded and the caller
//! persists the result when `changed` is set. Transitions are edge-triggered
//! so a steady out-of-band reading never causes redundant writes.

use crate::db::models::{ControlSettings, Reading};

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub settings: ControlSettings,
    pub changed: bool,
}

/// Computes target actuator states from one reading.
///
/// - Pump (when `pump_auto`): ON iff soil moisture is below its minimum AND
///   the water level is above its minimum (never run the pump dry), OFF
///   otherwise.
/// - Fan (when `fan_auto`): ON above `temp_threshold_max`, OFF below
///   `temp_threshold_min`, unchanged in the band between (hysteresis, so the
///   actuator does not chatter around a single cutoff).
/// - Curtain (when `curtain_auto`): mirrors the fan rule on the same
///   thresholds; closed (`true`) when hot, open when cold.
pub fn decide(reading: &Reading, current: &ControlSettings) -> Decision {
    let mut settings = current.clone();
    let mut changed = false;

    if settings.pump_auto {
        let pump_on = reading.soil_moisture < settings.soil_moisture_threshold_min
            && reading.water_level > settings.water_level_threshold_min;
        if pump_on != settings.pump_status {
            settings.pump_status = pump_on;
            changed = true;
        }
    }

    if settings.fan_auto {
        if reading.temperature > settings.temp_threshold_max && !settings.fan_status {
            settings.fan_status = true;
            changed = true;
        } else if reading.temperature < settings.temp_threshold_min && settings.fan_status {
            settings.fan_status = false;
            changed = true;
        }
    }

    if settings.curtain_auto {
        if reading.temperature > settings.temp_threshold_max && !settings.curtain_status {
            settings.curtain_status = true;
            changed = true;
        } else if reading.temperature < settings.temp_threshold_min && settings.curtain_status {
            settings.curtain_status = false;
            changed = true;
        }
    }

    Decision { settings, changed }
}
