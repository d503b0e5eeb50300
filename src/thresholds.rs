//! Static threshold checks over a single reading.
//!
//! Purely functional: callers load the settings once and persist the
//! resulting alerts themselves. There is no debouncing — a metric that stays
//! out of band produces one alert per reading.

use crate::db::models::{AlertType, ControlSettings, Reading, Severity};

/// One metric that crossed its configured band.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdBreach {
    pub alert_type: AlertType,
    pub message: String,
    pub severity: Severity,
}

/// Compares temperature, humidity, and pH against their `[min, max]` bands.
/// Strictly below min is "too low", strictly above max is "too high"; a
/// value exactly at a bound is normal. pH breaches are CRITICAL, the rest
/// WARNING.
pub fn evaluate(reading: &Reading, settings: &ControlSettings) -> Vec<ThresholdBreach> {
    let mut breaches = Vec::new();

    if reading.temperature < settings.temp_threshold_min {
        breaches.push(ThresholdBreach {
            alert_type: AlertType::Temperature,
            message: format!("Temperature too low: {}°C", reading.temperature),
            severity: Severity::Warning,
        });
    } else if reading.temperature > settings.temp_threshold_max {
        breaches.push(ThresholdBreach {
            alert_type: AlertType::Temperature,
            message: format!("Temperature too high: {}°C", reading.temperature),
            severity: Severity::Warning,
        });
    }

    if reading.humidity < settings.humidity_threshold_min {
        breaches.push(ThresholdBreach {
            alert_type: AlertType::Humidity,
            message: format!("Humidity too low: {}%", reading.humidity),
            severity: Severity::Warning,
        });
    } else if reading.humidity > settings.humidity_threshold_max {
        breaches.push(ThresholdBreach {
            alert_type: AlertType::Humidity,
            message: format!("Humidity too high: {}%", reading.humidity),
            severity: Severity::Warning,
        });
    }

    if reading.ph < settings.ph_threshold_min {
        breaches.push(ThresholdBreach {
            alert_type: AlertType::Ph,
            message: format!("pH too low: {}", reading.ph),
            severity: Severity::Critical,
        });
    } else if reading.ph > settings.ph_threshold_max {
        breaches.push(ThresholdBreach {
            alert_type: AlertType::Ph,
            message: format!("pH too high: {}", reading.ph),
            severity: Severity::Critical,
        });
    }

    breaches
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(temperature: f64, humidity: f64, ph: f64) -> Reading {
        Reading {
            id: 1,
            recorded_at: Utc::now(),
            temperature,
            humidity,
            ph,
            tds: 500.0,
            light_intensity: 800.0,
            co2: 400.0,
            soil_moisture: 45.0,
            water_level: 80.0,
        }
    }

    #[test]
    fn in_band_reading_produces_no_alerts() {
        let settings = ControlSettings::default();
        assert!(evaluate(&reading(25.0, 70.0, 6.0), &settings).is_empty());
    }

    #[test]
    fn values_exactly_at_bounds_are_normal() {
        let settings = ControlSettings::default();
        assert!(evaluate(&reading(20.0, 60.0, 5.5), &settings).is_empty());
        assert!(evaluate(&reading(30.0, 80.0, 6.5), &settings).is_empty());
    }

    #[test]
    fn temperature_above_max_is_warning_too_high() {
        let settings = ControlSettings::default();
        let breaches = evaluate(&reading(32.0, 70.0, 6.0), &settings);
        assert_eq!(breaches.len(), 1);
        assert_eq!(breaches[0].alert_type, AlertType::Temperature);
        assert_eq!(breaches[0].severity, Severity::Warning);
        assert_eq!(breaches[0].message, "Temperature too high: 32°C");
    }

    #[test]
    fn humidity_below_min_is_warning_too_low() {
        let settings = ControlSettings::default();
        let breaches = evaluate(&reading(25.0, 55.0, 6.0), &settings);
        assert_eq!(breaches.len(), 1);
        assert_eq!(breaches[0].alert_type, AlertType::Humidity);
        assert!(breaches[0].message.contains("too low"));
    }

    #[test]
    fn ph_breaches_are_critical() {
        let settings = ControlSettings::default();
        let low = evaluate(&reading(25.0, 70.0, 5.0), &settings);
        assert_eq!(low[0].severity, Severity::Critical);
        assert!(low[0].message.contains("too low"));

        let high = evaluate(&reading(25.0, 70.0, 7.0), &settings);
        assert_eq!(high[0].severity, Severity::Critical);
        assert!(high[0].message.contains("too high"));
    }

    #[test]
    fn multiple_metrics_breach_independently() {
        let settings = ControlSettings::default();
        let breaches = evaluate(&reading(35.0, 50.0, 4.0), &settings);
        assert_eq!(breaches.len(), 3);
    }

    #[test]
    fn evaluation_is_monotonic_around_max() {
        let settings = ControlSettings::default();
        for temperature in [30.5, 31.0, 40.0, 100.0] {
            let breaches = evaluate(&reading(temperature, 70.0, 6.0), &settings);
            assert_eq!(breaches.len(), 1, "temperature {temperature} should alert");
            assert!(breaches[0].message.contains("too high"));
        }
    }
}
