//! # Calibration Constants
//!
//! Every density, conversion factor and regression coefficient used by the
//! foundation pipeline lives in [`FoundationConfig`]. The defaults reproduce
//! the reference model; a project file can override any subset of them.
//!
//! ## JSON Override
//!
//! Sections and fields are all optional. Anything left out keeps its default:
//!
//! ```json
//! {
//!   "weather": { "critical_wind_speed_m_s": 15.0 },
//!   "schedule": { "foundation_fraction": 0.5 }
//! }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cost_core::config::FoundationConfig;
//!
//! let config = FoundationConfig::default();
//! assert_eq!(config.weather.critical_wind_speed_m_s, 13.0);
//! assert_eq!(config.daily_operating_hours("normal").unwrap(), 10.0);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Root configuration for one foundation cost run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FoundationConfig {
    /// Wind pressure constants (ASCE 7 style velocity pressure)
    pub wind: WindConstants,

    /// Dead load and unit conversion constants
    pub gravity: GravityConstants,

    /// Empirical raft sizing regression
    pub sizing: SizingRegression,

    /// Material take-off ratios and unit conversions
    pub materials: MaterialConstants,

    /// Foundation share of the construction schedule
    pub schedule: ScheduleConstants,

    /// Weather delay thresholds and operating windows
    pub weather: WeatherConstants,
}

/// Constants for the per-component wind force.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConstants {
    /// Terrain exposure coefficient α
    pub exposure_coefficient: f64,
    /// Gradient height z_g (m)
    pub gradient_height_m: f64,
    /// Leading coefficient of the exposure factor K_z
    pub exposure_scale: f64,
    /// Velocity pressure constant (N/m² per (m/s)²)
    pub pressure_constant: f64,
    /// Wind directionality factor K_d
    pub directionality_factor: f64,
    /// Topographic factor K_zt
    pub topographic_factor: f64,
    /// Design wind speed V (m/s)
    pub reference_wind_speed_m_s: f64,
    /// Gust factor G
    pub gust_factor: f64,
    /// Force coefficient C_f
    pub force_coefficient: f64,
}

impl Default for WindConstants {
    fn default() -> Self {
        WindConstants {
            exposure_coefficient: 9.5,
            gradient_height_m: 274.32,
            exposure_scale: 2.01,
            pressure_constant: 0.613,
            directionality_factor: 0.95,
            topographic_factor: 1.0,
            reference_wind_speed_m_s: 70.0,
            gust_factor: 0.85,
            force_coefficient: 0.8,
        }
    }
}

/// Constants for converting component mass to dead load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConstants {
    /// Gravitational acceleration (m/s²)
    pub gravity_m_s2: f64,
    /// Kilograms per metric tonne
    pub kg_per_tonne: f64,
}

impl Default for GravityConstants {
    fn default() -> Self {
        GravityConstants {
            gravity_m_s2: 9.8,
            kg_per_tonne: 1000.0,
        }
    }
}

/// Coefficients of the raft volume regression:
///
/// `V = scale · (moment_coefficient · M · M/(lateral_divisor·F_lat) · M/(dead_divisor·F_dead) + intercept) / yd³-per-m³`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingRegression {
    pub scale: f64,
    pub moment_coefficient: f64,
    pub lateral_divisor: f64,
    pub dead_divisor: f64,
    /// Volume intercept (yd³)
    pub intercept_yd3: f64,
}

impl Default for SizingRegression {
    fn default() -> Self {
        SizingRegression {
            scale: 1.012,
            moment_coefficient: 0.0000034,
            lateral_divisor: 71.0,
            dead_divisor: 20.0,
            intercept_yd3: 168.0,
        }
    }
}

/// Material take-off ratios, ids and unit conversions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConstants {
    /// Rebar volume as a fraction of foundation volume
    pub rebar_volume_fraction: f64,
    /// Steel density (kg/m³)
    pub steel_density_kg_m3: f64,
    /// Concrete volume as a fraction of foundation volume
    pub concrete_volume_fraction: f64,
    /// Cubic yards per cubic meter
    pub cubic_yards_per_cubic_meter: f64,
    /// Short tons per metric tonne
    pub short_tons_per_tonne: f64,
    /// Material id used for rebar in the throughput and price tables
    pub steel_material_id: String,
    pub steel_unit: String,
    /// Material id used for concrete in the throughput and price tables
    pub concrete_material_id: String,
    pub concrete_unit: String,
}

impl Default for MaterialConstants {
    fn default() -> Self {
        MaterialConstants {
            rebar_volume_fraction: 0.012,
            steel_density_kg_m3: 9490.0,
            concrete_volume_fraction: 0.99,
            cubic_yards_per_cubic_meter: 1.30795,
            short_tons_per_tonne: 0.907185,
            steel_material_id: "Steel - rebar".to_string(),
            steel_unit: "ton (short)".to_string(),
            concrete_material_id: "Concrete 5000 psi".to_string(),
            concrete_unit: "cubic yards".to_string(),
        }
    }
}

/// Foundation share of the overall construction schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConstants {
    /// Fraction of the project construction duration given to foundations
    pub foundation_fraction: f64,
    /// Working days per month
    pub days_per_month: f64,
}

impl Default for ScheduleConstants {
    fn default() -> Self {
        ScheduleConstants {
            foundation_fraction: 1.0 / 3.0,
            days_per_month: 30.0,
        }
    }
}

/// Weather delay thresholds and operating windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConstants {
    /// Wind speed above which work stops (m/s)
    pub critical_wind_speed_m_s: f64,
    /// Hours at the start of the window that never count as delay
    pub start_delay_hours: u32,
    /// Daily delay above which the whole day is lost (hours)
    pub shutdown_threshold_hours: f64,
    /// Delay charged for a lost day (hours)
    pub full_day_delay_hours: f64,
    /// Operating hours per day, keyed by time window id
    pub operating_hours: BTreeMap<String, f64>,
}

impl Default for WeatherConstants {
    fn default() -> Self {
        let mut operating_hours = BTreeMap::new();
        operating_hours.insert("normal".to_string(), 10.0);
        operating_hours.insert("long".to_string(), 24.0);
        WeatherConstants {
            critical_wind_speed_m_s: 13.0,
            start_delay_hours: 0,
            shutdown_threshold_hours: 4.0,
            full_day_delay_hours: 10.0,
            operating_hours,
        }
    }
}

impl FoundationConfig {
    /// Create the reference configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the critical wind speed (builder pattern)
    pub fn with_critical_wind_speed(mut self, speed_m_s: f64) -> Self {
        self.weather.critical_wind_speed_m_s = speed_m_s;
        self
    }

    /// Add or replace an operating window (builder pattern)
    pub fn with_operating_window(mut self, time_window: impl Into<String>, hours_per_day: f64) -> Self {
        self.weather.operating_hours.insert(time_window.into(), hours_per_day);
        self
    }

    /// Daily operating hours for a time window id.
    pub fn daily_operating_hours(&self, time_window: &str) -> CalcResult<f64> {
        self.weather
            .operating_hours
            .get(time_window)
            .copied()
            .ok_or_else(|| {
                CalcError::invalid_input(
                    "time_construct",
                    time_window,
                    format!(
                        "Unknown time window; expected one of: {}",
                        self.weather
                            .operating_hours
                            .keys()
                            .cloned()
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                )
            })
    }

    /// Validate that every calibration value is usable.
    ///
    /// Coefficients that appear as divisors or scale factors must be finite
    /// and positive; the start delay and topographic factor may be anything
    /// non-negative.
    pub fn validate(&self) -> CalcResult<()> {
        let positive = [
            ("wind.exposure_coefficient", self.wind.exposure_coefficient),
            ("wind.gradient_height_m", self.wind.gradient_height_m),
            ("wind.exposure_scale", self.wind.exposure_scale),
            ("wind.pressure_constant", self.wind.pressure_constant),
            ("wind.directionality_factor", self.wind.directionality_factor),
            ("wind.reference_wind_speed_m_s", self.wind.reference_wind_speed_m_s),
            ("wind.gust_factor", self.wind.gust_factor),
            ("wind.force_coefficient", self.wind.force_coefficient),
            ("gravity.gravity_m_s2", self.gravity.gravity_m_s2),
            ("gravity.kg_per_tonne", self.gravity.kg_per_tonne),
            ("sizing.scale", self.sizing.scale),
            ("sizing.moment_coefficient", self.sizing.moment_coefficient),
            ("sizing.lateral_divisor", self.sizing.lateral_divisor),
            ("sizing.dead_divisor", self.sizing.dead_divisor),
            ("materials.rebar_volume_fraction", self.materials.rebar_volume_fraction),
            ("materials.steel_density_kg_m3", self.materials.steel_density_kg_m3),
            ("materials.concrete_volume_fraction", self.materials.concrete_volume_fraction),
            ("materials.cubic_yards_per_cubic_meter", self.materials.cubic_yards_per_cubic_meter),
            ("materials.short_tons_per_tonne", self.materials.short_tons_per_tonne),
            ("schedule.foundation_fraction", self.schedule.foundation_fraction),
            ("schedule.days_per_month", self.schedule.days_per_month),
            ("weather.critical_wind_speed_m_s", self.weather.critical_wind_speed_m_s),
            ("weather.full_day_delay_hours", self.weather.full_day_delay_hours),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CalcError::invalid_input(
                    field,
                    value.to_string(),
                    "Calibration value must be finite and positive",
                ));
            }
        }

        let non_negative = [
            ("wind.topographic_factor", self.wind.topographic_factor),
            ("sizing.intercept_yd3", self.sizing.intercept_yd3),
            ("weather.shutdown_threshold_hours", self.weather.shutdown_threshold_hours),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CalcError::invalid_input(
                    field,
                    value.to_string(),
                    "Calibration value must be finite and non-negative",
                ));
            }
        }

        if self.materials.steel_material_id == self.materials.concrete_material_id {
            return Err(CalcError::invalid_input(
                "materials.concrete_material_id",
                self.materials.concrete_material_id.clone(),
                "Steel and concrete must use distinct material ids",
            ));
        }

        for (window, hours) in &self.weather.operating_hours {
            if !hours.is_finite() || *hours <= 0.0 || *hours > 24.0 {
                return Err(CalcError::invalid_input(
                    format!("weather.operating_hours.{}", window),
                    hours.to_string(),
                    "Operating hours must be in (0, 24]",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(FoundationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_reference_constants() {
        let config = FoundationConfig::new();
        assert_eq!(config.wind.exposure_coefficient, 9.5);
        assert_eq!(config.wind.gradient_height_m, 274.32);
        assert_eq!(config.gravity.gravity_m_s2, 9.8);
        assert_eq!(config.materials.steel_density_kg_m3, 9490.0);
        assert!((config.schedule.foundation_fraction - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(config.weather.shutdown_threshold_hours, 4.0);
        assert_eq!(config.weather.full_day_delay_hours, 10.0);
    }

    #[test]
    fn test_partial_json_override() {
        let json = r#"{ "weather": { "critical_wind_speed_m_s": 15.0 } }"#;
        let config: FoundationConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.weather.critical_wind_speed_m_s, 15.0);
        // Untouched fields keep their defaults
        assert_eq!(config.weather.full_day_delay_hours, 10.0);
        assert_eq!(config.daily_operating_hours("long").unwrap(), 24.0);
        assert_eq!(config.sizing, SizingRegression::default());
    }

    #[test]
    fn test_unknown_time_window() {
        let config = FoundationConfig::default();
        let err = config.daily_operating_hours("night").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.to_string().contains("long, normal"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = FoundationConfig::new()
            .with_critical_wind_speed(11.0)
            .with_operating_window("short", 8.0);
        assert_eq!(config.weather.critical_wind_speed_m_s, 11.0);
        assert_eq!(config.daily_operating_hours("short").unwrap(), 8.0);
    }

    #[test]
    fn test_rejects_zero_divisor() {
        let mut config = FoundationConfig::default();
        config.sizing.lateral_divisor = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_operating_hours() {
        let config = FoundationConfig::default().with_operating_window("double", 30.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_shared_material_id() {
        let mut config = FoundationConfig::default();
        config.materials.concrete_material_id = config.materials.steel_material_id.clone();
        assert!(config.validate().is_err());
    }
}
