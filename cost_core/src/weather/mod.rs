//! # Weather Delays
//!
//! Hours lost to high wind during foundation construction.
//!
//! ## Weather window
//!
//! The hourly series is first narrowed to the construction window: hours in
//! one of the construction seasons *and* inside the selected time-of-day
//! window (e.g. `normal` = 10 working hours, `long` = round the clock).
//!
//! ## Delay accounting
//!
//! 1. Take the first `ceil(mission_days · operating_hours_per_day)` hours of
//!    the window. If the window is shorter, every available hour is used -
//!    there is no padding and no error, but the result is marked truncated
//!    and a warning is logged.
//! 2. Skip the start delay (hours at the beginning that never count).
//! 3. Split the remaining hours into operating days (consecutive hours on the
//!    same calendar date) and count the hours above the critical wind speed.
//! 4. A day with more than 4 h of delay is lost entirely and charged 10 h.
//!    Exactly 4 h is charged as 4 h.
//! 5. The total is the sum of the charged hours.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeSet;
//! use chrono::NaiveDate;
//! use cost_core::config::FoundationConfig;
//! use cost_core::weather::{calculate_wind_delay, WeatherRecord, WeatherWindow};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
//! let series: Vec<WeatherRecord> = (7..17)
//!     .map(|h| WeatherRecord::new(day.and_hms_opt(h, 0, 0).unwrap(), 15.0, "summer", "normal"))
//!     .collect();
//!
//! let seasons: BTreeSet<String> = ["summer".to_string()].into();
//! let window = WeatherWindow::create(&series, &seasons, "normal");
//!
//! let config = FoundationConfig::default();
//! let delay = calculate_wind_delay(&window, 1.0, 10.0, &config.weather).unwrap();
//! // Ten windy hours -> the whole day is lost
//! assert_eq!(delay.total_delay_hours, 10.0);
//! ```

pub mod season;

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::WeatherConstants;
use crate::errors::{CalcError, CalcResult};

pub use season::{SeasonMap, DEFAULT_SEASONS};

/// One hour of site weather.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// Start of the hour (site local time)
    #[serde(alias = "Date")]
    pub timestamp: NaiveDateTime,

    /// Mean wind speed at the working height (m/s)
    #[serde(alias = "Speed m per s")]
    pub wind_speed_m_s: f64,

    /// Season label (e.g. "summer")
    #[serde(alias = "Season")]
    pub season: String,

    /// Time-of-day window the hour belongs to (e.g. "normal", "long")
    #[serde(alias = "Time window")]
    pub time_window: String,
}

impl WeatherRecord {
    pub fn new(
        timestamp: NaiveDateTime,
        wind_speed_m_s: f64,
        season: impl Into<String>,
        time_window: impl Into<String>,
    ) -> Self {
        WeatherRecord {
            timestamp,
            wind_speed_m_s,
            season: season.into(),
            time_window: time_window.into(),
        }
    }
}

/// Weather hours inside the construction seasons and time-of-day window,
/// in series order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherWindow {
    records: Vec<WeatherRecord>,
}

impl WeatherWindow {
    /// Filter a weather series to the construction seasons and time window.
    pub fn create(weather: &[WeatherRecord], seasons: &BTreeSet<String>, time_window: &str) -> Self {
        let records = weather
            .iter()
            .filter(|r| seasons.contains(&r.season) && r.time_window == time_window)
            .cloned()
            .collect();
        WeatherWindow { records }
    }

    /// Wrap records that are already filtered.
    pub fn from_records(records: Vec<WeatherRecord>) -> Self {
        WeatherWindow { records }
    }

    /// Keep at most the first `max_records` hours.
    ///
    /// A window already shorter than `max_records` is returned unchanged.
    pub fn truncated(mut self, max_records: usize) -> Self {
        self.records.truncate(max_records);
        self
    }

    pub fn records(&self) -> &[WeatherRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Number of weather hours covering `days` working days.
pub fn required_hours(days: f64, daily_operating_hours: f64) -> CalcResult<usize> {
    if !days.is_finite() || days < 0.0 {
        return Err(CalcError::invalid_input(
            "mission_days",
            days.to_string(),
            "Duration must be finite and non-negative",
        ));
    }
    if !daily_operating_hours.is_finite() || daily_operating_hours <= 0.0 {
        return Err(CalcError::invalid_input(
            "daily_operating_hours",
            daily_operating_hours.to_string(),
            "Operating hours must be finite and positive",
        ));
    }
    Ok((days * daily_operating_hours).ceil() as usize)
}

/// Delay on one operating day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyDelay {
    pub date: NaiveDate,
    /// Hours above the critical wind speed
    pub delay_hours: f64,
    /// Hours charged after the whole-day shutdown rule
    pub charged_hours: f64,
}

/// Wind delay over one mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindDelay {
    /// Hours the mission needs
    pub required_hours: usize,
    /// Hours the weather window could supply
    pub available_hours: usize,
    /// True when the window was shorter than the mission
    pub truncated: bool,
    pub daily: Vec<DailyDelay>,
    /// Sum of charged hours
    pub total_delay_hours: f64,
}

/// Whole-day shutdown rule: more than `threshold_hours` of delay loses the
/// whole day (`full_day_hours`); anything up to and including the threshold
/// is charged as measured.
pub fn apply_shutdown_rule(delay_hours: f64, threshold_hours: f64, full_day_hours: f64) -> f64 {
    if delay_hours > threshold_hours {
        full_day_hours
    } else {
        delay_hours
    }
}

/// Total wind delay for a mission of `mission_days` working days.
///
/// Start delay, critical wind speed and the shutdown rule come from
/// `weather`.
///
/// # Errors
///
/// * `InvalidInput` - negative/non-finite duration, non-positive operating
///   hours, or a non-finite or negative wind speed in the mission hours
pub fn calculate_wind_delay(
    window: &WeatherWindow,
    mission_days: f64,
    daily_operating_hours: f64,
    weather: &WeatherConstants,
) -> CalcResult<WindDelay> {
    let required = required_hours(mission_days, daily_operating_hours)?;
    let available = window.len().min(required);
    let truncated = window.len() < required;

    // Short windows are used as-is: no padding, no error.
    if truncated {
        warn!(
            required_hours = required,
            available_hours = window.len(),
            "TruncatedWeatherWindow: weather window shorter than construction mission"
        );
    }

    let mission = &window.records()[..available];
    for (index, record) in mission.iter().enumerate() {
        if !record.wind_speed_m_s.is_finite() || record.wind_speed_m_s < 0.0 {
            return Err(CalcError::invalid_input(
                format!("weather[{}].wind_speed_m_s", index),
                record.wind_speed_m_s.to_string(),
                "Wind speed must be finite and non-negative",
            ));
        }
    }

    let start = (weather.start_delay_hours as usize).min(mission.len());
    let mut daily: Vec<DailyDelay> = Vec::new();
    for record in &mission[start..] {
        let date = record.timestamp.date();
        let windy = if record.wind_speed_m_s > weather.critical_wind_speed_m_s { 1.0 } else { 0.0 };
        match daily.last_mut() {
            Some(day) if day.date == date => day.delay_hours += windy,
            _ => daily.push(DailyDelay {
                date,
                delay_hours: windy,
                charged_hours: 0.0,
            }),
        }
    }

    for day in &mut daily {
        day.charged_hours = apply_shutdown_rule(
            day.delay_hours,
            weather.shutdown_threshold_hours,
            weather.full_day_delay_hours,
        );
    }
    let total_delay_hours: f64 = daily.iter().map(|d| d.charged_hours).sum();

    debug!(
        required_hours = required,
        available_hours = available,
        days = daily.len(),
        total_delay_hours,
        "wind delay calculated"
    );

    Ok(WindDelay {
        required_hours: required,
        available_hours: available,
        truncated,
        daily,
        total_delay_hours,
    })
}
