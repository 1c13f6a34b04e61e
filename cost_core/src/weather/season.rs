//! Month to season labelling for weather series without a season column.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Meteorological seasons (Northern Hemisphere).
pub static DEFAULT_SEASONS: Lazy<SeasonMap> = Lazy::new(|| {
    SeasonMap::new()
        .with_season("winter", &[12, 1, 2])
        .with_season("spring", &[3, 4, 5])
        .with_season("summer", &[6, 7, 8])
        .with_season("fall", &[9, 10, 11])
});

/// Season label for each calendar month (1-12).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeasonMap {
    months: BTreeMap<u32, String>,
}

impl SeasonMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `months` to `label` (builder pattern)
    pub fn with_season(mut self, label: &str, months: &[u32]) -> Self {
        for month in months {
            self.months.insert(*month, label.to_string());
        }
        self
    }

    /// Season for a month, if mapped
    pub fn season_for_month(&self, month: u32) -> Option<&str> {
        self.months.get(&month).map(String::as_str)
    }

    /// Season for a timestamp, if its month is mapped
    pub fn season_for(&self, timestamp: &NaiveDateTime) -> Option<&str> {
        self.season_for_month(timestamp.month())
    }
}
