//! # CSV Table Input
//!
//! Readers for the tabular inputs a project draws on: component geometry,
//! crew throughput, material prices and hourly weather. Headers may use
//! either the snake_case field names or the spreadsheet column titles
//! ("Section height m", "Material type ID", "Speed m per s", ...).
//!
//! ## Example
//!
//! ```rust,no_run
//! use cost_core::tables::read_weather;
//! use std::path::Path;
//!
//! let weather = read_weather(Path::new("site_weather.csv"))?;
//! println!("{} hours of weather", weather.len());
//! # Ok::<(), cost_core::errors::CalcError>(())
//! ```

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::calculations::schedule::ThroughputRecord;
use crate::errors::{CalcError, CalcResult};
use crate::loads::ComponentRecord;
use crate::materials::{MaterialPrice, PriceField};
use crate::weather::{WeatherRecord, DEFAULT_SEASONS};

/// Accepted weather timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

fn open(path: &Path) -> CalcResult<File> {
    File::open(path).map_err(|e| CalcError::file_error("open table", path.display().to_string(), e.to_string()))
}

/// Deserialize every row of a headed CSV table.
///
/// Row numbers in errors count the header as row 1.
fn read_rows<T: DeserializeOwned, R: Read>(reader: R, table: &str) -> CalcResult<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(reader);

    let mut rows = Vec::new();
    for (row_idx, result) in reader.deserialize().enumerate() {
        let row: T = result.map_err(|e| CalcError::SerializationError {
            reason: format!("{} row {}: {}", table, row_idx + 2, e),
        })?;
        rows.push(row);
    }
    debug!(table, rows = rows.len(), "table read");
    Ok(rows)
}

/// Component table from any reader.
pub fn components_from_reader<R: Read>(reader: R) -> CalcResult<Vec<ComponentRecord>> {
    read_rows(reader, "components")
}

/// Component table from a CSV file.
pub fn read_components(path: &Path) -> CalcResult<Vec<ComponentRecord>> {
    components_from_reader(open(path)?)
}

/// Throughput table from any reader.
pub fn throughput_from_reader<R: Read>(reader: R) -> CalcResult<Vec<ThroughputRecord>> {
    read_rows(reader, "throughput")
}

/// Throughput table from a CSV file.
pub fn read_throughput(path: &Path) -> CalcResult<Vec<ThroughputRecord>> {
    throughput_from_reader(open(path)?)
}

#[derive(Debug, Deserialize)]
struct PriceRow {
    #[serde(alias = "Material type ID")]
    material_id: String,
    #[serde(alias = "Material price USD per unit")]
    price_usd_per_unit: String,
}

/// Price table from any reader.
///
/// Prices are kept as text and parsed when costed, so "$1,200" is accepted.
pub fn material_prices_from_reader<R: Read>(reader: R) -> CalcResult<Vec<MaterialPrice>> {
    let rows: Vec<PriceRow> = read_rows(reader, "material_price")?;
    Ok(rows
        .into_iter()
        .map(|row| MaterialPrice::new(row.material_id, PriceField::Text(row.price_usd_per_unit)))
        .collect())
}

/// Price table from a CSV file.
pub fn read_material_prices(path: &Path) -> CalcResult<Vec<MaterialPrice>> {
    material_prices_from_reader(open(path)?)
}

#[derive(Debug, Deserialize)]
struct WeatherRow {
    #[serde(alias = "Date", alias = "Date UTC")]
    timestamp: String,
    #[serde(alias = "Speed m per s")]
    wind_speed_m_s: f64,
    #[serde(default, alias = "Season")]
    season: Option<String>,
    #[serde(alias = "Time window")]
    time_window: String,
}

/// Parse a weather timestamp in any of the accepted layouts.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text.trim(), format).ok())
}

/// Weather series from any reader.
///
/// Rows without a season are labelled from their month.
pub fn weather_from_reader<R: Read>(reader: R) -> CalcResult<Vec<WeatherRecord>> {
    let rows: Vec<WeatherRow> = read_rows(reader, "weather")?;

    rows.into_iter()
        .enumerate()
        .map(|(row_idx, row)| -> CalcResult<WeatherRecord> {
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
                CalcError::invalid_input(
                    format!("weather row {}.timestamp", row_idx + 2),
                    row.timestamp.clone(),
                    "Unrecognised date/time format",
                )
            })?;

            let season = match row.season.filter(|s| !s.is_empty()) {
                Some(season) => season,
                None => DEFAULT_SEASONS
                    .season_for(&timestamp)
                    .map(str::to_string)
                    .ok_or_else(|| CalcError::missing_field(format!("weather row {}.season", row_idx + 2)))?,
            };

            Ok(WeatherRecord::new(timestamp, row.wind_speed_m_s, season, row.time_window))
        })
        .collect()
}

/// Weather series from a CSV file.
pub fn read_weather(path: &Path) -> CalcResult<Vec<WeatherRecord>> {
    weather_from_reader(open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costs::CostType;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_components_with_sheet_headers() {
        let csv = "\
Component,Section height m,Surface area sq m,Lever arm m,Weight tonne
Tower,45,180,45,120
Nacelle,90,40,90,75
";
        let rows = components_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].component.as_deref(), Some("Tower"));
        assert_eq!(rows[1].weight_tonne, 75.0);
    }

    #[test]
    fn test_components_with_field_names() {
        let csv = "section_height_m,surface_area_sq_m,lever_arm_m,weight_tonne\n30,120,30,95\n";
        let rows = components_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rows[0], ComponentRecord::new(30.0, 120.0, 30.0, 95.0));
    }

    #[test]
    fn test_throughput_equipment_rental_alias() {
        let csv = "\
Material type ID,Operation ID,Type of cost,Daily output,Rate USD per unit
Concrete 5000 psi,Pour concrete,Labor,120,22.5
Concrete 5000 psi,Concrete pump,Equipment rental,150,9
";
        let rows = throughput_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].cost_type, CostType::Labor);
        assert_eq!(rows[1].cost_type, CostType::Equipment);
        assert_eq!(rows[1].daily_output, 150.0);
    }

    #[test]
    fn test_prices_kept_as_text() {
        let csv = "\
Material type ID,Material price USD per unit
Steel - rebar,\"$1,200.00\"
Concrete 5000 psi,125
";
        let prices = material_prices_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(prices[0].unit_price().unwrap(), 1200.0);
        assert_eq!(prices[1].unit_price().unwrap(), 125.0);
    }

    #[test]
    fn test_bad_number_reports_row() {
        let csv = "section_height_m,surface_area_sq_m,lever_arm_m,weight_tonne\n30,120,30,95\n30,wide,30,95\n";
        let err = components_from_reader(csv.as_bytes()).unwrap_err();
        match err {
            CalcError::SerializationError { reason } => assert!(reason.contains("row 3")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_weather_fills_missing_season() {
        let csv = "\
Date,Speed m per s,Season,Time window
2024-01-15 08:00:00,12.5,,normal
2024-07-15 08:00,14.0,summer,normal
07/16/2024 09:00,3.0,custom,long
";
        let rows = weather_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].season, "winter");
        assert_eq!(rows[1].season, "summer");
        assert_eq!(rows[2].season, "custom");
        assert_eq!(
            rows[2].timestamp,
            NaiveDate::from_ymd_opt(2024, 7, 16).unwrap().and_hms_opt(9, 0, 0).unwrap()
        );
        assert_eq!(rows[2].time_window, "long");
    }

    #[test]
    fn test_weather_without_season_column() {
        let csv = "timestamp,wind_speed_m_s,time_window\n2024-04-02T10:00:00,6.5,normal\n";
        let rows = weather_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].season, "spring");
    }

    #[test]
    fn test_weather_bad_timestamp() {
        let csv = "Date,Speed m per s,Season,Time window\nyesterday,5,summer,normal\n";
        let err = weather_from_reader(csv.as_bytes()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("weather.csv");
        fs::write(&path, "Date,Speed m per s,Season,Time window\n2024-06-01 07:00:00,18,summer,normal\n").unwrap();

        let rows = read_weather(&path).unwrap();
        assert_eq!(rows[0].wind_speed_m_s, 18.0);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_components(&dir.path().join("absent.csv")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }
}
