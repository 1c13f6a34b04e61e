//! # Construction Schedule
//!
//! Days, crews and nominal cost for each foundation operation.
//!
//! Foundations get a fixed share (1/3 by default) of the project's
//! construction duration. Each operation in the throughput table is joined to
//! the material it consumes; its duration is the material quantity divided by
//! one crew's daily output. An operation that would overrun the foundation
//! window gets more crews, and its time on site is capped at the window:
//!
//! ```text
//! days  = quantity / daily_output
//! crews = ceil((days / 30) / foundation_months)
//! time  = min(days, foundation_months · 30)
//! cost  = quantity · rate
//! ```
//!
//! The join is validated first: a material without an operation, or an
//! operation without a material, is a [`CalcError::JoinMismatch`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FoundationConfig;
use crate::costs::CostType;
use crate::errors::{CalcError, CalcResult};
use crate::materials::MaterialQuantity;

/// One row of the crew/equipment throughput table.
///
/// Column names from RSMeans-style sheets ("Material type ID", "Daily output",
/// ...) are accepted as aliases so exported sheets load unchanged.
///
/// ## JSON Example
///
/// ```json
/// {
///   "material_id": "Concrete 5000 psi",
///   "operation_id": "Pour concrete",
///   "cost_type": "Labor",
///   "daily_output": 120.0,
///   "rate_usd_per_unit": 22.5
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputRecord {
    #[serde(alias = "Material type ID")]
    pub material_id: String,

    #[serde(alias = "Operation ID")]
    pub operation_id: String,

    /// Labor or Equipment
    #[serde(alias = "Type of cost")]
    pub cost_type: CostType,

    /// Units of material one crew handles per day
    #[serde(alias = "Daily output")]
    pub daily_output: f64,

    /// Crew or equipment cost per unit of material (USD)
    #[serde(alias = "Rate USD per unit")]
    pub rate_usd_per_unit: f64,
}

impl ThroughputRecord {
    pub fn new(
        material_id: impl Into<String>,
        operation_id: impl Into<String>,
        cost_type: CostType,
        daily_output: f64,
        rate_usd_per_unit: f64,
    ) -> Self {
        ThroughputRecord {
            material_id: material_id.into(),
            operation_id: operation_id.into(),
            cost_type,
            daily_output,
            rate_usd_per_unit,
        }
    }

    /// Validate the row at position `index` of the throughput table.
    pub fn validate(&self, index: usize) -> CalcResult<()> {
        if !matches!(self.cost_type, CostType::Labor | CostType::Equipment) {
            return Err(CalcError::invalid_input(
                format!("throughput[{}].cost_type", index),
                self.cost_type.to_string(),
                "Throughput rows must be Labor or Equipment",
            ));
        }
        if !self.daily_output.is_finite() || self.daily_output <= 0.0 {
            return Err(CalcError::invalid_input(
                format!("throughput[{}].daily_output", index),
                self.daily_output.to_string(),
                "Daily output must be finite and positive",
            ));
        }
        if !self.rate_usd_per_unit.is_finite() || self.rate_usd_per_unit < 0.0 {
            return Err(CalcError::invalid_input(
                format!("throughput[{}].rate_usd_per_unit", index),
                self.rate_usd_per_unit.to_string(),
                "Rate must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

/// Schedule and nominal cost of one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSchedule {
    pub operation_id: String,
    pub material_id: String,
    pub cost_type: CostType,

    /// Material quantity handled by this operation
    pub quantity: f64,
    pub unit: String,

    pub daily_output: f64,
    pub rate_usd_per_unit: f64,

    /// Crew-days needed at one crew
    pub number_of_days: f64,

    /// Crews needed to finish inside the foundation window
    pub number_of_crews: u32,

    /// Days on site: `number_of_days` capped at the foundation window
    pub time_construct_days: f64,

    /// quantity · rate, before weather delays
    pub cost_usd_without_weather: f64,
}

/// Check that the throughput table and the material quantities match
/// one-to-one on material id.
///
/// # Errors
///
/// * `JoinMismatch` - a produced material has no operation, or an operation
///   references a material the estimator did not produce
pub fn validate_throughput_join(throughput: &[ThroughputRecord], quantities: &[MaterialQuantity]) -> CalcResult<()> {
    let produced: BTreeSet<&str> = quantities.iter().map(|q| q.material_id.as_str()).collect();
    let scheduled: BTreeSet<&str> = throughput.iter().map(|t| t.material_id.as_str()).collect();

    if let Some(missing) = produced.difference(&scheduled).next() {
        return Err(CalcError::join_mismatch(
            "throughput",
            *missing,
            "material has no throughput row",
        ));
    }
    if let Some(orphan) = scheduled.difference(&produced).next() {
        return Err(CalcError::join_mismatch(
            "throughput",
            *orphan,
            "throughput row references a material that is not produced",
        ));
    }
    Ok(())
}

/// Foundation window in months for a project construction duration.
pub fn foundation_construction_months(construct_duration_months: f64, config: &FoundationConfig) -> CalcResult<f64> {
    if !construct_duration_months.is_finite() || construct_duration_months <= 0.0 {
        return Err(CalcError::invalid_input(
            "construct_duration",
            construct_duration_months.to_string(),
            "Construction duration must be finite and positive",
        ));
    }
    Ok(construct_duration_months * config.schedule.foundation_fraction)
}

/// Schedule every operation in the throughput table.
///
/// Rows are returned in throughput-table order.
///
/// # Errors
///
/// * `InvalidInput` - non-positive duration or daily output, negative rate,
///   or a throughput row that is not Labor or Equipment
/// * `JoinMismatch` - see [`validate_throughput_join`]
pub fn estimate_construction_time(
    throughput: &[ThroughputRecord],
    quantities: &[MaterialQuantity],
    construct_duration_months: f64,
    config: &FoundationConfig,
) -> CalcResult<Vec<OperationSchedule>> {
    let foundation_months = foundation_construction_months(construct_duration_months, config)?;
    let window_days = foundation_months * config.schedule.days_per_month;

    for (index, row) in throughput.iter().enumerate() {
        row.validate(index)?;
    }
    validate_throughput_join(throughput, quantities)?;

    let mut operations = Vec::with_capacity(throughput.len());
    for row in throughput {
        // Join is validated above; every row has its material.
        let Some(material) = quantities.iter().find(|q| q.material_id == row.material_id) else {
            return Err(CalcError::join_mismatch(
                "throughput",
                row.material_id.clone(),
                "material has no quantity",
            ));
        };

        let number_of_days = material.quantity / row.daily_output;
        let number_of_crews = ((number_of_days / config.schedule.days_per_month) / foundation_months).ceil() as u32;
        let time_construct_days = number_of_days.min(window_days);

        operations.push(OperationSchedule {
            operation_id: row.operation_id.clone(),
            material_id: row.material_id.clone(),
            cost_type: row.cost_type,
            quantity: material.quantity,
            unit: material.unit.clone(),
            daily_output: row.daily_output,
            rate_usd_per_unit: row.rate_usd_per_unit,
            number_of_days,
            number_of_crews,
            time_construct_days,
            cost_usd_without_weather: material.quantity * row.rate_usd_per_unit,
        });
    }

    debug!(
        operations = operations.len(),
        foundation_months,
        window_days,
        "construction time estimated"
    );

    Ok(operations)
}

/// Longest time on site across all operations, if any.
pub fn max_time_construct_days(operations: &[OperationSchedule]) -> Option<f64> {
    operations
        .iter()
        .map(|op| op.time_construct_days)
        .fold(None, |max, t| match max {
            Some(m) if m >= t => Some(m),
            _ => Some(t),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantity(material_id: &str, quantity: f64) -> MaterialQuantity {
        MaterialQuantity {
            material_id: material_id.to_string(),
            quantity,
            unit: "unit".to_string(),
        }
    }

    #[test]
    fn test_number_of_days() {
        let throughput = vec![ThroughputRecord::new("Concrete", "Pour", CostType::Labor, 10.0, 4.0)];
        let quantities = vec![quantity("Concrete", 25.0)];

        let ops = estimate_construction_time(&throughput, &quantities, 9.0, &FoundationConfig::default()).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].number_of_days, 2.5);
        assert_eq!(ops[0].time_construct_days, 2.5);
        assert_eq!(ops[0].number_of_crews, 1);
        assert_eq!(ops[0].cost_usd_without_weather, 100.0);
    }

    #[test]
    fn test_crews_added_to_meet_window() {
        // 9 months · 1/3 = 3 months = 90-day window
        let throughput = vec![ThroughputRecord::new("Concrete", "Pour", CostType::Labor, 10.0, 1.0)];
        let quantities = vec![quantity("Concrete", 2000.0)];

        let ops = estimate_construction_time(&throughput, &quantities, 9.0, &FoundationConfig::default()).unwrap();
        // 200 days / 30 / 3 = 2.22 -> 3 crews, compressed into the window
        assert_eq!(ops[0].number_of_days, 200.0);
        assert_eq!(ops[0].number_of_crews, 3);
        assert!((ops[0].time_construct_days - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_exactly_window_not_compressed() {
        let throughput = vec![ThroughputRecord::new("Concrete", "Pour", CostType::Labor, 10.0, 1.0)];
        let quantities = vec![quantity("Concrete", 300.0)];
        let config = FoundationConfig::default();

        let ops = estimate_construction_time(&throughput, &quantities, 3.0, &config).unwrap();
        // window = 3 · (1/3) · 30 = 30 days
        assert!((ops[0].time_construct_days - 30.0).abs() < 1e-9);
        assert_eq!(ops[0].number_of_crews, 1);
    }

    #[test]
    fn test_multiple_operations_per_material() {
        let throughput = vec![
            ThroughputRecord::new("Steel", "Place rebar", CostType::Labor, 2.0, 500.0),
            ThroughputRecord::new("Concrete", "Pour", CostType::Labor, 100.0, 20.0),
            ThroughputRecord::new("Concrete", "Pump truck", CostType::Equipment, 150.0, 8.0),
        ];
        let quantities = vec![quantity("Steel", 50.0), quantity("Concrete", 600.0)];

        let ops = estimate_construction_time(&throughput, &quantities, 9.0, &FoundationConfig::default()).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0].operation_id, "Place rebar");
        assert_eq!(ops[2].cost_type, CostType::Equipment);
        assert_eq!(ops[2].number_of_days, 4.0);
        assert_eq!(max_time_construct_days(&ops), Some(25.0));
    }

    #[test]
    fn test_missing_throughput_row_is_join_mismatch() {
        let throughput = vec![ThroughputRecord::new("Concrete", "Pour", CostType::Labor, 10.0, 1.0)];
        let quantities = vec![quantity("Steel", 50.0), quantity("Concrete", 600.0)];

        let err = estimate_construction_time(&throughput, &quantities, 9.0, &FoundationConfig::default()).unwrap_err();
        assert_eq!(
            err,
            CalcError::join_mismatch("throughput", "Steel", "material has no throughput row")
        );
    }

    #[test]
    fn test_orphan_throughput_row_is_join_mismatch() {
        let throughput = vec![
            ThroughputRecord::new("Concrete", "Pour", CostType::Labor, 10.0, 1.0),
            ThroughputRecord::new("Gravel", "Spread", CostType::Equipment, 10.0, 1.0),
        ];
        let quantities = vec![quantity("Concrete", 600.0)];

        let err = estimate_construction_time(&throughput, &quantities, 9.0, &FoundationConfig::default()).unwrap_err();
        match err {
            CalcError::JoinMismatch { material_id, .. } => assert_eq!(material_id, "Gravel"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_rows() {
        let config = FoundationConfig::default();
        let quantities = vec![quantity("Concrete", 600.0)];

        let zero_output = vec![ThroughputRecord::new("Concrete", "Pour", CostType::Labor, 0.0, 1.0)];
        assert!(estimate_construction_time(&zero_output, &quantities, 9.0, &config).is_err());

        let materials_row = vec![ThroughputRecord::new("Concrete", "Pour", CostType::Materials, 10.0, 1.0)];
        assert!(estimate_construction_time(&materials_row, &quantities, 9.0, &config).is_err());

        let other_row = vec![ThroughputRecord::new("Concrete", "Permits", CostType::Other, 10.0, 1.0)];
        let err = estimate_construction_time(&other_row, &quantities, 9.0, &config).unwrap_err();
        match err {
            CalcError::InvalidInput { field, value, .. } => {
                assert_eq!(field, "throughput[0].cost_type");
                assert_eq!(value, "Other");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let ok = vec![ThroughputRecord::new("Concrete", "Pour", CostType::Labor, 10.0, 1.0)];
        assert!(estimate_construction_time(&ok, &quantities, 0.0, &config).is_err());
    }

    #[test]
    fn test_sheet_column_aliases() {
        let json = r#"{
            "Material type ID": "Concrete 5000 psi",
            "Operation ID": "Pour",
            "Type of cost": "Equipment",
            "Daily output": 120.0,
            "Rate USD per unit": 9.5
        }"#;
        let record: ThroughputRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.material_id, "Concrete 5000 psi");
        assert_eq!(record.cost_type, CostType::Equipment);
    }

    #[test]
    fn test_max_time_empty() {
        assert_eq!(max_time_construct_days(&[]), None);
    }
}
