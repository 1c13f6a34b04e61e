//! # Cost Aggregation
//!
//! Turns the operation schedule, the wind delay and the material take-off
//! into cost line items, then rolls them up by cost type.
//!
//! ## Wind multiplier
//!
//! ```text
//! multiplier = 1 + wind_delay_hours / max(time_construct_days)
//! ```
//!
//! The multiplier is applied to *every* labor and equipment operation, not
//! only to the ones exposed to wind. Materials are priced without it.
//!
//! ## Example
//!
//! ```rust
//! use cost_core::costs::{aggregate_costs, CostLineItem, CostType, Phase};
//!
//! let items = vec![
//!     CostLineItem::new("Pour", CostType::Labor, 1000.0),
//!     CostLineItem::new("Rebar", CostType::Labor, 500.0),
//!     CostLineItem::new("Concrete", CostType::Materials, 2000.0),
//! ];
//! let totals = aggregate_costs(&items, Phase::Foundations);
//! assert_eq!(totals.len(), 2);
//! assert_eq!(totals[0].cost_usd, 1500.0);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::schedule::{max_time_construct_days, OperationSchedule};
use crate::errors::{CalcError, CalcResult};
use crate::materials::{MaterialPrice, MaterialQuantity};

/// Cost category of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CostType {
    Labor,
    #[serde(alias = "Equipment rental")]
    Equipment,
    Materials,
    /// Catch-all used by other phases (mobilization, fees, ...)
    Other,
}

impl CostType {
    pub fn display_name(&self) -> &'static str {
        match self {
            CostType::Labor => "Labor",
            CostType::Equipment => "Equipment",
            CostType::Materials => "Materials",
            CostType::Other => "Other",
        }
    }
}

impl std::fmt::Display for CostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Phase of balance-of-system construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Foundations,
    Roads,
    Substation,
    #[serde(rename = "Transmission and distribution")]
    TransmissionDistribution,
    Collection,
    Erection,
    Development,
    Management,
}

impl Phase {
    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Foundations => "Foundations",
            Phase::Roads => "Roads",
            Phase::Substation => "Substation",
            Phase::TransmissionDistribution => "Transmission and distribution",
            Phase::Collection => "Collection",
            Phase::Erection => "Erection",
            Phase::Development => "Development",
            Phase::Management => "Management",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Cost of one operation or material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLineItem {
    /// Operation id, or material id for material rows
    pub operation_id: String,
    pub cost_type: CostType,
    pub cost_usd: f64,
}

impl CostLineItem {
    pub fn new(operation_id: impl Into<String>, cost_type: CostType, cost_usd: f64) -> Self {
        CostLineItem {
            operation_id: operation_id.into(),
            cost_type,
            cost_usd,
        }
    }
}

/// Total cost of one cost type within one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseCost {
    pub phase: Phase,
    pub cost_type: CostType,
    pub cost_usd: f64,
}

/// Foundation totals are phase costs with `phase = Foundations`.
pub type TotalFoundationCost = PhaseCost;

/// Weather multiplier on labor and equipment cost.
///
/// # Errors
///
/// * `InvalidInput` - negative or non-finite delay
/// * `InvalidSchedule` - no operations, or the longest operation takes zero days
pub fn wind_multiplier(wind_delay_hours: f64, operations: &[OperationSchedule]) -> CalcResult<f64> {
    if !wind_delay_hours.is_finite() || wind_delay_hours < 0.0 {
        return Err(CalcError::invalid_input(
            "wind_delay_hours",
            wind_delay_hours.to_string(),
            "Delay must be finite and non-negative",
        ));
    }
    let longest = max_time_construct_days(operations)
        .ok_or_else(|| CalcError::invalid_schedule("no construction operations to apply weather delay to"))?;
    if longest <= 0.0 {
        return Err(CalcError::invalid_schedule(format!(
            "longest operation takes {} days; weather multiplier is undefined",
            longest
        )));
    }
    Ok(1.0 + wind_delay_hours / longest)
}

/// Labor and equipment line items with the wind multiplier applied.
pub fn labor_equipment_costs(operations: &[OperationSchedule], multiplier: f64) -> Vec<CostLineItem> {
    operations
        .iter()
        .map(|op| CostLineItem::new(op.operation_id.clone(), op.cost_type, op.cost_usd_without_weather * multiplier))
        .collect()
}

/// Material line items: quantity times parsed unit price.
///
/// Price rows for materials the foundation does not use are ignored; the
/// price sheet is shared with other phases.
///
/// # Errors
///
/// * `JoinMismatch` - a material has no price row
/// * `InvalidInput` - duplicate price rows for a material, or an unusable price
pub fn material_costs(quantities: &[MaterialQuantity], prices: &[MaterialPrice]) -> CalcResult<Vec<CostLineItem>> {
    let mut by_material: BTreeMap<&str, &MaterialPrice> = BTreeMap::new();
    for price in prices {
        if by_material.insert(price.material_id.as_str(), price).is_some() {
            return Err(CalcError::invalid_input(
                format!("material_price[{}]", price.material_id),
                price.material_id.clone(),
                "Duplicate price rows for material",
            ));
        }
    }

    quantities
        .iter()
        .map(|q| -> CalcResult<CostLineItem> {
            let price = by_material.get(q.material_id.as_str()).ok_or_else(|| {
                CalcError::join_mismatch("material_price", q.material_id.clone(), "material has no price row")
            })?;
            Ok(CostLineItem::new(
                q.material_id.clone(),
                CostType::Materials,
                q.quantity * price.unit_price()?,
            ))
        })
        .collect()
}

/// Group line items by cost type and sum them.
///
/// One row per cost type present, ordered Labor, Equipment, Materials, Other.
pub fn aggregate_costs(items: &[CostLineItem], phase: Phase) -> Vec<PhaseCost> {
    let mut totals: BTreeMap<CostType, f64> = BTreeMap::new();
    for item in items {
        *totals.entry(item.cost_type).or_insert(0.0) += item.cost_usd;
    }

    let rows: Vec<PhaseCost> = totals
        .into_iter()
        .map(|(cost_type, cost_usd)| PhaseCost {
            phase,
            cost_type,
            cost_usd,
        })
        .collect();

    debug!(phase = %phase, rows = rows.len(), "costs aggregated");
    rows
}

/// Sum of a set of phase costs.
pub fn total_usd(costs: &[PhaseCost]) -> f64 {
    costs.iter().map(|c| c.cost_usd).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operation(operation_id: &str, cost_type: CostType, days: f64, cost: f64) -> OperationSchedule {
        OperationSchedule {
            operation_id: operation_id.to_string(),
            material_id: "Concrete".to_string(),
            cost_type,
            quantity: 100.0,
            unit: "cubic yards".to_string(),
            daily_output: 100.0 / days,
            rate_usd_per_unit: cost / 100.0,
            number_of_days: days,
            number_of_crews: 1,
            time_construct_days: days,
            cost_usd_without_weather: cost,
        }
    }

    #[test]
    fn test_no_delay_multiplier_is_one() {
        let ops = vec![
            operation("Pour", CostType::Labor, 10.0, 1000.0),
            operation("Pump", CostType::Equipment, 5.0, 400.0),
        ];
        let multiplier = wind_multiplier(0.0, &ops).unwrap();
        assert_eq!(multiplier, 1.0);

        let items = labor_equipment_costs(&ops, multiplier);
        assert_eq!(items[0].cost_usd, 1000.0);
        assert_eq!(items[1].cost_usd, 400.0);
    }

    #[test]
    fn test_multiplier_uses_longest_operation() {
        let ops = vec![
            operation("Pour", CostType::Labor, 10.0, 1000.0),
            operation("Pump", CostType::Equipment, 40.0, 400.0),
        ];
        // 1 + 20 / 40
        let multiplier = wind_multiplier(20.0, &ops).unwrap();
        assert!((multiplier - 1.5).abs() < 1e-12);

        // Applied uniformly, including the short operation
        let items = labor_equipment_costs(&ops, multiplier);
        assert!((items[0].cost_usd - 1500.0).abs() < 1e-9);
        assert!((items[1].cost_usd - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_schedule() {
        let ops = vec![operation("Pour", CostType::Labor, 0.0, 0.0)];
        let err = wind_multiplier(5.0, &ops).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SCHEDULE");

        let err = wind_multiplier(5.0, &[]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SCHEDULE");
    }

    #[test]
    fn test_material_costs() {
        let quantities = vec![
            MaterialQuantity {
                material_id: "Steel - rebar".to_string(),
                quantity: 50.0,
                unit: "ton (short)".to_string(),
            },
            MaterialQuantity {
                material_id: "Concrete 5000 psi".to_string(),
                quantity: 600.0,
                unit: "cubic yards".to_string(),
            },
        ];
        let prices = vec![
            MaterialPrice::new("Gravel", 12.0),
            MaterialPrice::new("Concrete 5000 psi", 125.0),
            MaterialPrice::new("Steel - rebar", 1200.0),
        ];

        let items = material_costs(&quantities, &prices).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].operation_id, "Steel - rebar");
        assert_eq!(items[0].cost_type, CostType::Materials);
        assert_eq!(items[0].cost_usd, 60_000.0);
        assert_eq!(items[1].cost_usd, 75_000.0);
    }

    #[test]
    fn test_missing_price_is_join_mismatch() {
        let quantities = vec![MaterialQuantity {
            material_id: "Steel - rebar".to_string(),
            quantity: 50.0,
            unit: "ton (short)".to_string(),
        }];
        let err = material_costs(&quantities, &[MaterialPrice::new("Concrete 5000 psi", 125.0)]).unwrap_err();
        assert_eq!(err.error_code(), "JOIN_MISMATCH");
    }

    #[test]
    fn test_duplicate_price_rejected() {
        let prices = vec![MaterialPrice::new("Concrete", 125.0), MaterialPrice::new("Concrete", 130.0)];
        assert!(material_costs(&[], &prices).is_err());
    }

    #[test]
    fn test_aggregate_one_row_per_type() {
        let items = vec![
            CostLineItem::new("Pour", CostType::Labor, 1000.0),
            CostLineItem::new("Pump", CostType::Equipment, 400.0),
            CostLineItem::new("Rebar", CostType::Labor, 250.5),
            CostLineItem::new("Concrete", CostType::Materials, 75_000.0),
            CostLineItem::new("Crane", CostType::Equipment, 99.5),
        ];
        let totals = aggregate_costs(&items, Phase::Foundations);

        let types: Vec<CostType> = totals.iter().map(|t| t.cost_type).collect();
        assert_eq!(types, vec![CostType::Labor, CostType::Equipment, CostType::Materials]);
        assert!(totals.iter().all(|t| t.phase == Phase::Foundations));

        for total in &totals {
            let expected: f64 = items
                .iter()
                .filter(|i| i.cost_type == total.cost_type)
                .map(|i| i.cost_usd)
                .sum();
            assert_eq!(total.cost_usd, expected);
        }
        assert_eq!(total_usd(&totals), items.iter().map(|i| i.cost_usd).sum::<f64>());
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&Phase::TransmissionDistribution).unwrap();
        assert_eq!(json, "\"Transmission and distribution\"");
        let cost_type: CostType = serde_json::from_str("\"Equipment rental\"").unwrap();
        assert_eq!(cost_type, CostType::Equipment);
    }
}
