//! # Foundation Materials
//!
//! Material take-off for a round concrete raft, and the unit price table the
//! take-off is priced against.
//!
//! ## Take-off
//!
//! For a foundation volume V (m³) and n turbines:
//!
//! ```text
//! rebar    = V · 0.012 · 9490 kg/m³ / 1000 · 0.907185   short tons per turbine
//! concrete = V · 0.99 · 1.30795                          cubic yards per turbine
//! ```
//!
//! Both are multiplied by n last, so doubling the turbine count exactly
//! doubles every quantity.
//!
//! ## Example
//!
//! ```rust
//! use cost_core::config::FoundationConfig;
//! use cost_core::materials::estimate_material_needs;
//!
//! let needs = estimate_material_needs(500.0, 1, &FoundationConfig::default()).unwrap();
//! assert_eq!(needs.len(), 2);
//! assert!((needs[1].quantity - 647.435).abs() < 0.01); // concrete, yd³
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FoundationConfig;
use crate::errors::{CalcError, CalcResult};

/// Quantity of one material needed for the whole project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialQuantity {
    /// Material id shared with the throughput and price tables
    pub material_id: String,

    /// Quantity in `unit`
    pub quantity: f64,

    /// Unit label (e.g. "ton (short)", "cubic yards")
    pub unit: String,
}

/// A unit price as read from a price sheet.
///
/// Price sheets often carry numbers as text ("125.50", "1,200"), so both
/// forms are accepted and parsed on use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Number(f64),
    Text(String),
}

impl PriceField {
    /// Parse to a non-negative, finite USD amount.
    pub fn parse(&self, material_id: &str) -> CalcResult<f64> {
        let field = format!("material_price[{}].price_usd_per_unit", material_id);
        let value = match self {
            PriceField::Number(value) => *value,
            PriceField::Text(text) => {
                let cleaned: String = text
                    .trim()
                    .trim_start_matches('$')
                    .chars()
                    .filter(|c| *c != ',')
                    .collect();
                cleaned.parse::<f64>().map_err(|_| {
                    CalcError::invalid_input(field.clone(), text.clone(), "Price is not a number")
                })?
            }
        };
        if !value.is_finite() || value < 0.0 {
            return Err(CalcError::invalid_input(
                field,
                value.to_string(),
                "Price must be finite and non-negative",
            ));
        }
        Ok(value)
    }
}

impl From<f64> for PriceField {
    fn from(value: f64) -> Self {
        PriceField::Number(value)
    }
}

impl From<String> for PriceField {
    fn from(text: String) -> Self {
        PriceField::Text(text)
    }
}

/// One row of the material price table.
///
/// ## JSON Example
///
/// ```json
/// { "material_id": "Concrete 5000 psi", "price_usd_per_unit": "125.00" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialPrice {
    pub material_id: String,
    pub price_usd_per_unit: PriceField,
}

impl MaterialPrice {
    pub fn new(material_id: impl Into<String>, price_usd_per_unit: impl Into<PriceField>) -> Self {
        MaterialPrice {
            material_id: material_id.into(),
            price_usd_per_unit: price_usd_per_unit.into(),
        }
    }

    /// Parsed unit price
    pub fn unit_price(&self) -> CalcResult<f64> {
        self.price_usd_per_unit.parse(&self.material_id)
    }
}

/// Estimate rebar and concrete for `num_turbines` foundations of
/// `foundation_volume_m3` each.
///
/// Returns steel first, then concrete.
///
/// # Errors
///
/// * `InvalidInput` - zero turbines, or a volume that is not finite and positive
pub fn estimate_material_needs(
    foundation_volume_m3: f64,
    num_turbines: u32,
    config: &FoundationConfig,
) -> CalcResult<Vec<MaterialQuantity>> {
    if num_turbines == 0 {
        return Err(CalcError::invalid_input(
            "num_turbines",
            num_turbines.to_string(),
            "At least one turbine is required",
        ));
    }
    if !foundation_volume_m3.is_finite() || foundation_volume_m3 <= 0.0 {
        return Err(CalcError::invalid_input(
            "foundation_volume_m3",
            foundation_volume_m3.to_string(),
            "Foundation volume must be finite and positive",
        ));
    }

    let m = &config.materials;
    let turbines = f64::from(num_turbines);

    let steel_per_turbine = foundation_volume_m3 * m.rebar_volume_fraction * m.steel_density_kg_m3
        / config.gravity.kg_per_tonne
        * m.short_tons_per_tonne;
    let concrete_per_turbine = foundation_volume_m3 * m.concrete_volume_fraction * m.cubic_yards_per_cubic_meter;

    let needs = vec![
        MaterialQuantity {
            material_id: m.steel_material_id.clone(),
            quantity: steel_per_turbine * turbines,
            unit: m.steel_unit.clone(),
        },
        MaterialQuantity {
            material_id: m.concrete_material_id.clone(),
            quantity: concrete_per_turbine * turbines,
            unit: m.concrete_unit.clone(),
        },
    ];

    debug!(
        num_turbines,
        steel = needs[0].quantity,
        concrete = needs[1].quantity,
        "material needs estimated"
    );

    Ok(needs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_turbine_500_m3() {
        let needs = estimate_material_needs(500.0, 1, &FoundationConfig::default()).unwrap();

        assert_eq!(needs[0].material_id, "Steel - rebar");
        assert_eq!(needs[0].unit, "ton (short)");
        // 500 · 0.012 · 9490 / 1000 · 0.907185 = 51.655
        assert!((needs[0].quantity - 51.655).abs() < 0.001);

        assert_eq!(needs[1].material_id, "Concrete 5000 psi");
        assert_eq!(needs[1].unit, "cubic yards");
        // 500 · 0.99 · 1.30795 = 647.435
        assert!((needs[1].quantity - 647.435).abs() < 0.001);
    }

    #[test]
    fn test_linear_in_turbine_count() {
        let config = FoundationConfig::default();
        for n in [1_u32, 3, 7, 50, 121] {
            let single = estimate_material_needs(612.3, n, &config).unwrap();
            let double = estimate_material_needs(612.3, 2 * n, &config).unwrap();
            for (a, b) in single.iter().zip(double.iter()) {
                assert_eq!(b.quantity, 2.0 * a.quantity);
            }
        }
    }

    #[test]
    fn test_zero_turbines_rejected() {
        let err = estimate_material_needs(500.0, 0, &FoundationConfig::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_bad_volume_rejected() {
        let config = FoundationConfig::default();
        assert!(estimate_material_needs(0.0, 1, &config).is_err());
        assert!(estimate_material_needs(f64::INFINITY, 1, &config).is_err());
    }

    #[test]
    fn test_price_parsing() {
        assert_eq!(MaterialPrice::new("Concrete", 125.0).unit_price().unwrap(), 125.0);

        let text: MaterialPrice =
            serde_json::from_str(r#"{"material_id": "Steel - rebar", "price_usd_per_unit": "$1,250.50"}"#).unwrap();
        assert_eq!(text.unit_price().unwrap(), 1250.5);

        let number: MaterialPrice =
            serde_json::from_str(r#"{"material_id": "Steel - rebar", "price_usd_per_unit": 980}"#).unwrap();
        assert_eq!(number.unit_price().unwrap(), 980.0);
    }

    #[test]
    fn test_price_parsing_rejects_garbage() {
        let bad = MaterialPrice::new("Concrete", PriceField::Text("n/a".to_string()));
        let err = bad.unit_price().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.to_string().contains("material_price[Concrete]"));

        let negative = MaterialPrice::new("Concrete", PriceField::Text("-4".to_string()));
        assert!(negative.unit_price().is_err());
    }
}
