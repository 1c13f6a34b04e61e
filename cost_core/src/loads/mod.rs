//! Foundation loads from turbine components
//!
//! Each tower section, the nacelle and the rotor contribute a wind force
//! (acting at its section height) and a weight. This module sums those into
//! the three loads that size the raft:
//!
//! - **Lateral load** - total horizontal wind force (N)
//! - **Overturning moment** - wind force times lever arm, summed (N·m)
//! - **Dead load** - total weight (N)
//!
//! # Example
//!
//! ```
//! use cost_core::config::FoundationConfig;
//! use cost_core::loads::{calculate_foundation_loads, ComponentRecord};
//!
//! let components = vec![
//!     ComponentRecord::new(45.0, 180.0, 45.0, 120.0),  // tower
//!     ComponentRecord::new(90.0, 40.0, 90.0, 75.0),    // nacelle
//! ];
//!
//! let loads = calculate_foundation_loads(&components, &FoundationConfig::default()).unwrap();
//! assert!(loads.lateral_load_n > 0.0);
//! assert!(loads.moment_n_m > loads.lateral_load_n);
//! ```

pub mod wind;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FoundationConfig;
use crate::errors::{CalcError, CalcResult};

/// One turbine sub-component contributing wind and weight load.
///
/// # JSON Format
/// ```json
/// {
///   "component": "Tower section 1",
///   "section_height_m": 30.0,
///   "surface_area_sq_m": 120.0,
///   "lever_arm_m": 30.0,
///   "weight_tonne": 95.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Optional label, used in error messages
    #[serde(default, alias = "Component", skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    /// Height of the section's load centroid above grade (m)
    #[serde(alias = "Section height m")]
    pub section_height_m: f64,

    /// Projected area facing the wind (m²)
    #[serde(alias = "Surface area sq m")]
    pub surface_area_sq_m: f64,

    /// Lever arm from the foundation to the line of action (m)
    #[serde(alias = "Lever arm m")]
    pub lever_arm_m: f64,

    /// Component mass (metric tonnes)
    #[serde(alias = "Weight tonne")]
    pub weight_tonne: f64,
}

impl ComponentRecord {
    /// Create an unlabelled component record
    pub fn new(section_height_m: f64, surface_area_sq_m: f64, lever_arm_m: f64, weight_tonne: f64) -> Self {
        ComponentRecord {
            component: None,
            section_height_m,
            surface_area_sq_m,
            lever_arm_m,
            weight_tonne,
        }
    }

    /// Attach a label (builder pattern)
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.component = Some(label.into());
        self
    }

    fn field_name(&self, index: usize, field: &str) -> String {
        match &self.component {
            Some(label) => format!("components[{}] ({}).{}", index, label, field),
            None => format!("components[{}].{}", index, field),
        }
    }

    /// Validate the record at position `index` of the component table.
    ///
    /// Heights, areas and weights must be finite and non-negative; the lever
    /// arm only needs to be finite.
    pub fn validate(&self, index: usize) -> CalcResult<()> {
        let non_negative = [
            ("section_height_m", self.section_height_m),
            ("surface_area_sq_m", self.surface_area_sq_m),
            ("weight_tonne", self.weight_tonne),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CalcError::invalid_input(
                    self.field_name(index, field),
                    value.to_string(),
                    "Must be finite and non-negative",
                ));
            }
        }
        if !self.lever_arm_m.is_finite() {
            return Err(CalcError::invalid_input(
                self.field_name(index, "lever_arm_m"),
                self.lever_arm_m.to_string(),
                "Lever arm must be finite",
            ));
        }
        Ok(())
    }
}

/// Aggregate loads at the top of the foundation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoundationLoads {
    /// Vertical load from component weight (N)
    pub dead_load_n: f64,

    /// Total horizontal wind force (N)
    pub lateral_load_n: f64,

    /// Overturning moment at the base of the tower (N·m)
    pub moment_n_m: f64,
}

/// Sum per-component wind forces, moments and weights.
///
/// Rows with zero area or zero height contribute exactly zero force and
/// moment. An empty component table yields all-zero loads, which the
/// foundation sizer will reject.
///
/// # Errors
///
/// * `InvalidInput` - a height, area or weight is negative or non-finite
pub fn calculate_foundation_loads(
    components: &[ComponentRecord],
    config: &FoundationConfig,
) -> CalcResult<FoundationLoads> {
    let mut lateral_load_n = 0.0;
    let mut moment_n_m = 0.0;
    let mut weight_tonne = 0.0;

    for (index, component) in components.iter().enumerate() {
        component.validate(index)?;

        let force = wind::wind_force(component.section_height_m, component.surface_area_sq_m, &config.wind);
        lateral_load_n += force;
        moment_n_m += force * component.lever_arm_m;
        weight_tonne += component.weight_tonne;
    }

    let dead_load_n = weight_tonne * config.gravity.gravity_m_s2 * config.gravity.kg_per_tonne;

    debug!(
        components = components.len(),
        dead_load_n,
        lateral_load_n,
        moment_n_m,
        "foundation loads calculated"
    );

    Ok(FoundationLoads {
        dead_load_n,
        lateral_load_n,
        moment_n_m,
    })
}
