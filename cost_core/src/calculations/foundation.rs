//! # Foundation Sizing
//!
//! Required concrete volume for a round raft foundation.
//!
//! ## Assumptions
//!
//! - Cylindrical raft, 1 m thick, concrete
//! - Non-buoyant design, fixed-bottom tower
//! - Volume from an empirical regression on overturning moment, lateral
//!   load and dead load (not derived from a bearing/overturning check)
//!
//! ```text
//! V_yd3 = 1.012 · (3.4e-6 · M · M/(71·F_lat) · M/(20·F_dead) + 168)
//! V_m3  = V_yd3 / 1.30795
//! ```
//!
//! ## Example
//!
//! ```rust
//! use cost_core::calculations::foundation::determine_foundation_size;
//! use cost_core::config::FoundationConfig;
//! use cost_core::loads::FoundationLoads;
//!
//! let loads = FoundationLoads {
//!     dead_load_n: 4.0e6,
//!     lateral_load_n: 1.5e6,
//!     moment_n_m: 1.0e8,
//! };
//! let volume = determine_foundation_size(&loads, &FoundationConfig::default()).unwrap();
//! assert!(volume > 0.0);
//! ```

use tracing::debug;

use crate::config::FoundationConfig;
use crate::errors::{CalcError, CalcResult};
use crate::loads::FoundationLoads;

/// Foundation volume (m³) for one turbine.
///
/// # Errors
///
/// * `DivisionByZero` - lateral or dead load is zero or negative
/// * `InvalidInput` - any load is non-finite
pub fn determine_foundation_size(loads: &FoundationLoads, config: &FoundationConfig) -> CalcResult<f64> {
    for (field, value) in [
        ("dead_load_n", loads.dead_load_n),
        ("lateral_load_n", loads.lateral_load_n),
        ("moment_n_m", loads.moment_n_m),
    ] {
        if !value.is_finite() {
            return Err(CalcError::invalid_input(field, value.to_string(), "Load must be finite"));
        }
    }
    if loads.lateral_load_n <= 0.0 {
        return Err(CalcError::division_by_zero(
            "foundation sizing",
            format!("lateral load must be positive, got {} N", loads.lateral_load_n),
        ));
    }
    if loads.dead_load_n <= 0.0 {
        return Err(CalcError::division_by_zero(
            "foundation sizing",
            format!("dead load must be positive, got {} N", loads.dead_load_n),
        ));
    }

    let r = &config.sizing;
    let m = loads.moment_n_m;
    let moment_term = r.moment_coefficient
        * m
        * (m / (r.lateral_divisor * loads.lateral_load_n))
        * (m / (r.dead_divisor * loads.dead_load_n));
    let volume_yd3 = r.scale * (moment_term + r.intercept_yd3);
    let volume_m3 = volume_yd3 / config.materials.cubic_yards_per_cubic_meter;

    debug!(volume_m3, "foundation sized");

    Ok(volume_m3)
}
