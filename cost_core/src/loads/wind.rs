//! Wind pressure on turbine components.
//!
//! Velocity pressure and force on a single component, after Shrestha (2015),
//! *Design and Analysis of Foundation for Onshore Tall Wind Turbines*:
//!
//! ```text
//! K_z = 2.01 · (z / z_g)^(2/α)
//! q_z = 0.613 · K_z · K_zt · K_d · V²
//! F   = q_z · G · C_f · A_f
//! ```

use crate::config::WindConstants;

/// Exposure factor K_z at section height `height_m`.
///
/// Zero height gives exactly zero.
pub fn exposure_factor(height_m: f64, wind: &WindConstants) -> f64 {
    wind.exposure_scale * (height_m / wind.gradient_height_m).powf(2.0 / wind.exposure_coefficient)
}

/// Velocity pressure q_z (N/m²) at section height `height_m`.
pub fn velocity_pressure(height_m: f64, wind: &WindConstants) -> f64 {
    let v = wind.reference_wind_speed_m_s;
    wind.pressure_constant
        * exposure_factor(height_m, wind)
        * wind.topographic_factor
        * wind.directionality_factor
        * v
        * v
}

/// Design wind force (N) on a component of projected area `area_sq_m`.
pub fn wind_force(height_m: f64, area_sq_m: f64, wind: &WindConstants) -> f64 {
    velocity_pressure(height_m, wind) * wind.gust_factor * wind.force_coefficient * area_sq_m
}
