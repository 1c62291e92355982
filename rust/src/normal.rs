//! Closed-form approximation of the standard normal CDF.
//!
//! Abramowitz & Stegun (1964), formula 26.2.17. Absolute error < 7.5e-8.
//! [`legacy_cumulative`] keeps the same coefficients without the density
//! factor, matching the numbers the older calculators printed.

use std::f64::consts::PI;

use crate::config::CdfVariant;

const P: f64 = 0.2316419;
const B1: f64 = 0.319381530;
const B2: f64 = -0.356563782;
const B3: f64 = 1.781477937;
const B4: f64 = -1.821255978;
const B5: f64 = 1.330274429;

/// `b1*t + b2*t^2 + ... + b5*t^5` with `t = 1 / (1 + p|z|)`.
fn poly(z: f64) -> f64 {
    let t = 1.0 / (1.0 + P * z.abs());
    ((((B5 * t + B4) * t + B3) * t + B2) * t + B1) * t
}

/// Standard normal density at `z`.
fn density(z: f64) -> f64 {
    (-0.5 * z * z).exp() / (2.0 * PI).sqrt()
}

/// P(Z <= z) for a standard normal Z.
///
/// The upper tail `density(|z|) * poly(t)` is computed for `|z|` and
/// mirrored for negative arguments, so `cumulative(z) + cumulative(-z) == 1`
/// up to rounding.
pub fn cumulative(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    let tail = density(z) * poly(z);

    let value = if z > 0.0 { 1.0 - tail } else { tail };
    value.clamp(0.0, 1.0)
}

/// `y = poly(t) / 2π + 0.5`, then `1 - y` for positive `z`.
///
/// Ranges over roughly (0.30, 0.70) with a jump at 0; it is not symmetric
/// and not monotone.
pub fn legacy_cumulative(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    let y = poly(z) / (2.0 * PI) + 0.5;
    if z > 0.0 {
        1.0 - y
    } else {
        y
    }
}

/// Evaluate the CDF selected by `variant`.
pub fn cumulative_with(variant: CdfVariant, z: f64) -> f64 {
    match variant {
        CdfVariant::Standard => cumulative(z),
        CdfVariant::Legacy => legacy_cumulative(z),
    }
}
