//! Ratio and delta comparators between adjacent windows
//!
//! The two rules are deliberately asymmetric. The ratio carries a -1
//! sentinel for "activity in the short window but a zero long-window
//! denominator" (activity started recently); the delta is the plain
//! difference with no special cases.

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Ratio between a shorter-window value and its adjacent longer-window
/// value: missing when both are zero, -1 when only the denominator is
/// zero, otherwise v1/v2 rounded to 3 decimal places.
pub fn ratio(v1: f64, v2: f64) -> Option<f64> {
    if v1 == 0.0 && v2 == 0.0 {
        None
    } else if v2 == 0.0 {
        Some(-1.0)
    } else {
        Some(round_to(v1 / v2, 3))
    }
}

/// Plain difference between adjacent window values. Never sentineled.
pub fn delta(v1: f64, v2: f64) -> f64 {
    v1 - v2
}

/// Ratio lifted over missing operands.
pub fn ratio_opt(v1: Option<f64>, v2: Option<f64>) -> Option<f64> {
    match (v1, v2) {
        (Some(a), Some(b)) => ratio(a, b),
        _ => None,
    }
}

/// Delta lifted over missing operands.
pub fn delta_opt(v1: Option<f64>, v2: Option<f64>) -> Option<f64> {
    match (v1, v2) {
        (Some(a), Some(b)) => Some(delta(a, b)),
        _ => None,
    }
}
