//! # Game Mathematics
//!
//! Small numeric helpers shared by generation and tactics.

use std::f64::consts::{PI, TAU};

/// Clamps `value` into `[lo, hi]`, preferring `lo` when the range is inverted.
///
/// Generation relies on the inverted case: a leaf too small to honour both
/// minimum sizes still gets a split at `lo`.
///
/// # Examples
///
/// ```
/// use delve::clamp_low;
///
/// assert_eq!(clamp_low(5.0, 0.0, 10.0), 5.0);
/// assert_eq!(clamp_low(5.0, 8.0, 3.0), 8.0);
/// ```
pub fn clamp_low(value: f64, lo: f64, hi: f64) -> f64 {
    lo.max(hi.min(value))
}

/// Integer counterpart of [`clamp_low`].
pub fn clamp_low_i32(value: i32, lo: i32, hi: i32) -> i32 {
    lo.max(hi.min(value))
}

/// Absolute difference between two bearings folded into `[0, PI]`.
pub fn angle_delta(a: f64, b: f64) -> f64 {
    let mut delta = (a - b).abs();
    while delta > PI {
        delta = (delta - TAU).abs();
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_low() {
        assert_eq!(clamp_low(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp_low(2.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp_low_i32(20, 10, 5), 10);
        assert_eq!(clamp_low_i32(7, 5, 10), 7);
    }

    #[test]
    fn test_angle_delta_folds() {
        assert!((angle_delta(0.1, -0.1) - 0.2).abs() < 1e-12);
        // Opposite sides of the +/-PI seam are close together.
        let d = angle_delta(PI - 0.1, -PI + 0.1);
        assert!((d - 0.2).abs() < 1e-12);
        assert!(angle_delta(0.0, PI) <= PI);
    }
}
