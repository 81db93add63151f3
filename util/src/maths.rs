//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Vector2, Vector3};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Norm below which a vector is treated as having no direction.
pub const UNIT_MIN_NORM: f64 = 1e-5;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Types whose every component can be checked for finiteness.
pub trait AllFinite {
    /// Returns `true` if no component is NaN or infinite.
    fn all_finite(&self) -> bool;
}

impl AllFinite for f64 {
    fn all_finite(&self) -> bool {
        self.is_finite()
    }
}

impl AllFinite for Vector2<f64> {
    fn all_finite(&self) -> bool {
        self.iter().all(|v| v.is_finite())
    }
}

impl AllFinite for Vector3<f64> {
    fn all_finite(&self) -> bool {
        self.iter().all(|v| v.is_finite())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Return the unit vector in the direction of `v`, or the zero vector if `v` has (almost) no
/// length.
pub fn unit_or_zero(v: &Vector2<f64>) -> Vector2<f64> {
    let norm = v.norm();

    if norm > UNIT_MIN_NORM {
        v / norm
    }
    else {
        Vector2::zeros()
    }
}

/// Bring an angle in degrees back inside (-360, 360) by a single 360 degree shift.
///
/// Returns the wrapped angle and the shift that was applied (one of -360, 0, +360), so that
/// companion angles can be shifted by the same amount.
pub fn wrap_deg_360(angle_deg: f64) -> (f64, f64) {
    if angle_deg > 360.0 {
        (angle_deg - 360.0, -360.0)
    }
    else if angle_deg < -360.0 {
        (angle_deg + 360.0, 360.0)
    }
    else {
        (angle_deg, 0.0)
    }
}

/// Rotate a 2D vector by the given angle (radians, positive from X towards Y).
pub fn rotate_2d(v: &Vector2<f64>, angle_rad: f64) -> Vector2<f64> {
    let (sin, cos) = angle_rad.sin_cos();

    Vector2::new(
        cos * v[0] - sin * v[1],
        sin * v[0] + cos * v[1]
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_all_finite() {
        assert!(1.0f64.all_finite());
        assert!(!f64::NAN.all_finite());
        assert!(Vector3::new(1.0, 2.0, 3.0).all_finite());
        assert!(!Vector3::new(1.0, f64::NAN, 3.0).all_finite());
        assert!(!Vector2::new(f64::INFINITY, 0.0).all_finite());
    }

    #[test]
    fn test_unit_or_zero() {
        assert_eq!(unit_or_zero(&Vector2::new(3.0, 4.0)), Vector2::new(0.6, 0.8));
        assert_eq!(unit_or_zero(&Vector2::zeros()), Vector2::zeros());
        assert_eq!(unit_or_zero(&Vector2::new(1e-7, 0.0)), Vector2::zeros());
    }

    #[test]
    fn test_wrap_deg_360() {
        assert_eq!(wrap_deg_360(370.0), (10.0, -360.0));
        assert_eq!(wrap_deg_360(-400.0), (-40.0, 360.0));
        assert_eq!(wrap_deg_360(360.0), (360.0, 0.0));
        assert_eq!(wrap_deg_360(-90.0), (-90.0, 0.0));
    }

    #[test]
    fn test_rotate_2d() {
        let r = rotate_2d(&Vector2::new(1.0, 0.0), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(r, Vector2::new(0.0, 1.0), epsilon = 1e-12);
    }
}
