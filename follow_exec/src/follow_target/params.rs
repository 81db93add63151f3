//! Parameters structure for FollowTarget

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Perspective;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for follow target.
///
/// Parameters may be changed between cycles, see `FollowTarget::set_params`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {

    /// Horizontal distance to keep from the target.
    ///
    /// Units: meters
    pub follow_distance_m: f64,

    /// Side from which to view the target, as an integer code. Unknown codes view the target
    /// from behind.
    pub perspective: Perspective,

    /// Altitude control mode, as an integer code. Unknown codes keep a constant altitude.
    pub altitude_mode: AltitudeMode,

    /// Minimum height above home (or ground) when keeping a constant altitude, or the height
    /// above the target when tracking the target's altitude.
    ///
    /// Units: meters
    pub min_height_m: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How the drone's altitude setpoint is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum AltitudeMode {
    /// Keep the current altitude setpoint, but never lower than the minimum height (2D
    /// tracking). Code 0.
    Constant,

    /// Stay a fixed height above the target's altitude (3D tracking). Code 1.
    TrackTarget,

    /// Any other code, treated as `Constant`.
    Unknown(i32),
}

/// Errors raised by parameter validation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    #[error("Follow distance must be finite and non-negative, found {0} m")]
    InvalidFollowDistance(f64),

    #[error("Minimum height must be finite and non-negative, found {0} m")]
    InvalidMinHeight(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            follow_distance_m: 8.0,
            perspective: Perspective::Behind,
            altitude_mode: AltitudeMode::Constant,
            min_height_m: 8.0,
        }
    }
}

impl Params {
    /// Check that the numerical parameters can be used for control.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !self.follow_distance_m.is_finite() || self.follow_distance_m < 0.0 {
            return Err(ParamsError::InvalidFollowDistance(self.follow_distance_m));
        }

        if !self.min_height_m.is_finite() || self.min_height_m < 0.0 {
            return Err(ParamsError::InvalidMinHeight(self.min_height_m));
        }

        Ok(())
    }
}

impl From<i32> for AltitudeMode {
    fn from(code: i32) -> Self {
        match code {
            0 => AltitudeMode::Constant,
            1 => AltitudeMode::TrackTarget,
            c => AltitudeMode::Unknown(c),
        }
    }
}

impl From<AltitudeMode> for i32 {
    fn from(mode: AltitudeMode) -> Self {
        match mode {
            AltitudeMode::Constant => 0,
            AltitudeMode::TrackTarget => 1,
            AltitudeMode::Unknown(c) => c,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_from_toml() {
        let p: Params = util::params::from_str(
            "follow_distance_m = 5.0\n\
             perspective = 3\n\
             altitude_mode = 1\n\
             min_height_m = 10.0"
        ).unwrap();

        assert_eq!(p.follow_distance_m, 5.0);
        assert_eq!(p.perspective, Perspective::FrontRight);
        assert_eq!(p.altitude_mode, AltitudeMode::TrackTarget);
        assert_eq!(p.min_height_m, 10.0);
    }

    #[test]
    fn test_defaults_and_unknown_codes() {
        let p: Params = util::params::from_str("altitude_mode = 7\nperspective = 42").unwrap();

        assert_eq!(p.follow_distance_m, 8.0);
        assert_eq!(p.min_height_m, 8.0);
        assert_eq!(p.altitude_mode, AltitudeMode::Unknown(7));
        assert_eq!(p.perspective, Perspective::Invalid(42));
        assert_eq!(i32::from(p.altitude_mode), 7);
    }

    #[test]
    fn test_validate() {
        assert!(Params::default().validate().is_ok());

        let p = Params { follow_distance_m: -1.0, ..Default::default() };
        assert_eq!(p.validate(), Err(ParamsError::InvalidFollowDistance(-1.0)));

        let p = Params { min_height_m: f64::INFINITY, ..Default::default() };
        assert_eq!(p.validate(), Err(ParamsError::InvalidMinHeight(f64::INFINITY)));
    }
}
