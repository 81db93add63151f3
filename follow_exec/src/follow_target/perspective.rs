//! # Follow perspective
//!
//! Maps the configured perspective onto a follow angle, and keeps a continuous (unwrapped) angle
//! so that perspective changes near the 0/360 degree boundary rotate the drone the short way
//! around the target.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::wrap_deg_360;

use super::AlphaFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const BEHIND_ANGLE_DEG: f64 = 180.0;
pub const FRONT_ANGLE_DEG: f64 = 0.0;
pub const FRONT_RIGHT_ANGLE_DEG: f64 = 45.0;
pub const FRONT_LEFT_ANGLE_DEG: f64 = 315.0;
pub const MID_RIGHT_ANGLE_DEG: f64 = 90.0;
pub const MID_LEFT_ANGLE_DEG: f64 = 270.0;
pub const BEHIND_RIGHT_ANGLE_DEG: f64 = 135.0;
pub const BEHIND_LEFT_ANGLE_DEG: f64 = 225.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The side from which the drone views the target.
///
/// Angles are measured clockwise from the target's direction of travel, so `Front` is at 0
/// degrees and `Behind` at 180 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Perspective {
    /// No offset, the drone flies over the filtered target position. Code 0.
    None,
    Behind,
    Front,
    FrontRight,
    FrontLeft,
    MidRight,
    MidLeft,
    BehindRight,
    BehindLeft,
    /// Same angle as `Behind`. Code 9.
    MiddleFollow,
    /// Any code outside 0..=9.
    Invalid(i32),
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The continuous follow angle and its filtered counterpart.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FollowAngle {
    /// Unwrapped angle setting, may leave [0, 360) to allow shortest rotations.
    ///
    /// Units: degrees
    raw_deg: f64,

    /// Low-pass filtered angle, kept inside (-360, 360).
    filtered_deg: AlphaFilter<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Perspective {
    /// Get the follow angle for this perspective.
    ///
    /// `None` and invalid codes resolve to the behind angle. Callers wanting the `None`
    /// behaviour (no offset at all) must check for it before asking for an angle.
    pub fn angle_deg(&self) -> f64 {
        match self {
            Perspective::Behind => BEHIND_ANGLE_DEG,
            Perspective::Front => FRONT_ANGLE_DEG,
            Perspective::FrontRight => FRONT_RIGHT_ANGLE_DEG,
            Perspective::FrontLeft => FRONT_LEFT_ANGLE_DEG,
            Perspective::MidRight => MID_RIGHT_ANGLE_DEG,
            Perspective::MidLeft => MID_LEFT_ANGLE_DEG,
            Perspective::BehindRight => BEHIND_RIGHT_ANGLE_DEG,
            Perspective::BehindLeft => BEHIND_LEFT_ANGLE_DEG,
            Perspective::MiddleFollow => BEHIND_ANGLE_DEG,
            Perspective::None | Perspective::Invalid(_) => BEHIND_ANGLE_DEG,
        }
    }
}

impl From<i32> for Perspective {
    fn from(code: i32) -> Self {
        match code {
            0 => Perspective::None,
            1 => Perspective::Behind,
            2 => Perspective::Front,
            3 => Perspective::FrontRight,
            4 => Perspective::FrontLeft,
            5 => Perspective::MidRight,
            6 => Perspective::MidLeft,
            7 => Perspective::BehindRight,
            8 => Perspective::BehindLeft,
            9 => Perspective::MiddleFollow,
            c => Perspective::Invalid(c),
        }
    }
}

impl From<Perspective> for i32 {
    fn from(p: Perspective) -> Self {
        match p {
            Perspective::None => 0,
            Perspective::Behind => 1,
            Perspective::Front => 2,
            Perspective::FrontRight => 3,
            Perspective::FrontLeft => 4,
            Perspective::MidRight => 5,
            Perspective::MidLeft => 6,
            Perspective::BehindRight => 7,
            Perspective::BehindLeft => 8,
            Perspective::MiddleFollow => 9,
            Perspective::Invalid(c) => c,
        }
    }
}

impl Default for FollowAngle {
    fn default() -> Self {
        Self {
            raw_deg: 0.0,
            filtered_deg: AlphaFilter::new(0.0),
        }
    }
}

impl FollowAngle {
    /// Reset both the raw and filtered angles to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Get the raw (unwrapped, unfiltered) angle setting in degrees.
    pub fn raw_deg(&self) -> f64 {
        self.raw_deg
    }

    /// Get the filtered angle in degrees.
    pub fn filtered_deg(&self) -> f64 {
        self.filtered_deg.state()
    }

    /// Advance the angle towards a newly resolved setting and return the filtered angle.
    ///
    /// The raw angle jumps to the setting, shifted by a full turn if that gives the shorter
    /// rotation from the current raw angle. The filtered angle then follows it with the given time
    /// constant, and is wrapped back inside (-360, 360) together with the raw angle.
    pub fn advance(&mut self, setting_deg: f64, dt_s: f64, time_constant_s: f64) -> f64 {
        self.raw_deg = shortest_rotation_target(self.raw_deg, setting_deg);

        self.filtered_deg.set_parameters(dt_s, time_constant_s);
        self.filtered_deg.update_or_reset(self.raw_deg);

        let (wrapped_deg, shift_deg) = wrap_deg_360(self.filtered_deg.state());
        if shift_deg != 0.0 {
            self.filtered_deg.reset(wrapped_deg);
            self.raw_deg += shift_deg;
        }

        self.filtered_deg.state()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the value to assign to a continuous angle currently at `current_deg` so that it reaches
/// `setting_deg` (modulo 360) along the shortest rotation.
///
/// For example going from 270 to a setting of 0 gives 360 rather than 0.
pub fn shortest_rotation_target(current_deg: f64, setting_deg: f64) -> f64 {
    if current_deg - setting_deg > 180.0 {
        setting_deg + 360.0
    }
    else if current_deg - setting_deg < -180.0 {
        setting_deg - 360.0
    }
    else {
        setting_deg
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_perspective_angles() {
        let expected = [
            (1, 180.0), (2, 0.0), (3, 45.0), (4, 315.0), (5, 90.0),
            (6, 270.0), (7, 135.0), (8, 225.0), (9, 180.0),
            // None and invalid codes fall back to behind
            (0, 180.0), (10, 180.0), (-3, 180.0), (i32::MAX, 180.0)
        ];

        for (code, angle) in expected.iter() {
            assert_eq!(Perspective::from(*code).angle_deg(), *angle, "code {}", code);
        }
    }

    #[test]
    fn test_code_round_trip() {
        for code in -1..12 {
            assert_eq!(i32::from(Perspective::from(code)), code);
        }
    }

    #[test]
    fn test_shortest_rotation_target() {
        assert_eq!(shortest_rotation_target(270.0, 0.0), 360.0);
        assert_eq!(shortest_rotation_target(0.0, 270.0), -90.0);
        assert_eq!(shortest_rotation_target(180.0, 0.0), 0.0);
        assert_eq!(shortest_rotation_target(45.0, 315.0), -45.0);
        assert_eq!(shortest_rotation_target(360.0, 45.0), 405.0);
        assert_eq!(shortest_rotation_target(90.0, 135.0), 135.0);
    }

    #[test]
    fn test_advance_from_rest() {
        let mut angle = FollowAngle::default();

        // 270 is reached from 0 by rotating backwards to -90
        for _ in 0..2000 {
            angle.advance(MID_LEFT_ANGLE_DEG, 0.05, 3.0);
        }
        assert_eq!(angle.raw_deg(), -90.0);
        assert!((angle.filtered_deg() + 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_advance_takes_short_way() {
        let mut angle = FollowAngle::default();
        angle.raw_deg = 270.0;
        angle.filtered_deg.reset(270.0);

        // Switching to front must increase the angle towards 360 on every cycle
        let mut prev = angle.filtered_deg();
        for _ in 0..100 {
            let a = angle.advance(FRONT_ANGLE_DEG, 0.05, 3.0);
            assert!(a > prev, "angle went from {} to {}", prev, a);
            assert!(a < 360.0);
            prev = a;
        }
        assert_eq!(angle.raw_deg(), 360.0);
    }

    #[test]
    fn test_advance_wraps_filtered_angle() {
        let mut angle = FollowAngle::default();
        angle.raw_deg = 300.0;
        angle.filtered_deg.reset(359.0);

        // Setting 45 from 300 is reached via 405, which takes the filter past 360
        let mut wrapped = false;
        for _ in 0..400 {
            let a = angle.advance(FRONT_RIGHT_ANGLE_DEG, 0.05, 3.0);
            assert!(a > -360.0 && a <= 360.0);
            if angle.raw_deg() == 45.0 {
                wrapped = true;
            }
        }

        assert!(wrapped);
        assert!((angle.filtered_deg() - 45.0).abs() < 1.0);
    }
}
