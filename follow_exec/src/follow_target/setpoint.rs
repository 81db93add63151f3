//! # Setpoints
//!
//! The setpoint shared between a flight task and the controllers below it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Altitude above the current position the setpoint must be to trigger a takeoff, when no
/// minimum height above ground is known.
///
/// Units: meters
pub const TAKEOFF_MIN_ALTITUDE_M: f64 = 0.2;

/// Margin added to the minimum height above ground when it is known.
///
/// Units: meters
pub const TAKEOFF_HAGL_MARGIN_M: f64 = 0.05;

/// Upwards velocity setpoint above which a takeoff is triggered.
///
/// Units: meters/second
pub const TAKEOFF_MIN_ASCENT_SPEED_MS: f64 = 0.3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position, velocity and yaw setpoints.
///
/// Any axis holding NaN is not controlled by this setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Setpoint {
    /// Position setpoint
    ///
    /// Units: meters,
    /// Frame: Local NED
    pub position_m: Vector3<f64>,

    /// Velocity feedforward
    ///
    /// Units: meters/second,
    /// Frame: Local NED
    pub velocity_ms: Vector3<f64>,

    /// Yaw setpoint
    ///
    /// Units: radians
    pub yaw_rad: f64,

    /// Yaw rate setpoint
    ///
    /// Units: radians/second
    pub yawspeed_rads: f64,

    /// Set when these setpoints would make a landed vehicle take off.
    pub want_takeoff: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Typed view of a single setpoint axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisSetpoint {
    Controlled(f64),
    Uncontrolled,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Setpoint {
    /// A setpoint which controls nothing.
    fn default() -> Self {
        Self {
            position_m: Vector3::repeat(f64::NAN),
            velocity_ms: Vector3::repeat(f64::NAN),
            yaw_rad: f64::NAN,
            yawspeed_rads: f64::NAN,
            want_takeoff: false,
        }
    }
}

impl From<f64> for AxisSetpoint {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            AxisSetpoint::Controlled(value)
        }
        else {
            AxisSetpoint::Uncontrolled
        }
    }
}

impl AxisSetpoint {
    /// Get the controlled value, if any.
    pub fn value(&self) -> Option<f64> {
        match self {
            AxisSetpoint::Controlled(v) => Some(*v),
            AxisSetpoint::Uncontrolled => None,
        }
    }
}

impl Setpoint {
    /// Typed view of the position setpoint axes (north, east, down).
    pub fn position_axes(&self) -> [AxisSetpoint; 3] {
        [
            self.position_m[0].into(),
            self.position_m[1].into(),
            self.position_m[2].into(),
        ]
    }

    /// Typed view of the velocity setpoint axes (north, east, down).
    pub fn velocity_axes(&self) -> [AxisSetpoint; 3] {
        [
            self.velocity_ms[0].into(),
            self.velocity_ms[1].into(),
            self.velocity_ms[2].into(),
        ]
    }

    /// Typed view of the yaw setpoint.
    pub fn yaw(&self) -> AxisSetpoint {
        self.yaw_rad.into()
    }

    /// Determine whether these setpoints, applied to a vehicle at `position_m`, would make it
    /// take off.
    ///
    /// `hagl_min_m` is the minimum height above ground the vehicle needs for its estimation to
    /// work (NaN if there is none).
    pub fn check_takeoff(&self, position_m: &Vector3<f64>, hagl_min_m: f64) -> bool {
        let position_triggered = if self.position_m[2].is_finite() {
            let min_altitude_m = if hagl_min_m.is_finite() {
                hagl_min_m + TAKEOFF_HAGL_MARGIN_M
            }
            else {
                TAKEOFF_MIN_ALTITUDE_M
            };

            self.position_m[2] < position_m[2] - min_altitude_m
        }
        else {
            false
        };

        let velocity_triggered = self.velocity_ms[2].is_finite()
            && self.velocity_ms[2] < -TAKEOFF_MIN_ASCENT_SPEED_MS;

        position_triggered || velocity_triggered
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_axes() {
        let mut sp = Setpoint::default();
        assert_eq!(sp.position_axes(), [AxisSetpoint::Uncontrolled; 3]);
        assert_eq!(sp.yaw().value(), None);

        sp.position_m = Vector3::new(f64::NAN, f64::NAN, -10.0);
        assert_eq!(sp.position_axes()[2], AxisSetpoint::Controlled(-10.0));
        assert_eq!(sp.position_axes()[0], AxisSetpoint::Uncontrolled);

        sp.velocity_ms = Vector3::new(0.0, 0.0, -0.2);
        assert_eq!(
            sp.velocity_axes().iter().map(|a| a.value()).collect::<Vec<_>>(),
            vec![Some(0.0), Some(0.0), Some(-0.2)]
        );
    }

    #[test]
    fn test_check_takeoff() {
        let ground = Vector3::new(0.0, 0.0, 0.0);
        let mut sp = Setpoint::default();
        assert!(!sp.check_takeoff(&ground, f64::NAN));

        // Setpoint 10 cm up is not enough, 30 cm is
        sp.position_m = Vector3::new(0.0, 0.0, -0.1);
        assert!(!sp.check_takeoff(&ground, f64::NAN));
        sp.position_m[2] = -0.3;
        assert!(sp.check_takeoff(&ground, f64::NAN));

        // Unless the estimator needs to be higher
        assert!(!sp.check_takeoff(&ground, 0.5));

        // Ascent rate triggers regardless of position
        sp.position_m[2] = f64::NAN;
        sp.velocity_ms[2] = -0.5;
        assert!(sp.check_takeoff(&ground, f64::NAN));
        sp.velocity_ms[2] = -0.2;
        assert!(!sp.check_takeoff(&ground, f64::NAN));
    }
}
