//! # Simulated target
//!
//! Generates target estimates along a scripted trajectory, and a simple first order response of
//! the drone to the setpoints it is given. No noise is added, so the estimates are exactly what a
//! perfect target estimator would produce.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

// Internal
use crate::follow_target::{DroneState, Setpoint};
use comms_if::msg::TargetEstimate;
use util::time::seconds_to_micros;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the whole simulation, loaded from `sim_target.toml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub target: TargetParams,
    pub drone: DroneParams,
}

/// Parameters of the simulated target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetParams {
    /// Horizontal position at the start of the simulation, also the centre of circles.
    ///
    /// Units: meters,
    /// Frame: Local NED
    pub start_position_m: [f64; 2],

    /// Altitude of the target above the origin.
    ///
    /// Units: meters
    pub altitude_m: f64,

    pub trajectory: Trajectory,

    /// Start and end of a period during which the estimates are flagged invalid, as if the
    /// estimator had lost the target.
    ///
    /// Units: seconds
    pub invalid_window_s: Option<[f64; 2]>,
}

/// Parameters of the simulated drone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneParams {
    /// Units: meters,
    /// Frame: Local NED
    pub start_position_m: [f64; 3],

    /// Units: radians
    pub start_yaw_rad: f64,

    /// Time constant with which the drone reaches its position setpoint.
    ///
    /// Units: seconds
    pub time_constant_s: f64,
}

/// A scripted target.
#[derive(Debug, Clone)]
pub struct SimTarget {
    params: TargetParams,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Path followed by the simulated target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Trajectory {
    /// The target doesn't move.
    Static,

    /// Constant horizontal velocity.
    Line {
        /// Units: meters/second,
        /// Frame: Local NED
        velocity_ms: [f64; 2],
    },

    /// Constant speed around the start position, clockwise seen from above, starting north of
    /// the centre.
    Circle {
        /// Units: meters
        radius_m: f64,

        /// Units: meters/second
        speed_ms: f64,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Circle trajectories need a finite positive radius, got {0} m")]
    InvalidRadius(f64),

    #[error("The invalid window must start before it ends, got {0} s to {1} s")]
    InvalidWindow(f64, f64),

    #[error("The drone's time constant must be finite and positive, got {0} s")]
    InvalidTimeConstant(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TargetParams {
    fn default() -> Self {
        Self {
            start_position_m: [20.0, 0.0],
            altitude_m: 0.0,
            trajectory: Trajectory::Static,
            invalid_window_s: None,
        }
    }
}

impl Default for DroneParams {
    fn default() -> Self {
        Self {
            start_position_m: [0.0; 3],
            start_yaw_rad: 0.0,
            time_constant_s: 0.5,
        }
    }
}

impl DroneParams {
    /// Get the drone's state at the start of the simulation. The ground is at zero altitude.
    pub fn initial_state(&self) -> DroneState {
        let position_m = Vector3::from(self.start_position_m);

        DroneState {
            position_m,
            yaw_rad: self.start_yaw_rad,
            dist_to_bottom_m: (-position_m[2]).max(0.0),
            hagl_min_m: f64::NAN,
        }
    }
}

impl SimTarget {
    pub fn new(params: TargetParams) -> Result<Self, SimError> {
        if let Trajectory::Circle { radius_m, .. } = params.trajectory {
            if !radius_m.is_finite() || radius_m <= 0.0 {
                return Err(SimError::InvalidRadius(radius_m));
            }
        }

        if let Some([start, end]) = params.invalid_window_s {
            if !(start <= end) {
                return Err(SimError::InvalidWindow(start, end));
            }
        }

        Ok(Self { params })
    }

    /// Returns `true` if the estimate at `time_s` falls inside the invalid window.
    pub fn is_invalid_at(&self, time_s: f64) -> bool {
        match self.params.invalid_window_s {
            Some([start, end]) => time_s >= start && time_s < end,
            None => false,
        }
    }

    /// Get the estimate of the target at `time_s` seconds from the start of the simulation.
    pub fn estimate_at(&self, time_s: f64) -> TargetEstimate {
        let start = Vector2::from(self.params.start_position_m);

        let (position, velocity, acceleration) = match self.params.trajectory {
            Trajectory::Static => (start, Vector2::zeros(), Vector2::zeros()),
            Trajectory::Line { velocity_ms } => {
                let v = Vector2::from(velocity_ms);
                (start + v * time_s, v, Vector2::zeros())
            }
            Trajectory::Circle { radius_m, speed_ms } => {
                let omega = speed_ms / radius_m;
                let (sin, cos) = (omega * time_s).sin_cos();

                (
                    start + Vector2::new(cos, sin) * radius_m,
                    Vector2::new(-sin, cos) * speed_ms,
                    Vector2::new(cos, sin) * (-speed_ms * omega),
                )
            }
        };

        TargetEstimate {
            // Zero is reserved for "never received"
            timestamp_us: seconds_to_micros(time_s).max(1),
            valid: !self.is_invalid_at(time_s),
            position_m: [position[0], position[1], -self.params.altitude_m],
            velocity_ms: [velocity[0], velocity[1], 0.0],
            acceleration_mss: [acceleration[0], acceleration[1], 0.0],
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Move the drone for one cycle in response to `setpoint`.
///
/// Each axis with a position setpoint converges to it with the given time constant, on top of
/// any velocity feedforward. Axes with only a velocity setpoint follow that velocity, and axes
/// with neither hold still. The drone cannot go below the ground at zero altitude.
pub fn drone_response(
    drone: &DroneState,
    setpoint: &Setpoint,
    dt_s: f64,
    time_constant_s: f64
) -> Result<DroneState, SimError> {
    if !time_constant_s.is_finite() || time_constant_s <= 0.0 {
        return Err(SimError::InvalidTimeConstant(time_constant_s));
    }

    let alpha = dt_s / (time_constant_s + dt_s);
    let mut next = *drone;

    for i in 0..3 {
        let pos_sp = setpoint.position_m[i];
        let vel_sp = setpoint.velocity_ms[i];
        let vel_ff = if vel_sp.is_finite() { vel_sp } else { 0.0 };

        if pos_sp.is_finite() {
            next.position_m[i] += (pos_sp - drone.position_m[i]) * alpha + vel_ff * dt_s;
        }
        else {
            next.position_m[i] += vel_ff * dt_s;
        }
    }

    // Ground
    next.position_m[2] = next.position_m[2].min(0.0);
    next.dist_to_bottom_m = -next.position_m[2];

    if setpoint.yaw_rad.is_finite() {
        let error = setpoint.yaw_rad - drone.yaw_rad;
        let error = error.sin().atan2(error.cos());
        next.yaw_rad = drone.yaw_rad + error * alpha;
    }

    Ok(next)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_load_params() {
        let p: SimParams = util::params::from_str(
            "[target]\n\
             start_position_m = [5.0, -3.0]\n\
             altitude_m = 2.0\n\
             invalid_window_s = [10.0, 12.5]\n\
             [target.trajectory]\n\
             kind = \"Circle\"\n\
             radius_m = 30.0\n\
             speed_ms = 3.0\n\
             [drone]\n\
             start_position_m = [0.0, 0.0, -1.0]\n"
        ).unwrap();

        assert_eq!(p.target.start_position_m, [5.0, -3.0]);
        assert_eq!(
            p.target.trajectory,
            Trajectory::Circle { radius_m: 30.0, speed_ms: 3.0 }
        );
        assert_eq!(p.target.invalid_window_s, Some([10.0, 12.5]));
        assert_eq!(p.drone.start_position_m, [0.0, 0.0, -1.0]);
        assert_eq!(p.drone.time_constant_s, 0.5);

        let p: SimParams = util::params::from_str("").unwrap();
        assert_eq!(p, SimParams::default());
    }

    #[test]
    fn test_line() {
        let target = SimTarget::new(TargetParams {
            start_position_m: [1.0, 2.0],
            altitude_m: 3.0,
            trajectory: Trajectory::Line { velocity_ms: [2.0, -1.0] },
            invalid_window_s: None,
        }).unwrap();

        let est = target.estimate_at(2.0);
        assert!(est.is_usable());
        assert_eq!(est.timestamp_us, 2_000_000);
        assert_eq!(est.position_m, [5.0, 0.0, -3.0]);
        assert_eq!(est.velocity_ms, [2.0, -1.0, 0.0]);
        assert_eq!(est.acceleration_mss, [0.0; 3]);

        // Never a zero timestamp
        assert_eq!(target.estimate_at(0.0).timestamp_us, 1);
    }

    #[test]
    fn test_circle() {
        let target = SimTarget::new(TargetParams {
            start_position_m: [0.0, 0.0],
            trajectory: Trajectory::Circle { radius_m: 10.0, speed_ms: 2.0 },
            ..Default::default()
        }).unwrap();

        for t in &[0.0, 1.3, 7.0, 40.0] {
            let est = target.estimate_at(*t);
            let x = Vector3::from(est.position_m);
            let v = Vector3::from(est.velocity_ms);
            let a = Vector3::from(est.acceleration_mss);

            assert_relative_eq!(x.norm(), 10.0, epsilon = 1e-9);
            assert_relative_eq!(v.norm(), 2.0, epsilon = 1e-9);
            assert_relative_eq!(x.dot(&v), 0.0, epsilon = 1e-9);

            // Centripetal
            assert_relative_eq!(a, -x * (2.0 * 2.0 / 100.0), epsilon = 1e-9);
        }

        // Clockwise, so heading east from the north of the circle
        assert!(target.estimate_at(0.0).velocity_ms[1] > 0.0);

        assert!(matches!(
            SimTarget::new(TargetParams {
                trajectory: Trajectory::Circle { radius_m: 0.0, speed_ms: 2.0 },
                ..Default::default()
            }),
            Err(SimError::InvalidRadius(_))
        ));
    }

    #[test]
    fn test_invalid_window() {
        let target = SimTarget::new(TargetParams {
            invalid_window_s: Some([1.0, 2.0]),
            ..Default::default()
        }).unwrap();

        assert!(target.estimate_at(0.5).valid);
        assert!(!target.estimate_at(1.0).valid);
        assert!(!target.estimate_at(1.9).valid);
        assert!(target.estimate_at(2.0).valid);

        assert!(SimTarget::new(TargetParams {
            invalid_window_s: Some([2.0, 1.0]),
            ..Default::default()
        }).is_err());
    }

    #[test]
    fn test_drone_response() {
        let mut drone = DroneParams::default().initial_state();
        assert_eq!(drone.dist_to_bottom_m, 0.0);

        let setpoint = Setpoint {
            position_m: Vector3::new(10.0, -5.0, -8.0),
            velocity_ms: Vector3::zeros(),
            yaw_rad: 1.0,
            ..Default::default()
        };

        for _ in 0..400 {
            drone = drone_response(&drone, &setpoint, 0.05, 0.5).unwrap();
        }

        assert_relative_eq!(drone.position_m, setpoint.position_m, epsilon = 1e-6);
        assert_relative_eq!(drone.dist_to_bottom_m, 8.0, epsilon = 1e-6);
        assert_relative_eq!(drone.yaw_rad, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_drone_velocity_only() {
        let drone = DroneParams::default().initial_state();

        // Emergency ascent style setpoint
        let setpoint = Setpoint {
            position_m: Vector3::new(f64::NAN, f64::NAN, 0.0),
            velocity_ms: Vector3::new(0.0, 0.0, -0.2),
            ..Default::default()
        };

        let next = drone_response(&drone, &setpoint, 0.5, 0.5).unwrap();
        assert_eq!(next.position_m.xy(), drone.position_m.xy());
        assert_relative_eq!(next.position_m[2], -0.1, epsilon = 1e-12);
        assert_eq!(next.yaw_rad, drone.yaw_rad);

        // And it can't sink into the ground
        let sink = Setpoint {
            velocity_ms: Vector3::new(0.0, 0.0, 1.0),
            ..Default::default()
        };
        let next = drone_response(&drone, &sink, 0.5, 0.5).unwrap();
        assert_eq!(next.position_m[2], 0.0);

        assert!(drone_response(&drone, &sink, 0.5, 0.0).is_err());
    }
}
