//! # Follow target module
//!
//! Follow target keeps the drone at a fixed distance and viewing angle from a moving ground
//! target, such as a person or a vehicle, using the position, velocity and acceleration
//! estimates produced by the target estimator.
//!
//! Each cycle the task:
//!  1. Copies the latest target estimate if a new one has been published.
//!  1. Resolves the configured perspective into a follow angle, measured clockwise from the
//!     target's direction of travel, and advances a continuous angle towards it along the
//!     shortest rotation.
//!  1. Low-pass filters the target position, the follow angle, the offset direction and the
//!     velocity feedforward scale.
//!  1. Builds the position setpoint as the filtered target position plus the offset direction
//!     scaled by the follow distance, with a velocity feedforward derived from the change in
//!     setpoint.
//!  1. Overrides everything with a slow ascent if the drone is too close to the ground, and
//!     points the drone at the target when it is far enough away to have a defined bearing.
//!  1. Publishes the filtered target position for diagnostics.
//!
//! Setpoint axes use NaN to mean "uncontrolled", matching what lower level controllers expect.
//! [`Setpoint::position_axes`] gives a typed view of the same information.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod filter;
mod params;
mod perspective;
mod setpoint;
mod state;


// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use filter::*;
pub use params::*;
pub use perspective::*;
pub use setpoint::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target speed above which the target's heading is allowed to change. Below this the heading is
/// dominated by estimator jitter.
///
/// Units: meters/second
pub const MINIMUM_SPEED_FOR_HEADING_CHANGE_MS: f64 = 0.1;

/// Minimum horizontal distance between the drone and the target for any yaw control to be done.
///
/// Units: meters
pub const MINIMUM_DISTANCE_TO_TARGET_FOR_YAW_CONTROL_M: f64 = 1.0;

/// Distance to ground (or home) under which horizontal control stops and the drone ascends.
///
/// Units: meters
pub const MINIMUM_SAFETY_ALTITUDE_M: f64 = 1.0;

/// Maximum vertical deviation from the desired altitude above which no horizontal control is
/// done.
///
/// Units: meters
pub const ALT_ACCEPTANCE_THRESHOLD_M: f64 = 3.0;

/// Ascent rate commanded while under the minimum safety altitude.
///
/// Units: meters/second
pub const EMERGENCY_ASCENT_SPEED_MS: f64 = 0.2;

/// Time constant of the target position filter. Also used as the prediction horizon so the
/// lookahead cancels the filter lag.
///
/// Units: seconds
pub const POSITION_FILTER_ALPHA_S: f64 = 1.5;

/// Time constant of the follow angle filter.
///
/// Units: seconds
pub const FOLLOW_ANGLE_FILTER_ALPHA_S: f64 = 3.0;

/// Time constant of the offset direction filter.
///
/// Units: seconds
pub const DIRECTION_FILTER_ALPHA_S: f64 = 3.0;

/// Time constant of the velocity feedforward scale filter.
///
/// Units: seconds
pub const VELOCITY_FF_FILTER_ALPHA_S: f64 = 1.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during FollowTarget operation.
#[derive(Debug, thiserror::Error)]
pub enum FollowTargetError {
    #[error("Invalid cycle duration: {0} s, expected a finite positive value")]
    InvalidDeltaTime(f64),

    #[error("Invalid parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("The task was updated before being activated")]
    NotActivated,
}
