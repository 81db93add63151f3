//! Implementations for the FollowTarget state structures

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use nalgebra::{Vector2, Vector3};
use serde::Serialize;

// Internal
use super::*;
use comms_if::{
    msg::{FollowTargetStatus, TargetEstimate},
    topic::{Publication, Subscription}
};
use util::{
    maths::{rotate_2d, unit_or_zero, AllFinite},
    module::FlightTask
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The follow target flight task.
///
/// Reads target estimates from `S` and publishes diagnostics to `P`. All filter state lives in an
/// owned [`FollowTargetState`], so any number of tasks can run side by side.
pub struct FollowTarget<S, P> {
    params: Params,

    state: FollowTargetState,

    /// Setpoint carried from cycle to cycle
    setpoint: Setpoint,

    /// Latest copy of the target estimate
    estimate: TargetEstimate,

    estimate_sub: S,
    status_pub: P,

    activated: bool,

    /// Report from the previous cycle, used to log transitions
    prev_report: StatusReport,
}

/// Filter and angle state of the follow target control law.
#[derive(Debug, Clone, Serialize)]
pub struct FollowTargetState {
    /// Filtered (and lag compensated) target position, NaN until the first usable estimate.
    target_position_filtered: AlphaFilter<Vector3<f64>>,

    /// Filtered horizontal direction from the target to the drone.
    offset_vector_filtered: AlphaFilter<Vector2<f64>>,

    /// Scale in [0, 1] applied to the velocity feedforward.
    velocity_ff_scale: AlphaFilter<f64>,

    follow_angle: FollowAngle,

    /// Last known horizontal direction of travel of the target, zero until it is seen moving.
    target_velocity_unit_vector: Vector2<f64>,
}

/// State of the drone, provided by the host each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DroneState {
    /// Current position
    ///
    /// Units: meters,
    /// Frame: Local NED
    pub position_m: Vector3<f64>,

    /// Current yaw, zero pointing north
    ///
    /// Units: radians
    pub yaw_rad: f64,

    /// Distance to the ground, or altitude above home, NaN if unknown.
    ///
    /// Units: meters
    pub dist_to_bottom_m: f64,

    /// Minimum height above ground needed by the position estimator, NaN if there is none.
    ///
    /// Units: meters
    pub hagl_min_m: f64,
}

/// Data required to activate the task.
#[derive(Debug, Clone, Copy)]
pub struct ActivateData {
    /// The setpoint left by the previously active task
    pub last_setpoint: Setpoint,

    /// The drone's state at activation
    pub drone: DroneState,
}

/// Input data to FollowTarget.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    pub drone: DroneState,

    /// Duration of the cycle
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Time of this cycle, used to stamp the published status
    ///
    /// Units: microseconds
    pub time_us: u64,
}

/// Status report for FollowTarget processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    /// A valid target estimate was available this cycle
    pub estimate_usable: bool,

    /// Horizontal position was controlled towards the follow position
    pub horizontal_control: bool,

    /// The drone is too far from the desired altitude, so only the altitude is controlled
    pub altitude_first: bool,

    /// The drone is too close to the ground and is ascending, overriding all other setpoints
    pub emergency_ascent: bool,

    /// The yaw setpoint was updated to face the target
    pub yaw_updated: bool,

    /// Filtered follow angle
    ///
    /// Units: degrees
    pub follow_angle_deg: f64,

    /// Filtered velocity feedforward scale
    pub velocity_ff_scale: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<S, P> FollowTarget<S, P>
where
    S: Subscription<TargetEstimate>,
    P: Publication<FollowTargetStatus>
{
    /// Create a new task. The task must be activated before it is updated.
    pub fn new(params: Params, estimate_sub: S, status_pub: P) -> Result<Self, FollowTargetError> {
        params.validate()?;

        Ok(Self {
            params,
            state: FollowTargetState::default(),
            setpoint: Setpoint::default(),
            estimate: TargetEstimate::default(),
            estimate_sub,
            status_pub,
            activated: false,
            prev_report: StatusReport::default(),
        })
    }

    /// Replace the parameters, taking effect on the next cycle.
    ///
    /// Invalid parameters are rejected and the current ones kept.
    pub fn set_params(&mut self, params: Params) -> Result<(), FollowTargetError> {
        params.validate()?;

        if params != self.params {
            debug!("FollowTarget parameters changed: {:?}", params);
        }
        self.params = params;

        Ok(())
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn state(&self) -> &FollowTargetState {
        &self.state
    }

    pub fn setpoint(&self) -> &Setpoint {
        &self.setpoint
    }

    /// Get the status publication, for example to read back recorded statuses.
    pub fn status_pub(&self) -> &P {
        &self.status_pub
    }

    /// Copy the latest target estimate if a new one has been published, otherwise keep the last
    /// one.
    fn ingest_estimate(&mut self) {
        if self.estimate_sub.updated() {
            if let Some(est) = self.estimate_sub.copy() {
                self.estimate = est;
            }
        }
    }

    /// Publish the filtered target position.
    fn emit_status(&mut self, time_us: u64) {
        let p = self.state.target_position_filtered();

        self.status_pub.publish(FollowTargetStatus {
            timestamp_us: time_us,
            position_filtered_m: [p[0], p[1], p[2]],
        });
    }

    /// Warn about changes in the operating condition of the task.
    fn log_transitions(&self, report: &StatusReport) {
        let prev = &self.prev_report;

        if prev.estimate_usable && !report.estimate_usable {
            warn!("Target estimate lost, horizontal control suspended");
        }
        if !prev.estimate_usable && report.estimate_usable {
            debug!("Target estimate available");
        }
        if !prev.emergency_ascent && report.emergency_ascent {
            warn!("Below minimum safety altitude, ascending");
        }
        if !prev.altitude_first && report.altitude_first {
            warn!("Too far from follow altitude, adjusting altitude before following");
        }
    }
}

impl<S, P> FlightTask for FollowTarget<S, P>
where
    S: Subscription<TargetEstimate>,
    P: Publication<FollowTargetStatus>
{
    type ActivateData = ActivateData;

    type InputData = InputData;
    type OutputData = Setpoint;
    type StatusReport = StatusReport;
    type Error = FollowTargetError;

    /// Activate the task.
    ///
    /// The position setpoint starts at the drone's current position and the yaw setpoint is
    /// carried over from the last setpoint. All filters are reset, with the offset direction
    /// seeded from the drone's heading so that it faces the target before the target's heading is
    /// known.
    fn activate(&mut self, data: Self::ActivateData) -> Result<(), Self::Error> {
        self.setpoint = Setpoint::default();
        self.setpoint.position_m = data.drone.position_m;
        self.setpoint.yaw_rad = data.last_setpoint.yaw_rad;
        self.setpoint.yawspeed_rads = 0.0;

        self.state.reset(data.drone.yaw_rad);

        self.prev_report = StatusReport::default();
        self.activated = true;

        debug!(
            "FollowTarget activated at {:?}, offset direction {:?}",
            data.drone.position_m.as_slice(),
            self.state.offset_vector_filtered().as_slice()
        );

        Ok(())
    }

    /// Perform cyclic processing of follow target.
    fn update(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::Error>
    {
        if !self.activated {
            return Err(FollowTargetError::NotActivated);
        }

        if !input_data.dt_s.is_finite() || input_data.dt_s <= 0.0 {
            return Err(FollowTargetError::InvalidDeltaTime(input_data.dt_s));
        }

        self.ingest_estimate();

        let report = self.state.step(
            &self.params,
            &input_data.drone,
            &self.estimate,
            input_data.dt_s,
            &mut self.setpoint
        );

        self.setpoint.want_takeoff = self.setpoint.check_takeoff(
            &input_data.drone.position_m,
            input_data.drone.hagl_min_m
        );

        self.emit_status(input_data.time_us);

        trace!(
            "FollowTarget output:\n    pos: {:?}\n    vel: {:?}\n    yaw: {}",
            self.setpoint.position_m.as_slice(),
            self.setpoint.velocity_ms.as_slice(),
            self.setpoint.yaw_rad
        );

        self.log_transitions(&report);
        self.prev_report = report;

        Ok((self.setpoint, report))
    }
}

impl Default for FollowTargetState {
    fn default() -> Self {
        let mut state = Self {
            target_position_filtered: AlphaFilter::new(Vector3::repeat(f64::NAN)),
            offset_vector_filtered: AlphaFilter::new(Vector2::zeros()),
            velocity_ff_scale: AlphaFilter::new(0.0),
            follow_angle: FollowAngle::default(),
            target_velocity_unit_vector: Vector2::zeros(),
        };
        state.reset(f64::NAN);
        state
    }
}

impl FollowTargetState {
    /// Reset all filters, seeding the offset direction from the drone's yaw.
    ///
    /// A non-finite yaw seeds the offset direction with `(1, 0)`. The target's heading is
    /// forgotten, so the seeded offset is held until the target is seen moving.
    pub fn reset(&mut self, yaw_rad: f64) {
        self.target_position_filtered.reset(Vector3::repeat(f64::NAN));
        self.offset_vector_filtered.reset(Vector2::zeros());
        self.follow_angle.reset();
        self.velocity_ff_scale.reset(0.0);

        let heading = Vector2::new(yaw_rad.cos(), -yaw_rad.sin());
        let heading = if heading.all_finite() {
            heading
        }
        else {
            Vector2::new(1.0, 0.0)
        };

        self.offset_vector_filtered.reset(heading);
        self.target_velocity_unit_vector = Vector2::zeros();
    }

    pub fn target_position_filtered(&self) -> Vector3<f64> {
        self.target_position_filtered.state()
    }

    pub fn offset_vector_filtered(&self) -> Vector2<f64> {
        self.offset_vector_filtered.state()
    }

    pub fn velocity_ff_scale(&self) -> f64 {
        self.velocity_ff_scale.state()
    }

    pub fn follow_angle(&self) -> &FollowAngle {
        &self.follow_angle
    }

    pub fn target_velocity_unit_vector(&self) -> Vector2<f64> {
        self.target_velocity_unit_vector
    }

    /// Run one cycle of the control law, updating `setpoint` in place.
    ///
    /// `setpoint` must hold the setpoint from the previous cycle, as the velocity feedforward is
    /// derived from the change in position setpoint.
    pub fn step(
        &mut self,
        params: &Params,
        drone: &DroneState,
        estimate: &TargetEstimate,
        dt_s: f64,
        setpoint: &mut Setpoint
    ) -> StatusReport {
        let mut report = StatusReport::default();

        if estimate.is_usable() {
            report.estimate_usable = true;
            self.follow(params, drone, estimate, dt_s, setpoint, &mut report);
        }
        else {
            // No horizontal control, leave the vertical axis alone
            setpoint.position_m[0] = f64::NAN;
            setpoint.position_m[1] = f64::NAN;
            setpoint.velocity_ms[0] = 0.0;
            setpoint.velocity_ms[1] = 0.0;
        }

        // ---- SAFETY ----

        // Takes priority over every other setpoint, whatever the state of the estimate
        if drone.dist_to_bottom_m.is_finite() && drone.dist_to_bottom_m < MINIMUM_SAFETY_ALTITUDE_M {
            report.emergency_ascent = true;
            setpoint.position_m[0] = f64::NAN;
            setpoint.position_m[1] = f64::NAN;
            setpoint.position_m[2] = drone.position_m[2];
            setpoint.velocity_ms[0] = 0.0;
            setpoint.velocity_ms[1] = 0.0;
            setpoint.velocity_ms[2] = -EMERGENCY_ASCENT_SPEED_MS;
        }

        // ---- YAW ----

        if report.estimate_usable {
            report.yaw_updated = self.face_target(drone, setpoint);
        }

        report.follow_angle_deg = self.follow_angle.filtered_deg();
        report.velocity_ff_scale = self.velocity_ff_scale.state();

        report
    }

    /// Follow a usable target estimate.
    fn follow(
        &mut self,
        params: &Params,
        drone: &DroneState,
        estimate: &TargetEstimate,
        dt_s: f64,
        setpoint: &mut Setpoint,
        report: &mut StatusReport
    ) {
        let x_ned_est = Vector3::from(estimate.position_m);
        let v_ned_est = Vector3::from(estimate.velocity_ms);
        let a_ned_est = Vector3::from(estimate.acceleration_mss);

        let target_speed_ms = v_ned_est.norm();
        let target_speed_xy_ms = v_ned_est.xy().norm();

        // ---- TARGET POSITION ----

        // Start from the first estimate, rather than from NaN
        if !self.target_position_filtered.state().all_finite() {
            self.target_position_filtered.reset(x_ned_est);
        }

        // Filter a predicted position, with the prediction horizon equal to the filter time
        // constant to compensate its lag
        let predicted = predict_future_position(
            POSITION_FILTER_ALPHA_S, &x_ned_est, &v_ned_est, &a_ned_est
        );
        self.target_position_filtered.set_parameters(dt_s, POSITION_FILTER_ALPHA_S);
        self.target_position_filtered.update(predicted);

        // ---- OFFSET DIRECTION ----

        if params.perspective == Perspective::None {
            self.offset_vector_filtered.reset(Vector2::zeros());
        }
        else {
            let follow_angle_deg = self.follow_angle.advance(
                params.perspective.angle_deg(),
                dt_s,
                FOLLOW_ANGLE_FILTER_ALPHA_S
            );

            // The target's heading is only known while it is moving
            if target_speed_xy_ms > MINIMUM_SPEED_FOR_HEADING_CHANGE_MS
                && target_speed_xy_ms > f64::EPSILON
            {
                self.target_velocity_unit_vector = unit_or_zero(&v_ned_est.xy());
            }

            // Without a heading there is nothing to rotate, hold the current offset
            if self.target_velocity_unit_vector != Vector2::zeros() {
                let offset = rotate_2d(
                    &self.target_velocity_unit_vector,
                    follow_angle_deg.to_radians()
                );

                self.offset_vector_filtered.set_parameters(dt_s, DIRECTION_FILTER_ALPHA_S);
                self.offset_vector_filtered.update_or_reset(offset);
            }
        }

        // ---- DESIRED POSITION ----

        let target_filtered = self.target_position_filtered.state();
        let offset_dir = unit_or_zero(&self.offset_vector_filtered.state());

        let desired_xy = target_filtered.xy() + offset_dir * params.follow_distance_m;

        let desired_z = match params.altitude_mode {
            AltitudeMode::TrackTarget => target_filtered[2] - params.min_height_m,
            AltitudeMode::Constant | AltitudeMode::Unknown(_) =>
                setpoint.position_m[2].min(-params.min_height_m),
        };

        let desired = Vector3::new(desired_xy[0], desired_xy[1], desired_z);

        // ---- SETPOINTS ----

        let mut desired_ff_scale = 0.0;

        if desired.all_finite() {
            if (desired[2] - drone.position_m[2]).abs() < ALT_ACCEPTANCE_THRESHOLD_M {
                report.horizontal_control = true;

                // A static target needs no feedforward
                if target_speed_ms >= MINIMUM_SPEED_FOR_HEADING_CHANGE_MS {
                    desired_ff_scale = 1.0;
                }

                setpoint.velocity_ms = (desired - setpoint.position_m) / dt_s
                    * self.velocity_ff_scale.state();
                setpoint.position_m = desired;
            }
            else {
                // Reach the follow altitude before moving horizontally
                report.altitude_first = true;
                setpoint.position_m = drone.position_m;
                setpoint.position_m[2] = desired[2];
            }
        }
        else {
            setpoint.position_m = drone.position_m;
            setpoint.velocity_ms = Vector3::zeros();
        }

        self.velocity_ff_scale.set_parameters(dt_s, VELOCITY_FF_FILTER_ALPHA_S);
        self.velocity_ff_scale.update_or_reset(desired_ff_scale);
    }

    /// Point the yaw setpoint from the drone to the filtered target position.
    ///
    /// The yaw setpoint is left as it is when the target is too close to have a defined bearing.
    /// Returns `true` if the setpoint was updated.
    fn face_target(&self, drone: &DroneState, setpoint: &mut Setpoint) -> bool {
        let drone_to_target = self.target_position_filtered.state().xy() - drone.position_m.xy();

        if drone_to_target.norm() >= MINIMUM_DISTANCE_TO_TARGET_FOR_YAW_CONTROL_M {
            setpoint.yaw_rad = drone_to_target[1].atan2(drone_to_target[0]);
            true
        }
        else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Predict the target's position `horizon_s` into the future by integrating its velocity and
/// acceleration.
pub fn predict_future_position(
    horizon_s: f64,
    x_ned_est: &Vector3<f64>,
    v_ned_est: &Vector3<f64>,
    a_ned_est: &Vector3<f64>
) -> Vector3<f64> {
    x_ned_est + v_ned_est * horizon_s + a_ned_est * (0.5 * horizon_s * horizon_s)
}
