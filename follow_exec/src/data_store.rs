//! # Data Store

use comms_if::msg::TargetEstimate;
use serde::Serialize;
use util::{
    archive::{Archived, Archiver},
    logger,
    session::Session,
};

use crate::follow_target::{DroneState, Setpoint, StatusReport};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// Simulation elapsed time
    pub sim_time_s: f64,

    // Simulation
    pub drone: DroneState,
    pub target_estimate: TargetEstimate,

    // FollowTarget
    pub setpoint: Setpoint,
    pub follow_status_rpt: StatusReport,

    /// Filtered target position reported by FollowTarget
    pub target_filtered_m: [f64; 3],

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive FollowTarget processing errors
    pub num_consec_follow_errors: u64,

    archiver: Archiver,
}

/// One row of the cycle archive.
///
/// Kept flat as CSV can't hold nested records.
#[derive(Debug, Clone, Copy, Serialize)]
struct CycleRecord {
    time_s: f64,

    drone_x_m: f64,
    drone_y_m: f64,
    drone_z_m: f64,
    drone_yaw_rad: f64,

    target_valid: bool,
    target_x_m: f64,
    target_y_m: f64,
    target_z_m: f64,

    target_filtered_x_m: f64,
    target_filtered_y_m: f64,
    target_filtered_z_m: f64,

    sp_x_m: f64,
    sp_y_m: f64,
    sp_z_m: f64,
    sp_vx_ms: f64,
    sp_vy_ms: f64,
    sp_vz_ms: f64,
    sp_yaw_rad: f64,
    want_takeoff: bool,

    horizontal_control: bool,
    altitude_first: bool,
    emergency_ascent: bool,
    follow_angle_deg: f64,
    velocity_ff_scale: f64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Create a new data store with the drone in its initial state.
    ///
    /// If a session is given each cycle is archived into `follow_target.csv` in the session's
    /// archive directory.
    pub fn new(
        drone: DroneState, session: Option<&Session>
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let archiver = match session {
            Some(s) => Archiver::from_path(s, "follow_target.csv")?,
            None => Archiver::default(),
        };

        Ok(Self {
            num_cycles: 0,
            sim_time_s: 0.0,
            drone,
            target_estimate: TargetEstimate::default(),
            setpoint: Setpoint::default(),
            follow_status_rpt: StatusReport::default(),
            target_filtered_m: [f64::NAN; 3],
            num_consec_cycle_overruns: 0,
            num_consec_follow_errors: 0,
            archiver,
        })
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears the outputs of the previous cycle and advances the simulation time, which is
    /// also stamped onto the log.
    pub fn cycle_start(&mut self, cycle_period_s: f64) {
        self.follow_status_rpt = StatusReport::default();
        self.sim_time_s = self.num_cycles as f64 * cycle_period_s;
        logger::set_sim_time(self.sim_time_s);
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }

    fn record(&self) -> CycleRecord {
        let est = &self.target_estimate;
        let sp = &self.setpoint;
        let rpt = &self.follow_status_rpt;

        CycleRecord {
            time_s: self.sim_time_s,
            drone_x_m: self.drone.position_m[0],
            drone_y_m: self.drone.position_m[1],
            drone_z_m: self.drone.position_m[2],
            drone_yaw_rad: self.drone.yaw_rad,
            target_valid: est.is_usable(),
            target_x_m: est.position_m[0],
            target_y_m: est.position_m[1],
            target_z_m: est.position_m[2],
            target_filtered_x_m: self.target_filtered_m[0],
            target_filtered_y_m: self.target_filtered_m[1],
            target_filtered_z_m: self.target_filtered_m[2],
            sp_x_m: sp.position_m[0],
            sp_y_m: sp.position_m[1],
            sp_z_m: sp.position_m[2],
            sp_vx_ms: sp.velocity_ms[0],
            sp_vy_ms: sp.velocity_ms[1],
            sp_vz_ms: sp.velocity_ms[2],
            sp_yaw_rad: sp.yaw_rad,
            want_takeoff: sp.want_takeoff,
            horizontal_control: rpt.horizontal_control,
            altitude_first: rpt.altitude_first,
            emergency_ascent: rpt.emergency_ascent,
            follow_angle_deg: rpt.follow_angle_deg,
            velocity_ff_scale: rpt.velocity_ff_scale,
        }
    }
}

impl Archived for DataStore {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let record = self.record();
        self.archiver.serialise(record)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Vector3;

    fn drone() -> DroneState {
        DroneState {
            position_m: Vector3::new(1.0, 2.0, -3.0),
            yaw_rad: 0.0,
            dist_to_bottom_m: 3.0,
            hagl_min_m: f64::NAN,
        }
    }

    #[test]
    fn test_cycle_time() {
        let mut ds = DataStore::new(drone(), None).unwrap();

        ds.cycle_start(0.05);
        assert_eq!(ds.sim_time_s, 0.0);
        ds.cycle_end();
        ds.cycle_end();
        ds.cycle_start(0.05);
        assert_eq!(ds.num_cycles, 2);
        assert_eq!(ds.sim_time_s, 0.1);
        assert_eq!(logger::sim_time(), Some(0.1));

        // Without a session records are dropped
        ds.write().unwrap();
    }

    #[test]
    fn test_record() {
        let mut ds = DataStore::new(drone(), None).unwrap();
        ds.setpoint.position_m[2] = -8.0;
        ds.follow_status_rpt.altitude_first = true;

        let r = ds.record();
        assert_eq!(r.drone_z_m, -3.0);
        assert_eq!(r.sp_z_m, -8.0);
        assert!(r.sp_x_m.is_nan());
        assert!(r.altitude_first);
        assert!(!r.target_valid);
    }
}
