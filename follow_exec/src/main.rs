//! Main follow target executable entry point.
//!
//! # Architecture
//!
//! The executable flies a simulated drone after a simulated target in closed loop:
//!
//!     - Initialise the session, logger, parameters and simulation
//!     - Activate FollowTarget
//!     - Main loop:
//!         - Target estimate publication
//!         - FollowTarget processing
//!         - Drone response to the setpoints
//!         - Archiving
//!
//! # Modules
//!
//! All flight tasks (e.g. `follow_target`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::FlightTask` trait.
//!

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Report};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use comms_if::{
    msg::{FollowTargetStatus, TargetEstimate},
    topic::{topic, Publication, Subscription}
};
use follow_lib::{
    data_store::DataStore,
    follow_target::{self, ActivateData, FollowTarget, InputData, Setpoint},
    sim_target::{self, SimParams, SimTarget},
};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::FlightTask,
    session::Session,
    time::seconds_to_micros,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.05;

/// Limit of the number of consecutive FollowTarget errors before the executable stops.
const MAX_FOLLOW_ERROR_LIMIT: u64 = 5;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "follow_exec", about = "Follow a simulated target with a simulated drone")]
struct Opt {
    /// Duration of the simulation in seconds
    #[structopt(short, long, default_value = "120")]
    duration_s: f64,

    /// FollowTarget parameter file, instead of `params/follow_target.toml`
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Simulation parameter file, instead of `params/sim_target.toml`
    #[structopt(long, parse(from_os_str))]
    sim: Option<PathBuf>,

    /// Run as fast as possible rather than in real time
    #[structopt(long)]
    fast: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "follow_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Follow Target Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    if !opt.duration_s.is_finite() || opt.duration_s <= 0.0 {
        return Err(eyre!("Expected a positive duration, found {} s", opt.duration_s));
    }

    // ---- LOAD PARAMETERS ----

    let follow_params: follow_target::Params = match opt.params {
        Some(ref path) => util::params::load_from_path(path),
        None => util::params::load("follow_target.toml"),
    }.wrap_err("Could not load FollowTarget params")?;

    let sim_params: SimParams = match opt.sim {
        Some(ref path) => util::params::load_from_path(path),
        None => util::params::load("sim_target.toml"),
    }.wrap_err("Could not load simulation params")?;

    info!("Exec parameters loaded");
    debug!("FollowTarget params: {:?}", follow_params);
    debug!("Simulation params: {:?}", sim_params);

    session.save("params/follow_target.json", &follow_params)
        .wrap_err("Failed to save FollowTarget params")?;
    session.save("params/sim_target.json", &sim_params)
        .wrap_err("Failed to save simulation params")?;

    // ---- INITIALISE SIMULATION ----

    let sim_target = SimTarget::new(sim_params.target)
        .wrap_err("Failed to initialise the simulated target")?;

    let mut ds = DataStore::new(sim_params.drone.initial_state(), Some(&session))
        .map_err(|e| eyre!("Failed to initialise the DataStore: {}", e))?;

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let (mut estimate_pub, estimate_sub) = topic::<TargetEstimate>();
    let (status_pub, mut status_sub) = topic::<FollowTargetStatus>();

    let mut follow = FollowTarget::new(follow_params, estimate_sub, status_pub)
        .wrap_err("Failed to initialise FollowTarget")?;

    follow.activate(ActivateData {
        last_setpoint: Setpoint::default(),
        drone: ds.drone,
    }).wrap_err("Failed to activate FollowTarget")?;
    info!("FollowTarget activated");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    while ds.sim_time_s < opt.duration_s {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_PERIOD_S);

        // ---- DATA INPUT ----

        ds.target_estimate = sim_target.estimate_at(ds.sim_time_s);
        estimate_pub.publish(ds.target_estimate);

        // ---- CONTROL ALGORITHM PROCESSING ----

        let input = InputData {
            drone: ds.drone,
            dt_s: CYCLE_PERIOD_S,
            time_us: seconds_to_micros(ds.sim_time_s),
        };

        match follow.update(&input) {
            Ok((o, r)) => {
                ds.setpoint = o;
                ds.follow_status_rpt = r;
                ds.num_consec_follow_errors = 0;
            },
            Err(e) => {
                warn!("Error during FollowTarget processing: {}", e);
                ds.num_consec_follow_errors += 1;

                if ds.num_consec_follow_errors > MAX_FOLLOW_ERROR_LIMIT {
                    error!(
                        "Maximum number of FollowTarget errors ({}) has been exceeded",
                        MAX_FOLLOW_ERROR_LIMIT
                    );
                    return Err(e).wrap_err("FollowTarget failed repeatedly");
                }
            }
        }

        if let Some(status) = status_sub.copy() {
            ds.target_filtered_m = status.position_filtered_m;
        }

        // ---- DRONE RESPONSE ----

        ds.drone = sim_target::drone_response(
            &ds.drone,
            &ds.setpoint,
            CYCLE_PERIOD_S,
            sim_params.drone.time_constant_s
        ).wrap_err("Failed to simulate the drone")?;

        // ---- WRITE ARCHIVES ----

        if let Err(e) = ds.write() {
            warn!("Could not archive cycle: {}", e);
        }

        // 1 Hz summary
        if ds.num_cycles % ((1.0 / CYCLE_PERIOD_S) as u128) == 0 {
            info!(
                "t = {:.1} s, drone at {:?}, target at {:?}",
                ds.sim_time_s,
                ds.drone.position_m.as_slice(),
                ds.target_estimate.position_m
            );
        }

        // ---- CYCLE MANAGEMENT ----

        ds.cycle_end();

        if opt.fast {
            continue;
        }

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S)
            .checked_sub(cycle_dur)
        {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }
    }

    // ---- SHUTDOWN ----

    session.save("follow_target_state.json", follow.state())
        .wrap_err("Failed to save the final FollowTarget state")?;

    info!("End of execution after {} cycles", ds.num_cycles);

    Ok(())
}
