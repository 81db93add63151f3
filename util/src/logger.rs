//! Logger for the follow executables
//!
//! Every line carries the wall time elapsed since the session epoch and, once a simulation is
//! running, the simulation clock, so that log lines can be matched against rows of the cycle
//! archive:
//!
//! ```text
//! [  0.012345 sim   12.35 INF] message
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info, Record};
use std::fmt::Arguments;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Bits of the current simulation time in seconds, NaN while no simulation is running.
static SIM_TIME_S_BITS: AtomicU64 = AtomicU64::new(0x7ff8_0000_0000_0000);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level less than `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Notes
///
/// - `min_level` must be greater than `log::Level::Info`.
/// - Per-tick logs are emitted at trace level, so stdout is capped at `Debug`. The log file
///   receives everything down to `min_level`, without colour codes.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let stdout = fern::Dispatch::new()
        .level(min_level.min(LevelFilter::Debug))
        .format(|out, message, record| out.finish(format_args!(
            "{}",
            format_line(record, message, level_to_str(record.level()))
        )))
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!(
            "{}",
            format_line(record, message, level_to_str(record.level()).clear())
        )))
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .chain(stdout)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

/// Set the simulation time stamped onto following log lines.
///
/// A non-finite time removes the stamp.
pub fn set_sim_time(sim_time_s: f64) {
    SIM_TIME_S_BITS.store(sim_time_s.to_bits(), Ordering::Relaxed);
}

/// Get the simulation time currently stamped onto log lines, if any.
pub fn sim_time() -> Option<f64> {
    let t = f64::from_bits(SIM_TIME_S_BITS.load(Ordering::Relaxed));

    if t.is_finite() {
        Some(t)
    }
    else {
        None
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn format_line(record: &Record, message: &Arguments, level: ColoredString) -> String {
    let stamp = format!(
        "{:10.6}{}",
        session::get_elapsed_seconds(),
        sim_time_tag(sim_time())
    );

    // If debug or trace include the target, otherwise don't include it
    if record.level() > log::Level::Info {
        format!("[{} {}] {}: {}", stamp, level, record.target(), message)
    }
    else {
        format!("[{} {}] {}", stamp, level, message)
    }
}

/// Tag for the simulation clock, empty outside of a simulation.
fn sim_time_tag(sim_time_s: Option<f64>) -> String {
    match sim_time_s {
        Some(t) => format!(" sim {:7.2}", t),
        None => String::new(),
    }
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
