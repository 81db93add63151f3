//! Module interfaces
//!
//! Each flight task in `follow_exec` shall implement all the items in this module.

// ---------------------------------------------------------------------------
// FLIGHT TASK
// ---------------------------------------------------------------------------

/// A flight task, which produces setpoints once per control cycle while it is active.
///
/// The enclosing executable decides when a task is active. Before the first call to `update`,
/// and on every reactivation, `activate` must be called so the task can reset its internal state.
pub trait FlightTask {
    /// Data required during activation, usually the setpoint the previous task left behind.
    type ActivateData;

    /// Data required for cyclic processing.
    type InputData;
    /// Data produced by cyclic processing.
    type OutputData;
    /// A report on the status of the cyclic processing.
    type StatusReport;
    /// An error which can occur during activation or cyclic processing.
    type Error;

    /// Activate the task.
    ///
    /// # Outputs
    /// - On success `Ok(())`.
    /// - On error an `Error` instance, in which case the task must not be updated.
    fn activate(&mut self, activate_data: Self::ActivateData) -> Result<(), Self::Error>;

    /// Main task processing function, called once per control cycle.
    ///
    /// # Inputs
    /// - `input_data`: The data required for processing by the task.
    ///
    /// # Outputs
    /// - On success a tuple of the output data and status report.
    /// - On error an `Error` instance.
    fn update(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::Error>;
}
