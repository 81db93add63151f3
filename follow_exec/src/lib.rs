//! # Follow library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the follow executable crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Follow target - keeps the drone at a set distance and angle from a moving target
pub mod follow_target;

/// Simulated target - generates target estimates along a scripted trajectory
pub mod sim_target;

/// Data store - the global state of the executable
pub mod data_store;
