//! # Communications interface crate.
//!
//! Provides all common communications interfaces between the follow-target flight task and its
//! external collaborators (the target estimator and telemetry consumers).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Message definitions exchanged over topics
pub mod msg;

/// Publish/subscribe topics
pub mod topic;
