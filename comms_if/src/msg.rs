//! # Message definitions
//!
//! All vector quantities are expressed in the local North-East-Down (NED) tangent frame shared
//! by the vehicle and the target estimator.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Latest estimate of the followed target's state, as produced by the target estimator.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct TargetEstimate {
    /// Time at which the estimate was produced. Zero means no estimate was ever received.
    ///
    /// Units: microseconds
    pub timestamp_us: u64,

    /// Set by the estimator when the estimate can be used for control
    pub valid: bool,

    /// Target position
    ///
    /// Units: meters,
    /// Frame: Local NED
    pub position_m: [f64; 3],

    /// Target velocity
    ///
    /// Units: meters/second,
    /// Frame: Local NED
    pub velocity_ms: [f64; 3],

    /// Target acceleration
    ///
    /// Units: meters/second^2,
    /// Frame: Local NED
    pub acceleration_mss: [f64; 3],
}

/// Diagnostics published by the follow-target task every cycle.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct FollowTargetStatus {
    /// Time at which the status was sent.
    ///
    /// Units: microseconds
    pub timestamp_us: u64,

    /// Low-pass filtered target position used for setpoint generation. NaN until the first
    /// usable estimate has been received.
    ///
    /// Units: meters,
    /// Frame: Local NED
    pub position_filtered_m: [f64; 3],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TargetEstimate {
    /// Returns `true` if the estimate may be used for control, i.e. it is flagged valid and has
    /// been received at least once.
    pub fn is_usable(&self) -> bool {
        self.valid && self.timestamp_us > 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_usable() {
        let mut est = TargetEstimate::default();
        assert!(!est.is_usable());

        est.valid = true;
        assert!(!est.is_usable());

        est.timestamp_us = 10;
        assert!(est.is_usable());

        est.valid = false;
        assert!(!est.is_usable());
    }

    #[test]
    fn test_status_json() {
        let status = FollowTargetStatus {
            timestamp_us: 42,
            position_filtered_m: [1.0, 2.0, -3.0]
        };

        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp_us":42,"position_filtered_m":[1.0,2.0,-3.0]}"#
        );
    }
}
