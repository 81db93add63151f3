//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Number of microseconds in a second
pub const MICROS_PER_SECOND: f64 = 1e6;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a time in seconds into whole microseconds, saturating at zero.
pub fn seconds_to_micros(time_s: f64) -> u64 {
    if time_s.is_finite() && time_s > 0.0 {
        (time_s * MICROS_PER_SECOND) as u64
    }
    else {
        0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_conversions() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
        assert_eq!(seconds_to_micros(0.25), 250_000);
        assert_eq!(seconds_to_micros(-1.0), 0);
        assert_eq!(seconds_to_micros(f64::NAN), 0);
    }
}
