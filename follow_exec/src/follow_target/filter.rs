//! # Smoothing filters
//!
//! This module provides the single pole low-pass filter used to smooth the follow target
//! setpoints.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::ops::{Add, Mul, Sub};
use serde::Serialize;

// Internal
use util::maths::AllFinite;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A first order exponential smoothing filter.
///
/// The filter is parameterised by the sample interval and a time constant, giving
/// `alpha = dt / (tau + dt)` and the update `state += alpha * (input - state)`.
#[derive(Debug, Serialize, Clone, Copy)]
pub struct AlphaFilter<T> {
    /// Weight given to each new sample
    alpha: f64,

    /// Current filtered value
    state: T,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> AlphaFilter<T>
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T>
{
    /// Create a new filter holding the given state.
    ///
    /// Alpha starts at zero, so `set_parameters` must be called before updates have any effect.
    pub fn new(state: T) -> Self {
        Self {
            alpha: 0.0,
            state,
        }
    }

    /// Set the sample interval and time constant of the filter.
    ///
    /// If their sum is not positive the previous alpha is kept.
    pub fn set_parameters(&mut self, sample_interval_s: f64, time_constant_s: f64) {
        let denominator = time_constant_s + sample_interval_s;

        if denominator > f64::EPSILON {
            self.alpha = sample_interval_s / denominator;
        }
    }

    /// Get the current weight given to new samples.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Get the current filtered value.
    pub fn state(&self) -> T {
        self.state
    }

    /// Overwrite the filtered value.
    pub fn reset(&mut self, state: T) {
        self.state = state;
    }

    /// Feed a new sample into the filter, returning the new filtered value.
    pub fn update(&mut self, sample: T) -> T {
        self.state = self.state + (sample - self.state) * self.alpha;
        self.state
    }
}

impl<T> AlphaFilter<T>
where
    T: Copy + Add<Output = T> + Sub<Output = T> + Mul<f64, Output = T> + AllFinite
{
    /// Feed a new sample into the filter, unless the current state is not finite, in which case
    /// the state is reset to the sample.
    pub fn update_or_reset(&mut self, sample: T) -> T {
        if self.state.all_finite() {
            self.update(sample)
        }
        else {
            self.reset(sample);
            self.state
        }
    }
}
