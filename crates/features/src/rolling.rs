//! Trailing rolling window statistics.
//!
//! Statistics are defined from the first observation (minimum one period),
//! so a window holding a single value has that value as its mean.

use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Fixed-size trailing window over price observations.
pub struct RollingWindow {
    /// Window size in observations.
    window: usize,
    /// Values currently in the window, oldest first.
    values: VecDeque<f64>,
    /// Running sum of values (for mean).
    sum: f64,
}

impl RollingWindow {
    /// Create a new rolling window.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
        }
    }

    /// Push an observation, evicting the oldest once the window is full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() >= self.window {
            if let Some(old) = self.values.pop_front() {
                self.sum -= old;
            }
        }
        self.values.push_back(value);
        self.sum += value;
    }

    /// Mean of the window, `None` before the first observation.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.sum / self.values.len() as f64)
    }

    /// Sample standard deviation (n - 1 denominator), `None` with fewer than
    /// two observations.
    pub fn std_dev(&self) -> Option<f64> {
        if self.values.len() < 2 {
            return None;
        }
        let sd = self.values.iter().std_dev();
        if sd.is_finite() {
            Some(sd)
        } else {
            None
        }
    }
}
