// src/observer/backoff.rs

use std::time::Duration;

/// Multiplicative polling interval, capped at `max`.
///
/// Starts at `initial`; each [`next`](Backoff::next) multiplies the current
/// interval by `factor` and clamps it to `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    current: Duration,
    factor: f64,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, factor: f64, max: Duration) -> Self {
        let factor = if factor.is_finite() && factor >= 1.0 {
            factor
        } else {
            1.0
        };
        let max = max.max(initial);
        Self {
            initial,
            current: initial,
            factor,
            max,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    /// Grow the interval one step and return it.
    pub fn next(&mut self) -> Duration {
        self.current = Duration::try_from_secs_f64(self.current.as_secs_f64() * self.factor)
            .map_or(self.max, |grown| grown.min(self.max));
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
