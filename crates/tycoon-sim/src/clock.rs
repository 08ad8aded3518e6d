//! Fixed-period step clock driven by reported wall time.
//!
//! The host reports elapsed time with [`Clock::advance`]; the clock answers
//! how many whole periods are due and carries the remainder. One period is
//! `100 ms / game speed`. Changing the speed starts a new generation and
//! throws away any partial period from the old one.

use std::time::Duration;

/// Step period at game speed 1.
pub const BASE_PERIOD: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct Clock {
    period: Duration,
    accumulator: Duration,
    generation: u64,
    max_catch_up: u32,
}

impl Clock {
    /// `speed` must already be validated.
    pub fn new(speed: f64, max_catch_up: u32) -> Self {
        Self {
            period: BASE_PERIOD.div_f64(speed),
            accumulator: Duration::ZERO,
            generation: 0,
            max_catch_up: max_catch_up.max(1),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Bumped on every speed change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Time carried toward the next step.
    pub fn pending(&self) -> Duration {
        self.accumulator
    }

    /// Swap in a new period. Pending time from the old period is discarded.
    pub fn set_speed(&mut self, speed: f64) {
        self.period = BASE_PERIOD.div_f64(speed);
        self.accumulator = Duration::ZERO;
        self.generation += 1;
        tracing::debug!(
            speed,
            period_us = self.period.as_micros() as u64,
            generation = self.generation,
            "clock reconfigured"
        );
    }

    /// Account for `elapsed` wall time and return the number of steps due.
    ///
    /// At most `max_catch_up` steps are returned; backlog beyond that is
    /// dropped so a long stall does not replay hours of play in one call.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;
        let mut steps = 0;
        while self.accumulator >= self.period {
            if steps == self.max_catch_up {
                tracing::warn!(
                    dropped_ms = self.accumulator.as_millis() as u64,
                    "clock backlog exceeded catch-up cap"
                );
                self.accumulator = Duration::ZERO;
                break;
            }
            self.accumulator -= self.period;
            steps += 1;
        }
        steps
    }
}
