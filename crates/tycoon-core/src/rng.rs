//! Deterministic PRNG for market drift.
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, and trivially
//! seedable so tests and replays see the same price walk.

use std::time::{SystemTime, UNIX_EPOCH};

/// SplitMix64 pseudo-random number generator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from the system clock, for interactive sessions.
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5EED);
        Self::new(nanos)
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform sample in `[0, 1)` built from the top 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform sample in `[0, 1]`, both ends reachable.
    pub fn next_f64_inclusive(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / ((1u64 << 53) - 1) as f64
    }

    /// Uniform sample in the closed interval `[low, high]`.
    pub fn range(&mut self, low: f64, high: f64) -> f64 {
        (low + self.next_f64_inclusive() * (high - low)).clamp(low, high)
    }

    /// Get the internal state.
    pub fn state(&self) -> u64 {
        self.state
    }
}
