//! Prestige arithmetic: converting wealth into a permanent multiplier.
//!
//! This module only computes. Resetting the rest of the simulation state is
//! the simulator's job; [`Prestige::apply`] updates the prestige record and
//! reports what the reset should use.

use crate::resource::{Ledger, ResourceKind};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Money required for the first prestige.
pub const BASE_COST: f64 = 1_000_000.0;

/// Cost multiplier applied after every prestige.
pub const COST_GROWTH: f64 = 5.0;

/// Money is divided by this before the square root.
pub const POINT_DIVISOR: f64 = 1_000_000.0;

/// Multiplier gained per accumulated point.
pub const MULTIPLIER_PER_POINT: f64 = 0.02;

/// Share of retained resources kept across a prestige.
pub const RETAINED_FRACTION: f64 = 0.1;

/// Starting money after a prestige, before the multiplier.
pub const STARTING_MONEY_BASE: f64 = 100.0;

/// Resources partially kept across a prestige.
pub const RETAINED_KINDS: [ResourceKind; 2] = [ResourceKind::QuantumChip, ResourceKind::AiModule];

// ---------------------------------------------------------------------------
// Prestige
// ---------------------------------------------------------------------------

/// Outcome of a prestige, used to build the reset state and the notification.
#[derive(Debug, Clone, PartialEq)]
pub struct PrestigeOutcome {
    pub points_gained: u64,
    pub multiplier: f64,
    /// The ledger to continue with.
    pub ledger: Ledger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Prestige {
    pub multiplier: f64,
    pub prestige_points: u64,
    pub cost: f64,
}

impl Default for Prestige {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            prestige_points: 0,
            cost: BASE_COST,
        }
    }
}

impl Prestige {
    pub fn is_eligible(&self, money: f64) -> bool {
        money >= self.cost
    }

    /// `floor(sqrt(money / 1,000,000))`.
    pub fn points_for(money: f64) -> u64 {
        (money.max(0.0) / POINT_DIVISOR).sqrt().floor() as u64
    }

    /// Bank the points for `ledger`'s money, grow the cost, and compute the
    /// post-prestige ledger. Callers check [`is_eligible`](Self::is_eligible)
    /// first; this never refuses.
    pub fn apply(&mut self, ledger: &Ledger) -> PrestigeOutcome {
        let points_gained = Self::points_for(ledger.money());
        self.prestige_points += points_gained;
        self.multiplier = 1.0 + self.prestige_points as f64 * MULTIPLIER_PER_POINT;
        self.cost *= COST_GROWTH;

        let mut next = Ledger::with_money(STARTING_MONEY_BASE * self.multiplier);
        for kind in RETAINED_KINDS {
            next.set(kind, (ledger.get(kind) * RETAINED_FRACTION).floor());
        }

        PrestigeOutcome {
            points_gained,
            multiplier: self.multiplier,
            ledger: next,
        }
    }
}
