//! Lifetime counters and passive income.

use crate::machine::TICK_FRACTION;
use crate::resource::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Monotonic lifetime counters. Every field only ever grows within a save.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    /// Seconds of simulated time.
    pub time_played: f64,
    pub money_earned: f64,
    pub machines_bought: u64,
    pub resources_produced: f64,
    pub resources_sold: f64,
    pub upgrades_bought: u64,
    pub techs_researched: u64,
    /// Lifetime production per resource kind.
    pub produced: BTreeMap<ResourceKind, f64>,
}

impl Stats {
    pub fn record_production(&mut self, kind: ResourceKind, amount: f64) {
        self.resources_produced += amount;
        *self.produced.entry(kind).or_insert(0.0) += amount;
    }

    pub fn record_sale(&mut self, amount: u32, value: f64) {
        self.resources_sold += amount as f64;
        self.money_earned += value;
    }

    pub fn record_income(&mut self, value: f64) {
        self.money_earned += value;
    }

    pub fn produced(&self, kind: ResourceKind) -> f64 {
        self.produced.get(&kind).copied().unwrap_or(0.0)
    }

    /// Advance the play clock by one tick.
    pub fn tick(&mut self) {
        self.time_played += TICK_FRACTION;
    }
}

/// Money generated every tick without any machine, once enabled by research.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PassiveIncome {
    pub active: bool,
    /// Per-second amount before the prestige multiplier.
    pub amount: f64,
}

impl PassiveIncome {
    pub fn enable(&mut self, amount: f64) {
        self.active = true;
        self.amount = amount;
    }

    /// Money credited this tick, zero while inactive.
    pub fn per_tick(&self, multiplier: f64) -> f64 {
        if self.active {
            self.amount * multiplier * TICK_FRACTION
        } else {
            0.0
        }
    }
}
