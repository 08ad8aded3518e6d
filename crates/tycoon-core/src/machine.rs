//! Machine definitions, owned instances, and the per-tick production cycle.
//!
//! A [`MachineDefinition`] is immutable catalog data. Buying a machine
//! snapshots the definition into a [`MachineInstance`] whose rate maps are
//! independently mutable, since research effects scale the rates of the
//! instances that exist when the research completes.

use crate::id::{MachineId, MachineKindId};
use crate::resource::{Ledger, LedgerError, ResourceKind};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fraction of a per-second rate consumed in one tick.
pub const TICK_FRACTION: f64 = 0.1;

/// Progress points gained by a running, supplied machine each tick.
pub const PROGRESS_PER_TICK: u32 = 10;

/// Progress at which a production cycle completes.
pub const CYCLE_COMPLETE: u32 = 100;

/// Highest level a machine can be upgraded to.
pub const MAX_LEVEL: u32 = 1000;

/// Share of the total investment refunded when a machine is sold.
pub const SELL_REFUND_RATIO: f64 = 0.5;

/// Per-level rates keyed by resource.
pub type RateMap = BTreeMap<ResourceKind, f64>;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// A purchasable machine kind. Catalog data; never mutated at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineDefinition {
    pub kind: MachineKindId,
    pub name: String,
    pub price: f64,
    pub input_rate: RateMap,
    pub output_rate: RateMap,
    pub base_upgrade_cost: f64,
    pub upgrade_cost_multiplier: f64,
}

impl MachineDefinition {
    /// Snapshot this definition into a fresh level-1, running instance.
    pub fn instantiate(&self) -> MachineInstance {
        MachineInstance {
            kind: self.kind.clone(),
            name: self.name.clone(),
            input_rate: self.input_rate.clone(),
            output_rate: self.output_rate.clone(),
            base_upgrade_cost: self.base_upgrade_cost,
            upgrade_cost_multiplier: self.upgrade_cost_multiplier,
            level: 1,
            running: true,
            progress: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Instances
// ---------------------------------------------------------------------------

fn default_level() -> u32 {
    1
}

fn default_running() -> bool {
    true
}

/// An owned machine. `progress` is percent-of-cycle and is always reset to
/// zero when a cycle completes or when the machine is starved of input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineInstance {
    pub kind: MachineKindId,
    pub name: String,
    #[serde(default)]
    pub input_rate: RateMap,
    #[serde(default)]
    pub output_rate: RateMap,
    pub base_upgrade_cost: f64,
    pub upgrade_cost_multiplier: f64,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default = "default_running")]
    pub running: bool,
    #[serde(default)]
    pub progress: u32,
}

/// What happened to one machine during one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum MachineTick {
    /// The machine is switched off; nothing was touched.
    Idle,
    /// An input was short. Nothing was consumed and progress went back to 0.
    Stalled { missing: ResourceKind },
    /// Inputs were consumed and the cycle advanced.
    Working { progress: u32 },
    /// Inputs were consumed and the cycle finished, producing outputs.
    Completed { produced: Vec<(ResourceKind, f64)> },
}

impl MachineInstance {
    /// Inputs this machine draws in one tick at its current level.
    pub fn required_inputs(&self) -> Vec<(ResourceKind, f64)> {
        self.input_rate
            .iter()
            .map(|(kind, rate)| (*kind, rate * self.level as f64 * TICK_FRACTION))
            .collect()
    }

    /// Output of one completed cycle for `kind`, including the prestige
    /// multiplier.
    pub fn output_per_cycle(&self, kind: ResourceKind, multiplier: f64) -> f64 {
        self.output_rate.get(&kind).copied().unwrap_or(0.0) * self.level as f64 * multiplier
    }

    /// Advance this machine by one tick against the ledger.
    ///
    /// Consumption is all-or-nothing across inputs: a single short input
    /// stalls the machine without consuming anything.
    pub fn tick(&mut self, ledger: &mut Ledger, multiplier: f64) -> MachineTick {
        if !self.running {
            return MachineTick::Idle;
        }

        match ledger.withdraw_all(&self.required_inputs()) {
            Ok(()) => {}
            Err(LedgerError::Insufficient { kind, .. }) => {
                self.progress = 0;
                return MachineTick::Stalled { missing: kind };
            }
        }

        self.progress = self.progress.saturating_add(PROGRESS_PER_TICK);
        if self.progress < CYCLE_COMPLETE {
            return MachineTick::Working {
                progress: self.progress,
            };
        }

        // Overshoot past 100 is dropped, not carried into the next cycle.
        let produced: Vec<(ResourceKind, f64)> = self
            .output_rate
            .keys()
            .map(|kind| (*kind, self.output_per_cycle(*kind, multiplier)))
            .collect();
        for &(kind, amount) in &produced {
            ledger.add(kind, amount);
        }
        self.progress = 0;
        MachineTick::Completed { produced }
    }

    /// Raise the level by one. `None` at [`MAX_LEVEL`].
    pub fn level_up(&mut self) -> Option<u32> {
        if self.level >= MAX_LEVEL {
            return None;
        }
        self.level += 1;
        Some(self.level)
    }

    /// Check fields that come from outside the simulation (a save file)
    /// against the ranges the tick and cost code rely on.
    pub fn check_bounds(&self) -> Result<(), String> {
        if !(1..=MAX_LEVEL).contains(&self.level) {
            return Err(format!("level {} is outside 1..={MAX_LEVEL}", self.level));
        }
        if self.progress > CYCLE_COMPLETE {
            return Err(format!("progress {} is above {CYCLE_COMPLETE}", self.progress));
        }
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.base_upgrade_cost) || !positive(self.upgrade_cost_multiplier) {
            return Err("upgrade costs must be positive".to_string());
        }
        if self
            .input_rate
            .values()
            .chain(self.output_rate.values())
            .any(|rate| !(rate.is_finite() && *rate >= 0.0))
        {
            return Err("rates must be finite and non-negative".to_string());
        }
        Ok(())
    }

    /// Cost to go from the current level to the next:
    /// `floor(base × multiplier^(level - 1))`.
    pub fn upgrade_cost(&self) -> f64 {
        self.cost_at_level(self.level)
    }

    /// Refund for selling: half of the implied purchase price
    /// (`base_upgrade_cost / multiplier`) plus every upgrade paid so far.
    pub fn sell_value(&self) -> f64 {
        let implied_price = self.base_upgrade_cost / self.upgrade_cost_multiplier;
        let upgrades: f64 = (1..self.level)
            .map(|level| {
                self.base_upgrade_cost * self.upgrade_cost_multiplier.powi(level as i32 - 1)
            })
            .sum();
        ((implied_price + upgrades) * SELL_REFUND_RATIO).floor()
    }

    fn cost_at_level(&self, level: u32) -> f64 {
        (self.base_upgrade_cost * self.upgrade_cost_multiplier.powi(level as i32 - 1)).floor()
    }

    /// Multiply every output rate by `factor`.
    pub fn scale_outputs(&mut self, factor: f64) {
        for rate in self.output_rate.values_mut() {
            *rate *= factor;
        }
    }

    /// Multiply every input rate by `factor`.
    pub fn scale_inputs(&mut self, factor: f64) {
        for rate in self.input_rate.values_mut() {
            *rate *= factor;
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Errors from machine lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    #[error("machine {0:?} does not exist")]
    NotFound(MachineId),
}

/// Owned instances plus the kinds currently unlocked for purchase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineRegistry {
    owned: SlotMap<MachineId, MachineInstance>,
    available: Vec<MachineKindId>,
}

impl MachineRegistry {
    /// An empty registry with the given kinds unlocked.
    pub fn new(available: impl IntoIterator<Item = MachineKindId>) -> Self {
        let mut registry = Self::default();
        for kind in available {
            registry.unlock(kind);
        }
        registry
    }

    // -- Instances --

    pub fn insert(&mut self, instance: MachineInstance) -> MachineId {
        self.owned.insert(instance)
    }

    pub fn get(&self, id: MachineId) -> Result<&MachineInstance, MachineError> {
        self.owned.get(id).ok_or(MachineError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: MachineId) -> Result<&mut MachineInstance, MachineError> {
        self.owned.get_mut(id).ok_or(MachineError::NotFound(id))
    }

    pub fn remove(&mut self, id: MachineId) -> Result<MachineInstance, MachineError> {
        self.owned.remove(id).ok_or(MachineError::NotFound(id))
    }

    pub fn contains(&self, id: MachineId) -> bool {
        self.owned.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MachineId, &MachineInstance)> {
        self.owned.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (MachineId, &mut MachineInstance)> {
        self.owned.iter_mut()
    }

    /// Snapshot of current instance ids, for mutate-after-collect loops.
    pub fn ids(&self) -> Vec<MachineId> {
        self.owned.keys().collect()
    }

    /// Highest level among owned instances, or 0 when none are owned.
    pub fn max_level(&self) -> u32 {
        self.owned.values().map(|m| m.level).max().unwrap_or(0)
    }

    /// Instantaneous output per cycle of `kind` across running instances.
    pub fn production_rate(&self, kind: ResourceKind, multiplier: f64) -> f64 {
        self.owned
            .values()
            .filter(|m| m.running)
            .map(|m| m.output_per_cycle(kind, multiplier))
            .sum()
    }

    /// Remove every instance. Unlocked kinds are kept.
    pub fn clear_instances(&mut self) {
        self.owned.clear();
    }

    pub fn instances(&self) -> &SlotMap<MachineId, MachineInstance> {
        &self.owned
    }

    /// Replace every instance wholesale, keeping the given ids.
    pub fn replace_instances(&mut self, owned: SlotMap<MachineId, MachineInstance>) {
        self.owned = owned;
    }

    // -- Availability --

    pub fn available(&self) -> &[MachineKindId] {
        &self.available
    }

    pub fn is_available(&self, kind: &MachineKindId) -> bool {
        self.available.contains(kind)
    }

    /// Unlock a kind for purchase. Returns `false` if it was already unlocked.
    pub fn unlock(&mut self, kind: MachineKindId) -> bool {
        if self.is_available(&kind) {
            return false;
        }
        self.available.push(kind);
        true
    }

    /// Replace the unlocked list wholesale, dropping duplicates.
    pub fn replace_available(&mut self, kinds: impl IntoIterator<Item = MachineKindId>) {
        self.available.clear();
        for kind in kinds {
            self.unlock(kind);
        }
    }
}
