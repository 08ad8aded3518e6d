//! Live achievement metrics read straight from the simulation state.

use crate::state::SimulationState;
use tycoon_core::achievement::{AchievementMetric, MetricSource};
use tycoon_core::id::AchievementId;
use tycoon_core::machine::MachineRegistry;
use tycoon_core::resource::Ledger;
use tycoon_core::stats::Stats;
use tycoon_research::TechTree;

/// Borrowed view over the parts of the state achievements measure. Holding
/// field borrows rather than `&SimulationState` lets the tracker be
/// mutated alongside.
pub struct StateMetrics<'a> {
    resources: &'a Ledger,
    machines: &'a MachineRegistry,
    research: &'a TechTree,
    stats: &'a Stats,
    multiplier: f64,
}

impl<'a> StateMetrics<'a> {
    pub fn new(
        resources: &'a Ledger,
        machines: &'a MachineRegistry,
        research: &'a TechTree,
        stats: &'a Stats,
        multiplier: f64,
    ) -> Self {
        Self {
            resources,
            machines,
            research,
            stats,
            multiplier,
        }
    }
}

impl MetricSource for StateMetrics<'_> {
    fn metric(&self, metric: &AchievementMetric) -> f64 {
        match metric {
            AchievementMetric::MachinesOwned => self.machines.len() as f64,
            AchievementMetric::ResourceProduced(kind) => self.stats.produced(*kind),
            AchievementMetric::TechsResearched => self.research.researched_count() as f64,
            AchievementMetric::MoneyEarned => self.stats.money_earned,
            AchievementMetric::ResourceOnHand(kind) => self.resources.get(*kind),
            AchievementMetric::MaxMachineLevel => self.machines.max_level() as f64,
            AchievementMetric::ProductionRate(kind) => {
                self.machines.production_rate(*kind, self.multiplier)
            }
        }
    }
}

/// Re-evaluate every achievement against the current state.
pub fn evaluate_achievements(state: &mut SimulationState) -> Vec<AchievementId> {
    let metrics = StateMetrics::new(
        &state.resources,
        &state.machines,
        &state.research,
        &state.stats,
        state.prestige.multiplier,
    );
    state.achievements.evaluate(&metrics)
}
