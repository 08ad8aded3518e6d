//! The mutable state graph of one game.

use crate::metrics::StateMetrics;
use crate::settings::GameSettings;
use tycoon_core::achievement::AchievementTracker;
use tycoon_core::machine::MachineRegistry;
use tycoon_core::market::Market;
use tycoon_core::prestige::Prestige;
use tycoon_core::resource::Ledger;
use tycoon_core::stats::{PassiveIncome, Stats};
use tycoon_data::Catalog;
use tycoon_research::TechTree;

/// Everything a save captures, plus the tick counter.
///
/// Cloning is how persistence stays all-or-nothing: a load decodes onto a
/// fresh state and only replaces the live one on success.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub resources: Ledger,
    pub machines: MachineRegistry,
    pub research: TechTree,
    pub market: Market,
    pub stats: Stats,
    pub settings: GameSettings,
    pub achievements: AchievementTracker,
    pub prestige: Prestige,
    pub passive_income: PassiveIncome,
    /// Steps run since this state was created or loaded. Not persisted.
    pub tick: u64,
}

impl SimulationState {
    /// A new game as described by the catalog.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            resources: Ledger::with_money(catalog.starting_money),
            machines: catalog.machine_registry(),
            research: catalog.tech_tree(),
            market: catalog.market(),
            stats: Stats::default(),
            settings: GameSettings::default(),
            achievements: catalog.achievement_tracker(),
            prestige: Prestige::default(),
            passive_income: PassiveIncome::default(),
            tick: 0,
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.prestige.multiplier
    }

    pub fn metrics(&self) -> StateMetrics<'_> {
        StateMetrics::new(
            &self.resources,
            &self.machines,
            &self.research,
            &self.stats,
            self.prestige.multiplier,
        )
    }
}
