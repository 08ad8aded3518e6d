//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so downstream
//! crates can reuse the fixtures through the `test-utils` feature.

use crate::achievement::{AchievementMetric, MetricSource};
use crate::id::MachineKindId;
use crate::machine::{MachineDefinition, RateMap};
use crate::resource::{Ledger, ResourceKind};
use std::collections::HashMap;

// ===========================================================================
// Machine definitions
// ===========================================================================

pub fn machine_def(
    kind: &str,
    price: f64,
    inputs: &[(ResourceKind, f64)],
    outputs: &[(ResourceKind, f64)],
    base_upgrade_cost: f64,
    upgrade_cost_multiplier: f64,
) -> MachineDefinition {
    MachineDefinition {
        kind: MachineKindId::from(kind),
        name: kind.to_string(),
        price,
        input_rate: inputs.iter().copied().collect::<RateMap>(),
        output_rate: outputs.iter().copied().collect::<RateMap>(),
        base_upgrade_cost,
        upgrade_cost_multiplier,
    }
}

pub fn ore_miner() -> MachineDefinition {
    machine_def("oreMiner", 50.0, &[], &[(ResourceKind::Ore, 1.0)], 100.0, 1.5)
}

pub fn metal_refiner() -> MachineDefinition {
    machine_def(
        "metalRefiner",
        150.0,
        &[(ResourceKind::Ore, 2.0)],
        &[(ResourceKind::Metal, 1.0)],
        200.0,
        1.5,
    )
}

// ===========================================================================
// Ledgers and metrics
// ===========================================================================

pub fn ledger_with(amounts: &[(ResourceKind, f64)]) -> Ledger {
    let mut ledger = Ledger::new();
    for &(kind, amount) in amounts {
        ledger.set(kind, amount);
    }
    ledger
}

/// Metric source backed by a plain table; unknown metrics read as zero.
#[derive(Debug, Default, Clone)]
pub struct StaticMetrics(pub HashMap<String, f64>);

impl StaticMetrics {
    pub fn with(mut self, metric: AchievementMetric, value: f64) -> Self {
        self.0.insert(format!("{metric:?}"), value);
        self
    }
}

impl MetricSource for StaticMetrics {
    fn metric(&self, metric: &AchievementMetric) -> f64 {
        self.0.get(&format!("{metric:?}")).copied().unwrap_or(0.0)
    }
}
