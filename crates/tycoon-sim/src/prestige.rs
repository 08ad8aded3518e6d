//! Applying a prestige reset to the whole simulation state.

use crate::error::SimError;
use crate::state::SimulationState;
use tycoon_core::prestige::PrestigeOutcome;

/// Trade current wealth for prestige points and restart the factory.
///
/// Owned machines, resources and unfinished research are reset. Stats,
/// unlocked machine kinds, completed research, market listings, passive
/// income and achievements carry over.
pub fn apply_prestige(state: &mut SimulationState) -> Result<PrestigeOutcome, SimError> {
    let money = state.resources.money();
    if !state.prestige.is_eligible(money) {
        return Err(SimError::PrestigeUnavailable {
            cost: state.prestige.cost,
        });
    }

    let outcome = state.prestige.apply(&state.resources);
    state.resources = outcome.ledger.clone();
    state.machines.clear_instances();
    state.research.reset_unfinished();

    tracing::info!(
        points = outcome.points_gained,
        multiplier = outcome.multiplier,
        next_cost = state.prestige.cost,
        "prestige performed"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tycoon_core::id::{MachineKindId, TechId};
    use tycoon_core::resource::ResourceKind;
    use tycoon_core::test_utils::ore_miner;
    use tycoon_data::Catalog;

    #[test]
    fn refuses_below_cost_without_changes() {
        let mut state = SimulationState::new(&Catalog::builtin().unwrap());
        state.resources.set(ResourceKind::Money, 999_999.0);
        state.machines.insert(ore_miner().instantiate());

        let err = apply_prestige(&mut state).unwrap_err();
        assert!(matches!(err, SimError::PrestigeUnavailable { cost } if cost == 1_000_000.0));
        assert_eq!(state.resources.money(), 999_999.0);
        assert_eq!(state.machines.len(), 1);
    }

    #[test]
    fn resets_factory_and_keeps_progression() {
        let catalog = Catalog::builtin().unwrap();
        let mut state = SimulationState::new(&catalog);
        state.resources.set(ResourceKind::Money, 4_000_000.0);
        state.resources.set(ResourceKind::QuantumChip, 25.0);
        state.machines.insert(ore_miner().instantiate());
        state.machines.unlock(MachineKindId::from("circuitAssembler"));
        state.stats.money_earned = 4_000_000.0;

        let mining = TechId::from("efficientMining");
        let metallurgy = TechId::from("advancedMetallurgy");
        state.research.restore(
            &mining,
            tycoon_research::TechState { researched: true, researching: false, progress: 100.0 },
        );
        state.research.restore(
            &metallurgy,
            tycoon_research::TechState { researched: false, researching: true, progress: 40.0 },
        );

        let outcome = apply_prestige(&mut state).unwrap();
        assert_eq!(outcome.points_gained, 2);
        assert!((state.resources.money() - 104.0).abs() < 1e-9);
        assert_eq!(state.resources.get(ResourceKind::QuantumChip), 2.0);
        assert!(state.machines.is_empty());
        assert!(state.machines.is_available(&MachineKindId::from("circuitAssembler")));
        assert!(state.research.is_researched(&mining));
        let pending = state.research.state(&metallurgy).unwrap();
        assert!(!pending.researching);
        assert_eq!(pending.progress, 0.0);
        assert_eq!(state.stats.money_earned, 4_000_000.0);
        assert_eq!(state.prestige.cost, 5_000_000.0);
    }
}
