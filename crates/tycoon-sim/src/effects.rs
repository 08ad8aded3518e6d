//! Research effect dispatch.

use crate::state::SimulationState;
use tycoon_research::ResearchEffect;

/// Apply one completed-research effect to the state.
///
/// Rate changes only touch instances owned right now. Machines bought later
/// start from their catalog rates.
pub fn apply_effect(state: &mut SimulationState, effect: &ResearchEffect) {
    match effect {
        ResearchEffect::UnlockMachine(kind) => {
            if state.machines.unlock(kind.clone()) {
                tracing::debug!(machine = %kind, "machine unlocked");
            }
        }
        ResearchEffect::BoostOutput { machine, factor } => {
            for (_, instance) in state.machines.iter_mut() {
                if machine.as_ref().is_none_or(|kind| *kind == instance.kind) {
                    instance.scale_outputs(*factor);
                }
            }
        }
        ResearchEffect::ReduceInput { factor } => {
            for (_, instance) in state.machines.iter_mut() {
                instance.scale_inputs(*factor);
            }
        }
        ResearchEffect::EnablePassiveIncome { amount } => {
            state.passive_income.enable(*amount);
        }
        ResearchEffect::AddMarketResource {
            resource,
            base_price,
        } => {
            state.market.list(*resource, *base_price);
        }
    }
}
