//! Prestige arithmetic end to end.

use tycoon_core::id::MachineKindId;
use tycoon_core::resource::ResourceKind;
use tycoon_data::Catalog;
use tycoon_sim::{MemoryStore, SimConfig, Simulator};

fn new_sim() -> Simulator {
    Simulator::with_config(Catalog::builtin().unwrap(), MemoryStore::new(), SimConfig::seeded(5))
}

#[test]
fn four_million_gives_two_points() {
    let mut sim = new_sim();
    let state = sim.state_mut();
    state.resources.set(ResourceKind::Money, 4_000_050.0);
    state.resources.set(ResourceKind::QuantumChip, 25.0);
    state.resources.set(ResourceKind::AiModule, 9.0);
    state.resources.set(ResourceKind::Device, 400.0);
    sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();

    let outcome = sim.perform_prestige().unwrap();
    assert_eq!(outcome.points_gained, 2);

    let state = sim.state();
    assert!((state.prestige.multiplier - 1.04).abs() < 1e-12);
    assert!((state.resources.money() - 104.0).abs() < 1e-9);
    assert_eq!(state.resources.get(ResourceKind::QuantumChip), 2.0);
    assert_eq!(state.resources.get(ResourceKind::AiModule), 0.0);
    assert_eq!(state.resources.get(ResourceKind::Device), 0.0);
    assert!(state.machines.is_empty());
    assert_eq!(state.prestige.cost, 5_000_000.0);
    assert_eq!(state.stats.machines_bought, 1);
}

#[test]
fn multiplier_scales_production() {
    let mut sim = new_sim();
    sim.state_mut().resources.set(ResourceKind::Money, 9_000_000.0);
    sim.perform_prestige().unwrap();
    assert!((sim.state().prestige.multiplier - 1.06).abs() < 1e-12);

    sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();
    for _ in 0..10 {
        sim.step();
    }
    assert!((sim.state().resources.get(ResourceKind::Ore) - 1.06).abs() < 1e-12);
}

#[test]
fn points_and_cost_accumulate() {
    let mut sim = new_sim();
    sim.state_mut().resources.set(ResourceKind::Money, 1_000_000.0);
    sim.perform_prestige().unwrap();
    assert_eq!(sim.state().prestige.prestige_points, 1);

    sim.state_mut().resources.set(ResourceKind::Money, 4_999_999.0);
    assert!(sim.perform_prestige().is_err());
    assert_eq!(sim.state().prestige.prestige_points, 1);

    sim.state_mut().resources.set(ResourceKind::Money, 16_000_000.0);
    sim.perform_prestige().unwrap();
    let prestige = &sim.state().prestige;
    assert_eq!(prestige.prestige_points, 5);
    assert!((prestige.multiplier - 1.1).abs() < 1e-12);
    assert_eq!(prestige.cost, 25_000_000.0);
}
