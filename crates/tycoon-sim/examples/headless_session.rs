//! Headless session: drive the simulator from a real-time clock.
//!
//! Buys the starter machines, researches Efficient Mining, sells ore on the
//! market, and prints a status line every simulated second. The save goes
//! to a file in the system temp directory.
//!
//! Run with: `cargo run -p tycoon-sim --example headless_session`

use std::thread;
use std::time::{Duration, Instant};
use tycoon_core::id::{MachineKindId, TechId};
use tycoon_core::market::AmountStep;
use tycoon_core::resource::ResourceKind;
use tycoon_data::Catalog;
use tycoon_sim::{Command, FileStore, SimConfig, Simulator};

fn main() {
    let catalog = Catalog::builtin().expect("builtin catalog");
    let store = FileStore::new(std::env::temp_dir().join("tycoon_headless_save.json"));
    let mut sim = Simulator::with_config(catalog, store, SimConfig::default());

    sim.set_game_speed(10.0).unwrap();
    sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();

    let mut last = Instant::now();
    let mut seconds_reported = 0;
    while sim.state().stats.time_played < 120.0 {
        thread::sleep(Duration::from_millis(20));
        let now = Instant::now();
        let result = sim.advance(now - last);
        last = now;

        for report in &result.reports {
            for id in &report.achievements_unlocked {
                println!("  achievement: {id}");
            }
            for tech in &report.research_completed {
                println!("  researched: {tech}");
            }
        }

        let ore = sim.state().resources.get(ResourceKind::Ore);
        if ore >= 10.0 {
            sim.set_market_amount(ResourceKind::Ore, AmountStep::Increase);
            let _ = sim.execute(Command::SellResource { resource: ResourceKind::Ore });
            sim.set_market_amount(ResourceKind::Ore, AmountStep::Decrease);
        }

        let refiner = MachineKindId::from("metalRefiner");
        if sim.can_afford_machine(&refiner) && sim.state().machines.len() < 3 {
            let _ = sim.buy_machine(&refiner);
        }

        let mining = TechId::from("efficientMining");
        if sim.state().resources.money() > 100.0
            && !sim.state().research.is_researched(&mining)
            && !sim.state().research.is_researching(&mining)
        {
            let _ = sim.start_research(&mining);
        }

        let played = sim.state().stats.time_played as u64;
        if played / 10 > seconds_reported {
            seconds_reported = played / 10;
            println!(
                "[{}] money ${} ore {} metal {} machines {}",
                sim.play_time(),
                sim.format_number(sim.state().resources.money()),
                sim.format_number(ore),
                sim.format_number(sim.state().resources.get(ResourceKind::Metal)),
                sim.state().machines.len(),
            );
        }
    }

    sim.save_game().unwrap();
    for notification in sim.notifications() {
        println!("{:?}: {}", notification.severity, notification.message);
    }
}
