//! The simulator: owns the state and runs steps and player commands.
//!
//! # Step order
//!
//! Each call to [`Simulator::step`] runs these phases in order:
//!
//! 1. **Machines** -- every running instance draws inputs and advances its
//!    cycle; completed cycles add outputs and production stats.
//! 2. **Research** -- in-progress technologies draw money; completions apply
//!    their effects exactly once.
//! 3. **Income** -- passive income, once unlocked.
//! 4. **Market** -- every listed price drifts.
//! 5. **Bookkeeping** -- play time and the tick counter advance.
//! 6. **Achievements** -- every locked achievement is re-evaluated.
//! 7. **Autosave** -- on the configured interval, when enabled.
//!
//! Commands are all-or-nothing: a command that returns `Err` has changed
//! nothing and has queued the error as a notification.

use crate::clock::Clock;
use crate::config::SimConfig;
use crate::effects::apply_effect;
use crate::error::{PersistError, SimError};
use crate::metrics::evaluate_achievements;
use crate::prestige::apply_prestige;
use crate::serialize::{self, export_file_name};
use crate::settings::validate_speed;
use crate::state::SimulationState;
use crate::store::SaveStore;
use chrono::Local;
use std::path::Path;
use std::time::Duration;
use tycoon_core::achievement::AchievementDefinition;
use tycoon_core::format::{format_duration, format_number, NumberFormat};
use tycoon_core::id::{AchievementId, MachineId, MachineKindId, TechId};
use tycoon_core::machine::{MachineTick, MAX_LEVEL};
use tycoon_core::market::{AmountStep, Sale};
use tycoon_core::notify::{Notification, NotificationQueue, Severity};
use tycoon_core::prestige::PrestigeOutcome;
use tycoon_core::resource::ResourceKind;
use tycoon_core::rng::SimRng;
use tycoon_data::Catalog;
use tycoon_research::ResearchEvent;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What happened during one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Tick counter after the step.
    pub tick: u64,
    pub cycles_completed: u32,
    pub machines_stalled: u32,
    pub research_completed: Vec<TechId>,
    pub research_suspended: Vec<TechId>,
    pub achievements_unlocked: Vec<AchievementId>,
    pub autosaved: bool,
}

/// Result of a [`Simulator::advance`] call.
#[derive(Debug, Default)]
pub struct AdvanceResult {
    /// Number of steps actually executed.
    pub steps_run: u64,
    pub reports: Vec<StepReport>,
}

/// An exported save, ready to be written wherever the host likes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedSave {
    pub file_name: String,
    /// Base64 of the JSON save document.
    pub contents: String,
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

pub struct Simulator {
    catalog: Catalog,
    state: SimulationState,
    notifications: NotificationQueue,
    latest_achievement: Option<AchievementId>,
    rng: SimRng,
    clock: Clock,
    store: Box<dyn SaveStore>,
    config: SimConfig,
}

impl Simulator {
    /// A new game from `catalog` with the default config.
    pub fn new(catalog: Catalog, store: impl SaveStore + 'static) -> Self {
        Self::with_config(catalog, store, SimConfig::default())
    }

    pub fn with_config(catalog: Catalog, store: impl SaveStore + 'static, config: SimConfig) -> Self {
        let state = SimulationState::new(&catalog);
        let rng = match config.rng_seed {
            Some(seed) => SimRng::new(seed),
            None => SimRng::from_time(),
        };
        let clock = Clock::new(state.settings.game_speed, config.max_catch_up_steps);
        Self {
            notifications: NotificationQueue::new(config.notification_capacity),
            catalog,
            state,
            latest_achievement: None,
            rng,
            clock,
            store: Box::new(store),
            config,
        }
    }

    /// Build from a data directory holding `catalog.*` and an optional
    /// `sim.*` config.
    pub fn from_data_dir(dir: &Path, store: impl SaveStore + 'static) -> Result<Self, SimError> {
        let catalog = Catalog::load_dir(dir)?;
        let config = SimConfig::load_dir(dir)?;
        tracing::info!(dir = %dir.display(), "simulator loaded from data directory");
        Ok(Self::with_config(catalog, store, config))
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Direct state access for hosts and scenario setup. Bypasses every
    /// command check.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    /// The most recently unlocked achievement, until dismissed.
    pub fn latest_achievement(&self) -> Option<&AchievementDefinition> {
        self.latest_achievement
            .as_ref()
            .and_then(|id| self.state.achievements.definition(id))
    }

    pub fn dismiss_achievement(&mut self) {
        self.latest_achievement = None;
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Run as many steps as `elapsed` wall time covers at the current speed.
    pub fn advance(&mut self, elapsed: Duration) -> AdvanceResult {
        let due = self.clock.advance(elapsed);
        let mut result = AdvanceResult::default();
        for _ in 0..due {
            result.reports.push(self.step());
            result.steps_run += 1;
        }
        result
    }

    /// Run exactly one step.
    pub fn step(&mut self) -> StepReport {
        let mut report = StepReport::default();
        self.phase_machines(&mut report);
        self.phase_research(&mut report);
        self.phase_income();
        self.state.market.drift(&mut self.rng);

        self.state.stats.tick();
        self.state.tick += 1;
        report.tick = self.state.tick;

        let unlocked = self.check_achievements();
        report.achievements_unlocked.extend(unlocked);
        self.phase_autosave(&mut report);
        report
    }

    fn phase_machines(&mut self, report: &mut StepReport) {
        let multiplier = self.state.prestige.multiplier;
        let SimulationState {
            machines,
            resources,
            stats,
            ..
        } = &mut self.state;

        for (_, machine) in machines.iter_mut() {
            match machine.tick(resources, multiplier) {
                MachineTick::Completed { produced } => {
                    for (kind, amount) in produced {
                        stats.record_production(kind, amount);
                    }
                    report.cycles_completed += 1;
                }
                MachineTick::Stalled { .. } => report.machines_stalled += 1,
                MachineTick::Idle | MachineTick::Working { .. } => {}
            }
        }
    }

    fn phase_research(&mut self, report: &mut StepReport) {
        let speed = self.state.settings.game_speed;
        self.state
            .research
            .advance(self.state.resources.money_mut(), speed);

        for event in self.state.research.drain_events() {
            match event {
                ResearchEvent::Started { .. } => {}
                ResearchEvent::Suspended { tech, .. } => {
                    self.notifications
                        .push("Research paused: Not enough money.", Severity::Warning);
                    report.research_suspended.push(tech);
                }
                ResearchEvent::Completed { tech, effects, .. } => {
                    for effect in &effects {
                        apply_effect(&mut self.state, effect);
                    }
                    self.state.stats.techs_researched += 1;
                    report.research_completed.push(tech);
                    let unlocked = self.check_achievements();
                    report.achievements_unlocked.extend(unlocked);
                }
            }
        }
    }

    fn phase_income(&mut self) {
        let income = self
            .state
            .passive_income
            .per_tick(self.state.prestige.multiplier);
        if income > 0.0 {
            self.state.resources.add(ResourceKind::Money, income);
            self.state.stats.record_income(income);
        }
    }

    fn phase_autosave(&mut self, report: &mut StepReport) {
        let interval = self.config.autosave_interval_ticks;
        if !self.state.settings.auto_save || interval == 0 || self.state.tick % interval != 0 {
            return;
        }
        let result = self.write_save();
        report.autosaved = self.report(result).is_ok();
    }

    fn check_achievements(&mut self) -> Vec<AchievementId> {
        let unlocked = evaluate_achievements(&mut self.state);
        for id in &unlocked {
            let name = self
                .state
                .achievements
                .definition(id)
                .map_or_else(|| id.to_string(), |def| def.name.clone());
            tracing::info!(achievement = %id, "achievement unlocked");
            self.notifications
                .push(format!("Achievement unlocked: {name}!"), Severity::Success);
            self.latest_achievement = Some(id.clone());
        }
        unlocked
    }

    /// Queue a failed command's error for the player and hand it back.
    fn report<T>(&mut self, result: Result<T, SimError>) -> Result<T, SimError> {
        if let Err(err) = &result {
            self.notifications.push(err.user_message(), err.severity());
        }
        result
    }

    // -----------------------------------------------------------------------
    // Machine commands
    // -----------------------------------------------------------------------

    pub fn buy_machine(&mut self, kind: &MachineKindId) -> Result<MachineId, SimError> {
        let result = self.try_buy_machine(kind);
        self.report(result)
    }

    fn try_buy_machine(&mut self, kind: &MachineKindId) -> Result<MachineId, SimError> {
        let def = self
            .catalog
            .machine(kind)
            .ok_or_else(|| SimError::UnknownMachineKind(kind.clone()))?;
        if !self.state.machines.is_available(kind) {
            return Err(SimError::MachineLocked(kind.clone()));
        }
        if self.state.resources.money() < def.price {
            return Err(SimError::CannotAffordMachine {
                kind: kind.clone(),
                price: def.price,
            });
        }

        *self.state.resources.money_mut() -= def.price;
        let id = self.state.machines.insert(def.instantiate());
        self.state.stats.machines_bought += 1;
        self.notifications
            .push(format!("Purchased a new {}!", def.name), Severity::Success);
        self.check_achievements();
        Ok(id)
    }

    /// Returns the new level.
    pub fn upgrade_machine(&mut self, id: MachineId) -> Result<u32, SimError> {
        let result = self.try_upgrade_machine(id);
        self.report(result)
    }

    fn try_upgrade_machine(&mut self, id: MachineId) -> Result<u32, SimError> {
        let machine = self.state.machines.get(id)?;
        if machine.level >= MAX_LEVEL {
            return Err(SimError::MaxLevel(id));
        }
        let cost = machine.upgrade_cost();
        if self.state.resources.money() < cost {
            return Err(SimError::CannotAffordUpgrade { machine: id, cost });
        }

        let machine = self.state.machines.get_mut(id)?;
        let level = machine.level_up().ok_or(SimError::MaxLevel(id))?;
        let name = machine.name.clone();
        *self.state.resources.money_mut() -= cost;
        self.state.stats.upgrades_bought += 1;
        self.notifications
            .push(format!("Upgraded {name} to level {level}!"), Severity::Success);
        self.check_achievements();
        Ok(level)
    }

    /// Returns the refund.
    pub fn sell_machine(&mut self, id: MachineId) -> Result<f64, SimError> {
        let result = self.try_sell_machine(id);
        self.report(result)
    }

    fn try_sell_machine(&mut self, id: MachineId) -> Result<f64, SimError> {
        let machine = self.state.machines.remove(id)?;
        let value = machine.sell_value();
        self.state.resources.add(ResourceKind::Money, value);
        let message = format!("Sold {} for ${}.", machine.name, self.format_number(value));
        self.notifications.push(message, Severity::Info);
        self.check_achievements();
        Ok(value)
    }

    /// Flip a machine on or off. Returns whether it is now running.
    pub fn toggle_machine(&mut self, id: MachineId) -> Result<bool, SimError> {
        let result = self.try_toggle_machine(id);
        self.report(result)
    }

    fn try_toggle_machine(&mut self, id: MachineId) -> Result<bool, SimError> {
        let machine = self.state.machines.get_mut(id)?;
        machine.running = !machine.running;
        let verb = if machine.running { "Started" } else { "Stopped" };
        let message = format!("{verb} {}.", machine.name);
        let running = machine.running;
        self.notifications.push(message, Severity::Info);
        self.check_achievements();
        Ok(running)
    }

    // -----------------------------------------------------------------------
    // Market commands
    // -----------------------------------------------------------------------

    /// Sell the selected amount of `resource` at the current price.
    pub fn sell_resource(&mut self, resource: ResourceKind) -> Result<Sale, SimError> {
        let result = self.try_sell_resource(resource);
        self.report(result)
    }

    fn try_sell_resource(&mut self, resource: ResourceKind) -> Result<Sale, SimError> {
        let sale = self.state.market.sell(resource, &mut self.state.resources)?;
        self.state.stats.record_sale(sale.amount, sale.value);
        let message = format!(
            "Sold {} {} for ${}.",
            sale.amount,
            sale.resource,
            self.format_number(sale.value)
        );
        self.notifications.push(message, Severity::Success);
        self.check_achievements();
        Ok(sale)
    }

    /// Step the selected sell amount. Returns the new amount.
    pub fn set_market_amount(&mut self, resource: ResourceKind, step: AmountStep) -> u32 {
        self.state.market.step_amount(resource, step)
    }

    // -----------------------------------------------------------------------
    // Research and prestige
    // -----------------------------------------------------------------------

    pub fn start_research(&mut self, tech: &TechId) -> Result<(), SimError> {
        let result = self.try_start_research(tech);
        self.report(result)
    }

    fn try_start_research(&mut self, tech: &TechId) -> Result<(), SimError> {
        self.state.research.start(tech, self.state.resources.money())?;
        let name = self
            .state
            .research
            .definition(tech)
            .map_or_else(|| tech.to_string(), |def| def.name.clone());
        self.notifications
            .push(format!("Started researching {name}."), Severity::Info);
        Ok(())
    }

    pub fn perform_prestige(&mut self) -> Result<PrestigeOutcome, SimError> {
        let result = apply_prestige(&mut self.state);
        let outcome = self.report(result)?;
        self.notifications.push(
            format!(
                "Prestige complete! Gained {} prestige points. Production multiplier is now {:.2}x",
                outcome.points_gained, outcome.multiplier
            ),
            Severity::Success,
        );
        self.check_achievements();
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn save_game(&mut self) -> Result<(), SimError> {
        let result = self.write_save();
        self.report(result)
    }

    /// Encode and store the state, stamping `last_save` only on success.
    fn write_save(&mut self) -> Result<(), SimError> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let previous = self.state.settings.last_save.replace(stamp);

        let written = serialize::encode(&self.state)
            .and_then(|document| self.store.write(&document));
        if let Err(source) = written {
            self.state.settings.last_save = previous;
            tracing::error!(error = %source, "save failed");
            return Err(SimError::persist("Failed to save game", source));
        }

        tracing::info!(tick = self.state.tick, "game saved");
        self.notifications
            .push("Game saved successfully.", Severity::Success);
        Ok(())
    }

    pub fn load_game(&mut self) -> Result<(), SimError> {
        let result = self.try_load_game();
        self.report(result)
    }

    fn try_load_game(&mut self) -> Result<(), SimError> {
        let context = "Failed to load game";
        let document = self
            .store
            .read()
            .and_then(|doc| doc.ok_or(PersistError::NoSave))
            .map_err(|source| SimError::persist(context, source))?;
        let state = serialize::decode(&document, &self.catalog)
            .map_err(|source| SimError::persist(context, source))?;

        self.install(state);
        tracing::info!("game loaded");
        self.notifications
            .push("Game loaded successfully.", Severity::Success);
        Ok(())
    }

    /// Save, then hand back the save wrapped for export.
    pub fn export_save(&mut self) -> Result<ExportedSave, SimError> {
        let result = self.try_export_save();
        self.report(result)
    }

    fn try_export_save(&mut self) -> Result<ExportedSave, SimError> {
        self.write_save()?;
        let document = serialize::encode(&self.state)
            .map_err(|source| SimError::persist("Failed to export save", source))?;
        let exported = ExportedSave {
            file_name: export_file_name(Local::now().date_naive()),
            contents: serialize::export_payload(&document),
        };
        tracing::info!(file = %exported.file_name, "save exported");
        self.notifications
            .push("Save file exported successfully!", Severity::Success);
        Ok(exported)
    }

    pub fn import_save(&mut self, contents: &str) -> Result<(), SimError> {
        let result = self.try_import_save(contents);
        self.report(result)
    }

    fn try_import_save(&mut self, contents: &str) -> Result<(), SimError> {
        let state = serialize::import_payload(contents)
            .and_then(|document| serialize::decode(&document, &self.catalog))
            .map_err(|source| SimError::persist("Failed to import save", source))?;

        self.install(state);
        tracing::info!("save imported");
        self.notifications
            .push("Save file imported successfully!", Severity::Success);
        Ok(())
    }

    /// Swap in a decoded state and bring the clock in line with its speed.
    fn install(&mut self, state: SimulationState) {
        let previous_speed = self.state.settings.game_speed;
        self.state = state;
        self.latest_achievement = None;
        if self.state.settings.game_speed != previous_speed {
            self.clock.set_speed(self.state.settings.game_speed);
        }
    }

    /// Delete the stored save and start over from the catalog.
    pub fn reset_game(&mut self) -> Result<(), SimError> {
        let result = self
            .store
            .clear()
            .map_err(|source| SimError::persist("Failed to reset game", source));
        self.report(result)?;

        self.state = SimulationState::new(&self.catalog);
        self.notifications.clear();
        self.latest_achievement = None;
        self.clock.set_speed(self.state.settings.game_speed);
        tracing::info!("game reset");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    pub fn set_game_speed(&mut self, speed: f64) -> Result<(), SimError> {
        let result = validate_speed(speed);
        let speed = self.report(result)?;
        self.state.settings.game_speed = speed;
        self.clock.set_speed(speed);
        Ok(())
    }

    pub fn set_number_format(&mut self, format: NumberFormat) {
        self.state.settings.number_format = format;
    }

    pub fn set_auto_save(&mut self, enabled: bool) {
        self.state.settings.auto_save = enabled;
    }

    pub fn remove_notification(&mut self, index: usize) -> Option<Notification> {
        self.notifications.remove(index)
    }

    // -----------------------------------------------------------------------
    // Read-side helpers
    // -----------------------------------------------------------------------

    pub fn upgrade_cost(&self, id: MachineId) -> Result<f64, SimError> {
        Ok(self.state.machines.get(id)?.upgrade_cost())
    }

    pub fn sell_value(&self, id: MachineId) -> Result<f64, SimError> {
        Ok(self.state.machines.get(id)?.sell_value())
    }

    pub fn can_afford_machine(&self, kind: &MachineKindId) -> bool {
        self.catalog
            .machine(kind)
            .is_some_and(|def| self.state.resources.money() >= def.price)
    }

    /// `false` for a machine already at [`MAX_LEVEL`].
    pub fn can_afford_upgrade(&self, id: MachineId) -> bool {
        self.state.machines.get(id).is_ok_and(|machine| {
            machine.level < MAX_LEVEL && self.state.resources.money() >= machine.upgrade_cost()
        })
    }

    pub fn is_tech_available(&self, tech: &TechId) -> bool {
        self.state.research.is_available(tech)
    }

    /// Funded ticks until `tech` completes at the current speed.
    pub fn research_eta(&self, tech: &TechId) -> Option<u64> {
        self.state
            .research
            .ticks_remaining(tech, self.state.settings.game_speed)
    }

    /// Non-zero resources other than money.
    pub fn displayed_resources(&self) -> Vec<(ResourceKind, f64)> {
        self.state.resources.displayed()
    }

    /// Format a number in the player's chosen style.
    pub fn format_number(&self, value: f64) -> String {
        format_number(value, self.state.settings.number_format)
    }

    pub fn format_time(&self, seconds: f64) -> String {
        format_duration(seconds)
    }

    pub fn play_time(&self) -> String {
        format_duration(self.state.stats.time_played)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use tycoon_core::market::MarketError;

    fn sim() -> Simulator {
        Simulator::with_config(
            Catalog::builtin().unwrap(),
            MemoryStore::new(),
            SimConfig::seeded(42),
        )
    }

    fn last_message(sim: &Simulator) -> String {
        sim.notifications()
            .last()
            .map(|n| n.message.clone())
            .unwrap_or_default()
    }

    #[test]
    fn data_directory_supplies_catalog_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = Simulator::from_data_dir(dir.path(), MemoryStore::new()).err().unwrap();
        assert!(matches!(err, SimError::Data(tycoon_data::DataLoadError::NotFound { .. })));
        assert!(err.to_string().starts_with("Failed to load catalog: "));

        std::fs::write(
            dir.path().join("catalog.ron"),
            include_str!("../../tycoon-data/data/catalog.ron"),
        )
        .unwrap();
        std::fs::write(dir.path().join("sim.toml"), "rng_seed = 5\nautosave_interval_ticks = 0\n")
            .unwrap();
        let sim = Simulator::from_data_dir(dir.path(), MemoryStore::new()).unwrap();
        assert_eq!(sim.config().rng_seed, Some(5));
        assert_eq!(sim.config().autosave_interval_ticks, 0);
        assert_eq!(sim.state().resources.money(), 50.0);
    }

    #[test]
    fn upgrades_stop_at_max_level() {
        let mut sim = sim();
        let id = sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();
        sim.state_mut().machines.get_mut(id).unwrap().level = MAX_LEVEL;
        sim.state_mut().resources.set(ResourceKind::Money, f64::MAX);
        assert!(!sim.can_afford_upgrade(id));
        assert!(matches!(sim.upgrade_machine(id), Err(SimError::MaxLevel(_))));
        assert_eq!(sim.state().resources.money(), f64::MAX);
        assert_eq!(last_message(&sim), "This machine is already at the maximum level.");
    }

    #[test]
    fn buying_deducts_price_and_counts() {
        let mut sim = sim();
        let id = sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();
        assert_eq!(sim.state().resources.money(), 0.0);
        assert_eq!(sim.state().stats.machines_bought, 1);
        assert!(sim.state().machines.contains(id));
        assert!(sim.state().achievements.is_unlocked(&AchievementId::from("firstMachine")));
        assert_eq!(sim.latest_achievement().unwrap().name, "First Steps");
    }

    #[test]
    fn failed_purchase_changes_nothing() {
        let mut sim = sim();
        let err = sim
            .buy_machine(&MachineKindId::from("metalRefiner"))
            .unwrap_err();
        assert!(matches!(err, SimError::CannotAffordMachine { .. }));
        assert_eq!(sim.state().resources.money(), 50.0);
        assert!(sim.state().machines.is_empty());
        assert_eq!(last_message(&sim), "Not enough money to buy this machine.");

        let locked = sim.buy_machine(&MachineKindId::from("aiCore")).unwrap_err();
        assert!(matches!(locked, SimError::MachineLocked(_)));
    }

    #[test]
    fn ore_miner_completes_a_cycle_every_ten_steps() {
        let mut sim = sim();
        sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();
        for _ in 0..9 {
            assert_eq!(sim.step().cycles_completed, 0);
        }
        assert_eq!(sim.step().cycles_completed, 1);
        assert_eq!(sim.state().resources.get(ResourceKind::Ore), 1.0);
        assert_eq!(sim.state().stats.produced(ResourceKind::Ore), 1.0);
    }

    #[test]
    fn starved_refiner_stalls_without_consuming() {
        let mut sim = sim();
        let state = sim.state_mut();
        state.resources.set(ResourceKind::Money, 150.0);
        let id = sim.buy_machine(&MachineKindId::from("metalRefiner")).unwrap();
        sim.state_mut().resources.set(ResourceKind::Ore, 0.1);

        let report = sim.step();
        assert_eq!(report.machines_stalled, 1);
        assert_eq!(sim.state().resources.get(ResourceKind::Ore), 0.1);
        assert_eq!(sim.state().machines.get(id).unwrap().progress, 0);
    }

    #[test]
    fn upgrade_and_sell() {
        let mut sim = sim();
        let id = sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();
        sim.state_mut().resources.set(ResourceKind::Money, 100.0);
        assert_eq!(sim.upgrade_cost(id).unwrap(), 100.0);
        assert_eq!(sim.upgrade_machine(id).unwrap(), 2);
        assert_eq!(sim.state().resources.money(), 0.0);
        assert_eq!(sim.state().stats.upgrades_bought, 1);
        assert_eq!(last_message(&sim), "Upgraded Ore Miner to level 2!");

        assert!(sim.upgrade_machine(id).is_err());
        assert_eq!(sim.state().machines.get(id).unwrap().level, 2);

        // floor(0.5 * (100 / 1.5 + 100))
        assert_eq!(sim.sell_machine(id).unwrap(), 83.0);
        assert!(!sim.state().machines.contains(id));
        assert_eq!(last_message(&sim), "Sold Ore Miner for $83.");
        assert!(matches!(sim.sell_machine(id), Err(SimError::Machine(_))));
    }

    #[test]
    fn toggling_stops_production() {
        let mut sim = sim();
        let id = sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();
        assert!(!sim.toggle_machine(id).unwrap());
        assert_eq!(last_message(&sim), "Stopped Ore Miner.");
        for _ in 0..20 {
            sim.step();
        }
        assert_eq!(sim.state().resources.get(ResourceKind::Ore), 0.0);
        assert!(sim.toggle_machine(id).unwrap());
    }

    #[test]
    fn selling_resources_records_stats() {
        let mut sim = sim();
        sim.state_mut().resources.set(ResourceKind::Ore, 25.0);
        let price = sim.state().market.price(ResourceKind::Ore).unwrap();
        assert_eq!(sim.set_market_amount(ResourceKind::Ore, AmountStep::Increase), 10);

        let sale = sim.sell_resource(ResourceKind::Ore).unwrap();
        assert_eq!(sale.amount, 10);
        assert!((sale.value - price * 10.0).abs() < 1e-9);
        assert_eq!(sim.state().resources.get(ResourceKind::Ore), 15.0);
        assert_eq!(sim.state().stats.resources_sold, 10.0);
        assert!((sim.state().stats.money_earned - sale.value).abs() < 1e-9);

        sim.set_market_amount(ResourceKind::Ore, AmountStep::Increase);
        let err = sim.sell_resource(ResourceKind::Ore).unwrap_err();
        assert!(matches!(err, SimError::Market(MarketError::Insufficient { .. })));
        assert_eq!(last_message(&sim), "Not enough ore to sell.");
        assert_eq!(sim.state().resources.get(ResourceKind::Ore), 15.0);

        assert!(sim.sell_resource(ResourceKind::Money).is_err());
    }

    #[test]
    fn research_runs_to_completion_and_applies_effects() {
        let mut sim = sim();
        let miner = sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();
        sim.state_mut().resources.set(ResourceKind::Money, 10_000.0);
        let tech = TechId::from("efficientMining");
        sim.start_research(&tech).unwrap();
        assert_eq!(last_message(&sim), "Started researching Efficient Mining.");
        assert_eq!(sim.research_eta(&tech), Some(50));

        let mut completed = Vec::new();
        for _ in 0..50 {
            completed.extend(sim.step().research_completed);
        }
        assert_eq!(completed, vec![tech.clone()]);
        assert!(sim.state().research.is_researched(&tech));
        assert_eq!(sim.state().stats.techs_researched, 1);
        assert_eq!(sim.state().resources.money(), 10_000.0 - 500.0);
        let rate = sim.state().machines.get(miner).unwrap().output_rate[&ResourceKind::Ore];
        assert!((rate - 1.5).abs() < 1e-12);
        assert!(sim.state().achievements.is_unlocked(&AchievementId::from("firstResearch")));
    }

    #[test]
    fn research_suspends_when_broke() {
        let mut sim = sim();
        sim.state_mut().resources.set(ResourceKind::Money, 15.0);
        let tech = TechId::from("efficientMining");
        sim.start_research(&tech).unwrap();

        let first = sim.step();
        assert!(first.research_suspended.is_empty());
        let second = sim.step();
        assert_eq!(second.research_suspended, vec![tech.clone()]);
        let state = sim.state().research.state(&tech).unwrap();
        assert!(!state.researching);
        assert!((state.progress - 2.0).abs() < 1e-9);
        assert!(sim
            .notifications()
            .any(|n| n.message == "Research paused: Not enough money." && n.severity == Severity::Warning));
    }

    #[test]
    fn research_gating() {
        let mut sim = sim();
        sim.state_mut().resources.set(ResourceKind::Money, 1_000.0);
        let gated = TechId::from("advancedMetallurgy");
        assert!(!sim.is_tech_available(&gated));
        assert!(matches!(sim.start_research(&gated), Err(SimError::Research(_))));

        sim.state_mut().resources.set(ResourceKind::Money, 5.0);
        let err = sim.start_research(&TechId::from("efficientMining")).unwrap_err();
        assert_eq!(err.to_string(), "Not enough money to start research.");
    }

    #[test]
    fn passive_income_accrues() {
        let mut sim = sim();
        sim.state_mut().passive_income.enable(500.0);
        sim.state_mut().prestige.multiplier = 2.0;
        sim.step();
        assert!((sim.state().resources.money() - 150.0).abs() < 1e-9);
        assert!((sim.state().stats.money_earned - 100.0).abs() < 1e-9);
    }

    #[test]
    fn prestige_command_notifies() {
        let mut sim = sim();
        assert!(sim.perform_prestige().is_err());
        assert_eq!(last_message(&sim), "You need $1,000,000 to prestige!");

        sim.state_mut().resources.set(ResourceKind::Money, 4_000_000.0);
        let outcome = sim.perform_prestige().unwrap();
        assert_eq!(outcome.points_gained, 2);
        assert!(sim.notifications().any(|n| n.message
            == "Prestige complete! Gained 2 prestige points. Production multiplier is now 1.04x"));
    }

    #[test]
    fn save_then_load_restores_state() {
        let mut sim = sim();
        let id = sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();
        for _ in 0..25 {
            sim.step();
        }
        sim.save_game().unwrap();
        assert!(sim.state().settings.last_save.is_some());
        let saved_ore = sim.state().resources.get(ResourceKind::Ore);

        sim.sell_machine(id).unwrap();
        sim.state_mut().resources.set(ResourceKind::Ore, 0.0);
        sim.load_game().unwrap();

        assert_eq!(sim.state().resources.get(ResourceKind::Ore), saved_ore);
        assert_eq!(sim.state().machines.get(id).unwrap().progress, 50);
        assert_eq!(last_message(&sim), "Game loaded successfully.");
    }

    #[test]
    fn loading_without_a_save_warns() {
        let mut sim = sim();
        let err = sim.load_game().unwrap_err();
        assert_eq!(err.severity(), Severity::Warning);
        let last = sim.notifications().last().unwrap();
        assert_eq!(last.message, "No saved game found.");
        assert_eq!(last.severity, Severity::Warning);
    }

    #[test]
    fn failed_save_is_reported_and_state_untouched() {
        let mut sim = Simulator::with_config(
            Catalog::builtin().unwrap(),
            MemoryStore::with_quota(10),
            SimConfig::seeded(1),
        );
        assert!(sim.save_game().is_err());
        assert!(sim.state().settings.last_save.is_none());
        assert!(last_message(&sim).starts_with("Failed to save game: "));
    }

    #[test]
    fn export_and_import() {
        let mut source = sim();
        source.state_mut().resources.set(ResourceKind::Metal, 77.0);
        let exported = source.export_save().unwrap();
        assert!(exported.file_name.starts_with("factory_tycoon_save_"));
        assert!(exported.file_name.ends_with(".txt"));

        let mut other = sim();
        other.import_save(&exported.contents).unwrap();
        assert_eq!(other.state().resources.get(ResourceKind::Metal), 77.0);

        let before = other.state().resources.clone();
        assert!(other.import_save("not base64 at all!").is_err());
        assert_eq!(other.state().resources, before);
        assert!(last_message(&other).starts_with("Failed to import save: "));
    }

    #[test]
    fn speed_changes_reconfigure_the_clock() {
        let mut sim = sim();
        assert_eq!(sim.advance(Duration::from_millis(350)).steps_run, 3);
        sim.set_game_speed(2.0).unwrap();
        assert_eq!(sim.clock().generation(), 1);
        assert_eq!(sim.advance(Duration::from_millis(100)).steps_run, 2);

        assert!(sim.set_game_speed(0.0).is_err());
        assert_eq!(sim.state().settings.game_speed, 2.0);
    }

    #[test]
    fn autosave_on_interval() {
        let mut config = SimConfig::seeded(3);
        config.autosave_interval_ticks = 5;
        let mut sim = Simulator::with_config(Catalog::builtin().unwrap(), MemoryStore::new(), config);
        let saves: Vec<bool> = (0..10).map(|_| sim.step().autosaved).collect();
        assert_eq!(saves.iter().filter(|s| **s).count(), 2);
        assert!(saves[4] && saves[9]);

        sim.set_auto_save(false);
        let later: Vec<bool> = (0..5).map(|_| sim.step().autosaved).collect();
        assert!(later.iter().all(|s| !s));
    }

    #[test]
    fn reset_starts_over() {
        let mut sim = sim();
        sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();
        sim.save_game().unwrap();
        sim.reset_game().unwrap();
        assert!(sim.state().machines.is_empty());
        assert_eq!(sim.state().resources.money(), 50.0);
        assert_eq!(sim.notifications().count(), 0);
        assert!(sim.load_game().is_err());
    }

    #[test]
    fn notifications_are_capped_and_removable() {
        let mut sim = sim();
        let id = sim.buy_machine(&MachineKindId::from("oreMiner")).unwrap();
        for _ in 0..10 {
            sim.toggle_machine(id).unwrap();
        }
        assert_eq!(sim.notifications().count(), 5);
        assert!(sim.remove_notification(0).is_some());
        assert_eq!(sim.notifications().count(), 4);
        assert!(sim.remove_notification(10).is_none());
    }

    #[test]
    fn number_formatting_follows_settings() {
        let mut sim = sim();
        assert_eq!(sim.format_number(1_234_567.0), "1,234,567");
        sim.set_number_format(NumberFormat::Compact);
        assert_eq!(sim.format_number(1_234_567.0), "1.2M");
        assert_eq!(sim.format_time(3_725.0), "1h 2m 5s");
    }
}
