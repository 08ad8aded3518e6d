//! Serializable player commands.
//!
//! Every public command method on [`Simulator`] has a [`Command`] variant,
//! so a host can queue, log or replay input as data.

use crate::error::SimError;
use crate::simulator::{ExportedSave, Simulator};
use serde::{Deserialize, Serialize};
use tycoon_core::format::NumberFormat;
use tycoon_core::id::{MachineId, MachineKindId, TechId};
use tycoon_core::market::{AmountStep, Sale};
use tycoon_core::notify::Notification;
use tycoon_core::resource::ResourceKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    BuyMachine { kind: MachineKindId },
    UpgradeMachine { machine: MachineId },
    SellMachine { machine: MachineId },
    ToggleMachine { machine: MachineId },
    SellResource { resource: ResourceKind },
    SetMarketAmount { resource: ResourceKind, step: AmountStep },
    StartResearch { tech: TechId },
    PerformPrestige,
    SaveGame,
    LoadGame,
    ExportSave,
    ImportSave { contents: String },
    ResetGame,
    SetGameSpeed { speed: f64 },
    SetNumberFormat { format: NumberFormat },
    SetAutoSave { enabled: bool },
    RemoveNotification { index: usize },
}

/// What a successful command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    MachineBought(MachineId),
    MachineUpgraded { machine: MachineId, level: u32 },
    MachineSold { machine: MachineId, value: f64 },
    MachineToggled { machine: MachineId, running: bool },
    ResourceSold(Sale),
    MarketAmountChanged { resource: ResourceKind, amount: u32 },
    ResearchStarted(TechId),
    Prestiged { points_gained: u64, multiplier: f64 },
    Saved,
    Loaded,
    Exported(ExportedSave),
    Imported,
    Reset,
    SettingsChanged,
    /// `None` when the index was out of range.
    NotificationRemoved(Option<Notification>),
}

impl Simulator {
    /// Run one command.
    pub fn execute(&mut self, command: Command) -> Result<CommandOutcome, SimError> {
        tracing::debug!(?command, "executing command");
        let outcome = match command {
            Command::BuyMachine { kind } => CommandOutcome::MachineBought(self.buy_machine(&kind)?),
            Command::UpgradeMachine { machine } => CommandOutcome::MachineUpgraded {
                machine,
                level: self.upgrade_machine(machine)?,
            },
            Command::SellMachine { machine } => CommandOutcome::MachineSold {
                machine,
                value: self.sell_machine(machine)?,
            },
            Command::ToggleMachine { machine } => CommandOutcome::MachineToggled {
                machine,
                running: self.toggle_machine(machine)?,
            },
            Command::SellResource { resource } => {
                CommandOutcome::ResourceSold(self.sell_resource(resource)?)
            }
            Command::SetMarketAmount { resource, step } => CommandOutcome::MarketAmountChanged {
                resource,
                amount: self.set_market_amount(resource, step),
            },
            Command::StartResearch { tech } => {
                self.start_research(&tech)?;
                CommandOutcome::ResearchStarted(tech)
            }
            Command::PerformPrestige => {
                let outcome = self.perform_prestige()?;
                CommandOutcome::Prestiged {
                    points_gained: outcome.points_gained,
                    multiplier: outcome.multiplier,
                }
            }
            Command::SaveGame => {
                self.save_game()?;
                CommandOutcome::Saved
            }
            Command::LoadGame => {
                self.load_game()?;
                CommandOutcome::Loaded
            }
            Command::ExportSave => CommandOutcome::Exported(self.export_save()?),
            Command::ImportSave { contents } => {
                self.import_save(&contents)?;
                CommandOutcome::Imported
            }
            Command::ResetGame => {
                self.reset_game()?;
                CommandOutcome::Reset
            }
            Command::SetGameSpeed { speed } => {
                self.set_game_speed(speed)?;
                CommandOutcome::SettingsChanged
            }
            Command::SetNumberFormat { format } => {
                self.set_number_format(format);
                CommandOutcome::SettingsChanged
            }
            Command::SetAutoSave { enabled } => {
                self.set_auto_save(enabled);
                CommandOutcome::SettingsChanged
            }
            Command::RemoveNotification { index } => {
                CommandOutcome::NotificationRemoved(self.remove_notification(index))
            }
        };
        Ok(outcome)
    }
}
