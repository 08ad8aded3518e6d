//! Simulation driver for the factory tycoon engine.
//!
//! [`Simulator`] owns a [`SimulationState`] built from a
//! [`Catalog`](tycoon_data::Catalog) and advances it one 100 ms tick at a
//! time, either directly with [`Simulator::step`] or from reported wall time
//! with [`Simulator::advance`]. Player input goes through the command
//! methods or the serializable [`Command`] enum; saves go through a
//! [`SaveStore`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tycoon_core::id::MachineKindId;
//! use tycoon_data::Catalog;
//! use tycoon_sim::{MemoryStore, Simulator};
//!
//! let catalog = Catalog::builtin().expect("builtin catalog");
//! let mut sim = Simulator::new(catalog, MemoryStore::new());
//! sim.buy_machine(&MachineKindId::from("oreMiner")).ok();
//! let result = sim.advance(Duration::from_secs(1));
//! assert_eq!(result.steps_run, 10);
//! ```

pub mod clock;
pub mod command;
pub mod config;
pub mod effects;
pub mod error;
pub mod metrics;
pub mod prestige;
pub mod serialize;
pub mod settings;
pub mod simulator;
pub mod state;
pub mod store;

pub use clock::Clock;
pub use command::{Command, CommandOutcome};
pub use config::SimConfig;
pub use error::{PersistError, SimError};
pub use settings::GameSettings;
pub use simulator::{AdvanceResult, ExportedSave, Simulator, StepReport};
pub use state::SimulationState;
pub use store::{FileStore, MemoryStore, SaveStore};
