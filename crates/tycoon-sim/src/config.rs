//! Runtime configuration for a [`Simulator`](crate::Simulator).
//!
//! Read from `sim.{ron,json,toml}` with the same loader as the catalog.
//! Every field has a default, so an empty file is a valid config.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tycoon_core::notify::DEFAULT_CAPACITY;
use tycoon_data::loader::{deserialize_file, find_data_file};
use tycoon_data::DataLoadError;

/// Base name of the config file inside a data directory.
pub const CONFIG_BASE_NAME: &str = "sim";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Market drift seed. `None` seeds from the system clock.
    pub rng_seed: Option<u64>,
    pub notification_capacity: usize,
    /// Ticks between autosaves while autosave is on. 600 ticks is one
    /// minute at normal speed.
    pub autosave_interval_ticks: u64,
    /// Most steps run for a single elapsed-time report; any further
    /// backlog is dropped.
    pub max_catch_up_steps: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            notification_capacity: DEFAULT_CAPACITY,
            autosave_interval_ticks: 600,
            max_catch_up_steps: 1000,
        }
    }
}

impl SimConfig {
    pub fn load_file(path: &Path) -> Result<Self, DataLoadError> {
        deserialize_file(path)
    }

    /// Load `sim.*` from `dir`, or the defaults if there is none.
    pub fn load_dir(dir: &Path) -> Result<Self, DataLoadError> {
        match find_data_file(dir, CONFIG_BASE_NAME)? {
            Some(path) => Self::load_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Same config with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng_seed: Some(seed),
            ..Self::default()
        }
    }
}
