//! Serde data file structs for catalog content.
//!
//! These structs define the on-disk format for machines, technologies, the
//! market and achievements. They reference each other by name and are
//! resolved into engine types by [`crate::catalog`].

use serde::Deserialize;
use std::collections::BTreeMap;

// ===========================================================================
// Top level
// ===========================================================================

/// The whole catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogData {
    pub starting_money: f64,
    /// Machine ids purchasable from the start.
    pub starting_machines: Vec<String>,
    pub machines: Vec<MachineData>,
    /// Resource name to base price. Only these are listed at the start.
    #[serde(default)]
    pub market: BTreeMap<String, f64>,
    #[serde(default)]
    pub technologies: Vec<TechData>,
    #[serde(default)]
    pub achievements: Vec<AchievementData>,
}

// ===========================================================================
// Machines
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MachineData {
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Resource name to units per second at level 1.
    #[serde(default)]
    pub inputs: BTreeMap<String, f64>,
    pub outputs: BTreeMap<String, f64>,
    pub upgrade_cost: f64,
    pub upgrade_multiplier: f64,
}

// ===========================================================================
// Technologies
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TechData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cost: f64,
    pub cost_per_tick: f64,
    #[serde(default)]
    pub prerequisites: Vec<String>,
    #[serde(default)]
    pub effects: Vec<EffectData>,
}

/// A research effect with names in place of typed ids.
#[derive(Debug, Clone, Deserialize)]
pub enum EffectData {
    UnlockMachine(String),
    BoostOutput {
        #[serde(default)]
        machine: Option<String>,
        factor: f64,
    },
    ReduceInput {
        factor: f64,
    },
    EnablePassiveIncome {
        amount: f64,
    },
    AddMarketResource {
        resource: String,
        base_price: f64,
    },
}

// ===========================================================================
// Achievements
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct AchievementData {
    pub id: String,
    pub name: String,
    pub description: String,
    pub metric: MetricData,
    /// Required for every metric except `AllTechsResearched`, whose target
    /// is the number of technologies in the catalog.
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub hidden: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub enum MetricData {
    MachinesOwned,
    ResourceProduced(String),
    TechsResearched,
    AllTechsResearched,
    MoneyEarned,
    ResourceOnHand(String),
    MaxMachineLevel,
    ProductionRate(String),
}
