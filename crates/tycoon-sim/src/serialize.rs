//! Save document encoding, merge-on-load decoding, and base64 export.
//!
//! The document is a JSON object with one key per state section. Decoding
//! merges a document onto a freshly initialized state, section by section:
//!
//! - object sections (`resources`, `stats`, `settings`, `prestige`,
//!   `passiveIncome`, `marketAmounts`) overwrite only the fields present;
//! - keyed sections (`availableResearch`, `achievements`) overwrite entries
//!   the catalog knows and skip the rest;
//! - collection sections (`ownedMachines`, `availableMachines`, `market`)
//!   replace the fresh contents outright. An absent collection is empty.
//!
//! Decoding works on a value the caller owns, so a failure part way through
//! never reaches the live state.

use crate::error::PersistError;
use crate::settings::{validate_speed, GameSettings};
use crate::state::SimulationState;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use slotmap::SlotMap;
use std::collections::BTreeMap;
use tycoon_core::achievement::AchievementProgress;
use tycoon_core::id::{AchievementId, MachineId, MachineKindId, TechId};
use tycoon_core::machine::MachineInstance;
use tycoon_core::prestige::Prestige;
use tycoon_core::resource::{Ledger, ResourceKind};
use tycoon_core::stats::{PassiveIncome, Stats};
use tycoon_data::Catalog;
use tycoon_research::TechState;

/// Prefix of exported save file names.
pub const EXPORT_FILE_PREFIX: &str = "factory_tycoon_save_";

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDocument {
    pub resources: Ledger,
    pub owned_machines: SlotMap<MachineId, MachineInstance>,
    pub available_machines: Vec<MachineKindId>,
    pub available_research: BTreeMap<TechId, TechState>,
    pub market: BTreeMap<ResourceKind, f64>,
    pub market_amounts: BTreeMap<ResourceKind, u32>,
    pub stats: Stats,
    pub settings: GameSettings,
    pub achievements: BTreeMap<AchievementId, AchievementProgress>,
    pub prestige: Prestige,
    pub passive_income: PassiveIncome,
}

/// Capture every persisted section of `state`.
pub fn snapshot(state: &SimulationState) -> SaveDocument {
    SaveDocument {
        resources: state.resources.clone(),
        owned_machines: state.machines.instances().clone(),
        available_machines: state.machines.available().to_vec(),
        available_research: state
            .research
            .iter()
            .map(|(def, tech)| (def.id.clone(), tech.clone()))
            .collect(),
        market: state.market.prices().clone(),
        market_amounts: state.market.amounts().clone(),
        stats: state.stats.clone(),
        settings: state.settings.clone(),
        achievements: state.achievements.progress_map().clone(),
        prestige: state.prestige.clone(),
        passive_income: state.passive_income.clone(),
    }
}

pub fn encode(state: &SimulationState) -> Result<String, PersistError> {
    Ok(serde_json::to_string(&snapshot(state))?)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn malformed(section: &str, detail: impl std::fmt::Display) -> PersistError {
    PersistError::Malformed(format!("{section}: {detail}"))
}

fn as_object<'a>(section: &str, value: &'a Value) -> Result<&'a Map<String, Value>, PersistError> {
    value
        .as_object()
        .ok_or_else(|| malformed(section, "expected an object"))
}

/// Overwrite the fields of `target` that `patch` names, leaving the rest.
fn merge_object<T>(section: &str, target: &mut T, patch: &Value) -> Result<(), PersistError>
where
    T: Serialize + DeserializeOwned,
{
    let patch = as_object(section, patch)?;
    let mut merged = serde_json::to_value(&*target)?;
    let fields = merged
        .as_object_mut()
        .ok_or_else(|| malformed(section, "section does not serialize to an object"))?;
    for (key, value) in patch {
        fields.insert(key.clone(), value.clone());
    }
    *target = serde_json::from_value(merged).map_err(|e| malformed(section, e))?;
    Ok(())
}

/// Entries of a resource-keyed object. Keys that name no resource are
/// skipped.
fn resource_entries<T: DeserializeOwned>(
    section: &str,
    value: &Value,
) -> Result<Vec<(ResourceKind, T)>, PersistError> {
    let mut entries = Vec::new();
    for (key, raw) in as_object(section, value)? {
        let Ok(kind) = key.parse::<ResourceKind>() else {
            tracing::debug!(section, key = %key, "skipping unknown resource in save");
            continue;
        };
        let parsed = serde_json::from_value(raw.clone()).map_err(|e| malformed(section, e))?;
        entries.push((kind, parsed));
    }
    Ok(entries)
}

fn section<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, PersistError> {
    serde_json::from_value(value.clone()).map_err(|e| malformed(name, e))
}

/// Decode `json` onto a fresh state built from `catalog`.
pub fn decode(json: &str, catalog: &Catalog) -> Result<SimulationState, PersistError> {
    let document: Value = serde_json::from_str(json)?;
    let doc = document
        .as_object()
        .ok_or_else(|| PersistError::Malformed("save document must be a JSON object".into()))?;
    let mut state = SimulationState::new(catalog);

    if let Some(value) = doc.get("resources") {
        for (kind, amount) in resource_entries::<f64>("resources", value)? {
            state.resources.set(kind, amount.max(0.0));
        }
    }

    let owned: SlotMap<MachineId, MachineInstance> = match doc.get("ownedMachines") {
        Some(value) => section("ownedMachines", value)?,
        None => SlotMap::with_key(),
    };
    for (_, machine) in &owned {
        machine
            .check_bounds()
            .map_err(|detail| malformed("ownedMachines", format!("{}: {detail}", machine.kind)))?;
    }
    state.machines.replace_instances(owned);

    let available: Vec<MachineKindId> = match doc.get("availableMachines") {
        Some(value) => section("availableMachines", value)?,
        None => Vec::new(),
    };
    state.machines.replace_available(available.into_iter().filter(|kind| {
        let known = catalog.machine(kind).is_some();
        if !known {
            tracing::debug!(machine = %kind, "skipping unknown machine kind in save");
        }
        known
    }));

    if let Some(value) = doc.get("availableResearch") {
        for (key, raw) in as_object("availableResearch", value)? {
            let tech: TechState = section("availableResearch", raw)?;
            if !state.research.restore(&TechId::from(key.as_str()), tech) {
                tracing::debug!(tech = %key, "skipping unknown technology in save");
            }
        }
    }

    let prices = match doc.get("market") {
        Some(value) => resource_entries::<f64>("market", value)?
            .into_iter()
            .collect(),
        None => BTreeMap::new(),
    };
    state.market.replace_prices(prices);

    if let Some(value) = doc.get("marketAmounts") {
        for (kind, amount) in resource_entries::<u32>("marketAmounts", value)? {
            state.market.set_amount(kind, amount);
        }
    }

    if let Some(value) = doc.get("stats") {
        merge_object("stats", &mut state.stats, value)?;
    }
    if let Some(value) = doc.get("settings") {
        merge_object("settings", &mut state.settings, value)?;
        if validate_speed(state.settings.game_speed).is_err() {
            tracing::warn!(
                speed = state.settings.game_speed,
                "saved game speed out of range, using default"
            );
            state.settings.game_speed = GameSettings::default().game_speed;
        }
    }

    if let Some(value) = doc.get("achievements") {
        for (key, raw) in as_object("achievements", value)? {
            let progress: AchievementProgress = section("achievements", raw)?;
            if !state.achievements.restore(&AchievementId::from(key.as_str()), progress) {
                tracing::debug!(achievement = %key, "skipping unknown achievement in save");
            }
        }
    }

    if let Some(value) = doc.get("prestige") {
        merge_object::<Prestige>("prestige", &mut state.prestige, value)?;
    }
    if let Some(value) = doc.get("passiveIncome") {
        merge_object::<PassiveIncome>("passiveIncome", &mut state.passive_income, value)?;
    }

    Ok(state)
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

/// Wrap a save document for export.
pub fn export_payload(json: &str) -> String {
    STANDARD.encode(json)
}

/// Unwrap an exported payload back into the JSON document.
pub fn import_payload(payload: &str) -> Result<String, PersistError> {
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// `factory_tycoon_save_YYYY-MM-DD.txt`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("{EXPORT_FILE_PREFIX}{}.txt", date.format("%Y-%m-%d"))
}
