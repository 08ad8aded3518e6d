//! Resource kinds and the ledger of quantities owned.
//!
//! The ledger is the shared substrate every other component reads and
//! writes. Quantities are fractional internally (consumption happens in
//! tenths per tick) and are only floored for display.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// ResourceKind
// ---------------------------------------------------------------------------

/// Every resource the factory can hold, including money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Money,
    Ore,
    Metal,
    Circuit,
    Plastic,
    Component,
    Gadget,
    Device,
    QuantumChip,
    AiModule,
}

impl ResourceKind {
    /// All kinds in ledger order.
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Money,
        ResourceKind::Ore,
        ResourceKind::Metal,
        ResourceKind::Circuit,
        ResourceKind::Plastic,
        ResourceKind::Component,
        ResourceKind::Gadget,
        ResourceKind::Device,
        ResourceKind::QuantumChip,
        ResourceKind::AiModule,
    ];

    /// The camelCase name used in data files and saves.
    pub fn name(self) -> &'static str {
        match self {
            ResourceKind::Money => "money",
            ResourceKind::Ore => "ore",
            ResourceKind::Metal => "metal",
            ResourceKind::Circuit => "circuit",
            ResourceKind::Plastic => "plastic",
            ResourceKind::Component => "component",
            ResourceKind::Gadget => "gadget",
            ResourceKind::Device => "device",
            ResourceKind::QuantumChip => "quantumChip",
            ResourceKind::AiModule => "aiModule",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a name does not match any [`ResourceKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource kind '{0}'")]
pub struct UnknownResource(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownResource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownResource(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by ledger withdrawals.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("not enough {kind}: need {needed}, have {available}")]
    Insufficient {
        kind: ResourceKind,
        needed: f64,
        available: f64,
    },
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Quantity owned of every [`ResourceKind`]. Every kind is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    amounts: BTreeMap<ResourceKind, f64>,
}

impl Ledger {
    /// A ledger with every kind at zero.
    pub fn new() -> Self {
        Self {
            amounts: ResourceKind::ALL.into_iter().map(|k| (k, 0.0)).collect(),
        }
    }

    /// A ledger with every kind at zero except money.
    pub fn with_money(money: f64) -> Self {
        let mut ledger = Self::new();
        ledger.set(ResourceKind::Money, money);
        ledger
    }

    pub fn get(&self, kind: ResourceKind) -> f64 {
        self.amounts.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, kind: ResourceKind, amount: f64) {
        self.amounts.insert(kind, amount);
    }

    pub fn add(&mut self, kind: ResourceKind, amount: f64) {
        *self.amounts.entry(kind).or_insert(0.0) += amount;
    }

    pub fn money(&self) -> f64 {
        self.get(ResourceKind::Money)
    }

    /// Mutable access to the money balance (research draws from it directly).
    pub fn money_mut(&mut self) -> &mut f64 {
        self.amounts.entry(ResourceKind::Money).or_insert(0.0)
    }

    pub fn has(&self, kind: ResourceKind, amount: f64) -> bool {
        self.get(kind) >= amount
    }

    /// Withdraw `amount` of a single kind, or fail without touching anything.
    pub fn withdraw(&mut self, kind: ResourceKind, amount: f64) -> Result<(), LedgerError> {
        let available = self.get(kind);
        if available < amount {
            return Err(LedgerError::Insufficient {
                kind,
                needed: amount,
                available,
            });
        }
        self.set(kind, available - amount);
        Ok(())
    }

    /// Withdraw every requirement at once. If any single requirement is not
    /// covered nothing is withdrawn and the first shortfall is returned.
    pub fn withdraw_all(&mut self, required: &[(ResourceKind, f64)]) -> Result<(), LedgerError> {
        if let Some(&(kind, needed)) = required.iter().find(|(k, n)| !self.has(*k, *n)) {
            return Err(LedgerError::Insufficient {
                kind,
                needed,
                available: self.get(kind),
            });
        }
        for &(kind, amount) in required {
            let current = self.get(kind);
            self.set(kind, current - amount);
        }
        Ok(())
    }

    /// Iterate `(kind, amount)` in ledger order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, f64)> + '_ {
        self.amounts.iter().map(|(k, v)| (*k, *v))
    }

    /// Non-money resources with a positive balance, for the resource bar.
    pub fn displayed(&self) -> Vec<(ResourceKind, f64)> {
        self.iter()
            .filter(|(k, v)| *k != ResourceKind::Money && *v > 0.0)
            .collect()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
