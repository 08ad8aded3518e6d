//! Simulator error types.
//!
//! [`SimError`]'s `Display` is the message shown to the player, and
//! [`SimError::severity`] picks the notification style.

use tycoon_core::format::{format_number, NumberFormat};
use tycoon_core::id::{MachineId, MachineKindId};
use tycoon_core::machine::MachineError;
use tycoon_core::market::MarketError;
use tycoon_core::notify::Severity;
use tycoon_data::DataLoadError;
use tycoon_research::ResearchError;

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("save data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("save data is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("save storage failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("No saved game found.")]
    NoSave,

    /// The store refused the write (quota, read-only medium).
    #[error("save storage rejected the write: {0}")]
    Storage(String),

    #[error("save data is malformed: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

fn money(value: &f64) -> String {
    format_number(*value, NumberFormat::Standard)
}

fn market_message(err: &MarketError) -> String {
    match err {
        MarketError::Insufficient { resource, .. } => format!("Not enough {resource} to sell."),
        MarketError::NotListed(resource) => format!("{resource} cannot be sold on the market."),
    }
}

fn research_message(err: &ResearchError) -> String {
    match err {
        ResearchError::InsufficientFunds { .. } => "Not enough money to start research.".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Not enough money to buy this machine.")]
    CannotAffordMachine { kind: MachineKindId, price: f64 },

    #[error("Not enough money to upgrade this machine.")]
    CannotAffordUpgrade { machine: MachineId, cost: f64 },

    #[error("Unknown machine kind '{0}'.")]
    UnknownMachineKind(MachineKindId),

    #[error("{0} is not available for purchase yet.")]
    MachineLocked(MachineKindId),

    #[error("This machine is already at the maximum level.")]
    MaxLevel(MachineId),

    #[error("Machine no longer exists.")]
    Machine(#[from] MachineError),

    #[error("{}", market_message(.0))]
    Market(#[from] MarketError),

    #[error("{}", research_message(.0))]
    Research(#[from] ResearchError),

    #[error("You need ${} to prestige!", money(.cost))]
    PrestigeUnavailable { cost: f64 },

    #[error("Invalid game speed {0}: must be above 0 and at most 100.")]
    InvalidSpeed(f64),

    #[error("{context}: {source}")]
    Persist {
        context: &'static str,
        #[source]
        source: PersistError,
    },

    #[error("Failed to load catalog: {0}")]
    Data(#[from] DataLoadError),
}

impl SimError {
    pub fn persist(context: &'static str, source: PersistError) -> Self {
        SimError::Persist { context, source }
    }

    /// Severity of the notification raised for this error.
    pub fn severity(&self) -> Severity {
        match self {
            SimError::Persist {
                source: PersistError::NoSave,
                ..
            } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Message shown to the player. A missing save reads as a plain warning.
    pub fn user_message(&self) -> String {
        match self {
            SimError::Persist {
                source: PersistError::NoSave,
                ..
            } => PersistError::NoSave.to_string(),
            other => other.to_string(),
        }
    }
}
