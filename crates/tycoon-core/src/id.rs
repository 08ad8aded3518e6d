//! Identifiers: generational keys for owned machines and string ids for
//! catalog entries.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Identifies an owned machine instance. Generational, so a sold
    /// machine's id is never handed out again for a different instance.
    pub struct MachineId;
}

/// Declares a string-backed catalog identifier. Catalog ids are strings so
/// that saves keyed by them stay readable across catalog revisions.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id! {
    /// Identifies a machine kind in the catalog (e.g. `oreMiner`).
    MachineKindId
}

string_id! {
    /// Identifies a technology in the catalog.
    TechId
}

string_id! {
    /// Identifies an achievement in the catalog.
    AchievementId
}
