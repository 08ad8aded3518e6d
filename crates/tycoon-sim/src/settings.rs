//! Player settings, persisted inside the save document.

use crate::error::SimError;
use serde::{Deserialize, Serialize};
use tycoon_core::format::NumberFormat;

/// Fastest allowed game speed multiplier.
pub const MAX_GAME_SPEED: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    /// Tick rate multiplier. Also scales research progress per tick.
    pub game_speed: f64,
    pub number_format: NumberFormat,
    pub auto_save: bool,
    /// Local time of the last successful save, for display.
    pub last_save: Option<String>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            game_speed: 1.0,
            number_format: NumberFormat::Standard,
            auto_save: true,
            last_save: None,
        }
    }
}

/// A speed must be finite, positive and at most [`MAX_GAME_SPEED`].
pub fn validate_speed(speed: f64) -> Result<f64, SimError> {
    if speed.is_finite() && speed > 0.0 && speed <= MAX_GAME_SPEED {
        Ok(speed)
    } else {
        Err(SimError::InvalidSpeed(speed))
    }
}
