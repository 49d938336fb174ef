//! Runtime configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "autonomy_interval_ms": 1000, "waste_chance": 0.0, "seed": 7 }
//! ```

use serde::{Deserialize, Serialize};

use petsim_logic::constants::timing;
use petsim_logic::message::QueueTiming;

use crate::error::PetError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PetConfig {
    pub tick_interval_ms: u64,
    pub autonomy_interval_ms: u64,
    pub min_display_ms: u64,
    pub min_duration_ms: u64,
    pub reaction_delay_ms: u64,
    /// Chance of leaving waste after eating something off the grid.
    pub waste_chance: f32,
    pub seed: u64,
    /// Needs the scheduler tracks, in ranking tie order. Empty tracks the
    /// whole registry in declaration order.
    pub tracked_needs: Vec<String>,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: timing::TICK_INTERVAL_MS,
            autonomy_interval_ms: timing::AUTONOMY_INTERVAL_MS,
            min_display_ms: timing::MIN_DISPLAY_MS,
            min_duration_ms: timing::MIN_DURATION_MS,
            reaction_delay_ms: timing::REACTION_DELAY_MS,
            waste_chance: 0.3,
            seed: 0x5EED,
            tracked_needs: Vec::new(),
        }
    }
}

impl PetConfig {
    pub fn from_json(json: &str) -> Result<Self, PetError> {
        let config: PetConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PetError> {
        let invalid = |reason: &str| PetError::InvalidDescriptor {
            need: "config".to_string(),
            reason: reason.to_string(),
        };
        if self.tick_interval_ms == 0 || self.autonomy_interval_ms == 0 {
            return Err(invalid("clock intervals must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.waste_chance) {
            return Err(invalid("waste_chance must be within [0, 1]"));
        }
        Ok(())
    }

    pub fn queue_timing(&self) -> QueueTiming {
        QueueTiming {
            min_display_ms: self.min_display_ms,
            min_duration_ms: self.min_duration_ms,
        }
    }
}
