//! Game configuration read from the surrounding game record

use serde::{Deserialize, Serialize};

use crate::error::DuelError;

/// Largest disc count any putting format uses
pub const MAX_DISC_COUNT: u8 = 5;

/// How the ladder seats are driven
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuelMode {
    /// Every seat is a real participant submitting for themselves.
    #[default]
    Standard,
    /// One participant reports for both seats of a single station.
    Solo,
}

/// Configuration for a duel game
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuelConfig {
    pub station_count: u32,
    #[serde(default)]
    pub mode: DuelMode,
    /// Discs thrown per round; the made-count ceiling. Not enforced by the engine.
    #[serde(default = "default_disc_count")]
    pub disc_count: u8,
}

fn default_disc_count() -> u8 {
    3
}

impl DuelConfig {
    /// Standard ladder with `station_count` stations
    pub fn ladder(station_count: u32) -> Self {
        Self {
            station_count,
            mode: DuelMode::Standard,
            disc_count: default_disc_count(),
        }
    }

    /// Single-station practice where one person plays both seats
    pub fn solo() -> Self {
        Self {
            station_count: 1,
            mode: DuelMode::Solo,
            disc_count: default_disc_count(),
        }
    }

    pub fn with_disc_count(mut self, disc_count: u8) -> Self {
        self.disc_count = disc_count;
        self
    }

    /// Highest made-count a round can report
    pub fn made_count_ceiling(&self) -> u8 {
        self.disc_count
    }

    pub fn validate(&self) -> Result<(), DuelError> {
        if self.station_count == 0 {
            return Err(DuelError::InvalidStationCount);
        }
        if self.disc_count == 0 || self.disc_count > MAX_DISC_COUNT {
            return Err(DuelError::InvalidConfig(format!(
                "disc count {} not in 1..={}",
                self.disc_count, MAX_DISC_COUNT
            )));
        }
        Ok(())
    }

    /// Parse and validate a config from the game record JSON
    pub fn from_json(json: &str) -> Result<Self, DuelError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self::ladder(1)
    }
}
