//! Ledger tuning, optionally read from a RON file.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::shared::*;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid ledger config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub conversion_threshold: i64,
    pub daily_coin_cap: i64,
    pub history_limit: usize,
    pub notification_limit: usize,
    pub first_game_bonus_points: i64,
    pub first_game_bonus_coins: i64,
    pub first_game_bonus_description: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            conversion_threshold: CONVERSION_THRESHOLD,
            daily_coin_cap: DAILY_COIN_CAP,
            history_limit: HISTORY_LIMIT,
            notification_limit: NOTIFICATION_LIMIT,
            first_game_bonus_points: FIRST_GAME_BONUS_POINTS,
            first_game_bonus_coins: FIRST_GAME_BONUS_COINS,
            first_game_bonus_description: FIRST_GAME_BONUS_DESCRIPTION.to_string(),
        }
    }
}

impl LedgerConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&source)
    }

    /// Missing file means defaults; a broken file is logged and also means defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                info!("[Config] Loaded ledger config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("[Config] {}. Using defaults.", e);
                Self::default()
            }
        }
    }
}
