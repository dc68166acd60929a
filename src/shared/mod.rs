//! Shared resources, persisted records, and events for the Playhouse ledger.
//!
//! This is the type contract. Every domain plugin imports from here.
//! No domain imports from any other domain's internals directly.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS — defaults for `LedgerConfig`
// ═══════════════════════════════════════════════════════════════════════

/// Points at which a balance rolls over into one coin.
pub const CONVERSION_THRESHOLD: i64 = 500;
/// Maximum coins creditable per calendar day.
pub const DAILY_COIN_CAP: i64 = 100;
/// Reward history keeps this many newest entries.
pub const HISTORY_LIMIT: usize = 50;
/// Notification inbox keeps this many newest entries.
pub const NOTIFICATION_LIMIT: usize = 100;

pub const FIRST_GAME_BONUS_POINTS: i64 = 100;
pub const FIRST_GAME_BONUS_COINS: i64 = 10;
pub const FIRST_GAME_BONUS_DESCRIPTION: &str = "First Game Completed!";

// ═══════════════════════════════════════════════════════════════════════
// STORAGE KEYS
// ═══════════════════════════════════════════════════════════════════════

pub const KEY_POINTS: &str = "playhouse_s_points";
pub const KEY_COINS: &str = "playhouse_s_coins";
pub const KEY_DAILY_TALLY: &str = "playhouse_daily_coin_tally";
pub const KEY_REWARD_HISTORY: &str = "playhouse_reward_history";
pub const KEY_GAME_STATS: &str = "playhouse_game_stats";
pub const KEY_NOTIFICATIONS: &str = "playhouse_notifications";

pub type GameId = String;

// ═══════════════════════════════════════════════════════════════════════
// CURRENCY
// ═══════════════════════════════════════════════════════════════════════

/// The two running totals. Only the reward engine writes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyBalance {
    pub points: i64,
    pub coins: i64,
}

/// Coins credited on one calendar date (`YYYY-MM-DD`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCoinTally {
    pub date: String,
    pub total: i64,
}

impl DailyCoinTally {
    pub fn fresh(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            total: 0,
        }
    }
}

/// One row of the reward history log. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEvent {
    pub id: String,
    pub description: String,
    pub points: i64,
    pub coins: i64,
    pub timestamp: String,
}

/// Deltas actually applied by one `apply_rewards` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedReward {
    pub points: i64,
    pub coins: i64,
}

// ═══════════════════════════════════════════════════════════════════════
// GAME CATALOG & STATISTICS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameCategory {
    Game,
    Puzzle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: GameId,
    pub title: String,
    pub category: GameCategory,
}

impl CatalogEntry {
    pub fn new(id: &str, title: &str, category: GameCategory) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            category,
        }
    }
}

/// The fixed list of games and puzzles whose stat rows must always exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCatalog {
    pub entries: Vec<CatalogEntry>,
}

impl GameCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The catalog shipped with the playhouse.
    pub fn playhouse() -> Self {
        use GameCategory::*;
        Self::new(vec![
            CatalogEntry::new("memory-match", "Memory Match", Game),
            CatalogEntry::new("2048", "2048", Game),
            CatalogEntry::new("dots-and-boxes", "Dots and Boxes", Game),
            CatalogEntry::new("typing-rush", "Typing Rush", Game),
            CatalogEntry::new("ludo", "Ludo", Game),
            CatalogEntry::new("sudoku", "Sudoku", Puzzle),
            CatalogEntry::new("tower-of-hanoi", "Tower of Hanoi", Puzzle),
            CatalogEntry::new("english-puzzle", "English Puzzle", Puzzle),
            CatalogEntry::new("number-puzzle", "Number Puzzle", Puzzle),
        ])
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn contains(&self, game_id: &str) -> bool {
        self.entries.iter().any(|e| e.id == game_id)
    }

    pub fn category_of(&self, game_id: &str) -> Option<GameCategory> {
        self.entries
            .iter()
            .find(|e| e.id == game_id)
            .map(|e| e.category)
    }
}

impl Default for GameCatalog {
    fn default() -> Self {
        Self::playhouse()
    }
}

/// Per-game counters, persisted as one array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStat {
    pub game_id: GameId,
    pub games_played: u32,
    pub wins: u32,
    /// Best score recorded, starting from 0. Negative scores never replace
    /// it, so the floor is 0.
    pub high_score: i64,
}

impl GameStat {
    pub fn zeroed(game_id: impl Into<GameId>) -> Self {
        Self {
            game_id: game_id.into(),
            games_played: 0,
            wins: 0,
            high_score: 0,
        }
    }
}

/// Outcome of one finished game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub game_id: GameId,
    pub did_win: bool,
    pub score: Option<i64>,
}

// ═══════════════════════════════════════════════════════════════════════
// NOTIFICATIONS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub message: String,
    /// Dedup tag. At most one unread notification per kind.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub timestamp: String,
    pub is_read: bool,
}

/// Which persisted area a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerChange {
    Balances,
    History,
    Stats,
    Notifications,
}

// ═══════════════════════════════════════════════════════════════════════
// REWARD ESTIMATION
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// String-keyed numeric metrics reported by a game. Keys per game are listed
/// by `estimator::expected_metric_keys`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics(pub BTreeMap<String, f64>);

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstimateRequest {
    pub game_id: GameId,
    pub difficulty: Difficulty,
    pub did_win: bool,
    pub metrics: PerformanceMetrics,
}

/// Suggested S-Points / S-Coins for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSuggestion {
    pub s_points: i64,
    pub s_coins: i64,
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════

/// Any domain may ask the ledger to credit or debit the player.
#[derive(Event, Debug, Clone)]
pub struct RewardRequestEvent {
    pub points: i64,
    pub coins: i64,
    pub description: String,
}

/// Sent after a `RewardRequestEvent` (or session reward) has been applied.
#[derive(Event, Debug, Clone)]
pub struct RewardAppliedEvent {
    pub description: String,
    pub applied: AppliedReward,
}

#[derive(Event, Debug, Clone)]
pub struct GameCompletedEvent {
    pub result: GameResult,
}

/// Estimate a session's reward and apply it.
#[derive(Event, Debug, Clone)]
pub struct SessionRewardEvent {
    pub request: EstimateRequest,
}

/// Re-evaluate badges against current points and stats.
#[derive(Event, Debug, Clone, Default)]
pub struct AchievementCheckEvent;

#[derive(Event, Debug, Clone)]
pub struct BadgeNotifiedEvent {
    pub badge_id: String,
    pub title: String,
}

/// Forwarded from the ledger's change subscription, one frame after the write.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerChangedEvent {
    pub change: LedgerChange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playhouse_catalog_has_unique_ids() {
        let catalog = GameCatalog::playhouse();
        let mut ids: Vec<&str> = catalog.ids().collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before, "catalog ids must be unique");
    }

    #[test]
    fn test_catalog_category_lookup() {
        let catalog = GameCatalog::playhouse();
        assert_eq!(catalog.category_of("sudoku"), Some(GameCategory::Puzzle));
        assert_eq!(catalog.category_of("2048"), Some(GameCategory::Game));
        assert_eq!(catalog.category_of("chess"), None);
    }

    #[test]
    fn test_game_stat_json_layout() {
        let stat = GameStat {
            game_id: "sudoku".into(),
            games_played: 3,
            wins: 2,
            high_score: 140,
        };
        let json = serde_json::to_string(&stat).unwrap();
        assert_eq!(
            json,
            r#"{"gameId":"sudoku","gamesPlayed":3,"wins":2,"highScore":140}"#
        );
    }

    #[test]
    fn test_notification_serializes_kind_as_type() {
        let n = Notification {
            id: "n1".into(),
            message: "hi".into(),
            kind: "badge_first_win".into(),
            href: None,
            timestamp: "2026-01-01T00:00:00.000Z".into(),
            is_read: false,
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "badge_first_win");
        assert_eq!(json["isRead"], false);
        assert!(json.get("href").is_none());
    }
}
