//! Game statistics: per-game plays, wins, and high scores, plus the
//! first-game milestone bonus.

use bevy::prelude::*;

use crate::ledger::{LedgerSet, LedgerStore};
use crate::shared::*;

/// Owns the catalog the stat rows are synthesized from.
#[derive(Resource, Debug, Clone, Default)]
pub struct StatsTracker {
    catalog: GameCatalog,
}

impl StatsTracker {
    pub fn new(catalog: GameCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }

    /// Every persisted row: catalog ids first (zeroed when missing), then any
    /// stored rows for ids the catalog no longer lists.
    fn load_rows(&self, store: &LedgerStore) -> Vec<GameStat> {
        let mut stored: Vec<GameStat> = store.read_json(KEY_GAME_STATS).unwrap_or_default();
        let mut rows = Vec::with_capacity(self.catalog.entries.len() + stored.len());
        for id in self.catalog.ids() {
            match stored.iter().position(|s| s.game_id == id) {
                Some(i) => rows.push(stored.remove(i)),
                None => rows.push(GameStat::zeroed(id)),
            }
        }
        rows.extend(stored);
        rows
    }

    /// Exactly one row per catalog id, in catalog order.
    pub fn game_stats(&self, store: &LedgerStore) -> Vec<GameStat> {
        let mut rows = self.load_rows(store);
        rows.truncate(self.catalog.entries.len());
        rows
    }

    /// Records one finished session. Returns the milestone bonus when this was
    /// the first game ever recorded.
    pub fn update_game_stats(
        &self,
        store: &mut LedgerStore,
        result: &GameResult,
    ) -> Option<AppliedReward> {
        let mut rows = self.load_rows(store);
        let total_before: u64 = rows.iter().map(|s| s.games_played as u64).sum();

        let index = match rows.iter().position(|s| s.game_id == result.game_id) {
            Some(i) => i,
            None => {
                debug!("[Stats] New stat row for unlisted game '{}'", result.game_id);
                rows.push(GameStat::zeroed(result.game_id.clone()));
                rows.len() - 1
            }
        };

        let row = &mut rows[index];
        row.games_played = row.games_played.saturating_add(1);
        if result.did_win {
            row.wins = row.wins.saturating_add(1);
        }
        if let Some(score) = result.score {
            if score > row.high_score {
                row.high_score = score;
            }
        }
        info!(
            "[Stats] {}: played {}, wins {}, high score {}",
            row.game_id, row.games_played, row.wins, row.high_score
        );

        store.write_json(KEY_GAME_STATS, &rows);
        store.notify(LedgerChange::Stats);

        // Re-arms if the stats store is ever cleared.
        if total_before == 0 {
            let config = store.config().clone();
            info!("[Stats] First game ever recorded, applying milestone bonus.");
            return Some(store.apply_rewards(
                config.first_game_bonus_points,
                config.first_game_bonus_coins,
                &config.first_game_bonus_description,
            ));
        }
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

pub struct StatsPlugin;

impl Plugin for StatsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StatsTracker>()
            .add_event::<GameCompletedEvent>()
            .add_systems(Update, handle_game_completed.in_set(LedgerSet::Mutate));
    }
}

/// Updates stats for every `GameCompletedEvent`.
pub fn handle_game_completed(
    mut events: EventReader<GameCompletedEvent>,
    tracker: Res<StatsTracker>,
    mut store: ResMut<LedgerStore>,
) {
    for ev in events.read() {
        tracker.update_game_stats(&mut store, &ev.result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KvStore, MemoryStore};
    use crate::config::LedgerConfig;
    use crate::ledger::SystemClock;

    fn tiny_catalog() -> GameCatalog {
        GameCatalog::new(vec![
            CatalogEntry::new("alpha", "Alpha", GameCategory::Game),
            CatalogEntry::new("beta", "Beta", GameCategory::Puzzle),
        ])
    }

    fn result(game_id: &str, did_win: bool, score: Option<i64>) -> GameResult {
        GameResult {
            game_id: game_id.to_string(),
            did_win,
            score,
        }
    }

    #[test]
    fn test_empty_store_yields_zeroed_catalog_rows() {
        let tracker = StatsTracker::new(tiny_catalog());
        let store = LedgerStore::in_memory();
        assert_eq!(
            tracker.game_stats(&store),
            vec![GameStat::zeroed("alpha"), GameStat::zeroed("beta")]
        );
    }

    #[test]
    fn test_repeated_wins_count_plays_and_wins() {
        let tracker = StatsTracker::new(tiny_catalog());
        let mut store = LedgerStore::in_memory();
        for _ in 0..4 {
            tracker.update_game_stats(&mut store, &result("alpha", true, None));
        }
        let alpha = &tracker.game_stats(&store)[0];
        assert_eq!(alpha.games_played, 4);
        assert_eq!(alpha.wins, 4);
    }

    #[test]
    fn test_high_score_is_running_maximum() {
        let tracker = StatsTracker::new(tiny_catalog());
        let mut store = LedgerStore::in_memory();
        for score in [40, 120, 90, 0, 119] {
            tracker.update_game_stats(&mut store, &result("beta", false, Some(score)));
        }
        tracker.update_game_stats(&mut store, &result("beta", false, None));
        let beta = &tracker.game_stats(&store)[1];
        assert_eq!(beta.high_score, 120);
        assert_eq!(beta.games_played, 6);
        assert_eq!(beta.wins, 0);
    }

    #[test]
    fn test_first_game_bonus_fires_exactly_once() {
        let tracker = StatsTracker::new(tiny_catalog());
        let mut store = LedgerStore::in_memory();

        let bonus = tracker.update_game_stats(&mut store, &result("alpha", false, None));
        assert_eq!(bonus, Some(AppliedReward { points: 100, coins: 10 }));

        let again = tracker.update_game_stats(&mut store, &result("beta", true, None));
        assert_eq!(again, None);

        assert_eq!(store.balance(), CurrencyBalance { points: 100, coins: 10 });
        let history = store.reward_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].description, "First Game Completed!");
    }

    #[test]
    fn test_stale_rows_are_kept_but_not_listed() {
        let mut backend = MemoryStore::new();
        let stored = vec![
            GameStat { game_id: "retired".into(), games_played: 3, wins: 1, high_score: 9 },
            GameStat { game_id: "beta".into(), games_played: 2, wins: 2, high_score: 50 },
        ];
        backend
            .set(KEY_GAME_STATS, &serde_json::to_string(&stored).unwrap())
            .unwrap();
        let mut store = LedgerStore::new(
            Box::new(backend.clone()),
            Box::new(SystemClock),
            LedgerConfig::default(),
        );
        let tracker = StatsTracker::new(tiny_catalog());

        let listed = tracker.game_stats(&store);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], GameStat::zeroed("alpha"));
        assert_eq!(listed[1].wins, 2);

        // Prior plays exist (stale row included), so no milestone bonus.
        assert_eq!(tracker.update_game_stats(&mut store, &result("alpha", true, Some(5))), None);

        let persisted: Vec<GameStat> =
            serde_json::from_str(&backend.raw(KEY_GAME_STATS).unwrap()).unwrap();
        assert!(persisted.iter().any(|s| s.game_id == "retired" && s.games_played == 3));
    }

    #[test]
    fn test_negative_scores_leave_high_score_at_floor() {
        let tracker = StatsTracker::new(tiny_catalog());
        let mut store = LedgerStore::in_memory();
        for score in [-40, -3] {
            tracker.update_game_stats(&mut store, &result("alpha", false, Some(score)));
        }
        assert_eq!(tracker.game_stats(&store)[0].high_score, 0);

        tracker.update_game_stats(&mut store, &result("alpha", false, Some(12)));
        assert_eq!(tracker.game_stats(&store)[0].high_score, 12);
    }

    #[test]
    fn test_unlisted_game_gets_its_own_row() {
        let tracker = StatsTracker::new(tiny_catalog());
        let mut store = LedgerStore::in_memory();
        tracker.update_game_stats(&mut store, &result("gamma", true, Some(7)));

        assert_eq!(tracker.game_stats(&store).len(), 2);
        let rows = tracker.load_rows(&store);
        let gamma = rows.iter().find(|s| s.game_id == "gamma").unwrap();
        assert_eq!((gamma.games_played, gamma.wins, gamma.high_score), (1, 1, 7));
    }

    #[test]
    fn test_update_emits_stats_change() {
        let tracker = StatsTracker::new(tiny_catalog());
        let mut store = LedgerStore::in_memory();
        // Pre-existing play so the milestone does not add balance changes.
        tracker.update_game_stats(&mut store, &result("alpha", false, None));
        let changes = store.subscribe();

        tracker.update_game_stats(&mut store, &result("beta", true, None));

        assert_eq!(changes.try_recv(), Ok(LedgerChange::Stats));
        assert!(changes.try_recv().is_err());
    }
}
