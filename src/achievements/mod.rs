//! Badge catalog and evaluation.
//!
//! Badges are not persisted. Every check re-evaluates all of them against the
//! current points balance and stats, and pushes a notification per qualifying
//! badge; the notification inbox drops the ones already open.

use bevy::prelude::*;

use crate::ledger::{LedgerSet, LedgerStore};
use crate::notifications;
use crate::shared::*;
use crate::stats::StatsTracker;

// ═══════════════════════════════════════════════════════════════════════
// BADGE DEFINITIONS
// ═══════════════════════════════════════════════════════════════════════

/// Static description of a single badge.
#[derive(Debug)]
pub struct BadgeDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub const BADGES: &[BadgeDef] = &[
    BadgeDef {
        id: "point_collector",
        title: "Point Collector",
        description: "Hold 100 S-Points",
    },
    BadgeDef {
        id: "first_win",
        title: "First Win",
        description: "Win any game",
    },
    BadgeDef {
        id: "puzzle_explorer",
        title: "Puzzle Explorer",
        description: "Win 3 different puzzles",
    },
    BadgeDef {
        id: "typing_ace",
        title: "Typing Ace",
        description: "Score 150 in Typing Rush",
    },
    BadgeDef {
        id: "sudoku_master",
        title: "Sudoku Master",
        description: "Win Sudoku 5 times",
    },
    BadgeDef {
        id: "regular_player",
        title: "Regular Player",
        description: "Play 25 games",
    },
];

fn stat<'a>(stats: &'a [GameStat], game_id: &str) -> Option<&'a GameStat> {
    stats.iter().find(|s| s.game_id == game_id)
}

/// Returns `true` if the badge with the given id is earned.
fn evaluate_condition(id: &str, points: i64, stats: &[GameStat], catalog: &GameCatalog) -> bool {
    match id {
        "point_collector" => points >= 100,
        "first_win" => stats.iter().any(|s| s.wins > 0),
        "puzzle_explorer" => {
            stats
                .iter()
                .filter(|s| s.wins > 0)
                .filter(|s| catalog.category_of(&s.game_id) == Some(GameCategory::Puzzle))
                .count()
                >= 3
        }
        "typing_ace" => stat(stats, "typing-rush").is_some_and(|s| s.high_score >= 150),
        "sudoku_master" => stat(stats, "sudoku").is_some_and(|s| s.wins >= 5),
        "regular_player" => {
            stats.iter().map(|s| s.games_played as u64).sum::<u64>() >= 25
        }
        _ => false,
    }
}

pub fn notification_kind(badge: &BadgeDef) -> String {
    format!("badge_{}", badge.id)
}

/// Pure evaluation: every badge whose condition currently holds.
pub fn qualifying_badges(
    points: i64,
    stats: &[GameStat],
    catalog: &GameCatalog,
) -> Vec<&'static BadgeDef> {
    BADGES
        .iter()
        .filter(|def| evaluate_condition(def.id, points, stats, catalog))
        .collect()
}

/// Notifies every qualifying badge. Returns the badges whose notification was
/// newly opened (the rest were already open in the inbox).
pub fn check_and_trigger_achievements(
    store: &mut LedgerStore,
    catalog: &GameCatalog,
    points: i64,
    stats: &[GameStat],
) -> Vec<&'static BadgeDef> {
    let mut opened = Vec::new();
    for def in qualifying_badges(points, stats, catalog) {
        let message = format!("🏆 Badge unlocked: {}!", def.title);
        if notifications::push(store, &notification_kind(def), &message, Some("/profile")) {
            info!("[Achievements] {} — {}", def.title, def.description);
            opened.push(def);
        }
    }
    opened
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

pub struct AchievementsPlugin;

impl Plugin for AchievementsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AchievementCheckEvent>()
            .add_event::<BadgeNotifiedEvent>()
            .add_systems(Update, handle_achievement_checks.in_set(LedgerSet::Mutate));
    }
}

/// Evaluates badges against the latest balance and stats once per batch of
/// `AchievementCheckEvent`s.
pub fn handle_achievement_checks(
    mut checks: EventReader<AchievementCheckEvent>,
    mut notified: EventWriter<BadgeNotifiedEvent>,
    tracker: Res<StatsTracker>,
    mut store: ResMut<LedgerStore>,
) {
    if checks.read().count() == 0 {
        return;
    }
    let points = store.balance().points;
    let stats = tracker.game_stats(&store);
    for def in check_and_trigger_achievements(&mut store, tracker.catalog(), points, &stats) {
        notified.send(BadgeNotifiedEvent {
            badge_id: def.id.to_string(),
            title: def.title.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_with(rows: &[(&str, u32, u32, i64)]) -> Vec<GameStat> {
        let catalog = GameCatalog::playhouse();
        catalog
            .ids()
            .map(|id| {
                rows.iter()
                    .find(|r| r.0 == id)
                    .map(|r| GameStat {
                        game_id: id.to_string(),
                        games_played: r.1,
                        wins: r.2,
                        high_score: r.3,
                    })
                    .unwrap_or_else(|| GameStat::zeroed(id))
            })
            .collect()
    }

    fn ids(badges: &[&'static BadgeDef]) -> Vec<&'static str> {
        badges.iter().map(|b| b.id).collect()
    }

    #[test]
    fn test_fresh_player_has_no_badges() {
        let catalog = GameCatalog::playhouse();
        assert!(qualifying_badges(0, &stats_with(&[]), &catalog).is_empty());
    }

    #[test]
    fn test_point_threshold() {
        let catalog = GameCatalog::playhouse();
        let stats = stats_with(&[]);
        assert!(qualifying_badges(99, &stats, &catalog).is_empty());
        assert_eq!(ids(&qualifying_badges(100, &stats, &catalog)), vec!["point_collector"]);
    }

    #[test]
    fn test_puzzle_explorer_needs_three_distinct_puzzle_wins() {
        let catalog = GameCatalog::playhouse();
        // Game-category wins do not count toward puzzles.
        let two_puzzles = stats_with(&[
            ("sudoku", 1, 1, 0),
            ("tower-of-hanoi", 2, 1, 0),
            ("2048", 5, 5, 0),
        ]);
        assert!(!ids(&qualifying_badges(0, &two_puzzles, &catalog)).contains(&"puzzle_explorer"));

        let three_puzzles = stats_with(&[
            ("sudoku", 1, 1, 0),
            ("tower-of-hanoi", 2, 1, 0),
            ("number-puzzle", 1, 1, 0),
        ]);
        assert!(ids(&qualifying_badges(0, &three_puzzles, &catalog)).contains(&"puzzle_explorer"));
    }

    #[test]
    fn test_per_game_thresholds() {
        let catalog = GameCatalog::playhouse();
        let stats = stats_with(&[("typing-rush", 3, 0, 150), ("sudoku", 9, 5, 0)]);
        let earned = ids(&qualifying_badges(0, &stats, &catalog));
        assert!(earned.contains(&"typing_ace"));
        assert!(earned.contains(&"sudoku_master"));
        assert!(earned.contains(&"first_win"));
        assert!(!earned.contains(&"regular_player"));
    }

    #[test]
    fn test_repeated_checks_notify_once() {
        let catalog = GameCatalog::playhouse();
        let mut store = LedgerStore::in_memory();
        let stats = stats_with(&[("ludo", 1, 1, 0)]);

        let first = check_and_trigger_achievements(&mut store, &catalog, 120, &stats);
        assert_eq!(ids(&first), vec!["point_collector", "first_win"]);

        let second = check_and_trigger_achievements(&mut store, &catalog, 120, &stats);
        assert!(second.is_empty());
        assert_eq!(notifications::list(&store).len(), 2);
    }
}
