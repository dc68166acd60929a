//! Session reward estimation.
//!
//! The hosted model sits behind [`RewardEstimator`]. Metrics are validated at
//! this boundary, and any failure turns into a zero reward plus a warning
//! notification so a finished session is never blocked.

use bevy::prelude::*;
use thiserror::Error;

use crate::ledger::{LedgerSet, LedgerStore};
use crate::notifications;
use crate::shared::*;
use crate::stats::StatsTracker;

pub const ESTIMATE_FAILED_KIND: &str = "reward_estimate_failed";

#[derive(Debug, Error, PartialEq)]
pub enum EstimateError {
    #[error("invalid metrics for {game_id}: {reason}")]
    InvalidMetrics { game_id: String, reason: String },

    #[error("estimator unavailable: {0}")]
    Unavailable(String),

    #[error("estimator response rejected: {0}")]
    Rejected(String),
}

pub trait RewardEstimator: Send + Sync {
    fn estimate(&self, request: &EstimateRequest) -> Result<RewardSuggestion, EstimateError>;
}

/// Metric keys each catalog game reports.
pub fn expected_metric_keys(game_id: &str) -> Option<&'static [&'static str]> {
    let keys: &'static [&'static str] = match game_id {
        "memory-match" => &["moves", "timeSeconds"],
        "2048" => &["score", "maxTile"],
        "dots-and-boxes" => &["boxes", "opponentBoxes"],
        "typing-rush" => &["score", "wpm", "accuracy"],
        "ludo" => &["tokensHome"],
        "sudoku" => &["mistakes", "timeSeconds"],
        "tower-of-hanoi" => &["moves", "disks"],
        "english-puzzle" | "number-puzzle" => &["correct", "attempts"],
        _ => return None,
    };
    Some(keys)
}

/// Rejects non-finite values, and for known games, missing or unknown keys.
pub fn validate_metrics(game_id: &str, metrics: &PerformanceMetrics) -> Result<(), EstimateError> {
    let invalid = |reason: String| EstimateError::InvalidMetrics {
        game_id: game_id.to_string(),
        reason,
    };

    if let Some((key, _)) = metrics.0.iter().find(|(_, v)| !v.is_finite()) {
        return Err(invalid(format!("'{}' is not a finite number", key)));
    }

    let Some(expected) = expected_metric_keys(game_id) else {
        return Ok(());
    };
    if let Some(missing) = expected.iter().find(|k| !metrics.0.contains_key(**k)) {
        return Err(invalid(format!("missing '{}'", missing)));
    }
    if let Some(unknown) = metrics.0.keys().find(|k| !expected.contains(&k.as_str())) {
        return Err(invalid(format!("unexpected '{}'", unknown)));
    }
    Ok(())
}

/// Deterministic formula used when no model is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaEstimator;

impl FormulaEstimator {
    fn base_points(difficulty: Difficulty) -> i64 {
        match difficulty {
            Difficulty::Easy => 10,
            Difficulty::Medium => 20,
            Difficulty::Hard => 30,
        }
    }
}

impl RewardEstimator for FormulaEstimator {
    fn estimate(&self, request: &EstimateRequest) -> Result<RewardSuggestion, EstimateError> {
        let mut points = Self::base_points(request.difficulty);
        if request.did_win {
            points *= 2;
        }
        if let Some(score) = request.metrics.get("score") {
            points += (score.max(0.0) / 10.0).floor() as i64;
        }
        let coins = if request.did_win { points / 10 } else { 0 };
        Ok(RewardSuggestion {
            s_points: points,
            s_coins: coins,
        })
    }
}

/// Validates, estimates, and falls back to `{0, 0}` with a warning on any failure.
pub fn estimate_or_zero(
    estimator: &dyn RewardEstimator,
    request: &EstimateRequest,
    store: &mut LedgerStore,
) -> RewardSuggestion {
    let outcome = validate_metrics(&request.game_id, &request.metrics)
        .and_then(|()| estimator.estimate(request));
    match outcome {
        Ok(suggestion) => suggestion,
        Err(e) => {
            warn!("[Estimator] {}. Awarding nothing for this session.", e);
            notifications::push(
                store,
                ESTIMATE_FAILED_KIND,
                "We couldn't score that game, so no reward this time.",
                None,
            );
            RewardSuggestion::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

#[derive(Resource)]
pub struct ActiveEstimator(pub Box<dyn RewardEstimator>);

impl Default for ActiveEstimator {
    fn default() -> Self {
        Self(Box::new(FormulaEstimator))
    }
}

pub struct EstimatorPlugin;

impl Plugin for EstimatorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveEstimator>()
            .add_event::<SessionRewardEvent>()
            .add_event::<RewardAppliedEvent>()
            .add_systems(Update, handle_session_rewards.in_set(LedgerSet::Mutate));
    }
}

fn session_description(catalog: &GameCatalog, request: &EstimateRequest) -> String {
    let title = catalog
        .entries
        .iter()
        .find(|e| e.id == request.game_id)
        .map(|e| e.title.as_str())
        .unwrap_or(request.game_id.as_str());
    if request.did_win {
        format!("Won {}", title)
    } else {
        format!("Played {}", title)
    }
}

/// Estimates and applies the reward for each finished session.
pub fn handle_session_rewards(
    mut sessions: EventReader<SessionRewardEvent>,
    mut applied_events: EventWriter<RewardAppliedEvent>,
    estimator: Res<ActiveEstimator>,
    tracker: Res<StatsTracker>,
    mut store: ResMut<LedgerStore>,
) {
    for ev in sessions.read() {
        let suggestion = estimate_or_zero(estimator.0.as_ref(), &ev.request, &mut store);
        let description = session_description(tracker.catalog(), &ev.request);
        let applied = store.apply_rewards(suggestion.s_points, suggestion.s_coins, &description);
        applied_events.send(RewardAppliedEvent {
            description,
            applied,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DownEstimator;

    impl RewardEstimator for DownEstimator {
        fn estimate(&self, _request: &EstimateRequest) -> Result<RewardSuggestion, EstimateError> {
            Err(EstimateError::Unavailable("timeout".into()))
        }
    }

    fn request(game_id: &str, difficulty: Difficulty, did_win: bool, metrics: PerformanceMetrics) -> EstimateRequest {
        EstimateRequest {
            game_id: game_id.to_string(),
            difficulty,
            did_win,
            metrics,
        }
    }

    #[test]
    fn test_validate_accepts_expected_keys() {
        let metrics = PerformanceMetrics::new().with("score", 512.0).with("maxTile", 64.0);
        assert_eq!(validate_metrics("2048", &metrics), Ok(()));
    }

    #[test]
    fn test_validate_rejects_missing_unknown_and_nan() {
        let missing = PerformanceMetrics::new().with("score", 1.0);
        assert!(validate_metrics("2048", &missing).is_err());

        let unknown = PerformanceMetrics::new()
            .with("score", 1.0)
            .with("maxTile", 2.0)
            .with("cheats", 1.0);
        assert!(validate_metrics("2048", &unknown).is_err());

        let nan = PerformanceMetrics::new().with("anything", f64::NAN);
        assert!(validate_metrics("some-new-game", &nan).is_err());
    }

    #[test]
    fn test_unlisted_game_accepts_any_finite_metrics() {
        let metrics = PerformanceMetrics::new().with("whatever", 3.0);
        assert_eq!(validate_metrics("some-new-game", &metrics), Ok(()));
    }

    #[test]
    fn test_formula_estimate() {
        let win = request(
            "2048",
            Difficulty::Hard,
            true,
            PerformanceMetrics::new().with("score", 245.0).with("maxTile", 128.0),
        );
        assert_eq!(
            FormulaEstimator.estimate(&win).unwrap(),
            RewardSuggestion { s_points: 84, s_coins: 8 }
        );

        let loss = request(
            "sudoku",
            Difficulty::Easy,
            false,
            PerformanceMetrics::new().with("mistakes", 4.0).with("timeSeconds", 300.0),
        );
        assert_eq!(
            FormulaEstimator.estimate(&loss).unwrap(),
            RewardSuggestion { s_points: 10, s_coins: 0 }
        );
    }

    #[test]
    fn test_failure_falls_back_to_zero_with_warning() {
        let mut store = LedgerStore::in_memory();
        let req = request("ludo", Difficulty::Medium, true, PerformanceMetrics::new().with("tokensHome", 4.0));

        let suggestion = estimate_or_zero(&DownEstimator, &req, &mut store);

        assert_eq!(suggestion, RewardSuggestion::default());
        let inbox = notifications::list(&store);
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, ESTIMATE_FAILED_KIND);
    }

    #[test]
    fn test_invalid_metrics_never_reach_estimator() {
        let mut store = LedgerStore::in_memory();
        let req = request("ludo", Difficulty::Medium, true, PerformanceMetrics::new());
        assert_eq!(
            estimate_or_zero(&FormulaEstimator, &req, &mut store),
            RewardSuggestion::default()
        );
    }
}
