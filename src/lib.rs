//! Playhouse rewards — currency ledger, game statistics, badges, and
//! notifications for the Playhouse mini-game catalog.
//!
//! The binary crate (`main.rs`) is a headless recorder for one game session.
//! Everything is reachable from here so `tests/` can drive the plugins in a
//! bare Bevy app.

use bevy::prelude::*;

pub mod shared;
pub mod storage;
pub mod config;
pub mod ledger;
pub mod stats;
pub mod notifications;
pub mod achievements;
pub mod estimator;

/// All Playhouse domains. Insert a `LedgerStore`, `StatsTracker`, or
/// `ActiveEstimator` before adding this to override the defaults.
pub struct PlayhousePlugin;

impl Plugin for PlayhousePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(ledger::LedgerPlugin)
            .add_plugins(stats::StatsPlugin)
            .add_plugins(achievements::AchievementsPlugin)
            .add_plugins(estimator::EstimatorPlugin);
    }
}
