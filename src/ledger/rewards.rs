//! Reward application: point-to-coin conversion, the daily coin cap, and
//! the debit path.

use bevy::prelude::*;

use super::LedgerStore;
use crate::shared::*;

impl LedgerStore {
    /// Applies a points/coins delta and returns what was actually applied.
    ///
    /// A point credit reduces the balance modulo `conversion_threshold`, and
    /// each full threshold becomes one pending coin. Credits clip coins to the
    /// daily cap. A negative `coins_from_game` is a debit: pending conversion
    /// coins are dropped, the cap is skipped, and the coin delta is applied as
    /// given. All arithmetic saturates.
    ///
    /// Persistence is best-effort. If a write fails the computed deltas are
    /// still returned and nothing is rolled back.
    pub fn apply_rewards(
        &mut self,
        points_to_add: i64,
        coins_from_game: i64,
        description: &str,
    ) -> AppliedReward {
        let current = self.balance();

        let threshold = self.config.conversion_threshold;
        let mut new_points = current.points.saturating_add(points_to_add);
        let mut conversions = 0;
        if points_to_add > 0 && threshold > 0 && new_points >= threshold {
            conversions = new_points / threshold;
            new_points %= threshold;
        }

        // ── Debit ────────────────────────────────────────────────────────
        if coins_from_game < 0 {
            let new_coins = current.coins.saturating_add(coins_from_game);
            self.write_json(KEY_POINTS, &new_points);
            self.write_json(KEY_COINS, &new_coins);
            self.record_reward(description, points_to_add, coins_from_game);
            self.notify(LedgerChange::Balances);
            if conversions > 0 {
                debug!("[Ledger] Debit drops {} conversion coins", conversions);
            }
            info!(
                "[Ledger] Debit {} pts / {} coins: {}. Balance: {} pts, {} coins",
                points_to_add, coins_from_game, description, new_points, new_coins
            );
            return AppliedReward {
                points: points_to_add,
                coins: coins_from_game,
            };
        }

        // ── Credit ───────────────────────────────────────────────────────
        let potential = coins_from_game.saturating_add(conversions);
        let mut tally = self.daily_tally();
        let cap = self.config.daily_coin_cap;
        let awarded = if tally.total >= cap {
            0
        } else if tally.total.saturating_add(potential) > cap {
            cap - tally.total
        } else {
            potential
        };
        if awarded < potential {
            info!(
                "[Ledger] Daily coin cap: {} of {} coins awarded ({} already today)",
                awarded, potential, tally.total
            );
        }

        let new_coins = current.coins.saturating_add(awarded);
        self.write_json(KEY_POINTS, &new_points);
        self.write_json(KEY_COINS, &new_coins);

        if awarded > 0 {
            tally.total = tally.total.saturating_add(awarded);
            self.write_json(KEY_DAILY_TALLY, &tally);
        }

        if points_to_add != 0 || awarded != 0 {
            self.record_reward(description, points_to_add, awarded);
        }

        self.notify(LedgerChange::Balances);
        info!(
            "[Ledger] Credit {} pts / {} coins ({} converted): {}. Balance: {} pts, {} coins",
            points_to_add, awarded, conversions, description, new_points, new_coins
        );

        AppliedReward {
            points: points_to_add,
            coins: awarded,
        }
    }
}

/// Applies `RewardRequestEvent`s sent by any domain.
pub fn handle_reward_requests(
    mut requests: EventReader<RewardRequestEvent>,
    mut applied_events: EventWriter<RewardAppliedEvent>,
    mut store: ResMut<LedgerStore>,
) {
    for ev in requests.read() {
        let applied = store.apply_rewards(ev.points, ev.coins, &ev.description);
        applied_events.send(RewardAppliedEvent {
            description: ev.description.clone(),
            applied,
        });
    }
}
