//! Bounded reward history, newest first.

use super::LedgerStore;
use crate::shared::*;

impl LedgerStore {
    pub fn reward_history(&self) -> Vec<RewardEvent> {
        self.read_json(KEY_REWARD_HISTORY).unwrap_or_default()
    }

    /// Prepends one event and drops whatever falls past `history_limit`.
    pub(crate) fn record_reward(&mut self, description: &str, points: i64, coins: i64) {
        let event = RewardEvent {
            id: self.new_record_id("rw"),
            description: description.to_string(),
            points,
            coins,
            timestamp: self.clock.timestamp(),
        };
        let mut history = self.reward_history();
        history.insert(0, event);
        history.truncate(self.config.history_limit);
        self.write_json(KEY_REWARD_HISTORY, &history);
        self.notify(LedgerChange::History);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_newest_first() {
        let mut store = LedgerStore::in_memory();
        store.record_reward("first", 1, 0);
        store.record_reward("second", 2, 0);
        let history = store.reward_history();
        assert_eq!(history[0].description, "second");
        assert_eq!(history[1].description, "first");
        assert_ne!(history[0].id, history[1].id);
    }

    #[test]
    fn test_history_evicts_oldest_past_limit() {
        let mut store = LedgerStore::in_memory();
        for i in 0..51 {
            store.apply_rewards(1, 0, &format!("tx {}", i));
        }
        let history = store.reward_history();
        assert_eq!(history.len(), 50);
        assert_eq!(history[0].description, "tx 50");
        assert_eq!(history[49].description, "tx 1");
    }
}
