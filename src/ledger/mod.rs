//! Ledger domain: currency balances, daily coin cap, reward history.
//!
//! `LedgerStore` is the single owner of persisted state. Every other domain
//! receives it as a resource and never touches the key-value backend directly.

use async_channel::{Receiver, Sender};
use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::LedgerConfig;
use crate::shared::*;
use crate::storage::{KvStore, MemoryStore, StorageError};

pub mod clock;
pub mod history;
pub mod rewards;

pub use clock::{Clock, FixedClock, SystemClock};

// ═══════════════════════════════════════════════════════════════════════
// STORE
// ═══════════════════════════════════════════════════════════════════════

/// Typed access to persisted ledger state plus the change subscription.
///
/// Storage failures never reach callers: unreadable keys read as absent and
/// failed writes are logged and dropped.
#[derive(Resource)]
pub struct LedgerStore {
    backend: Box<dyn KvStore>,
    clock: Box<dyn Clock>,
    config: LedgerConfig,
    subscribers: Vec<Sender<LedgerChange>>,
}

impl LedgerStore {
    pub fn new(backend: Box<dyn KvStore>, clock: Box<dyn Clock>, config: LedgerConfig) -> Self {
        Self {
            backend,
            clock,
            config,
            subscribers: Vec::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MemoryStore::new()),
            Box::new(SystemClock),
            LedgerConfig::default(),
        )
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Reads and decodes a key. Missing, unreadable, and malformed values are all `None`.
    pub(crate) fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("[Ledger] Read of '{}' failed: {}. Treating as absent.", key, e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("[Ledger] Stored '{}' is malformed: {}. Treating as absent.", key, e);
                None
            }
        }
    }

    /// Encodes and writes a key. Returns `false` when persistence was lost.
    pub(crate) fn write_json<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        let written = serde_json::to_string(value)
            .map_err(StorageError::from)
            .and_then(|json| self.backend.set(key, &json));
        match written {
            Ok(()) => true,
            Err(e) => {
                warn!("[Ledger] Write of '{}' FAILED: {}", key, e);
                false
            }
        }
    }

    // ── Subscription ────────────────────────────────────────────────────

    /// New receiver for every future change. Dropping it unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<LedgerChange> {
        let (sender, receiver) = async_channel::unbounded();
        self.subscribers.push(sender);
        debug!("[Ledger] Subscriber added ({} total)", self.subscribers.len());
        receiver
    }

    /// Queues a change for every live subscriber. Listeners run when they
    /// next poll, never inside the mutating call.
    pub(crate) fn notify(&mut self, change: LedgerChange) {
        self.subscribers
            .retain(|sender| sender.try_send(change).is_ok());
    }

    // ── Balances ────────────────────────────────────────────────────────

    pub fn balance(&self) -> CurrencyBalance {
        CurrencyBalance {
            points: self.read_json(KEY_POINTS).unwrap_or(0),
            coins: self.read_json(KEY_COINS).unwrap_or(0),
        }
    }

    /// Today's tally. A tally stored under another date reads as a fresh one.
    pub fn daily_tally(&self) -> DailyCoinTally {
        let today = self.clock.today();
        match self.read_json::<DailyCoinTally>(KEY_DAILY_TALLY) {
            Some(tally) if tally.date == today => tally,
            _ => DailyCoinTally::fresh(today),
        }
    }

    pub(crate) fn new_record_id(&self, prefix: &str) -> String {
        format!(
            "{}-{}-{:08x}",
            prefix,
            self.clock.now().timestamp_millis(),
            rand::random::<u32>()
        )
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// PLUGIN
// ═══════════════════════════════════════════════════════════════════════

/// Systems that write ledger state run in `Mutate`; change forwarding runs after.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerSet {
    Mutate,
    Publish,
}

/// The plugin's own subscription, drained into `LedgerChangedEvent`s.
#[derive(Resource)]
pub struct LedgerSubscription(pub Receiver<LedgerChange>);

pub struct LedgerPlugin;

impl Plugin for LedgerPlugin {
    fn build(&self, app: &mut App) {
        // Keeps a store the app inserted beforehand (file-backed, custom clock).
        app.init_resource::<LedgerStore>();
        let receiver = app.world_mut().resource_mut::<LedgerStore>().subscribe();
        app.insert_resource(LedgerSubscription(receiver));

        app.add_event::<RewardRequestEvent>()
            .add_event::<RewardAppliedEvent>()
            .add_event::<LedgerChangedEvent>();

        app.configure_sets(Update, (LedgerSet::Mutate, LedgerSet::Publish).chain());

        app.add_systems(
            Update,
            rewards::handle_reward_requests.in_set(LedgerSet::Mutate),
        )
        .add_systems(Update, forward_ledger_changes.in_set(LedgerSet::Publish));

        info!("[Ledger] LedgerPlugin registered.");
    }
}

/// Drains the plugin's subscription into Bevy events.
pub fn forward_ledger_changes(
    subscription: Res<LedgerSubscription>,
    mut changed: EventWriter<LedgerChangedEvent>,
) {
    while let Ok(change) = subscription.0.try_recv() {
        changed.send(LedgerChangedEvent { change });
    }
}
