//! Persisted notification inbox, newest first, deduplicated by kind.
//!
//! Only one unread notification per kind may exist. Repeated pushes of an
//! already-open kind are dropped here, so callers can re-evaluate freely.

use bevy::prelude::*;

use crate::ledger::LedgerStore;
use crate::shared::*;

pub fn list(store: &LedgerStore) -> Vec<Notification> {
    store.read_json(KEY_NOTIFICATIONS).unwrap_or_default()
}

pub fn unread_count(store: &LedgerStore) -> usize {
    list(store).iter().filter(|n| !n.is_read).count()
}

/// Returns `false` when an unread notification of the same kind is already open.
pub fn push(store: &mut LedgerStore, kind: &str, message: &str, href: Option<&str>) -> bool {
    let mut inbox = list(store);
    if inbox.iter().any(|n| n.kind == kind && !n.is_read) {
        debug!("[Notifications] '{}' already open, skipping", kind);
        return false;
    }
    inbox.insert(
        0,
        Notification {
            id: store.new_record_id("nt"),
            message: message.to_string(),
            kind: kind.to_string(),
            href: href.map(str::to_string),
            timestamp: store.clock().timestamp(),
            is_read: false,
        },
    );
    inbox.truncate(store.config().notification_limit);
    store.write_json(KEY_NOTIFICATIONS, &inbox);
    store.notify(LedgerChange::Notifications);
    info!("[Notifications] {}: {}", kind, message);
    true
}

pub fn mark_read(store: &mut LedgerStore, id: &str) -> bool {
    let mut inbox = list(store);
    let Some(n) = inbox.iter_mut().find(|n| n.id == id && !n.is_read) else {
        return false;
    };
    n.is_read = true;
    store.write_json(KEY_NOTIFICATIONS, &inbox);
    store.notify(LedgerChange::Notifications);
    true
}

pub fn mark_all_read(store: &mut LedgerStore) {
    let mut inbox = list(store);
    if inbox.iter().all(|n| n.is_read) {
        return;
    }
    for n in inbox.iter_mut() {
        n.is_read = true;
    }
    store.write_json(KEY_NOTIFICATIONS, &inbox);
    store.notify(LedgerChange::Notifications);
}
