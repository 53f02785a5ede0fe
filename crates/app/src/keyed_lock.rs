//! Keyed async mutex table.
//!
//! One lock per key, created on first use and dropped again once nobody
//! holds or waits for it. Different keys never contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::OwnedMutexGuard;

type Slot = Arc<tokio::sync::Mutex<()>>;

/// Serializes work per key (e.g. per device id).
#[derive(Debug, Default)]
pub struct KeyedLock {
    slots: Mutex<HashMap<String, Slot>>,
}

impl KeyedLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        // The slot is cloned under the table lock so that a guard being
        // released concurrently sees this waiter in the reference count.
        let slot = Arc::clone(self.slots().entry(key.to_owned()).or_default());
        let guard = Arc::clone(&slot).lock_owned().await;
        KeyedGuard {
            table: self,
            key: key.to_owned(),
            slot,
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or awaited.
    #[must_use]
    pub fn active_keys(&self) -> usize {
        self.slots().len()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive access to one key; released on drop.
#[derive(Debug)]
pub struct KeyedGuard<'a> {
    table: &'a KeyedLock,
    key: String,
    slot: Slot,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        let mut slots = self.table.slots();
        drop(self.guard.take());
        // table + this guard: nobody else holds or waits for the slot
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.key);
        }
    }
}
