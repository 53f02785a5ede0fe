//! Keyed FIFO table with a single drainer per key.
//!
//! Items pushed for a key are handed out in push order. A key is present
//! in the table exactly while a drainer owns it: the push that creates the
//! entry elects the caller as drainer, and the pop that finds the queue
//! empty removes the entry under the same table lock, so a push can never
//! land in a queue nobody drains.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Pending work per key (e.g. per device id).
#[derive(Debug)]
pub struct KeyedQueue<T> {
    pending: Mutex<HashMap<String, VecDeque<T>>>,
}

impl<T> Default for KeyedQueue<T> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> KeyedQueue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` to the queue of `key`.
    ///
    /// Returns `true` when no drainer owns `key`: the caller must then
    /// drain it with [`KeyedQueue::pop`] until it returns `None`.
    #[must_use]
    pub fn push(&self, key: &str, item: T) -> bool {
        match self.pending().entry(key.to_owned()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().push_back(item);
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(VecDeque::from([item]));
                true
            }
        }
    }

    /// Next item of `key`, in push order. Releases the key and returns
    /// `None` once its queue is empty.
    pub fn pop(&self, key: &str) -> Option<T> {
        let mut pending = self.pending();
        let queue = pending.get_mut(key)?;
        let next = queue.pop_front();
        if next.is_none() {
            pending.remove(key);
        }
        next
    }

    /// Number of keys that still have a drainer.
    #[must_use]
    pub fn active_keys(&self) -> usize {
        self.pending().len()
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<String, VecDeque<T>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
