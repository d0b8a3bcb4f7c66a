//! dedup.rs: identities of plate appearances that were already handled.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use crate::feed::types::EventKey;

/// Grow-only set of processed event keys.
///
/// Keys are never removed for the lifetime of the process. `insert` is the
/// test-and-insert primitive: exactly one caller wins for a given key, even
/// with several pollers sharing the set.
#[derive(Debug, Default)]
pub struct ProcessedSet {
    inner: Mutex<HashSet<EventKey>>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.guard().contains(key)
    }

    /// Returns `true` if `key` was not present before (the caller owns it now).
    pub fn insert(&self, key: EventKey) -> bool {
        self.guard().insert(key)
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A poisoned lock still holds a valid set; keep going with it.
    fn guard(&self) -> MutexGuard<'_, HashSet<EventKey>> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }
}
