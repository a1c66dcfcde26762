//! Lock-scoped mutation per storage key.
//!
//! Every write touching one shell container runs under that shell's key
//! lock, so concurrent creates/deletes for the same identifier never
//! interleave. Different shells proceed in parallel. Entries are pruned once
//! no caller holds or waits on them.

use shellhub_kernel::StorageKey;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub struct KeyLocks {
    table: Mutex<BTreeMap<StorageKey, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `mutation` while holding the lock for `key`.
    pub fn with_lock<T>(&self, key: &StorageKey, mutation: impl FnOnce() -> T) -> T {
        let entry = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(key.clone()).or_default())
        };

        let value = {
            let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
            mutation()
        };

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only taken under the table lock: table + ours means idle.
        if Arc::strong_count(&entry) == 2 {
            table.remove(key);
        }
        value
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
