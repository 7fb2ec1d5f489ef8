//! Registry of keys currently being generated.
//!
//! At most one caller holds the claim for a key; others block in [`InFlight::wait`]
//! until the claim is dropped and then read the persisted result.

use mandeltile_core::TileKey;
use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct InFlight {
    keys: Mutex<HashSet<TileKey>>,
    released: Condvar,
}

/// Claim on one key, released on drop.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    registry: &'a InFlight,
    key: TileKey,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    // The set stays consistent even if a holder panicked, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashSet<TileKey>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim `key` unless another caller already holds it.
    pub fn try_claim(&self, key: &TileKey) -> Option<InFlightGuard<'_>> {
        if self.lock().insert(key.clone()) {
            Some(InFlightGuard {
                registry: self,
                key: key.clone(),
            })
        } else {
            None
        }
    }

    /// Block until nobody holds `key`.
    pub fn wait(&self, key: &TileKey) {
        let mut keys = self.lock();
        while keys.contains(key) {
            keys = self
                .released
                .wait(keys)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn is_in_flight(&self, key: &TileKey) -> bool {
        self.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InFlightGuard<'_> {
    pub fn key(&self) -> &TileKey {
        &self.key
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.key);
        self.registry.released.notify_all();
    }
}
