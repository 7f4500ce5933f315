//! Cache Statistics Module
//!
//! Tracks lookups, lazy expirations and persistence outcomes.

use serde::Serialize;

// == Cache Stats ==
/// Counters for a store's lifetime in this process.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Entries dropped because a lookup found them expired
    pub expirations: u64,
    /// Successful writes of the backing file
    pub persists: u64,
    /// Writes of the backing file that failed and were ignored
    pub persist_failures: u64,
}

impl CacheStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// An expired entry counts as a miss as well.
    pub fn record_expiration(&mut self) {
        self.expirations += 1;
        self.misses += 1;
    }

    pub fn record_persist(&mut self, ok: bool) {
        if ok {
            self.persists += 1;
        } else {
            self.persist_failures += 1;
        }
    }
}
