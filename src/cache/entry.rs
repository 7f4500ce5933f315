//! Cache Entry Module
//!
//! Defines the persisted shape of a single cache entry.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A cached value and the moment it was stored.
///
/// Entries are never mutated; a logical update replaces the whole entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Opaque serialized payload
    pub value: String,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(value: String, created_at: u64) -> Self {
        Self { value, created_at }
    }

    // == Is Expired ==
    /// Checks whether the entry is older than `ttl` at time `now_ms`.
    ///
    /// Boundary condition: an entry exactly `ttl` old is still live; it
    /// expires once its age strictly exceeds the TTL. A creation time in the
    /// future (clock moved backwards) counts as age zero.
    pub fn is_expired(&self, now_ms: u64, ttl: Duration) -> bool {
        u128::from(self.age_ms(now_ms)) > ttl.as_millis()
    }

    /// Milliseconds elapsed since creation.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }
}
