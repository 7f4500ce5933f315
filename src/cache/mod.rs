//! Cache Module
//!
//! Persistent key/value cache with lazy TTL expiration.

mod clock;
mod entry;
mod persist;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::CacheStore;

pub(crate) use persist::write_atomic;

// == Public Constants ==
/// Marks keys managed by the cache inside the backing map
pub const CACHE_PREFIX: &str = "cache_";

/// Time-to-live applied to every entry
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// File name of the backing file inside the cache directory
pub const CACHE_FILE_NAME: &str = "app_cache.json";
