//! Cache Store Module
//!
//! Namespaced TTL cache held in memory and mirrored, write-through, to a
//! single JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::cache::persist::{load_snapshot, save_snapshot, Snapshot};
use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock, CACHE_PREFIX};
use crate::config::CacheConfig;

// == Cache Store ==
/// Persistent key/value cache with a single fixed TTL.
///
/// Every caller key is stored as `CACHE_PREFIX + key`. Entries loaded from
/// the file without that prefix are kept and written back but are invisible
/// to every operation here. They must still have the `{value, created_at}`
/// shape: a single malformed entry makes the whole file unparseable, and
/// the store then starts empty.
///
/// Expiry is lazy: an entry older than the TTL is dropped when `get` finds
/// it. There is no background sweep, so `count` may include entries that
/// are logically expired but not yet looked up.
///
/// All operations take `&self`; share the store between threads with `Arc`.
#[derive(Debug)]
pub struct CacheStore {
    /// Backing file
    path: PathBuf,
    /// Uniform time-to-live
    ttl: Duration,
    /// Source of entry timestamps
    clock: Arc<dyn Clock>,
    /// Authoritative map, namespaced key -> entry
    entries: RwLock<Snapshot>,
    /// Lookup and persistence counters
    stats: Mutex<CacheStats>,
    /// Serializes writes of the backing file
    persist_lock: Mutex<()>,
}

impl CacheStore {
    // == Constructors ==
    /// Opens the store described by `config`, loading the backing file.
    ///
    /// Never fails: a missing, unreadable or corrupt file yields an empty
    /// cache.
    pub fn open(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Opens a store on `path` with the default TTL.
    pub fn open_at(path: impl Into<PathBuf>) -> Self {
        Self::open(&CacheConfig::at(path))
    }

    /// Opens a store that takes its timestamps from `clock`.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let entries = match load_snapshot(&config.path) {
            Ok(snapshot) => {
                info!(
                    "Cache loaded from {} with {} entries",
                    config.path.display(),
                    snapshot.len()
                );
                snapshot
            }
            Err(e) => {
                warn!(
                    "Discarding unreadable cache file {}: {}",
                    config.path.display(),
                    e
                );
                Snapshot::new()
            }
        };

        Self {
            path: config.path.clone(),
            ttl: config.ttl,
            clock,
            entries: RwLock::new(entries),
            stats: Mutex::new(CacheStats::new()),
            persist_lock: Mutex::new(()),
        }
    }

    // == Get ==
    /// Returns the value stored under `key` unless it is missing or expired.
    ///
    /// Finding an expired entry removes it and persists the removal.
    pub fn get(&self, key: &str) -> Option<String> {
        if key.is_empty() {
            return None;
        }
        let key = namespaced(key);
        let now = self.clock.now_ms();

        {
            let entries = self.entries.read();
            match entries.get(&key) {
                None => {
                    self.stats.lock().record_miss();
                    return None;
                }
                Some(entry) if !entry.is_expired(now, self.ttl) => {
                    self.stats.lock().record_hit();
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock, a concurrent put may have refreshed it
        let expired = {
            let mut entries = self.entries.write();
            match entries.get(&key) {
                Some(entry) if !entry.is_expired(now, self.ttl) => {
                    self.stats.lock().record_hit();
                    return Some(entry.value.clone());
                }
                Some(_) => entries.remove(&key).is_some(),
                None => false,
            }
        };

        if expired {
            debug!("Cache entry {} expired", key);
            self.stats.lock().record_expiration();
            self.persist();
        } else {
            self.stats.lock().record_miss();
        }
        None
    }

    // == Put ==
    /// Stores `value` under `key`, replacing any previous entry, and persists.
    pub fn put(&self, key: &str, value: impl Into<String>) {
        if key.is_empty() {
            warn!("Ignoring cache put with an empty key");
            return;
        }
        let entry = CacheEntry::new(value.into(), self.clock.now_ms());
        self.entries.write().insert(namespaced(key), entry);
        self.persist();
    }

    // == Remove ==
    /// Removes `key`. Persists and returns `true` only if it was present.
    pub fn remove(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        let removed = self.entries.write().remove(&namespaced(key)).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    // == Clear ==
    /// Removes every entry this store manages. Foreign entries are kept.
    pub fn clear(&self) {
        let removed = self.remove_matching(CACHE_PREFIX);
        if removed > 0 {
            info!("Cache cleared, {} entries removed", removed);
        } else {
            debug!("Cache already empty");
        }
    }

    // == Remove By Prefix ==
    /// Removes every entry whose caller key starts with `key_prefix` and
    /// returns how many were removed.
    ///
    /// Lets derived caches (e.g. recommendations keyed by a hash of the
    /// library) be invalidated without recomputing their old keys.
    pub fn remove_by_prefix(&self, key_prefix: &str) -> usize {
        let removed = self.remove_matching(&namespaced(key_prefix));
        if removed > 0 {
            debug!("Removed {} entries under {}", removed, key_prefix);
        }
        removed
    }

    // == Count ==
    /// Number of entries this store manages, including expired entries that
    /// have not been looked up yet.
    pub fn count(&self) -> usize {
        self.entries
            .read()
            .keys()
            .filter(|key| key.starts_with(CACHE_PREFIX))
            .count()
    }

    // == Accessors ==
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    // == Close ==
    /// Writes the current map one last time and drops the store.
    pub fn close(self) {
        self.persist();
        debug!("Cache store {} closed", self.path.display());
    }

    fn remove_matching(&self, namespaced_prefix: &str) -> usize {
        let removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|key, _| !key.starts_with(namespaced_prefix));
            before - entries.len()
        };
        if removed > 0 {
            self.persist();
        }
        removed
    }

    // == Persist ==
    /// Mirrors the in-memory map to the backing file.
    ///
    /// The snapshot is taken after acquiring the write lock so a later
    /// mutation is never overwritten by an earlier one. Failures are logged
    /// and counted; memory stays authoritative.
    fn persist(&self) {
        let _guard = self.persist_lock.lock();
        let snapshot = self.entries.read().clone();

        match save_snapshot(&self.path, &snapshot) {
            Ok(()) => self.stats.lock().record_persist(true),
            Err(e) => {
                error!("Failed to write cache file {}: {}", self.path.display(), e);
                self.stats.lock().record_persist(false);
            }
        }
    }
}

fn namespaced(key: &str) -> String {
    format!("{}{}", CACHE_PREFIX, key)
}
