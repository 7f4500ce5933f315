//! Library membership set.
//!
//! Keeps the user's library as a JSON array of game ids in a preference
//! store, and pairs each member with a detail blob in the cache.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::keys;
use crate::library::PreferenceStore;

/// Catalog identifier of a game.
pub type GameId = i64;

/// Preference key holding the serialized id set.
pub const LIBRARY_PREF_KEY: &str = "libraryItems";

/// The user's library.
///
/// Every read goes back to the preference store; there is no separate
/// in-memory copy of the set. A member's detail blob may be missing (never
/// supplied, or expired from the cache) and callers must treat that as
/// "data unavailable".
pub struct MembershipSet<P: PreferenceStore> {
    prefs: P,
    cache: Arc<CacheStore>,
    /// Cache key prefixes of results derived from the whole library
    derived_prefixes: Vec<String>,
    /// Serializes read-modify-write of the id set
    write_lock: Mutex<()>,
}

impl<P: PreferenceStore> MembershipSet<P> {
    pub fn new(prefs: P, cache: Arc<CacheStore>) -> Self {
        Self {
            prefs,
            cache,
            derived_prefixes: Vec::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Registers cache key prefixes of derived results (e.g.
    /// `keys::RECOMMENDATIONS_PREFIX`) to drop whenever a member is added
    /// or removed.
    ///
    /// Without any, derived results keyed by the old library stay in the
    /// cache until their TTL runs out.
    pub fn with_derived_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derived_prefixes.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Ids currently in the library. Unparseable stored data reads as empty.
    pub fn list_ids(&self) -> BTreeSet<GameId> {
        let Some(json) = self.prefs.get(LIBRARY_PREF_KEY) else {
            return BTreeSet::new();
        };
        match serde_json::from_str::<Option<BTreeSet<GameId>>>(&json) {
            Ok(ids) => ids.unwrap_or_default(),
            Err(e) => {
                warn!("Error reading library preferences: {}", e);
                BTreeSet::new()
            }
        }
    }

    /// Adds `id`, caching `detail` under its game data key when supplied.
    ///
    /// Returns `false` if the id was already present or the set could not
    /// be written.
    pub fn add(&self, id: GameId, detail: Option<&str>) -> bool {
        let _guard = self.write_lock.lock();
        let mut ids = self.list_ids();
        if !ids.insert(id) || !self.save(&ids) {
            return false;
        }

        match detail {
            Some(detail) => {
                if !has_recommendation_fields(detail) {
                    warn!("Caching game data for {} without name and genres fields", id);
                }
                self.cache.put(&keys::game_data(id), detail);
                info!("Added game {} to library and cached data", id);
            }
            None => info!("Added game {} to library (no data to cache)", id),
        }
        self.invalidate_derived();
        true
    }

    /// Removes `id` and its cached detail blob.
    pub fn remove(&self, id: GameId) -> bool {
        let _guard = self.write_lock.lock();
        let mut ids = self.list_ids();
        if !ids.remove(&id) || !self.save(&ids) {
            return false;
        }

        self.cache.remove(&keys::game_data(id));
        self.invalidate_derived();
        info!("Removed game {} from library and cache", id);
        true
    }

    pub fn contains(&self, id: GameId) -> bool {
        self.list_ids().contains(&id)
    }

    /// Empties the library.
    ///
    /// Detail blobs and derived results stay in the cache; use `reset` to
    /// drop them as well.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        self.save(&BTreeSet::new());
    }

    /// Empties the library and every cache entry.
    pub fn reset(&self) {
        self.clear();
        self.cache.clear();
    }

    /// Cached detail blob of `id`, if still present.
    pub fn detail(&self, id: GameId) -> Option<String> {
        self.cache.get(&keys::game_data(id))
    }

    /// Detail blobs of every member that still has one, in id order.
    pub fn details(&self) -> Vec<(GameId, String)> {
        self.list_ids()
            .into_iter()
            .filter_map(|id| match self.detail(id) {
                Some(detail) => Some((id, detail)),
                None => {
                    debug!("No cached data for library game {}", id);
                    None
                }
            })
            .collect()
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Writes the set, then flushes. Only a failed write counts as failure.
    fn save(&self, ids: &BTreeSet<GameId>) -> bool {
        let json = match serde_json::to_string(ids) {
            Ok(json) => json,
            Err(e) => {
                error!("Error serializing library: {}", e);
                return false;
            }
        };
        if let Err(e) = self.prefs.put(LIBRARY_PREF_KEY, &json) {
            error!("Error saving library preferences: {}", e);
            return false;
        }
        if let Err(e) = self.prefs.flush() {
            error!("Error flushing library preferences: {}", e);
        }
        true
    }

    fn invalidate_derived(&self) {
        for prefix in &self.derived_prefixes {
            self.cache.remove_by_prefix(prefix);
        }
    }
}

/// Whether `detail` carries the fields recommendation prompts are built from.
fn has_recommendation_fields(detail: &str) -> bool {
    match serde_json::from_str::<Value>(detail) {
        Ok(Value::Object(map)) => map.contains_key("name") && map.contains_key("genres"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CacheError, Result};
    use crate::library::MemoryPreferences;
    use tempfile::TempDir;

    fn create_library() -> (MembershipSet<MemoryPreferences>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = Arc::new(CacheStore::open_at(temp_dir.path().join("cache.json")));
        (MembershipSet::new(MemoryPreferences::new(), cache), temp_dir)
    }

    /// Accepts writes but never manages to flush them.
    #[derive(Default)]
    struct UnflushablePrefs(MemoryPreferences);

    impl PreferenceStore for UnflushablePrefs {
        fn get(&self, key: &str) -> Option<String> {
            self.0.get(key)
        }
        fn put(&self, key: &str, value: &str) -> Result<()> {
            self.0.put(key, value)
        }
        fn flush(&self) -> Result<()> {
            Err(CacheError::Preferences("backing store unavailable".to_string()))
        }
    }

    /// Rejects every write.
    struct ReadOnlyPrefs;

    impl PreferenceStore for ReadOnlyPrefs {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
        fn put(&self, _key: &str, _value: &str) -> Result<()> {
            Err(CacheError::Preferences("read only".to_string()))
        }
        fn flush(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_add_contains_remove_cascades() {
        let (library, _dir) = create_library();

        assert!(library.add(42, Some("{\"name\":\"Foo\"}")));
        assert!(library.contains(42));
        assert_eq!(library.detail(42).as_deref(), Some("{\"name\":\"Foo\"}"));

        assert!(library.remove(42));
        assert!(!library.contains(42));
        assert!(library.cache().get("gameData_42").is_none());
    }

    #[test]
    fn test_add_without_detail() {
        let (library, _dir) = create_library();

        assert!(library.add(7, None));
        assert!(library.contains(7));
        assert!(library.cache().get("gameData_7").is_none());
        assert!(library.detail(7).is_none());
    }

    #[test]
    fn test_add_twice_is_noop() {
        let (library, _dir) = create_library();

        assert!(library.add(1, Some("first")));
        assert!(!library.add(1, Some("second")));
        assert_eq!(library.detail(1).as_deref(), Some("first"));
    }

    #[test]
    fn test_remove_missing() {
        let (library, _dir) = create_library();
        assert!(!library.remove(99));
    }

    #[test]
    fn test_ids_are_stored_as_json_array() {
        let (library, _dir) = create_library();

        library.add(3, None);
        library.add(1, None);

        assert_eq!(
            library.prefs.get(LIBRARY_PREF_KEY).as_deref(),
            Some("[1,3]")
        );
        assert_eq!(library.list_ids().into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_malformed_preferences_read_as_empty() {
        let (library, _dir) = create_library();
        library.prefs.put(LIBRARY_PREF_KEY, "{oops").unwrap();

        assert!(library.list_ids().is_empty());
        assert!(library.add(5, None), "a corrupt set is replaced on write");
        assert!(library.contains(5));
    }

    #[test]
    fn test_null_preferences_read_as_empty() {
        let (library, _dir) = create_library();
        library.prefs.put(LIBRARY_PREF_KEY, "null").unwrap();
        assert!(library.list_ids().is_empty());
    }

    #[test]
    fn test_clear_keeps_detail_entries() {
        let (library, _dir) = create_library();
        library.add(10, Some("{}"));

        library.clear();

        assert!(library.list_ids().is_empty());
        assert_eq!(library.cache().get("gameData_10").as_deref(), Some("{}"));
    }

    #[test]
    fn test_reset_clears_cache_too() {
        let (library, _dir) = create_library();
        library.add(10, Some("{}"));
        library.cache().put("topGames", "[]");

        library.reset();

        assert!(library.list_ids().is_empty());
        assert_eq!(library.cache().count(), 0);
    }

    #[test]
    fn test_details_skip_missing_blobs() {
        let (library, _dir) = create_library();
        library.add(2, Some("two"));
        library.add(1, None);
        library.add(3, Some("three"));

        assert_eq!(
            library.details(),
            vec![(2, "two".to_string()), (3, "three".to_string())]
        );
    }

    #[test]
    fn test_derived_prefixes_invalidated_on_change() {
        let temp_dir = TempDir::new().unwrap();
        let cache = Arc::new(CacheStore::open_at(temp_dir.path().join("cache.json")));
        let library = MembershipSet::new(MemoryPreferences::new(), cache.clone())
            .with_derived_prefixes([keys::RECOMMENDATIONS_PREFIX]);

        cache.put(&keys::recommendations(&library.list_ids(), "m"), "old");
        library.add(1, None);
        assert_eq!(cache.count(), 0);

        cache.put(&keys::recommendations(&library.list_ids(), "m"), "stale");
        library.remove(1);
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_derived_results_survive_without_prefixes() {
        let (library, _dir) = create_library();
        library.cache().put("recommendations_0_m", "kept");

        library.add(1, None);

        assert_eq!(library.cache().get("recommendations_0_m").as_deref(), Some("kept"));
    }

    #[test]
    fn test_flush_failure_does_not_fail_mutation() {
        let temp_dir = TempDir::new().unwrap();
        let cache = Arc::new(CacheStore::open_at(temp_dir.path().join("cache.json")));
        let library = MembershipSet::new(UnflushablePrefs::default(), cache);

        assert!(library.add(8, Some("{}")));
        assert!(library.contains(8));
        assert!(library.remove(8));
    }

    #[test]
    fn test_failed_write_reports_not_added() {
        let temp_dir = TempDir::new().unwrap();
        let cache = Arc::new(CacheStore::open_at(temp_dir.path().join("cache.json")));
        let library = MembershipSet::new(ReadOnlyPrefs, cache);

        assert!(!library.add(8, Some("{}")));
        assert!(library.cache().get("gameData_8").is_none());
    }

    #[test]
    fn test_recommendation_field_check() {
        assert!(has_recommendation_fields(r#"{"name":"Foo","genres":[]}"#));
        assert!(!has_recommendation_fields(r#"{"name":"Foo"}"#));
        assert!(!has_recommendation_fields("[]"));
        assert!(!has_recommendation_fields("not json"));
    }
}
