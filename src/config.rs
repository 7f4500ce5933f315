//! Configuration Module
//!
//! Resolves where the cache file lives and how long entries stay fresh.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;

use crate::cache::{CACHE_FILE_NAME, DEFAULT_TTL};
use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// Values can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Backing file for the persisted map
    pub path: PathBuf,
    /// Age after which an entry is treated as absent
    pub ttl: Duration,
}

impl CacheConfig {
    /// Creates a config for an explicit file with the default TTL.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Sets the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Creates a new CacheConfig, applying environment overrides on top of
    /// the defaults.
    ///
    /// # Environment Variables
    /// - `CURATOR_CACHE_PATH` - Backing file (default: per-user cache dir)
    /// - `CURATOR_CACHE_TTL_SECS` - TTL in seconds (default: 86400)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            path: env::var_os("CURATOR_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            ttl: env::var("CURATOR_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.ttl),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let path = default_cache_path().unwrap_or_else(|_| PathBuf::from(CACHE_FILE_NAME));
        Self {
            path,
            ttl: DEFAULT_TTL,
        }
    }
}

/// Per-user location of the cache file (`~/.cache/gamecurator/app_cache.json`
/// on Linux).
pub fn default_cache_path() -> Result<PathBuf> {
    ProjectDirs::from("", "", "gamecurator")
        .map(|dirs| dirs.cache_dir().join(CACHE_FILE_NAME))
        .ok_or(CacheError::NoHomeDir)
}
