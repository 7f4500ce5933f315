//! Error types for the cache
//!
//! Provides unified error handling using thiserror. These errors stay inside
//! the crate: the public cache operations log them and degrade to a miss.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for persistence and preference storage.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backing file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted content could not be parsed or serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Preference store rejected a write or flush
    #[error("Preference store error: {0}")]
    Preferences(String),

    /// No home directory to place the default cache file under
    #[error("Could not determine a per-user cache directory")]
    NoHomeDir,
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
