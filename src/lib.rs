//! Curator Cache - persistent TTL cache for a game catalog browser
//!
//! Sits in front of catalog and recommendation calls, survives restarts
//! through a single JSON file, and backs the user's game library.

pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod library;
pub mod telemetry;

pub use cache::{CacheStore, DEFAULT_TTL};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use library::{GameId, MembershipSet, PreferenceStore};
