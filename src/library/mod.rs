//! Library Module
//!
//! The user's game library: a persisted id set paired with cached details.

mod membership;
mod prefs;

pub use membership::{GameId, MembershipSet, LIBRARY_PREF_KEY};
pub use prefs::{FilePreferences, MemoryPreferences, PreferenceStore};
