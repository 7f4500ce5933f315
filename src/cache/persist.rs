//! Backing file persistence.
//!
//! The whole map is stored as one pretty-printed JSON object of
//! `namespaced key -> {value, created_at}`.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::cache::CacheEntry;
use crate::error::Result;

/// Map as held in memory and on disk.
pub type Snapshot = HashMap<String, CacheEntry>;

/// Read the backing file. A missing file is an empty snapshot; unreadable or
/// malformed content is an error for the caller to degrade on.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    if !path.exists() {
        return Ok(Snapshot::new());
    }

    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Snapshot::new());
    }
    let snapshot: Snapshot = serde_json::from_str(&contents)?;
    Ok(snapshot)
}

/// Replace the backing file with `snapshot`.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    write_atomic(path, json.as_bytes())
}

/// Replace `path` with `contents` via a synced sibling temp file, so the
/// target is either the old or the new contents, never a partial write.
/// The temp file is removed if any step fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let result = fs::File::create(&temp_path)
        .and_then(|mut file| {
            file.write_all(contents)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp_path, path));

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
