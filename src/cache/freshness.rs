//! Mtime-based freshness of cache entries
//!
//! A cache entry is the only thing this crate writes next to its source, so
//! its modification time is a reliable signal: an entry strictly newer than
//! the source it was rendered from is still valid.

use std::path::Path;
use std::time::SystemTime;

/// How a cache entry's validity is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Valid iff the entry is strictly newer than this source mtime
    NewerThan(Option<SystemTime>),
    /// Valid iff the entry exists
    Exists,
}

/// Modification time of `path`, if it exists and can be read
pub async fn get_mtime(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path)
        .await
        .and_then(|m| m.modified())
        .ok()
}

/// Whether the entry at `entry` satisfies `rule`
pub async fn is_entry_fresh(entry: &Path, rule: Freshness) -> bool {
    let Some(entry_time) = get_mtime(entry).await else {
        return false;
    };

    match rule {
        Freshness::Exists => true,
        Freshness::NewerThan(Some(source_time)) => entry_time > source_time,
        Freshness::NewerThan(None) => false,
    }
}
