//! Last known status of every stream seen since startup.
//!
//! Entries are never evicted; the number of distinct stream keys is small.

use parking_lot::RwLock;
use restream_types::{StreamKey, StreamStatus};
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory map from stream key to its most recent status.
#[derive(Debug, Clone, Default)]
pub struct StatusCache {
    inner: Arc<RwLock<HashMap<StreamKey, StreamStatus>>>,
}

impl StatusCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the status stored for a stream key.
    pub fn get(&self, stream_key: &str) -> Option<StreamStatus> {
        self.inner.read().get(stream_key).cloned()
    }

    /// Store a status, replacing whatever was there. Last write wins.
    pub fn set(&self, status: StreamStatus) {
        self.inner.write().insert(status.stream_key.clone(), status);
    }

    /// Copy of every stored status, ordered by stream key.
    pub fn snapshot(&self) -> Vec<StreamStatus> {
        let map = self.inner.read();
        let mut statuses: Vec<StreamStatus> = map.values().cloned().collect();
        statuses.sort_by(|a, b| a.stream_key.cmp(&b.stream_key));
        statuses
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing() {
        let cache = StatusCache::new();
        assert!(cache.get("abc").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let cache = StatusCache::new();
        let key = StreamKey::from("abc");

        cache.set(StreamStatus::live(key.clone(), 3));
        let second = StreamStatus::offline(key);
        cache.set(second.clone());

        assert_eq!(cache.get("abc"), Some(second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_older_update_still_wins_when_written_last() {
        let cache = StatusCache::new();
        let key = StreamKey::from("abc");

        let older = StreamStatus::offline(key.clone());
        let newer = StreamStatus::live(key, 1);
        cache.set(newer);
        cache.set(older.clone());

        assert_eq!(cache.get("abc"), Some(older));
    }

    #[test]
    fn test_snapshot_sorted_by_key() {
        let cache = StatusCache::new();
        cache.set(StreamStatus::offline(StreamKey::from("zeta")));
        cache.set(StreamStatus::live(StreamKey::from("alpha"), 2));

        let keys: Vec<String> = cache
            .snapshot()
            .into_iter()
            .map(|s| s.stream_key.to_string())
            .collect();
        assert_eq!(keys, vec!["alpha", "zeta"]);
    }
}
