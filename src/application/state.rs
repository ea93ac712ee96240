//! # Bot State
//!
//! Persistent cache of already-handled message IDs, so a restart does not
//! replay pings for messages the bot already answered. Capped FIFO with a
//! hash index for lookups; serialized to `data/state.json`.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fs;

const STATE_PATH: &str = "data/state.json";
const CAPACITY: usize = 10_000;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SeenCache {
    #[serde(default)]
    ids: VecDeque<String>,
    /// Lookup index over `ids`; rebuilt on load, never serialized.
    #[serde(skip)]
    index: HashSet<String>,
}

impl SeenCache {
    /// Loads the cache from `data/state.json` or returns an empty one.
    pub fn load() -> Self {
        if let Ok(content) = fs::read_to_string(STATE_PATH)
            && let Ok(mut cache) = serde_json::from_str::<Self>(&content)
        {
            cache.ids.truncate(CAPACITY);
            cache.hydrate();
            return cache;
        }
        Self::default()
    }

    fn hydrate(&mut self) {
        self.index = self.ids.iter().cloned().collect();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Record a handled message, evicting the oldest entry at capacity.
    pub fn insert(&mut self, id: &str) {
        if !self.index.insert(id.to_string()) {
            return;
        }
        if self.ids.len() >= CAPACITY
            && let Some(evicted) = self.ids.pop_front()
        {
            self.index.remove(&evicted);
        }
        self.ids.push_back(id.to_string());
    }

    /// Persists the cache to `data/state.json`.
    pub fn save(&self) {
        match serde_json::to_string(self) {
            Ok(content) => {
                if let Err(e) = fs::write(STATE_PATH, content) {
                    tracing::warn!("Could not write {}: {}", STATE_PATH, e);
                }
            }
            Err(e) => tracing::warn!("Could not serialize seen cache: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut cache = SeenCache::default();
        cache.insert("$event1");
        assert!(cache.contains("$event1"));
        assert!(!cache.contains("$event2"));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut cache = SeenCache::default();
        cache.insert("$event1");
        cache.insert("$event1");
        assert_eq!(cache.ids.len(), 1);
    }

    #[test]
    fn test_eviction_at_capacity() {
        let mut cache = SeenCache::default();
        for i in 0..CAPACITY + 1 {
            cache.insert(&format!("$event{i}"));
        }
        assert_eq!(cache.ids.len(), CAPACITY);
        assert_eq!(cache.index.len(), CAPACITY);
        assert!(!cache.contains("$event0"));
        assert!(cache.contains(&format!("$event{CAPACITY}")));
    }

    #[test]
    fn test_index_rebuilt_after_deserialization() {
        let mut cache = SeenCache::default();
        cache.insert("$event1");
        cache.insert("$event2");

        let json = serde_json::to_string(&cache).unwrap();
        let mut restored: SeenCache = serde_json::from_str(&json).unwrap();
        assert!(!restored.contains("$event1"));

        restored.hydrate();
        assert!(restored.contains("$event1"));
        assert!(restored.contains("$event2"));
        assert!(!restored.contains("$event3"));
    }
}
