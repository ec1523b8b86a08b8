//! Lookup results keyed by field-tagged request keys.
//!
//! The cache holds at most `capacity` entries and evicts the oldest insert
//! first. Every `clear` starts a new generation; an insert carrying an older
//! generation is dropped, so a lookup that raced a reset cannot repopulate
//! the cache with pre-reset coordinates.

use hashbrown::HashMap;
use std::collections::VecDeque;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use georef::Coordinates;

#[derive(Default)]
struct Entries {
    map: HashMap<String, Coordinates>,
    order: VecDeque<String>,
    generation: u64,
}

pub struct LookupCache {
    capacity: usize,
    entries: RwLock<Entries>,
}

impl LookupCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(Entries::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<Coordinates> {
        self.read().map.get(key).copied()
    }

    /// Current generation; pass it back to [`insert`](Self::insert).
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Store `coordinates` unless the cache was cleared since `generation`
    /// was read. Returns whether the entry was kept.
    pub fn insert(&self, generation: u64, key: String, coordinates: Coordinates) -> bool {
        let mut entries = self.write();
        if entries.generation != generation {
            return false;
        }

        if entries.map.insert(key.clone(), coordinates).is_none() {
            entries.order.push_back(key);
            while entries.order.len() > self.capacity {
                if let Some(oldest) = entries.order.pop_front() {
                    entries.map.remove(&oldest);
                }
            }
        }
        true
    }

    pub fn clear(&self) {
        let mut entries = self.write();
        entries.map.clear();
        entries.order.clear();
        entries.generation += 1;
    }

    pub fn len(&self) -> usize {
        self.read().map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINNIPEG: Coordinates = Coordinates {
        latitude: 49.8844,
        longitude: -97.14704,
    };
    const OTTAWA: Coordinates = Coordinates {
        latitude: 45.41117,
        longitude: -75.69812,
    };

    #[test]
    fn test_insert_get_clear() {
        let cache = LookupCache::new(16);
        let generation = cache.generation();

        assert!(cache.get("abc").is_none());
        assert!(cache.insert(generation, "abc".to_string(), WINNIPEG));
        assert_eq!(cache.get("abc"), Some(WINNIPEG));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.get("abc").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = LookupCache::new(2);
        let generation = cache.generation();

        cache.insert(generation, "a".to_string(), WINNIPEG);
        cache.insert(generation, "b".to_string(), OTTAWA);
        cache.insert(generation, "a".to_string(), OTTAWA);
        assert_eq!(cache.len(), 2);

        cache.insert(generation, "c".to_string(), WINNIPEG);
        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b"), Some(OTTAWA));
        assert_eq!(cache.get("c"), Some(WINNIPEG));
    }

    #[test]
    fn test_insert_after_clear_is_dropped() {
        let cache = LookupCache::new(16);
        let before_reset = cache.generation();

        cache.clear();
        assert!(!cache.insert(before_reset, "abc".to_string(), WINNIPEG));
        assert!(cache.get("abc").is_none());

        assert!(cache.insert(cache.generation(), "abc".to_string(), OTTAWA));
        assert_eq!(cache.get("abc"), Some(OTTAWA));
    }
}
