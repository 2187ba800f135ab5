use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use log::debug;

use crate::config::settings::CacheSettings;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Bounded in-memory cache with a per-entry time to live.
///
/// Owned by a repository; never shared as global state. When full, the
/// oldest entry is evicted.
pub struct TtlCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    capacity: usize,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(1024)),
            capacity,
            ttl,
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.capacity, Duration::from_secs(settings.ttl_secs))
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => self.is_expired(entry, now),
            None => return None,
        };

        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    fn insert_at(&mut self, key: K, value: V, now: Instant) {
        if self.capacity == 0 {
            return;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict(now);
        }

        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
            },
        );
    }

    /// Drops expired entries, then the oldest one if still full
    fn evict(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < ttl);

        if self.entries.len() < self.capacity {
            return;
        }

        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            debug!("Cache full, evicting oldest entry");
            self.entries.remove(&key);
        }
    }

    fn is_expired(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) >= self.ttl
    }
}
