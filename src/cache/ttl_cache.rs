use dashmap::DashMap;
use std::{
    hash::Hash,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::debug;

/// Cache entry with its insertion instant
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

/// Concurrent map whose entries expire after a fixed TTL.
///
/// Bounded by `capacity`: inserting a new key into a full cache evicts the
/// oldest entry first.
#[derive(Debug)]
pub struct TtlCache<K: Clone + Eq + Hash, V> {
    data: Arc<DashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        if !self.data.contains_key(&key) && self.data.len() >= self.capacity {
            self.cleanup_expired();
            if self.data.len() >= self.capacity {
                self.evict_oldest();
            }
        }
        self.data.insert(key, CacheEntry::new(value)).map(|old| old.value)
    }

    /// Returns the value unless it is older than the TTL, in which case it is dropped.
    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(entry) = self.data.get(key) {
            if !entry.is_expired(self.ttl) {
                return Some(entry.value.clone());
            }
        }

        let ttl = self.ttl;
        self.data.remove_if(key, |_, entry| entry.is_expired(ttl));
        None
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Unexpired values, newest first.
    pub fn freshest(&self, limit: usize) -> Vec<V> {
        let mut live: Vec<(Instant, V)> = self
            .data
            .iter()
            .filter(|entry| !entry.value().is_expired(self.ttl))
            .map(|entry| (entry.value().inserted_at, entry.value().value.clone()))
            .collect();

        live.sort_by(|a, b| b.0.cmp(&a.0));
        live.into_iter().take(limit).map(|(_, value)| value).collect()
    }

    /// Removes expired entries and returns how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let before = self.data.len();
        let ttl = self.ttl;
        self.data.retain(|_, entry| !entry.is_expired(ttl));
        let removed = before.saturating_sub(self.data.len());

        if removed > 0 {
            debug!("Limpiadas {} entradas expiradas del cache", removed);
        }

        removed
    }

    fn evict_oldest(&self) {
        let oldest = self
            .data
            .iter()
            .min_by_key(|entry| entry.value().inserted_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.data.remove(&key);
        }
    }
}

impl<K, V> Clone for TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            ttl: self.ttl,
            capacity: self.capacity,
        }
    }
}
