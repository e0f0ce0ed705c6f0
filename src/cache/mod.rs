//! # Cache Module
//!
//! Short-lived cache of aggregated search results.
//!
//! Results are keyed by the normalized query plus the exact set of platforms
//! that were searched, so a Spotify-only search never answers a search across
//! every platform. Entries are never served once they are older than the TTL
//! (60 seconds by default, so trending queries stay fresh).
//!
//! ## Configuration
//!
//! ```env
//! RESULT_CACHE_TTL=60s         # 0s disables the cache
//! RESULT_CACHE_CAPACITY=256    # Maximum number of cached searches
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use musichub::cache::{CacheKey, ResultCache};
//! use musichub::sources::PlatformSet;
//! use std::time::Duration;
//!
//! let cache = ResultCache::new(Duration::from_secs(60), 256);
//! let key = CacheKey::new("Get Lucky", PlatformSet::all());
//!
//! cache.put(key.clone(), Vec::new(), PlatformSet::empty());
//! assert!(cache.get(&key).is_some());
//! ```

pub mod ttl_cache;

use std::time::Duration;
use tracing::debug;

use crate::sources::{PlatformSet, Song};
use ttl_cache::TtlCache;

/// Default number of songs returned by [`ResultCache::recent`].
pub const DEFAULT_RECENT_LIMIT: usize = 20;

/// Identifies one aggregated search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    platforms: PlatformSet,
}

impl CacheKey {
    /// Queries differing only in case or surrounding whitespace share an entry.
    pub fn new(query: &str, platforms: PlatformSet) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            platforms,
        }
    }
}

/// A cached search: the merged songs plus the platforms that failed when it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSearch {
    pub songs: Vec<Song>,
    pub failed: PlatformSet,
}

/// Cache of merged search results.
#[derive(Debug, Clone)]
pub struct ResultCache {
    entries: TtlCache<CacheKey, CachedSearch>,
}

impl ResultCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: TtlCache::new(ttl, capacity),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<CachedSearch> {
        let hit = self.entries.get(key);
        match &hit {
            Some(search) => debug!(
                "💾 Cache hit '{}' [{}]: {} canciones, fallidas [{}]",
                key.query,
                key.platforms,
                search.songs.len(),
                search.failed
            ),
            None => debug!("💾 Cache miss '{}' [{}]", key.query, key.platforms),
        }
        hit
    }

    pub fn put(&self, key: CacheKey, songs: Vec<Song>, failed: PlatformSet) {
        self.entries.insert(key, CachedSearch { songs, failed });
    }

    /// Songs from the most recent cached searches, newest search first.
    pub fn recent(&self, limit: usize) -> Vec<Song> {
        self.entries
            .freshest(self.entries.len())
            .into_iter()
            .flat_map(|search| search.songs)
            .take(limit)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.entries.ttl()
    }
}
