//! Response-level memoization keyed by request parameters.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Caches fully rendered response payloads for identical request
/// parameters. A `None` TTL means entries never expire.
pub struct ResponseCache {
    ttl: Option<Duration>,
    entries: DashMap<String, CacheEntry>,
}

#[derive(Clone)]
struct CacheEntry {
    stored_at: Instant,
    body: serde_json::Value,
}

impl ResponseCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    /// Look up a cached payload, evicting it first if it has expired.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entry = self.entries.get(key)?;

        if let Some(ttl) = self.ttl {
            if entry.stored_at.elapsed() >= ttl {
                // Drop the shard guard before removing to avoid deadlock.
                drop(entry);
                self.entries.remove(key);
                return None;
            }
        }

        Some(entry.body.clone())
    }

    pub fn insert(&self, key: impl Into<String>, body: serde_json::Value) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                stored_at: Instant::now(),
                body,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hit_returns_stored_payload() {
        let cache = ResponseCache::unbounded();
        cache.insert("books:list:page=0", json!({"total": 3}));

        assert_eq!(cache.get("books:list:page=0"), Some(json!({"total": 3})));
        assert_eq!(cache.get("books:list:page=1"), None);
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = ResponseCache::new(Some(Duration::ZERO));
        cache.insert("key", json!(1));

        assert_eq!(cache.get("key"), None);
        // Expired entries are evicted, not just skipped.
        assert!(cache.is_empty());
    }

    #[test]
    fn unbounded_entries_survive() {
        let cache = ResponseCache::unbounded();
        cache.insert("key", json!(1));

        assert_eq!(cache.get("key"), Some(json!(1)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn generous_ttl_serves_fresh_entries() {
        let cache = ResponseCache::new(Some(Duration::from_secs(300)));
        cache.insert("key", json!({"items": []}));

        assert_eq!(cache.get("key"), Some(json!({"items": []})));
    }
}
