//! Time-to-live cache with bounded capacity.

use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    last_access: Instant,
}

/// A string-keyed cache where entries expire after `ttl` without access.
///
/// Reads refresh the access timestamp but not the eviction order: when the
/// cache is full, the entry inserted earliest is dropped. Expiry is checked
/// lazily on read.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache holding at most `max_entries` values (minimum 1).
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a live value, dropping it first if it has expired.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let expired = match entries.peek_mut(key) {
            Some(entry) if now.duration_since(entry.last_access) <= self.ttl => {
                entry.last_access = now;
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
        }
        None
    }

    /// Insert or replace a value. Evicts the oldest entry when full.
    pub async fn insert(&self, key: String, value: V) {
        let entry = CacheEntry {
            value,
            last_access: Instant::now(),
        };
        self.entries.lock().await.put(key, entry);
    }

    pub async fn remove(&self, key: &str) -> Option<V> {
        self.entries.lock().await.pop(key).map(|e| e.value)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = TtlCache::new(Duration::from_secs(60), 10);
        cache.insert("a".to_string(), 1).await;

        assert_eq!(cache.get("a").await, Some(1));
        assert_eq!(cache.get("b").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(10), 10);
        cache.insert("a".to_string(), 1).await;

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.get("a").await, Some(1));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get("a").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_access_extends_lifetime() {
        let cache = TtlCache::new(Duration::from_secs(10), 10);
        cache.insert("a".to_string(), 1).await;

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("a").await, Some(1));

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get("a").await, Some(1));
    }

    #[tokio::test]
    async fn test_evicts_oldest_inserted_when_full() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        cache.insert("first".to_string(), 1).await;
        cache.insert("second".to_string(), 2).await;

        // Reading does not protect an entry from eviction
        assert_eq!(cache.get("first").await, Some(1));

        cache.insert("third".to_string(), 3).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("first").await, None);
        assert_eq!(cache.get("second").await, Some(2));
        assert_eq!(cache.get("third").await, Some(3));
    }

    #[tokio::test]
    async fn test_zero_capacity_holds_one_entry() {
        let cache = TtlCache::new(Duration::from_secs(60), 0);
        cache.insert("a".to_string(), 1).await;
        cache.insert("b".to_string(), 2).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("b").await, Some(2));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = TtlCache::new(Duration::from_secs(60), 10);
        cache.insert("a".to_string(), 1).await;
        cache.insert("b".to_string(), 2).await;

        assert_eq!(cache.remove("a").await, Some(1));
        assert_eq!(cache.remove("a").await, None);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
