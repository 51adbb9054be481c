//! In-memory TTL cache shared by every fetch operation.
//!
//! Entries are keyed by operation, symbol and request parameters. A read strictly before an
//! entry's expiry returns the stored value; a read at or after expiry is a miss. Nothing is
//! evicted except by TTL or [`CacheStore::invalidate_all`].

use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source for expiry checks.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

/// Monotonic wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for deterministic expiry tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("manual clock lock is not poisoned");
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().expect("manual clock lock is not poisoned")
    }
}

/// Cache key: operation name, symbol and request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub operation: &'static str,
    pub symbol: String,
    pub params: String,
}

impl CacheKey {
    pub fn new(
        operation: &'static str,
        symbol: impl Into<String>,
        params: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            symbol: symbol.into(),
            params: params.into(),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.operation, self.symbol, self.params)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner<V> {
    map: HashMap<CacheKey, CacheEntry<V>>,
}

impl<V: Clone> CacheInner<V> {
    fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    fn get(&self, key: &CacheKey, now: Instant) -> Option<V> {
        self.map.get(key).and_then(|entry| {
            if now < entry.expires_at {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    fn put(&mut self, key: CacheKey, value: V, expires_at: Instant) {
        self.map.insert(key, CacheEntry { value, expires_at });
    }

    fn purge_expired(&mut self, now: Instant) {
        self.map.retain(|_, entry| entry.expires_at > now);
    }
}

/// Thread-safe TTL cache.
#[derive(Debug, Clone)]
pub struct CacheStore<V> {
    inner: Arc<tokio::sync::RwLock<CacheInner<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone + Send + Sync> CacheStore<V> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner::new())),
            clock,
        }
    }

    /// Returns the cached value if it has not expired. `Some` is a hit, `None` a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now();
        let store = self.inner.read().await;
        store.get(key, now)
    }

    /// Stores a value for `ttl`. A zero TTL is a no-op, since the entry would already be expired.
    pub async fn put(&self, key: CacheKey, value: V, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }

        let expires_at = self.clock.now() + ttl;
        let mut store = self.inner.write().await;
        store.put(key, value, expires_at);
    }

    /// Drops every entry regardless of expiry.
    pub async fn invalidate_all(&self) {
        let mut store = self.inner.write().await;
        store.map.clear();
    }

    /// Removes expired entries.
    pub async fn purge_expired(&self) {
        let now = self.clock.now();
        let mut store = self.inner.write().await;
        store.purge_expired(now);
    }

    /// Number of entries held, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.map.is_empty()
    }
}

impl<V: Clone + Send + Sync> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(symbol: &str) -> CacheKey {
        CacheKey::new("quote", symbol, "range=1d")
    }

    #[tokio::test]
    async fn test_cache_store_basic_operations() {
        let cache = CacheStore::<String>::new();

        assert!(cache.get(&key("^GSPC")).await.is_none());

        cache
            .put(key("^GSPC"), "value1".to_string(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get(&key("^GSPC")).await, Some("value1".to_string()));

        cache
            .put(key("^GSPC"), "value2".to_string(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get(&key("^GSPC")).await, Some("value2".to_string()));
    }

    #[tokio::test]
    async fn test_cache_expiry_boundary_is_exclusive() {
        let clock = Arc::new(ManualClock::new());
        let cache = CacheStore::<u32>::with_clock(clock.clone());

        cache.put(key("^FTSE"), 7, Duration::from_secs(300)).await;

        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get(&key("^FTSE")).await, Some(7));

        clock.advance(Duration::from_secs(1));
        assert!(cache.get(&key("^FTSE")).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_keys_are_independent() {
        let cache = CacheStore::<u32>::new();

        cache.put(key("^GSPC"), 1, Duration::from_secs(60)).await;
        cache
            .put(
                CacheKey::new("history", "^GSPC", "range=1d"),
                2,
                Duration::from_secs(60),
            )
            .await;

        assert_eq!(cache.get(&key("^GSPC")).await, Some(1));
        assert!(cache.get(&key("SPY")).await.is_none());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_cache_purge_expired() {
        let clock = Arc::new(ManualClock::new());
        let cache = CacheStore::<u32>::with_clock(clock.clone());

        cache.put(key("^GSPC"), 1, Duration::from_secs(10)).await;
        cache.put(key("^N225"), 2, Duration::from_secs(100)).await;

        clock.advance(Duration::from_secs(50));
        cache.purge_expired().await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get(&key("^N225")).await, Some(2));
    }

    #[tokio::test]
    async fn test_cache_invalidate_all() {
        let cache = CacheStore::<u32>::new();

        cache.put(key("^GSPC"), 1, Duration::from_secs(60)).await;
        cache.put(key("^N225"), 2, Duration::from_secs(60)).await;

        assert_eq!(cache.len().await, 2);
        cache.invalidate_all().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_zero_ttl_is_not_stored() {
        let cache = CacheStore::<u32>::new();

        cache.put(key("^GSPC"), 1, Duration::ZERO).await;
        assert!(cache.get(&key("^GSPC")).await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[test]
    fn test_cache_key_display() {
        assert_eq!(key("^GSPC").to_string(), "quote:^GSPC:range=1d");
    }
}
