//! # Read Cache
//!
//! Small time-to-live cache for catalog and rental reads.
//! Reads are shared and frequent; the only writes are fills after a fetch
//! and explicit invalidation after a confirmed payment.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tokio::time::Instant;

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Time-to-live cache. An entry older than `ttl` is never served.
///
/// Every invalidation bumps a generation counter. A fill that started before
/// an invalidation goes through [`TtlCache::insert_if_current`] and is dropped.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, Entry<V>>>,
    generation: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value for `key`, if any
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    /// Current invalidation generation; read it before starting a fetch
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Self::store(&mut entries, self.ttl, key, value);
    }

    /// Insert only if nothing was invalidated since `generation` was read.
    /// Returns whether the value was stored.
    pub fn insert_if_current(&self, generation: u64, key: K, value: V) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // invalidation bumps under the same lock
        if self.generation.load(Ordering::Acquire) != generation {
            return false;
        }
        Self::store(&mut entries, self.ttl, key, value);
        true
    }

    /// Mark one entry stale so the next read re-fetches
    pub fn invalidate(&self, key: &K) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.remove(key);
    }

    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    fn store(entries: &mut HashMap<K, Entry<V>>, ttl: Duration, key: K, value: V) {
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of entries that would still be served
    pub fn fresh_len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .values()
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .count()
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache: TtlCache<u64, String> = TtlCache::new(Duration::from_secs(60));
        cache.insert(1, "drill".to_string());

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&1), Some("drill".to_string()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.fresh_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("rentals", 1);
        cache.insert("other", 2);

        cache.invalidate(&"rentals");
        assert_eq!(cache.get(&"rentals"), None);
        assert_eq!(cache.get(&"other"), Some(2));

        cache.invalidate_all();
        assert_eq!(cache.fresh_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_refreshes_timestamp() {
        let cache: TtlCache<u8, u8> = TtlCache::new(Duration::from_secs(10));
        cache.insert(0, 1);
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.insert(0, 2);
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get(&0), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fill_started_before_invalidation_is_dropped() {
        let cache: TtlCache<&'static str, &'static str> = TtlCache::new(Duration::from_secs(60));
        let before = cache.generation();

        cache.invalidate_all();
        assert!(!cache.insert_if_current(before, "rentals", "pending"));
        assert_eq!(cache.get(&"rentals"), None);

        let after = cache.generation();
        assert_ne!(before, after);
        assert!(cache.insert_if_current(after, "rentals", "confirmed"));
        assert_eq!(cache.get(&"rentals"), Some("confirmed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_invalidate_bumps_generation() {
        let cache: TtlCache<u8, u8> = TtlCache::new(Duration::from_secs(60));
        let before = cache.generation();
        cache.invalidate(&1);
        assert!(!cache.insert_if_current(before, 0, 0));
        assert_eq!(cache.fresh_len(), 0);
    }
}
