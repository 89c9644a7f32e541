// =============================================================================
// TtlCache — time-bounded memoisation keyed by the full argument tuple
// =============================================================================
//
// Each entry holds a value and an absolute expiry instant. A read never
// returns a value whose age exceeds its configured TTL; expired entries are
// simply skipped on read and overwritten on the next insert. Writes are
// last-writer-wins, which is sufficient because each key is computed
// synchronously on demand by the fetcher that owns it.
// =============================================================================

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe map of values with per-entry expiry.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` unless it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let map = self.entries.read();
        map.get(key).and_then(|entry| {
            if Instant::now() < entry.expires_at {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    /// Insert `value` under `key`, valid for `ttl` from now.
    pub fn insert(&self, key: K, value: V, ttl: Duration) {
        let mut map = self.entries.write();
        map.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every entry immediately, regardless of remaining TTL.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of entries currently stored (expired ones included until the
    /// next insert overwrites them).
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<K: Eq + Hash, V: Clone> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.insert("VNM".to_string(), 42, Duration::from_secs(60));
        assert_eq!(cache.get(&"VNM".to_string()), Some(42));
    }

    #[test]
    fn miss_on_absent_key() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        assert_eq!(cache.get(&"FPT".to_string()), None);
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.insert("VNM".to_string(), 42, Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&"VNM".to_string()), None);
    }

    #[test]
    fn distinct_keys_do_not_collide() {
        let cache: TtlCache<(String, i64), u32> = TtlCache::new();
        cache.insert(("VNM".to_string(), 30), 1, Duration::from_secs(60));
        cache.insert(("VNM".to_string(), 365), 2, Duration::from_secs(60));
        assert_eq!(cache.get(&("VNM".to_string(), 30)), Some(1));
        assert_eq!(cache.get(&("VNM".to_string(), 365)), Some(2));
    }

    #[test]
    fn clear_drops_everything() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.insert("VNM".to_string(), 1, Duration::from_secs(60));
        cache.insert("FPT".to_string(), 2, Duration::from_secs(60));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&"VNM".to_string()), None);
    }

    #[test]
    fn insert_overwrites_previous_value() {
        let cache: TtlCache<String, u32> = TtlCache::new();
        cache.insert("VNM".to_string(), 1, Duration::from_secs(60));
        cache.insert("VNM".to_string(), 2, Duration::from_secs(60));
        assert_eq!(cache.get(&"VNM".to_string()), Some(2));
        assert_eq!(cache.len(), 1);
    }
}
