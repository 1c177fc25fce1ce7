//! Write-through TTL cache over the last committed order snapshots.
//!
//! A bounded-lifetime, unbounded-capacity map: entries decay after a fixed
//! TTL and are swept lazily on read plus periodically via
//! [`TtlCache::invalidate_expired`]. There is no LRU or capacity eviction.
//!
//! The whole key space is guarded by one reader/writer lock. That
//! serializes all cache traffic; per-shard locking could replace it without
//! changing the observable contract.
//!
//! Expiry is wall-clock based (see [`Clock`]): clock adjustments can make
//! entries decay early or late.

use crate::environment::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// A cached value with its absolute expiry instant.
///
/// An entry whose expiry has passed is logically absent even while it is
/// still physically present in the map.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    /// Wrap a value expiring at the given instant.
    pub const fn new(value: V, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    /// An entry is live only while its expiry is strictly in the future.
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// The cached value.
    pub const fn value(&self) -> &V {
        &self.value
    }
}

/// Keyed TTL cache, safe under concurrent unsynchronized callers.
#[derive(Debug)]
pub struct TtlCache<K, V, C = SystemClock> {
    ttl: Duration,
    clock: C,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Create a cache whose entries live for `ttl` after each write.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<K: Eq + Hash, V: Clone, C: Clock> TtlCache<K, V, C> {
    /// Create a cache reading "now" from the supplied clock.
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: C) -> Self {
        Self {
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store `value` under `key`, expiring at `now + ttl`.
    ///
    /// `now` is passed in by the caller so that the expiry is anchored to
    /// the instant of the successful durable write being mirrored, not to
    /// the moment this method happens to run.
    pub fn set(&self, key: K, value: V, now: DateTime<Utc>) {
        let entry = CacheEntry::new(value, now + self.ttl);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    /// Look up a live entry. Decayed entries read as absent even while
    /// still physically stored.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| !entry.expired(now))
            .map(|entry| entry.value().clone())
    }

    /// Remove an entry unconditionally.
    pub fn delete(&self, key: &K) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Sweep every entry whose expiry has passed.
    ///
    /// Scheduling the sweep (e.g. once per minute) is the caller's concern;
    /// only the primitive lives here.
    pub fn invalidate_expired(&self) {
        let now = self.clock.now();
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, entry| !entry.expired(now));
    }

    /// Number of physically stored entries, including decayed ones.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the map holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;

    /// Clock whose reading the test controls.
    #[derive(Clone)]
    struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

    impl ManualClock {
        fn new(start: DateTime<Utc>) -> Self {
            Self(Arc::new(Mutex::new(start)))
        }

        fn advance(&self, by: Duration) {
            let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            *guard += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    fn start() -> DateTime<Utc> {
        chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 8, 30, 12, 0, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn get_returns_live_entries() {
        let clock = ManualClock::new(start());
        let cache: TtlCache<i64, String, _> =
            TtlCache::with_clock(Duration::minutes(5), clock.clone());

        cache.set(1, "parcel".to_string(), clock.now());

        assert_eq!(cache.get(&1).as_deref(), Some("parcel"));
        assert_eq!(cache.get(&2), None);
    }

    #[test]
    fn entry_at_exact_expiry_instant_is_a_miss() {
        let clock = ManualClock::new(start());
        let cache: TtlCache<i64, String, _> =
            TtlCache::with_clock(Duration::minutes(5), clock.clone());
        cache.set(1, "parcel".to_string(), clock.now());

        clock.advance(Duration::minutes(5));

        assert_eq!(cache.get(&1), None);
        // Physically still present until swept.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn delete_removes_unconditionally() {
        let clock = ManualClock::new(start());
        let cache: TtlCache<i64, String, _> =
            TtlCache::with_clock(Duration::minutes(5), clock.clone());
        cache.set(1, "parcel".to_string(), clock.now());

        cache.delete(&1);

        assert_eq!(cache.get(&1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn sweep_removes_only_decayed_entries() {
        let clock = ManualClock::new(start());
        let cache: TtlCache<i64, String, _> =
            TtlCache::with_clock(Duration::minutes(5), clock.clone());

        cache.set(1, "old".to_string(), clock.now());
        clock.advance(Duration::minutes(4));
        cache.set(2, "fresh".to_string(), clock.now());
        clock.advance(Duration::minutes(2));

        cache.invalidate_expired();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2).as_deref(), Some("fresh"));
    }

    #[test]
    fn rewrite_extends_the_lifetime() {
        let clock = ManualClock::new(start());
        let cache: TtlCache<i64, String, _> =
            TtlCache::with_clock(Duration::minutes(5), clock.clone());

        cache.set(1, "v1".to_string(), clock.now());
        clock.advance(Duration::minutes(4));
        cache.set(1, "v2".to_string(), clock.now());
        clock.advance(Duration::minutes(4));

        assert_eq!(cache.get(&1).as_deref(), Some("v2"));
    }

    #[test]
    fn concurrent_writers_and_readers_do_not_lose_the_map() {
        let cache: Arc<TtlCache<i64, i64>> = Arc::new(TtlCache::new(Duration::minutes(5)));
        let now = Utc::now();

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        cache.set(t * 100 + i, i, now);
                    }
                })
            })
            .collect();
        for writer in writers {
            let joined = writer.join();
            assert!(joined.is_ok());
        }

        assert_eq!(cache.len(), 400);
    }
}
