//! Bounded Cache
//!
//! Generic key → resource cache with strict LRU eviction.
//!
//! ## Responsibilities
//! - Hold at most `max_entries` live resources (windows, pages)
//! - Close the least-recently-touched resource when the bound is exceeded
//! - Guarantee exactly one creation per key under concurrent callers
//!
//! ## Concurrency Model
//!
//! One `RwLock` guards the map. Lookups take the shared lock; recency is an
//! atomic tick per entry so a hit never needs the exclusive lock. On a miss,
//! [`BoundedCache::get_or_create`] releases the shared lock, takes the
//! exclusive lock, and re-checks before invoking the factory — another thread
//! may have inserted the key in between. All structural mutation (insert,
//! evict, remove, expire) happens under the exclusive lock.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;

/// A cached resource that owns native state released by `close`
///
/// Eviction calls `close`; a resource must tolerate `close` being called
/// more than once.
pub trait Evictable {
    /// Flush and release the underlying resource
    fn close(&self) -> Result<()>;

    /// Whether the resource has already been released
    fn is_closed(&self) -> bool;
}

impl<T: Evictable + ?Sized> Evictable for Arc<T> {
    fn close(&self) -> Result<()> {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

/// One cached value plus its last-touched tick
struct Entry<V> {
    value: V,
    last_used: AtomicU64,
}

/// Capacity-bounded LRU cache of closeable resources
pub struct BoundedCache<K, V> {
    /// `None` = unbounded, eviction disabled
    bound: Option<usize>,

    /// Monotonic recency clock, shared by every entry
    tick: AtomicU64,

    /// Key → entry map; the single lock of this cache level
    entries: RwLock<HashMap<K, Entry<V>>>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Evictable + Clone,
{
    /// Create a cache holding at most `max_entries` values; a negative bound
    /// (conventionally [`crate::config::UNBOUNDED`]) disables eviction
    pub fn new(max_entries: i64) -> Self {
        let bound = usize::try_from(max_entries).ok();
        Self {
            bound,
            tick: AtomicU64::new(0),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up `key`; a hit counts as a recency touch
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        self.touch(entry);
        Some(entry.value.clone())
    }

    /// Return the value for `key`, creating and inserting it on a miss
    ///
    /// Lock protocol: check under the shared lock; on a miss release it,
    /// take the exclusive lock, and re-check before calling `create`. The
    /// factory runs at most once per key regardless of concurrent callers.
    /// A factory failure leaves the cache unchanged.
    pub fn get_or_create<F>(&self, key: K, create: F) -> Result<V>
    where
        F: FnOnce(&K) -> Result<V>,
    {
        {
            let entries = self.entries.read();
            if let Some(entry) = entries.get(&key) {
                self.touch(entry);
                return Ok(entry.value.clone());
            }
        }

        let mut entries = self.entries.write();
        // Re-check: another thread may have created the value while we were
        // between the two locks.
        if let Some(entry) = entries.get(&key) {
            self.touch(entry);
            return Ok(entry.value.clone());
        }

        let value = create(&key)?;
        entries.insert(
            key,
            Entry {
                value: value.clone(),
                last_used: AtomicU64::new(self.next_tick()),
            },
        );
        self.evict_excess(&mut entries);

        Ok(value)
    }

    /// Remove `key` without closing its value (caller-owned release)
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.write();
        entries.remove(key).map(|entry| entry.value)
    }

    /// Close and remove every entry
    ///
    /// Used at shutdown and before bulk full-page rewrites that would
    /// conflict with cached windows. Close failures are logged and the sweep
    /// continues.
    pub fn expire_all(&self) {
        let mut entries = self.entries.write();
        for (key, entry) in entries.drain() {
            if entry.value.is_closed() {
                continue;
            }
            if let Err(e) = entry.value.close() {
                tracing::error!("failed to close cache entry {:?}: {}", key, e);
            }
        }
    }

    /// Number of resident entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of every resident value, without a recency touch
    pub fn values(&self) -> Vec<V> {
        let entries = self.entries.read();
        entries.values().map(|entry| entry.value.clone()).collect()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn touch(&self, entry: &Entry<V>) {
        entry.last_used.store(self.next_tick(), Ordering::Relaxed);
    }

    /// Close and drop least-recently-touched entries until within bound
    ///
    /// Called with the exclusive lock held, right after an insert.
    fn evict_excess(&self, entries: &mut HashMap<K, Entry<V>>) {
        let Some(bound) = self.bound else {
            return;
        };
        while entries.len() > bound {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used.load(Ordering::Relaxed))
                .map(|(key, _)| key.clone());
            let Some(key) = oldest else {
                break;
            };
            if let Some(entry) = entries.remove(&key) {
                tracing::debug!("evicting cache entry {:?}", key);
                if let Err(e) = entry.value.close() {
                    tracing::error!("failed to close evicted entry {:?}: {}", key, e);
                }
            }
        }
    }
}
