//! Expiring LRU store for query results.

use std::sync::{Arc, RwLock};

use lru::LruCache;
use metrics::counter;
use time::OffsetDateTime;
use tracing::debug;

use crate::domain::entities::QuestionRecord;

use super::clock::Clock;
use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};
use super::policy::ExpiryPolicy;

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "faqbase_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "faqbase_cache_miss_total";
pub(crate) const METRIC_CACHE_EVICT: &str = "faqbase_cache_evict_total";
pub(crate) const METRIC_CACHE_INVALIDATE: &str = "faqbase_cache_invalidate_total";

/// A cached query result.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Questions(Vec<QuestionRecord>),
    Question(QuestionRecord),
    Count(i64),
}

#[derive(Debug)]
struct Entry {
    value: CachedValue,
    policy: ExpiryPolicy,
    inserted_at: OffsetDateTime,
    last_hit_at: OffsetDateTime,
}

/// Shared, process-wide query cache.
///
/// Safe to use from concurrent requests. Lookups take the write lock because
/// both LRU promotion and sliding expiry mutate the entry.
pub struct QueryCache {
    enabled: bool,
    clock: Arc<dyn Clock>,
    entries: RwLock<LruCache<CacheKey, Entry>>,
}

impl QueryCache {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            enabled: config.enabled,
            clock,
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fresh value for `key`, if any. Expired entries are dropped on sight.
    pub fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        if !self.enabled {
            return None;
        }

        let now = self.clock.now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");

        let expired = match entries.get_mut(key) {
            Some(entry) if !entry.policy.is_expired(entry.inserted_at, entry.last_hit_at, now) => {
                entry.last_hit_at = now;
                counter!(METRIC_CACHE_HIT, "operation" => key.operation()).increment(1);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            debug!(target: "faqbase::cache", key = %key, "Dropped expired cache entry");
        }
        counter!(METRIC_CACHE_MISS, "operation" => key.operation()).increment(1);
        None
    }

    /// Store `value` under `key` with the key's expiry policy.
    pub fn insert(&self, key: CacheKey, value: CachedValue) {
        if !self.enabled {
            return;
        }

        let now = self.clock.now();
        let entry = Entry {
            value,
            policy: key.policy(),
            inserted_at: now,
            last_hit_at: now,
        };

        let displaced = rw_write(&self.entries, SOURCE, "insert").push(key.clone(), entry);
        if let Some((evicted, _)) = displaced
            && evicted != key
        {
            counter!(METRIC_CACHE_EVICT, "operation" => evicted.operation()).increment(1);
            debug!(target: "faqbase::cache", key = %evicted, "Evicted cache entry at capacity");
        }
    }

    /// Drop `key`. Returns whether an entry was present.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = rw_write(&self.entries, SOURCE, "invalidate")
            .pop(key)
            .is_some();
        if removed {
            counter!(METRIC_CACHE_INVALIDATE, "operation" => key.operation()).increment(1);
        }
        removed
    }

    pub fn invalidate_all<'a>(&self, keys: impl IntoIterator<Item = &'a CacheKey>) {
        for key in keys {
            self.invalidate(key);
        }
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    /// Number of stored entries, expired ones included until next touched.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
