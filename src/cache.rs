//! Bounded LRU caches for the four lookup directions.
//!
//! Each direction gets its own lock so reads on one direction never
//! contend with writes on another. Entries are `Arc`-shared with the
//! callers, so a cache hit is a pointer clone.
//!
//! Cached IDs never bypass the revision check: an ID found here is only
//! carried into a value object through the stamping discipline of the
//! store, and `clear()` empties every direction before the store reopens.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;

use crate::revision::StoredValue;
use crate::value::{Value, ValueId};

/// The four most-recently-used maps backing value and namespace lookups.
pub struct ValueCaches {
    id_to_value: RwLock<LruCache<ValueId, Arc<StoredValue>>>,
    value_to_id: RwLock<LruCache<Value, ValueId>>,
    namespace_to_id: RwLock<LruCache<Arc<str>, ValueId>>,
    id_to_namespace: RwLock<LruCache<ValueId, Arc<str>>>,
}

fn bounded<K: std::hash::Hash + Eq, V>(capacity: usize) -> RwLock<LruCache<K, V>> {
    let cap = NonZeroUsize::new(capacity).expect("cache capacity must be > 0");
    RwLock::new(LruCache::new(cap))
}

impl ValueCaches {
    /// Create caches with explicit per-direction capacities.
    pub fn with_capacities(
        value_cache_size: usize,
        value_id_cache_size: usize,
        namespace_cache_size: usize,
        namespace_id_cache_size: usize,
    ) -> Self {
        Self {
            id_to_value: bounded(value_cache_size),
            value_to_id: bounded(value_id_cache_size),
            namespace_to_id: bounded(namespace_id_cache_size),
            id_to_namespace: bounded(namespace_cache_size),
        }
    }

    pub fn value_by_id(&self, id: ValueId) -> Option<Arc<StoredValue>> {
        self.id_to_value.write().get(&id).cloned()
    }

    pub fn put_value(&self, id: ValueId, value: Arc<StoredValue>) {
        self.id_to_value.write().put(id, value);
    }

    pub fn id_by_value(&self, value: &Value) -> Option<ValueId> {
        self.value_to_id.write().get(value).copied()
    }

    pub fn put_value_id(&self, value: Value, id: ValueId) {
        self.value_to_id.write().put(value, id);
    }

    pub fn id_by_namespace(&self, namespace: &str) -> Option<ValueId> {
        self.namespace_to_id.write().get(namespace).copied()
    }

    pub fn put_namespace_id(&self, namespace: Arc<str>, id: ValueId) {
        self.namespace_to_id.write().put(namespace, id);
    }

    pub fn namespace_by_id(&self, id: ValueId) -> Option<Arc<str>> {
        self.id_to_namespace.write().get(&id).cloned()
    }

    pub fn put_namespace(&self, id: ValueId, namespace: Arc<str>) {
        self.id_to_namespace.write().put(id, namespace);
    }

    /// Empty every direction. Called while the catalog write lock is held.
    pub fn clear(&self) {
        self.id_to_value.write().clear();
        self.value_to_id.write().clear();
        self.namespace_to_id.write().clear();
        self.id_to_namespace.write().clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
