//! Value store configuration.
//!
//! Pure data; defaults match the sizes the store has always shipped with.
//! Every field has a default so a config file only needs the values the
//! operator wants to change.

use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`crate::ValueStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueStoreConfig {
    /// Capacity of the ID → value cache.
    pub value_cache_size: usize,
    /// Capacity of the value → ID cache.
    pub value_id_cache_size: usize,
    /// Capacity of the ID → namespace cache.
    pub namespace_cache_size: usize,
    /// Capacity of the namespace → ID cache.
    pub namespace_id_cache_size: usize,
    /// Fsync on every commit instead of letting the engine batch syncs.
    pub force_sync: bool,
}

impl Default for ValueStoreConfig {
    fn default() -> Self {
        Self {
            value_cache_size: 512,
            value_id_cache_size: 128,
            namespace_cache_size: 64,
            namespace_id_cache_size: 32,
            force_sync: false,
        }
    }
}
