//! Namespaced key/value storage with TTL, shared by both caches.
//!
//! An expired entry is invisible to `get_for` and `get_info`. The memory store
//! drops expired entries on every write; the sqlite store removes them when
//! overwritten or when their namespace is cleared.

mod memory;
mod sqlite;

pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;

use crate::error::{MtError, MtResult};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// One live entry as reported by `CacheStore::get_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheInfo {
    /// `"<namespace>:<key>"`
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

/// Key/value store partitioned into namespaces.
///
/// Implementations must make single-key get/set atomic. Nothing more is
/// expected: concurrent writers of the same key simply overwrite each other.
pub trait CacheStore: Send + Sync {
    /// Store `value` under `namespace`/`key`, replacing any existing entry.
    fn save_for(&self, namespace: &str, key: &str, value: &str, ttl: Duration) -> MtResult<()>;

    /// Fetch a live entry.
    fn get_for(&self, namespace: &str, key: &str) -> MtResult<Option<String>>;

    /// Remove every entry in `namespace`.
    fn delete_for(&self, namespace: &str) -> MtResult<()>;

    /// Describe every live entry across all namespaces.
    fn get_info(&self) -> MtResult<Vec<CacheInfo>>;
}

/// Name under which an entry is reported by `get_info`.
pub fn entry_name(namespace: &str, key: &str) -> String {
    format!("{}:{}", namespace, key)
}

/// Count live entries of `namespace` by name prefix.
pub fn count_namespace(store: &dyn CacheStore, namespace: &str) -> MtResult<usize> {
    let prefix = format!("{}:", namespace);
    Ok(store
        .get_info()?
        .iter()
        .filter(|info| info.name.starts_with(&prefix))
        .count())
}

fn expiry_from_now(ttl: Duration) -> MtResult<DateTime<Utc>> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| MtError::Store(format!("TTL out of range: {}", e)))?;
    Utc::now().checked_add_signed(ttl).ok_or_else(|| {
        MtError::Store(format!(
            "TTL of {}s overflows the expiry time",
            ttl.num_seconds()
        ))
    })
}
