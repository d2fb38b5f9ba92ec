//! Read-through caches over engine calls.
//!
//! Both caches take a producer closure instead of an engine, so the caching
//! policy knows nothing about providers. Only error-free, non-empty values
//! are ever written.

mod languages;
mod translations;

pub use languages::{EngineLanguagesCache, LANGUAGES_NAMESPACE, LANGUAGES_TTL};
pub use translations::{TranslationCache, TRANSLATIONS_NAMESPACE, TRANSLATIONS_TTL};

use crate::error::MtResult;
use crate::store::{count_namespace, CacheStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One namespace of a `CacheStore` holding JSON values.
#[derive(Clone)]
struct NamespacedCache {
    store: Arc<dyn CacheStore>,
    namespace: &'static str,
    ttl: Duration,
}

impl NamespacedCache {
    fn new(store: Arc<dyn CacheStore>, namespace: &'static str, ttl: Duration) -> Self {
        Self {
            store,
            namespace,
            ttl,
        }
    }

    /// Stored value for `key`. Store or decoding failures count as a miss.
    fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get_for(self.namespace, key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss in {} for {}", self.namespace, key);
                return None;
            }
            Err(e) => {
                warn!("Cache read failed in {}: {}", self.namespace, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache hit in {} for {}", self.namespace, key);
                Some(value)
            }
            Err(e) => {
                warn!(
                    "Discarding undecodable cache entry in {} for {}: {}",
                    self.namespace, key, e
                );
                None
            }
        }
    }

    /// Write `value` under `key`. Failures are logged, not raised.
    fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to encode cache entry for {}: {}", self.namespace, e);
                return;
            }
        };

        match self.store.save_for(self.namespace, key, &raw, self.ttl) {
            Ok(()) => debug!("Stored {} in {}", key, self.namespace),
            Err(e) => warn!("Cache write failed in {}: {}", self.namespace, e),
        }
    }

    fn count(&self) -> MtResult<usize> {
        count_namespace(self.store.as_ref(), self.namespace)
    }

    /// Drop the namespace and return what is left (0 on success).
    fn clear(&self) -> MtResult<usize> {
        self.store.delete_for(self.namespace)?;
        let remaining = self.count()?;
        info!("Cleared cache {} ({} entries remaining)", self.namespace, remaining);
        Ok(remaining)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::error::{MtError, MtResult};
    use crate::store::{CacheInfo, CacheStore, MemoryCacheStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Memory store that counts writes.
    #[derive(Default)]
    pub struct CountingStore {
        pub inner: MemoryCacheStore,
        pub saves: AtomicUsize,
    }

    impl CountingStore {
        pub fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }
    }

    impl CacheStore for CountingStore {
        fn save_for(&self, ns: &str, key: &str, value: &str, ttl: Duration) -> MtResult<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save_for(ns, key, value, ttl)
        }

        fn get_for(&self, ns: &str, key: &str) -> MtResult<Option<String>> {
            self.inner.get_for(ns, key)
        }

        fn delete_for(&self, ns: &str) -> MtResult<()> {
            self.inner.delete_for(ns)
        }

        fn get_info(&self) -> MtResult<Vec<CacheInfo>> {
            self.inner.get_info()
        }
    }

    /// Store whose every operation fails.
    pub struct BrokenStore;

    impl CacheStore for BrokenStore {
        fn save_for(&self, _: &str, _: &str, _: &str, _: Duration) -> MtResult<()> {
            Err(MtError::Store("disk full".to_string()))
        }

        fn get_for(&self, _: &str, _: &str) -> MtResult<Option<String>> {
            Err(MtError::Store("disk unreadable".to_string()))
        }

        fn delete_for(&self, _: &str) -> MtResult<()> {
            Err(MtError::Store("disk unreadable".to_string()))
        }

        fn get_info(&self) -> MtResult<Vec<CacheInfo>> {
            Err(MtError::Store("disk unreadable".to_string()))
        }
    }
}
