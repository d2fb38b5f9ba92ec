use crate::cache::NamespacedCache;
use crate::error::MtResult;
use crate::model::{sha256_hex, LanguageCatalog};
use crate::store::CacheStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const LANGUAGES_NAMESPACE: &str = "mt_bridge.engine_languages";

/// Catalogs are refreshed weekly.
pub const LANGUAGES_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Per-engine cache of language catalogs, keyed by a hash of the engine's UUID.
#[derive(Clone)]
pub struct EngineLanguagesCache {
    inner: NamespacedCache,
}

impl EngineLanguagesCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_ttl(store, LANGUAGES_TTL)
    }

    pub fn with_ttl(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            inner: NamespacedCache::new(store, LANGUAGES_NAMESPACE, ttl),
        }
    }

    /// Cache key for an engine.
    pub fn key_for(engine_uuid: &str) -> String {
        sha256_hex(engine_uuid.as_bytes())
    }

    /// Return the cached catalog for the engine, or run `producer` and cache a
    /// non-empty, error-free catalog.
    pub async fn get_or_store_new<F, Fut>(&self, engine_uuid: &str, producer: F) -> LanguageCatalog
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LanguageCatalog>,
    {
        let key = Self::key_for(engine_uuid);
        if let Some(cached) = self.inner.lookup::<LanguageCatalog>(&key) {
            return cached.into_cached();
        }

        let catalog = producer().await;
        if catalog.is_cacheable() {
            self.inner.persist(&key, &catalog);
        }
        catalog
    }

    pub fn count(&self) -> MtResult<usize> {
        self.inner.count()
    }

    /// Remove every cached catalog; returns the post-clear count (0 = success).
    pub fn clear(&self) -> MtResult<usize> {
        self.inner.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::CountingStore;
    use crate::error::ErrorCode;
    use crate::model::EngineLanguage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ENGINE_A: &str = "0d9c4a6e-5d7b-4c59-9c64-6f2a4f1f7d01";
    const ENGINE_B: &str = "5f3b7c1a-2e44-4b8f-a1d6-93c0e2b8a402";

    fn catalog() -> LanguageCatalog {
        LanguageCatalog::new(vec![EngineLanguage::new("English", "EN", "German", "DE")])
    }

    #[test]
    fn test_key_is_stable_per_engine() {
        assert_eq!(
            EngineLanguagesCache::key_for(ENGINE_A),
            EngineLanguagesCache::key_for(ENGINE_A)
        );
        assert_ne!(
            EngineLanguagesCache::key_for(ENGINE_A),
            EngineLanguagesCache::key_for(ENGINE_B)
        );
        assert_eq!(EngineLanguagesCache::key_for(ENGINE_A).len(), 64);
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let store = Arc::new(CountingStore::default());
        let cache = EngineLanguagesCache::new(store.clone());
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_store_new(ENGINE_A, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                catalog()
            })
            .await;
        let second = cache
            .get_or_store_new(ENGINE_A, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                LanguageCatalog::new(vec![])
            })
            .await;

        assert!(!first.from_cache());
        assert!(second.from_cache());
        assert_eq!(second.languages(), first.languages());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.saves(), 1);
    }

    #[tokio::test]
    async fn test_engines_do_not_share_entries() {
        let cache = EngineLanguagesCache::new(Arc::new(CountingStore::default()));

        cache.get_or_store_new(ENGINE_A, || async { catalog() }).await;
        let other = cache
            .get_or_store_new(ENGINE_B, || async {
                LanguageCatalog::new(vec![EngineLanguage::new("French", "FR", "French", "FR")])
            })
            .await;

        assert!(!other.from_cache());
        assert_eq!(other.languages()[0].target_code, "FR");
        assert_eq!(cache.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failed_catalog_is_never_stored() {
        let store = Arc::new(CountingStore::default());
        let cache = EngineLanguagesCache::new(store.clone());
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result = cache
                .get_or_store_new(ENGINE_A, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    LanguageCatalog::failure(ErrorCode::AuthenticationFailed)
                })
                .await;
            assert!(!result.from_cache());
            assert_eq!(result.error(), Some(ErrorCode::AuthenticationFailed));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = EngineLanguagesCache::new(Arc::new(CountingStore::default()));
        cache.get_or_store_new(ENGINE_A, || async { catalog() }).await;
        assert_eq!(cache.count().unwrap(), 1);
        assert_eq!(cache.clear().unwrap(), 0);
        assert_eq!(cache.count().unwrap(), 0);
    }
}
