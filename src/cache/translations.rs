use crate::cache::NamespacedCache;
use crate::error::MtResult;
use crate::model::{TranslationRequest, TranslationResult};
use crate::store::CacheStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const TRANSLATIONS_NAMESPACE: &str = "mt_bridge.translations";

/// Translations are kept for a month.
pub const TRANSLATIONS_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Content-addressed cache of translation results, keyed by `TranslationRequest::cache_key`.
#[derive(Clone)]
pub struct TranslationCache {
    inner: NamespacedCache,
}

impl TranslationCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_ttl(store, TRANSLATIONS_TTL)
    }

    pub fn with_ttl(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            inner: NamespacedCache::new(store, TRANSLATIONS_NAMESPACE, ttl),
        }
    }

    /// Return the cached result for `request`, or run `producer` and cache its
    /// result when it has no error and at least one translation.
    ///
    /// On a miss the producer's result is returned as-is (`from_cache == false`),
    /// whether or not it was stored.
    pub async fn get_or_store_new<F, Fut>(
        &self,
        request: &TranslationRequest,
        producer: F,
    ) -> TranslationResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TranslationResult>,
    {
        if let Some(cached) = self.inner.lookup::<TranslationResult>(request.cache_key()) {
            return cached.into_cached();
        }

        let result = producer().await;
        if result.is_cacheable() {
            self.inner.persist(request.cache_key(), &result);
        }
        result
    }

    /// Live entries in the translations namespace.
    pub fn count(&self) -> MtResult<usize> {
        self.inner.count()
    }

    /// Remove every cached translation; returns the post-clear count (0 = success).
    pub fn clear(&self) -> MtResult<usize> {
        self.inner.clear()
    }
}
