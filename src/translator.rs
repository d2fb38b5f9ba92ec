//! The translation facade.
//!
//! One `Translator` owns the active engine and both caches. Construct it once
//! at startup and hand out references (or an `Arc`).

use crate::cache::{EngineLanguagesCache, TranslationCache};
use crate::config::Config;
use crate::engine::{EngineRegistry, TranslationEngine};
use crate::error::{ErrorCode, MtError, MtResult};
use crate::http::HttpClient;
use crate::metrics::{CacheKind, MetricsReport, TranslationMetrics};
use crate::model::{
    LanguageCatalog, TranslationOptions, TranslationRequest, TranslationResult, UsageInfo,
};
use crate::store::{CacheStore, SqliteCacheStore};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Live entries per cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheCounts {
    pub translations: usize,
    pub languages: usize,
}

pub struct Translator {
    engine: Box<dyn TranslationEngine>,
    translation_cache: Option<TranslationCache>,
    languages_cache: Option<EngineLanguagesCache>,
    metrics: TranslationMetrics,
}

impl Translator {
    /// Wrap `engine`; with no store, every call goes to the provider.
    pub fn new(engine: Box<dyn TranslationEngine>, store: Option<Arc<dyn CacheStore>>) -> Self {
        Self {
            engine,
            translation_cache: store.clone().map(TranslationCache::new),
            languages_cache: store.map(EngineLanguagesCache::new),
            metrics: TranslationMetrics::new(),
        }
    }

    /// Build the engine named by `config.engine` and, if enabled, the SQLite cache store.
    pub fn from_config(config: &Config) -> MtResult<Self> {
        let http = HttpClient::new(config.connect_timeout)?;
        let engine = EngineRegistry::get().create(&config.engine, config, http)?;

        let store: Option<Arc<dyn CacheStore>> = if config.cache_enabled {
            Some(Arc::new(open_store(&config.cache_path)?))
        } else {
            info!("Translation caching disabled");
            None
        };

        Ok(Self::new(engine, store))
    }

    pub fn engine(&self) -> &dyn TranslationEngine {
        self.engine.as_ref()
    }

    pub fn caching_enabled(&self) -> bool {
        self.translation_cache.is_some()
    }

    /// Translate `content` after resolving both codes against the engine's catalog.
    ///
    /// Codes the engine does not know yield `UNKNOWN_SOURCE` / `UNKNOWN_TARGET`
    /// without a provider call or a translation-cache lookup. If the catalog
    /// itself could not be fetched, its error code is returned instead.
    ///
    /// # Returns
    /// * `Err(MtError::InvalidRequest)` if `content` is empty
    pub async fn translate(
        &self,
        source_language: &str,
        target_language: &str,
        content: Vec<String>,
        options: TranslationOptions,
    ) -> MtResult<TranslationResult> {
        if content.is_empty() {
            return Err(MtError::InvalidRequest(
                "content must contain at least one string".to_string(),
            ));
        }

        let catalog = self.languages().await;
        if let Some(code) = catalog.error() {
            return Ok(TranslationResult::rejected(
                source_language,
                target_language,
                content,
                options,
                code,
            ));
        }

        let Some(source) = catalog.find_by_source(source_language) else {
            debug!("Unknown source language: {}", source_language);
            return Ok(TranslationResult::rejected(
                source_language,
                target_language,
                content,
                options,
                ErrorCode::UnknownSource,
            ));
        };
        let Some(target) = catalog.find_by_target(target_language) else {
            debug!("Unknown target language: {}", target_language);
            return Ok(TranslationResult::rejected(
                source_language,
                target_language,
                content,
                options,
                ErrorCode::UnknownTarget,
            ));
        };

        let request = TranslationRequest::new(
            source.source_code.as_str(),
            target.target_code.as_str(),
            content,
            options,
        )?;

        let result = match &self.translation_cache {
            Some(cache) => {
                let result = cache
                    .get_or_store_new(&request, || self.call_translate(&request))
                    .await;
                self.metrics
                    .record_lookup(CacheKind::Translations, result.from_cache());
                result
            }
            None => self.call_translate(&request).await,
        };

        Ok(result)
    }

    /// The engine's language catalog, cached per engine when caching is on.
    pub async fn languages(&self) -> LanguageCatalog {
        match &self.languages_cache {
            Some(cache) => {
                let catalog = cache
                    .get_or_store_new(self.engine.uuid(), || self.call_get_languages())
                    .await;
                self.metrics
                    .record_lookup(CacheKind::Languages, catalog.from_cache());
                catalog
            }
            None => self.call_get_languages().await,
        }
    }

    /// Provider usage; never cached.
    pub async fn usage(&self) -> UsageInfo {
        let usage = self.engine.get_api_usage().await;
        let failed = matches!(usage.error(), Some(code) if code != ErrorCode::NotImplemented);
        self.metrics.record_provider_call(failed);
        usage
    }

    pub fn cache_counts(&self) -> MtResult<CacheCounts> {
        Ok(CacheCounts {
            translations: match &self.translation_cache {
                Some(cache) => cache.count()?,
                None => 0,
            },
            languages: match &self.languages_cache {
                Some(cache) => cache.count()?,
                None => 0,
            },
        })
    }

    /// Clear both caches; returns the post-clear counts (all zero on success).
    pub fn clear_caches(&self) -> MtResult<CacheCounts> {
        Ok(CacheCounts {
            translations: match &self.translation_cache {
                Some(cache) => cache.clear()?,
                None => 0,
            },
            languages: match &self.languages_cache {
                Some(cache) => cache.clear()?,
                None => 0,
            },
        })
    }

    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }

    async fn call_translate(&self, request: &TranslationRequest) -> TranslationResult {
        let result = self.engine.translate(request).await;
        self.metrics.record_provider_call(result.error().is_some());
        result
    }

    async fn call_get_languages(&self) -> LanguageCatalog {
        let catalog = self.engine.get_languages().await;
        self.metrics.record_provider_call(catalog.error().is_some());
        catalog
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("engine", &self.engine)
            .field("caching_enabled", &self.caching_enabled())
            .finish()
    }
}

fn open_store(path: &str) -> MtResult<SqliteCacheStore> {
    if path != ":memory:" {
        let parent = Path::new(path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            std::fs::create_dir_all(parent).map_err(|e| {
                MtError::Store(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
    }
    SqliteCacheStore::open(path)
}
