//! Per-facade counters for cache lookups and provider calls.
//!
//! Each `Translator` owns one, so two facades in one process never share numbers.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Which cache a facade lookup went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Translations,
    Languages,
}

#[derive(Debug, Default)]
struct HitMiss {
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl HitMiss {
    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> LookupCounts {
        LookupCounts {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    translations: HitMiss,
    languages: HitMiss,
    provider_ok: AtomicUsize,
    provider_failed: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_lookup(&self, kind: CacheKind, from_cache: bool) {
        match kind {
            CacheKind::Translations => self.translations.record(from_cache),
            CacheKind::Languages => self.languages.record(from_cache),
        }
    }

    /// One round trip to the provider, successful unless `failed`.
    pub fn record_provider_call(&self, failed: bool) {
        let counter = if failed {
            &self.provider_failed
        } else {
            &self.provider_ok
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> MetricsReport {
        let translations = self.translations.snapshot();
        let languages = self.languages.snapshot();
        let ok = self.provider_ok.load(Ordering::Relaxed);
        let failed = self.provider_failed.load(Ordering::Relaxed);

        let cache_hits = translations.hits + languages.hits;
        let cache_misses = translations.misses + languages.misses;

        MetricsReport {
            cache_hits,
            cache_misses,
            cache_hit_rate: rate(cache_hits, cache_hits + cache_misses),
            translations,
            languages,
            api_calls: ok + failed,
            api_failures: failed,
            api_success_rate: rate(ok, ok + failed),
        }
    }
}

/// Percentage, or `None` before anything was counted.
fn rate(part: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| part as f64 * 100.0 / total as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LookupCounts {
    pub hits: usize,
    pub misses: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    /// Totals over both caches.
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_hit_rate: Option<f64>,
    pub translations: LookupCounts,
    pub languages: LookupCounts,
    pub api_calls: usize,
    pub api_failures: usize,
    pub api_success_rate: Option<f64>,
}
