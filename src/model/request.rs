use crate::error::{MtError, MtResult};
use crate::model::sha256_hex;
use serde::Serialize;
use std::collections::BTreeMap;

/// Engine-specific request options (formality, split_sentences, ...).
///
/// A `BTreeMap` keeps the key order stable, which the cache key relies on.
pub type TranslationOptions = BTreeMap<String, String>;

/// Fixed field order for hashing. Do not reorder: existing cache keys depend on it.
#[derive(Serialize)]
struct CanonicalRequest<'a> {
    source_language: &'a str,
    target_language: &'a str,
    content: &'a [String],
    options: &'a TranslationOptions,
}

/// An immutable translation request.
///
/// The cache key is derived once at construction; equal inputs always yield
/// equal keys, across calls and process restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    source_language: String,
    target_language: String,
    content: Vec<String>,
    options: TranslationOptions,
    cache_key: String,
}

impl TranslationRequest {
    /// Build a request and derive its cache key.
    ///
    /// # Returns
    /// * `Err(MtError::InvalidRequest)` if a language code is blank or there is
    ///   nothing to translate
    pub fn new(
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        content: Vec<String>,
        options: TranslationOptions,
    ) -> MtResult<Self> {
        let source_language = source_language.into();
        let target_language = target_language.into();

        if source_language.trim().is_empty() {
            return Err(MtError::InvalidRequest(
                "source language cannot be empty".to_string(),
            ));
        }
        if target_language.trim().is_empty() {
            return Err(MtError::InvalidRequest(
                "target language cannot be empty".to_string(),
            ));
        }
        if content.is_empty() {
            return Err(MtError::InvalidRequest(
                "content must contain at least one string".to_string(),
            ));
        }

        let cache_key = compute_cache_key(&source_language, &target_language, &content, &options)?;

        Ok(Self {
            source_language,
            target_language,
            content,
            options,
            cache_key,
        })
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn content(&self) -> &[String] {
        &self.content
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    /// Look up a single option value.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Hex-encoded SHA-256 of the canonical request serialization.
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }
}

fn compute_cache_key(
    source_language: &str,
    target_language: &str,
    content: &[String],
    options: &TranslationOptions,
) -> MtResult<String> {
    let canonical = serde_json::to_vec(&CanonicalRequest {
        source_language,
        target_language,
        content,
        options,
    })?;
    Ok(sha256_hex(&canonical))
}
