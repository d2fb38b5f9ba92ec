//! DeepL API v2 adapter.

use crate::config::DeepLConfig;
use crate::engine::{
    decode_failure, provider_failure, transport_failure, IgnoredStrings, TranslationEngine,
    IGNORE_TAG,
};
use crate::error::{ErrorCode, MtError, MtResult};
use crate::http::{HttpClient, Method, MultiValueQuery};
use crate::model::{
    EngineLanguage, LanguageCatalog, TranslationRequest, TranslationResult, Usage, UsageInfo,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

pub(crate) const ENGINE_ID: &str = "deepl";
pub(crate) const ENGINE_LABEL: &str = "DeepL";
pub(crate) const ENGINE_UUID: &str = "7a2f6c3e-1b8d-4e5a-9c0f-d3e4b5a69781";

const FREE_API_URL: &str = "https://api-free.deepl.com";
const PRO_API_URL: &str = "https://api.deepl.com";

/// Request options forwarded to DeepL as-is. `formality` is handled apart.
const PASS_THROUGH_OPTIONS: &[&str] = &[
    "split_sentences",
    "preserve_formatting",
    "context",
    "glossary_id",
];

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
struct TranslatedText {
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DeepLLanguage {
    language: String,
    name: String,
    #[serde(default)]
    supports_formality: bool,
}

#[derive(Debug, Deserialize)]
struct UsageResponse {
    character_count: u64,
    character_limit: u64,
}

pub struct DeepLEngine {
    auth_key: String,
    api_url: String,
    formality: Option<String>,
    ignored: Option<IgnoredStrings>,
    http: HttpClient,
}

impl DeepLEngine {
    /// # Returns
    /// * `Err(MtError::Config)` if no auth key is configured
    pub fn new(config: &DeepLConfig, http: HttpClient) -> MtResult<Self> {
        let auth_key = config
            .auth_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| MtError::Config("DeepL auth key is not set".to_string()))?;

        let api_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| Self::default_api_url(&auth_key).to_string());

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            formality: config.formality.clone(),
            ignored: IgnoredStrings::new(config.ignored_strings.iter().cloned())?,
            auth_key,
            http,
        })
    }

    /// Free-tier keys end in `:fx` and are only accepted by the free host.
    pub fn default_api_url(auth_key: &str) -> &'static str {
        if auth_key.ends_with(":fx") {
            FREE_API_URL
        } else {
            PRO_API_URL
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn auth_header(&self) -> [(&'static str, String); 1] {
        [("Authorization", format!("DeepL-Auth-Key {}", self.auth_key))]
    }

    fn build_translate_form(&self, request: &TranslationRequest) -> MultiValueQuery {
        let mut form = MultiValueQuery::new();

        let content = request.content().iter();
        match &self.ignored {
            Some(ignored) => form.extend("text", content.map(|c| ignored.wrap(c))),
            None => form.extend("text", content.cloned()),
        };
        form.push("source_lang", source_lang_param(request.source_language()));
        form.push("target_lang", request.target_language().to_uppercase());

        let formality = request.option("formality").or(self.formality.as_deref());
        if let Some(formality) = formality {
            form.push("formality", formality);
        }
        for key in PASS_THROUGH_OPTIONS {
            if let Some(value) = request.option(key) {
                form.push(*key, value);
            }
        }
        if self.ignored.is_some() {
            form.push("tag_handling", "xml");
            form.push("ignore_tags", IGNORE_TAG);
        }

        form
    }

    async fn request_translations(
        &self,
        request: &TranslationRequest,
    ) -> Result<Vec<String>, ErrorCode> {
        let url = format!("{}/v2/translate", self.api_url);
        let form = self.build_translate_form(request);

        let response = self
            .http
            .perform(Method::POST, &url, &self.auth_header(), Some(&form))
            .await
            .map_err(|e| transport_failure(ENGINE_LABEL, &e))?;

        if !response.is_success() {
            return Err(provider_failure(
                ENGINE_LABEL,
                &response,
                map_status(response.status),
            ));
        }

        let parsed: TranslateResponse =
            serde_json::from_str(&response.body).map_err(|e| decode_failure(ENGINE_LABEL, &e))?;

        if parsed.translations.len() != request.content().len() {
            warn!(
                "DeepL returned {} translations for {} strings",
                parsed.translations.len(),
                request.content().len()
            );
            return Err(ErrorCode::UnknownError);
        }

        let translations = parsed
            .translations
            .into_iter()
            .map(|t| match &self.ignored {
                Some(ignored) => ignored.unwrap(&t.text),
                None => t.text,
            })
            .collect::<Vec<_>>();

        if let Some(ignored) = &self.ignored {
            for (original, translated) in request.content().iter().zip(&translations) {
                for issue in ignored.check_preserved(original, translated) {
                    warn!("DeepL translation quality: {}", issue);
                }
            }
        }

        Ok(translations)
    }

    async fn fetch_languages(&self, kind: &str) -> Result<Vec<DeepLLanguage>, ErrorCode> {
        let url = format!("{}/v2/languages?type={}", self.api_url, kind);

        let response = self
            .http
            .perform(Method::GET, &url, &self.auth_header(), None)
            .await
            .map_err(|e| transport_failure(ENGINE_LABEL, &e))?;

        if !response.is_success() {
            return Err(provider_failure(
                ENGINE_LABEL,
                &response,
                map_status(response.status),
            ));
        }

        serde_json::from_str(&response.body).map_err(|e| decode_failure(ENGINE_LABEL, &e))
    }

    async fn fetch_usage(&self) -> Result<Usage, ErrorCode> {
        let url = format!("{}/v2/usage", self.api_url);

        let response = self
            .http
            .perform(Method::GET, &url, &self.auth_header(), None)
            .await
            .map_err(|e| transport_failure(ENGINE_LABEL, &e))?;

        if !response.is_success() {
            return Err(provider_failure(
                ENGINE_LABEL,
                &response,
                map_status(response.status),
            ));
        }

        let usage: UsageResponse =
            serde_json::from_str(&response.body).map_err(|e| decode_failure(ENGINE_LABEL, &e))?;

        Ok(Usage {
            character_count: usage.character_count,
            character_limit: usage.character_limit,
        })
    }
}

impl std::fmt::Debug for DeepLEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepLEngine")
            .field("auth_key", &"***")
            .field("api_url", &self.api_url)
            .field("formality", &self.formality)
            .field("ignored", &self.ignored.as_ref().map(|i| i.strings().len()))
            .finish()
    }
}

#[async_trait]
impl TranslationEngine for DeepLEngine {
    fn id(&self) -> &'static str {
        ENGINE_ID
    }

    fn label(&self) -> &'static str {
        ENGINE_LABEL
    }

    fn uuid(&self) -> &'static str {
        ENGINE_UUID
    }

    async fn translate(&self, request: &TranslationRequest) -> TranslationResult {
        debug!(
            "DeepL: translating {} string(s) {} -> {}",
            request.content().len(),
            request.source_language(),
            request.target_language()
        );

        match self.request_translations(request).await {
            Ok(translations) => TranslationResult::success(request, translations),
            Err(code) => TranslationResult::failure(request, code),
        }
    }

    async fn get_languages(&self) -> LanguageCatalog {
        let sources = match self.fetch_languages("source").await {
            Ok(sources) => sources,
            Err(code) => return LanguageCatalog::failure(code),
        };
        let targets = match self.fetch_languages("target").await {
            Ok(targets) => targets,
            Err(code) => return LanguageCatalog::failure(code),
        };

        LanguageCatalog::new(pair_languages(&sources, &targets))
    }

    async fn get_api_usage(&self) -> UsageInfo {
        match self.fetch_usage().await {
            Ok(usage) => UsageInfo::new(usage),
            Err(code) => UsageInfo::failure(code),
        }
    }
}

/// DeepL only accepts base codes as `source_lang` ("EN", never "EN-US").
fn source_lang_param(code: &str) -> String {
    code.split('-').next().unwrap_or(code).to_uppercase()
}

fn map_status(status: u16) -> ErrorCode {
    match status {
        400 | 413 | 414 => ErrorCode::BadRequest,
        401 | 403 => ErrorCode::AuthenticationFailed,
        404 => ErrorCode::NotFound,
        429 => ErrorCode::RateLimitExceeded,
        456 => ErrorCode::QuotaExceeded,
        500 => ErrorCode::InternalServerError,
        502 | 503 | 504 | 529 => ErrorCode::ServiceUnavailable,
        _ => ErrorCode::UnknownError,
    }
}

/// Pair every target with the source DeepL accepts for it. Targets with no
/// usable source are left out.
fn pair_languages(sources: &[DeepLLanguage], targets: &[DeepLLanguage]) -> Vec<EngineLanguage> {
    targets
        .iter()
        .filter_map(|target| {
            let source = resolve_source(sources, &target.language);
            if source.is_none() {
                debug!("DeepL: no source language for target {}", target.language);
            }
            source.map(|source| {
                let meta = serde_json::json!({ "supportsFormality": target.supports_formality });
                EngineLanguage::new(&source.name, &source.language, &target.name, &target.language)
                    .with_meta(meta)
            })
        })
        .collect()
}

/// Find the source for `target_code`: exact match first, then with the
/// suffix after the first hyphen removed. Two-letter codes are final.
///
/// Each round either returns or shortens the candidate, so the loop runs at
/// most once per hyphen-delimited segment.
fn resolve_source<'a>(
    sources: &'a [DeepLLanguage],
    target_code: &str,
) -> Option<&'a DeepLLanguage> {
    let mut candidate = target_code;
    loop {
        if let Some(found) = sources
            .iter()
            .find(|source| source.language.eq_ignore_ascii_case(candidate))
        {
            return Some(found);
        }
        if candidate.len() <= 2 {
            return None;
        }
        candidate = candidate.split_once('-')?.0;
    }
}
