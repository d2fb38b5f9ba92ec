//! Google Cloud Translation (Basic, v2) adapter.

use crate::config::GoogleConfig;
use crate::engine::{decode_failure, provider_failure, transport_failure, TranslationEngine};
use crate::error::{ErrorCode, MtError, MtResult};
use crate::http::{HttpClient, HttpResponse, Method, MultiValueQuery};
use crate::model::{
    EngineLanguage, LanguageCatalog, TranslationRequest, TranslationResult, UsageInfo,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

pub(crate) const ENGINE_ID: &str = "google_cloud";
pub(crate) const ENGINE_LABEL: &str = "Google Cloud Translation";
pub(crate) const ENGINE_UUID: &str = "c41e9b27-6f0d-4a83-b5e2-18d7f09a3c64";

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct LanguagesResponse {
    data: LanguagesData,
}

#[derive(Debug, Deserialize)]
struct LanguagesData {
    languages: Vec<GoogleLanguage>,
}

#[derive(Debug, Deserialize)]
struct GoogleLanguage {
    language: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

pub struct GoogleCloudTranslationEngine {
    api_key: String,
    api_url: String,
    display_language: String,
    http: HttpClient,
}

impl GoogleCloudTranslationEngine {
    /// # Returns
    /// * `Err(MtError::Config)` if no API key is configured
    pub fn new(config: &GoogleConfig, http: HttpClient) -> MtResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| MtError::Config("Google API key is not set".to_string()))?;

        Ok(Self {
            api_key,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            display_language: config.display_language.clone(),
            http,
        })
    }

    fn key_query(&self) -> MultiValueQuery {
        let mut query = MultiValueQuery::new();
        query.push("key", self.api_key.as_str());
        query
    }

    async fn request_translations(
        &self,
        request: &TranslationRequest,
    ) -> Result<Vec<String>, ErrorCode> {
        let url = format!("{}?{}", self.api_url, self.key_query().encode());

        let format = match request.option("format") {
            Some("html") => "html",
            _ => "text",
        };
        let mut form = MultiValueQuery::new();
        form.extend("q", request.content().iter().cloned())
            .push("target", request.target_language())
            .push("source", request.source_language())
            .push("format", format);

        let response = self
            .http
            .perform(Method::POST, &url, &[], Some(&form))
            .await
            .map_err(|e| transport_failure(ENGINE_LABEL, &e))?;

        if !response.is_success() {
            return Err(provider_failure(ENGINE_LABEL, &response, map_error(&response)));
        }

        let parsed: TranslateResponse =
            serde_json::from_str(&response.body).map_err(|e| decode_failure(ENGINE_LABEL, &e))?;

        if parsed.data.translations.len() != request.content().len() {
            warn!(
                "Google returned {} translations for {} strings",
                parsed.data.translations.len(),
                request.content().len()
            );
            return Err(ErrorCode::UnknownError);
        }

        Ok(parsed
            .data
            .translations
            .into_iter()
            .map(|t| t.translated_text)
            .collect())
    }

    async fn fetch_languages(&self) -> Result<Vec<EngineLanguage>, ErrorCode> {
        let mut query = self.key_query();
        query.push("target", self.display_language.as_str());
        let url = format!("{}/languages?{}", self.api_url, query.encode());

        let response = self
            .http
            .perform(Method::GET, &url, &[], None)
            .await
            .map_err(|e| transport_failure(ENGINE_LABEL, &e))?;

        if !response.is_success() {
            return Err(provider_failure(ENGINE_LABEL, &response, map_error(&response)));
        }

        let parsed: LanguagesResponse =
            serde_json::from_str(&response.body).map_err(|e| decode_failure(ENGINE_LABEL, &e))?;

        // Google lists languages, not directions: every code works both ways.
        Ok(parsed
            .data
            .languages
            .into_iter()
            .map(|lang| {
                let name = lang.name.unwrap_or_else(|| lang.language.clone());
                EngineLanguage::new(&name, &lang.language, &name, &lang.language)
            })
            .collect())
    }
}

impl std::fmt::Debug for GoogleCloudTranslationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCloudTranslationEngine")
            .field("api_key", &"***")
            .field("api_url", &self.api_url)
            .field("display_language", &self.display_language)
            .finish()
    }
}

#[async_trait]
impl TranslationEngine for GoogleCloudTranslationEngine {
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
            "Google: translating {} string(s) {} -> {}",
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
        match self.fetch_languages().await {
            Ok(languages) => LanguageCatalog::new(languages),
            Err(code) => LanguageCatalog::failure(code),
        }
    }

    async fn get_api_usage(&self) -> UsageInfo {
        UsageInfo::not_implemented()
    }
}

/// Prefer the `error.status` string Google puts in the body; fall back to the
/// HTTP status when the body has none.
fn map_error(response: &HttpResponse) -> ErrorCode {
    let body = serde_json::from_str::<ErrorResponse>(&response.body).ok();

    body.and_then(|body| {
        let rate_limited = body
            .error
            .errors
            .iter()
            .any(|detail| detail.reason.to_ascii_lowercase().contains("ratelimit"));
        body.error
            .status
            .as_deref()
            .and_then(|status| map_status_string(status, rate_limited))
    })
    .unwrap_or_else(|| map_http_status(response.status))
}

fn map_status_string(status: &str, rate_limited: bool) -> Option<ErrorCode> {
    let code = match status {
        "UNAUTHENTICATED" => ErrorCode::AuthenticationFailed,
        "PERMISSION_DENIED" => ErrorCode::AuthorizationFailed,
        "RESOURCE_EXHAUSTED" if rate_limited => ErrorCode::RateLimitExceeded,
        "RESOURCE_EXHAUSTED" => ErrorCode::QuotaExceeded,
        "INVALID_ARGUMENT" | "FAILED_PRECONDITION" | "OUT_OF_RANGE" => ErrorCode::BadRequest,
        "NOT_FOUND" => ErrorCode::NotFound,
        "INTERNAL" => ErrorCode::InternalServerError,
        "UNAVAILABLE" | "DEADLINE_EXCEEDED" => ErrorCode::ServiceUnavailable,
        _ => return None,
    };
    Some(code)
}

fn map_http_status(status: u16) -> ErrorCode {
    match status {
        400 => ErrorCode::BadRequest,
        401 => ErrorCode::AuthenticationFailed,
        403 => ErrorCode::AuthorizationFailed,
        404 => ErrorCode::NotFound,
        429 => ErrorCode::RateLimitExceeded,
        500 => ErrorCode::InternalServerError,
        503 => ErrorCode::ServiceUnavailable,
        _ => ErrorCode::UnknownError,
    }
}
