//! Provider-agnostic translation engine contract and the adapters behind it.
//!
//! Engines never fail for provider-side reasons: authentication, quota, rate
//! limiting, bad requests and unreachable hosts all come back as an
//! `ErrorCode` inside the returned value.

mod deepl;
mod google;
mod ignored;
mod registry;

pub use deepl::DeepLEngine;
pub use google::GoogleCloudTranslationEngine;
pub use ignored::{IgnoredStrings, IGNORE_TAG};
pub use registry::{EngineDescriptor, EngineFactory, EngineRegistry};

use crate::error::ErrorCode;
use crate::http::HttpResponse;
use crate::model::{LanguageCatalog, TranslationRequest, TranslationResult, UsageInfo};
use async_trait::async_trait;
use tracing::warn;

#[async_trait]
pub trait TranslationEngine: Send + Sync + std::fmt::Debug {
    /// Stable registry identifier (e.g. "deepl").
    fn id(&self) -> &'static str;

    /// Human-readable provider name.
    fn label(&self) -> &'static str;

    /// Fixed identifier used to key this engine's language catalog.
    fn uuid(&self) -> &'static str;

    /// Translate every string in `request.content()`, in order.
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult;

    /// Language pairs the provider supports, sorted by target name.
    async fn get_languages(&self) -> LanguageCatalog;

    /// Character usage for the current billing period, or `NOT_IMPLEMENTED`.
    async fn get_api_usage(&self) -> UsageInfo;
}

/// Log a provider response that mapped to `code` and hand the code back.
fn provider_failure(engine: &str, response: &HttpResponse, code: ErrorCode) -> ErrorCode {
    warn!(
        "{} request failed with HTTP {} ({}): {}",
        engine,
        response.status,
        code,
        truncate_for_log(&response.body)
    );
    code
}

/// Log a transport failure; unreachable providers count as unavailable.
fn transport_failure(engine: &str, error: &reqwest::Error) -> ErrorCode {
    warn!("{} request could not be completed: {}", engine, error);
    ErrorCode::ServiceUnavailable
}

/// Log an undecodable 2xx body.
fn decode_failure(engine: &str, error: &serde_json::Error) -> ErrorCode {
    warn!("{} returned an unreadable response: {}", engine, error);
    ErrorCode::UnknownError
}

fn truncate_for_log(body: &str) -> &str {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_body() {
        assert_eq!(truncate_for_log("Forbidden"), "Forbidden");
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let body = "ü".repeat(150);
        let truncated = truncate_for_log(&body);
        assert!(truncated.len() <= 200);
        assert!(truncated.chars().all(|c| c == 'ü'));
    }

    #[test]
    fn test_provider_failure_returns_code() {
        let response = HttpResponse {
            status: 456,
            body: "Quota exceeded".to_string(),
        };
        assert_eq!(
            provider_failure("DeepL", &response, ErrorCode::QuotaExceeded),
            ErrorCode::QuotaExceeded
        );
    }
}
