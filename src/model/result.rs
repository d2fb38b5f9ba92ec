use crate::error::{ErrorCode, MtError};
use crate::model::{TranslationOptions, TranslationRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a translation attempt.
///
/// The translations and the error live in one `Result`, so a failed result
/// can never carry translations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "TranslationResultRepr", try_from = "TranslationResultRepr")]
pub struct TranslationResult {
    source_language: String,
    target_language: String,
    content: Vec<String>,
    options: TranslationOptions,
    outcome: Result<Vec<String>, ErrorCode>,
    from_cache: bool,
    retrieved_at: DateTime<Utc>,
}

impl TranslationResult {
    /// Successful translation of `request`; `translations` align with its content.
    pub fn success(request: &TranslationRequest, translations: Vec<String>) -> Self {
        Self::for_request(request, Ok(translations))
    }

    /// Failed translation of `request`.
    pub fn failure(request: &TranslationRequest, error: ErrorCode) -> Self {
        Self::for_request(request, Err(error))
    }

    /// Failure for input that never became a `TranslationRequest`
    /// (e.g. a language the catalog does not know).
    pub fn rejected(
        source_language: impl Into<String>,
        target_language: impl Into<String>,
        content: Vec<String>,
        options: TranslationOptions,
        error: ErrorCode,
    ) -> Self {
        Self {
            source_language: source_language.into(),
            target_language: target_language.into(),
            content,
            options,
            outcome: Err(error),
            from_cache: false,
            retrieved_at: Utc::now(),
        }
    }

    fn for_request(request: &TranslationRequest, outcome: Result<Vec<String>, ErrorCode>) -> Self {
        Self {
            source_language: request.source_language().to_string(),
            target_language: request.target_language().to_string(),
            content: request.content().to_vec(),
            options: request.options().clone(),
            outcome,
            from_cache: false,
            retrieved_at: Utc::now(),
        }
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

    pub fn outcome(&self) -> &Result<Vec<String>, ErrorCode> {
        &self.outcome
    }

    /// Translations, empty when the result carries an error.
    pub fn translations(&self) -> &[String] {
        match &self.outcome {
            Ok(translations) => translations,
            Err(_) => &[],
        }
    }

    pub fn error(&self) -> Option<ErrorCode> {
        self.outcome.as_ref().err().copied()
    }

    /// Message derived from the error code.
    pub fn message(&self) -> Option<&'static str> {
        self.error().map(|code| code.message())
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Whether this result may be persisted: no error and at least one translation.
    pub fn is_cacheable(&self) -> bool {
        matches!(&self.outcome, Ok(translations) if !translations.is_empty())
    }

    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn retrieved_at(&self) -> DateTime<Utc> {
        self.retrieved_at
    }

    /// Flag a result read back from a cache. `retrieved_at` is left untouched.
    pub(crate) fn into_cached(mut self) -> Self {
        self.from_cache = true;
        self
    }
}

/// Flat wire shape consumed by the presentation layer and the cache store.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslationResultRepr {
    source_language: String,
    target_language: String,
    content: Vec<String>,
    #[serde(default)]
    translations: Vec<String>,
    #[serde(default)]
    options: TranslationOptions,
    #[serde(default)]
    from_cache: bool,
    retrieved_at: DateTime<Utc>,
    #[serde(default)]
    error: Option<ErrorCode>,
    #[serde(default)]
    message: Option<String>,
}

impl From<TranslationResult> for TranslationResultRepr {
    fn from(result: TranslationResult) -> Self {
        let message = result.message().map(str::to_string);
        let (translations, error) = match result.outcome {
            Ok(translations) => (translations, None),
            Err(code) => (Vec::new(), Some(code)),
        };
        Self {
            source_language: result.source_language,
            target_language: result.target_language,
            content: result.content,
            translations,
            options: result.options,
            from_cache: result.from_cache,
            retrieved_at: result.retrieved_at,
            error,
            message,
        }
    }
}

impl TryFrom<TranslationResultRepr> for TranslationResult {
    type Error = MtError;

    fn try_from(repr: TranslationResultRepr) -> Result<Self, Self::Error> {
        let outcome = match repr.error {
            Some(code) if !repr.translations.is_empty() => {
                return Err(MtError::InconsistentResult(format!(
                    "result with error {} also carries {} translations",
                    code,
                    repr.translations.len()
                )));
            }
            Some(code) => Err(code),
            None => Ok(repr.translations),
        };
        Ok(Self {
            source_language: repr.source_language,
            target_language: repr.target_language,
            content: repr.content,
            options: repr.options,
            outcome,
            from_cache: repr.from_cache,
            retrieved_at: repr.retrieved_at,
        })
    }
}
