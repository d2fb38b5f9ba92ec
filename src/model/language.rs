//! Language catalog types.
//!
//! An `EngineLanguage` is a *directed pairing*: the code an engine accepts as
//! a source paired with a code it can produce. DeepL, for example, translates
//! into "EN-US" while only accepting plain "EN" as a source.

use crate::error::{ErrorCode, MtError};
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineLanguage {
    pub source_name: String,
    pub source_code: String,
    pub target_name: String,
    pub target_code: String,
    /// Engine-specific extras, opaque to callers
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl EngineLanguage {
    pub fn new(
        source_name: impl Into<String>,
        source_code: impl Into<String>,
        target_name: impl Into<String>,
        target_code: impl Into<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            source_code: source_code.into(),
            target_name: target_name.into(),
            target_code: target_code.into(),
            meta: serde_json::Value::Null,
        }
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = meta;
        self
    }
}

// Each language row carries error/message slots in the wire shape; they are
// always null for rows inside a catalog.
impl Serialize for EngineLanguage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EngineLanguage", 7)?;
        state.serialize_field("sourceName", &self.source_name)?;
        state.serialize_field("sourceCode", &self.source_code)?;
        state.serialize_field("targetName", &self.target_name)?;
        state.serialize_field("targetCode", &self.target_code)?;
        state.serialize_field("meta", &self.meta)?;
        state.serialize_field("error", &Option::<ErrorCode>::None)?;
        state.serialize_field("message", &Option::<String>::None)?;
        state.end()
    }
}

/// The language pairings an engine offers, ordered by target name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "LanguageCatalogRepr", try_from = "LanguageCatalogRepr")]
pub struct LanguageCatalog {
    outcome: Result<Vec<EngineLanguage>, ErrorCode>,
    from_cache: bool,
    retrieved_at: DateTime<Utc>,
}

impl LanguageCatalog {
    /// Build a catalog, sorting the pairings by target name.
    pub fn new(mut languages: Vec<EngineLanguage>) -> Self {
        languages.sort_by(|a, b| a.target_name.cmp(&b.target_name));
        Self {
            outcome: Ok(languages),
            from_cache: false,
            retrieved_at: Utc::now(),
        }
    }

    pub fn failure(error: ErrorCode) -> Self {
        Self {
            outcome: Err(error),
            from_cache: false,
            retrieved_at: Utc::now(),
        }
    }

    pub fn outcome(&self) -> &Result<Vec<EngineLanguage>, ErrorCode> {
        &self.outcome
    }

    /// Pairings, empty when the catalog carries an error.
    pub fn languages(&self) -> &[EngineLanguage] {
        match &self.outcome {
            Ok(languages) => languages,
            Err(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.languages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages().is_empty()
    }

    /// First pairing whose source code matches, ignoring case.
    pub fn find_by_source(&self, code: &str) -> Option<&EngineLanguage> {
        self.languages()
            .iter()
            .find(|lang| lang.source_code.eq_ignore_ascii_case(code))
    }

    /// Pairing whose target code matches, ignoring case.
    pub fn find_by_target(&self, code: &str) -> Option<&EngineLanguage> {
        self.languages()
            .iter()
            .find(|lang| lang.target_code.eq_ignore_ascii_case(code))
    }

    pub fn error(&self) -> Option<ErrorCode> {
        self.outcome.as_ref().err().copied()
    }

    pub fn message(&self) -> Option<&'static str> {
        self.error().map(|code| code.message())
    }

    /// Whether this catalog may be persisted: no error and at least one pairing.
    pub fn is_cacheable(&self) -> bool {
        matches!(&self.outcome, Ok(languages) if !languages.is_empty())
    }

    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn retrieved_at(&self) -> DateTime<Utc> {
        self.retrieved_at
    }

    pub(crate) fn into_cached(mut self) -> Self {
        self.from_cache = true;
        self
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageCatalogRepr {
    #[serde(default)]
    languages: Vec<EngineLanguage>,
    #[serde(default)]
    from_cache: bool,
    retrieved_at: DateTime<Utc>,
    #[serde(default)]
    error: Option<ErrorCode>,
    #[serde(default)]
    message: Option<String>,
}

impl From<LanguageCatalog> for LanguageCatalogRepr {
    fn from(catalog: LanguageCatalog) -> Self {
        let message = catalog.message().map(str::to_string);
        let (languages, error) = match catalog.outcome {
            Ok(languages) => (languages, None),
            Err(code) => (Vec::new(), Some(code)),
        };
        Self {
            languages,
            from_cache: catalog.from_cache,
            retrieved_at: catalog.retrieved_at,
            error,
            message,
        }
    }
}

impl TryFrom<LanguageCatalogRepr> for LanguageCatalog {
    type Error = MtError;

    fn try_from(repr: LanguageCatalogRepr) -> Result<Self, Self::Error> {
        let outcome = match repr.error {
            Some(code) if !repr.languages.is_empty() => {
                return Err(MtError::InconsistentResult(format!(
                    "catalog with error {} also carries {} languages",
                    code,
                    repr.languages.len()
                )));
            }
            Some(code) => Err(code),
            None => Ok(repr.languages),
        };
        Ok(Self {
            outcome,
            from_cache: repr.from_cache,
            retrieved_at: repr.retrieved_at,
        })
    }
}
