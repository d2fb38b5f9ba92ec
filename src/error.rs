//! Error vocabulary shared by every engine, cache and the facade.
//!
//! Two layers live here:
//!
//! - `ErrorCode`: expected failures (provider said no, network down, unknown
//!   language). These travel as values inside results and are never raised.
//! - `MtError`: hard errors for programmer mistakes and infrastructure
//!   failures (bad request construction, unregistered error code, cache store
//!   I/O).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Provider-agnostic failure codes carried by results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ServiceUnavailable,
    AuthenticationFailed,
    AuthorizationFailed,
    RateLimitExceeded,
    QuotaExceeded,
    BadRequest,
    NotFound,
    InternalServerError,
    UnknownError,
    NotImplemented,
    /// Facade-level: the requested source language is not in the catalog
    UnknownSource,
    /// Facade-level: the requested target language is not in the catalog
    UnknownTarget,
}

impl ErrorCode {
    /// Every declared code, in declaration order.
    pub const ALL: [ErrorCode; 12] = [
        ErrorCode::ServiceUnavailable,
        ErrorCode::AuthenticationFailed,
        ErrorCode::AuthorizationFailed,
        ErrorCode::RateLimitExceeded,
        ErrorCode::QuotaExceeded,
        ErrorCode::BadRequest,
        ErrorCode::NotFound,
        ErrorCode::InternalServerError,
        ErrorCode::UnknownError,
        ErrorCode::NotImplemented,
        ErrorCode::UnknownSource,
        ErrorCode::UnknownTarget,
    ];

    /// Wire name, e.g. `RATE_LIMIT_EXCEEDED`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorCode::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ErrorCode::AuthorizationFailed => "AUTHORIZATION_FAILED",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
            ErrorCode::NotImplemented => "NOT_IMPLEMENTED",
            ErrorCode::UnknownSource => "UNKNOWN_SOURCE",
            ErrorCode::UnknownTarget => "UNKNOWN_TARGET",
        }
    }

    /// Human-readable message rendered next to the code.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::ServiceUnavailable => {
                "The translation service is currently unavailable. Please try again later."
            }
            ErrorCode::AuthenticationFailed => {
                "Authentication with the translation service failed. Check the API key."
            }
            ErrorCode::AuthorizationFailed => {
                "The API key is not authorized to use this translation service."
            }
            ErrorCode::RateLimitExceeded => "Too many requests. Please wait and try again.",
            ErrorCode::QuotaExceeded => "The translation quota for this account has been exceeded.",
            ErrorCode::BadRequest => "The translation service rejected the request.",
            ErrorCode::NotFound => "The requested translation resource was not found.",
            ErrorCode::InternalServerError => {
                "The translation service reported an internal error."
            }
            ErrorCode::UnknownError => {
                "An unknown error occurred while contacting the translation service."
            }
            ErrorCode::NotImplemented => {
                "This operation is not supported by the selected engine."
            }
            ErrorCode::UnknownSource => {
                "The source language is not supported by the selected engine."
            }
            ErrorCode::UnknownTarget => {
                "The target language is not supported by the selected engine."
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = MtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ErrorCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| MtError::UnknownErrorCode(s.to_string()))
    }
}

/// Hard errors. Provider failures never end up here.
#[derive(Debug, Error)]
pub enum MtError {
    #[error("Invalid translation request: {0}")]
    InvalidRequest(String),

    #[error("Inconsistent result: {0}")]
    InconsistentResult(String),

    #[error("Unregistered error code: '{0}'")]
    UnknownErrorCode(String),

    #[error("Unknown engine: '{id}' (registered: {})", registered.join(", "))]
    UnknownEngine {
        id: String,
        registered: Vec<&'static str>,
    },

    #[error("Engine configuration error: {0}")]
    Config(String),

    #[error("Cache store error: {0}")]
    Store(String),

    #[error("Cache database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Result type for hard-error paths
pub type MtResult<T> = Result<T, MtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_round_trips_every_code() {
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str().parse::<ErrorCode>().unwrap(), code);
        }
    }

    #[test]
    fn test_from_str_rejects_undeclared_code() {
        match "TEAPOT".parse::<ErrorCode>() {
            Err(MtError::UnknownErrorCode(code)) => assert_eq!(code, "TEAPOT"),
            other => panic!("Expected UnknownErrorCode, got {:?}", other),
        }
    }

    #[test]
    fn test_from_str_is_case_sensitive() {
        assert!("bad_request".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&ErrorCode::QuotaExceeded).unwrap();
        assert_eq!(json, "\"QUOTA_EXCEEDED\"");

        let parsed: ErrorCode = serde_json::from_str("\"UNKNOWN_TARGET\"").unwrap();
        assert_eq!(parsed, ErrorCode::UnknownTarget);
    }

    #[test]
    fn test_serde_rejects_undeclared_code() {
        let parsed: Result<ErrorCode, _> = serde_json::from_str("\"NOPE\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_display_matches_wire_name() {
        for code in ErrorCode::ALL {
            assert_eq!(code.to_string(), code.as_str());
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn test_every_code_has_a_message() {
        for code in ErrorCode::ALL {
            assert!(!code.message().is_empty());
        }
    }

    #[test]
    fn test_mt_error_display() {
        let err = MtError::UnknownEngine {
            id: "babelfish".to_string(),
            registered: vec!["deepl", "google_cloud"],
        };
        assert_eq!(
            err.to_string(),
            "Unknown engine: 'babelfish' (registered: deepl, google_cloud)"
        );
    }
}
