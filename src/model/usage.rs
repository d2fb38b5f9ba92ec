use crate::error::ErrorCode;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Character consumption reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub character_count: u64,
    pub character_limit: u64,
}

impl Usage {
    pub fn remaining(&self) -> u64 {
        self.character_limit.saturating_sub(self.character_count)
    }
}

/// API usage, or the reason it could not be read.
///
/// Engines without usage data return `ErrorCode::NotImplemented`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "UsageInfoRepr")]
pub struct UsageInfo {
    outcome: Result<Usage, ErrorCode>,
    retrieved_at: DateTime<Utc>,
}

impl UsageInfo {
    pub fn new(usage: Usage) -> Self {
        Self {
            outcome: Ok(usage),
            retrieved_at: Utc::now(),
        }
    }

    pub fn failure(error: ErrorCode) -> Self {
        Self {
            outcome: Err(error),
            retrieved_at: Utc::now(),
        }
    }

    pub fn not_implemented() -> Self {
        Self::failure(ErrorCode::NotImplemented)
    }

    pub fn outcome(&self) -> &Result<Usage, ErrorCode> {
        &self.outcome
    }

    pub fn usage(&self) -> Option<Usage> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn error(&self) -> Option<ErrorCode> {
        self.outcome.as_ref().err().copied()
    }

    pub fn message(&self) -> Option<&'static str> {
        self.error().map(|code| code.message())
    }

    pub fn retrieved_at(&self) -> DateTime<Utc> {
        self.retrieved_at
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UsageInfoRepr {
    character_count: Option<u64>,
    character_limit: Option<u64>,
    character_remaining: Option<u64>,
    retrieved_at: DateTime<Utc>,
    error: Option<ErrorCode>,
    message: Option<String>,
}

impl From<UsageInfo> for UsageInfoRepr {
    fn from(info: UsageInfo) -> Self {
        let usage = info.usage();
        Self {
            character_count: usage.map(|u| u.character_count),
            character_limit: usage.map(|u| u.character_limit),
            character_remaining: usage.map(|u| u.remaining()),
            retrieved_at: info.retrieved_at,
            error: info.error(),
            message: info.message().map(str::to_string),
        }
    }
}
