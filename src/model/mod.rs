//! Value objects passed between the facade, the caches and the engines.
//!
//! - `request`: immutable `TranslationRequest` with its content-addressed cache key
//! - `result`: `TranslationResult`, translations or an `ErrorCode`, never both
//! - `language`: `EngineLanguage` pairings and the `LanguageCatalog`
//! - `usage`: provider character usage

mod language;
mod request;
mod result;
mod usage;

pub use language::{EngineLanguage, LanguageCatalog};
pub use request::{TranslationOptions, TranslationRequest};
pub use result::TranslationResult;
pub use usage::{Usage, UsageInfo};

use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
