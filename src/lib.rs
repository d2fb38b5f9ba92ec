//! Machine-translation engine adapters with result and language-catalog caching.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod metrics;
pub mod model;
pub mod store;
pub mod translator;

pub use config::Config;
pub use engine::{EngineRegistry, TranslationEngine};
pub use error::{ErrorCode, MtError, MtResult};
pub use model::{
    EngineLanguage, LanguageCatalog, TranslationOptions, TranslationRequest, TranslationResult,
    Usage, UsageInfo,
};
pub use translator::{CacheCounts, Translator};
