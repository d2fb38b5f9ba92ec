use crate::http::DEFAULT_CONNECT_TIMEOUT;
use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_GOOGLE_API_URL: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Clone)]
pub struct Config {
    // Engine selection
    pub engine: String,

    // Providers
    pub deepl: DeepLConfig,
    pub google: GoogleConfig,

    // Cache
    pub cache_enabled: bool,
    pub cache_path: String,

    // HTTP
    pub connect_timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct DeepLConfig {
    pub auth_key: Option<String>,
    /// Overrides the host derived from the key
    pub api_url: Option<String>,
    pub formality: Option<String>,
    pub ignored_strings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    /// Language used for catalog display names
    pub display_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: "deepl".to_string(),
            deepl: DeepLConfig::default(),
            google: GoogleConfig::default(),
            cache_enabled: true,
            cache_path: "data/mt_cache.db".to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_GOOGLE_API_URL.to_string(),
            display_language: "en".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let ignored_strings = match non_empty_var("DEEPL_IGNORED_STRINGS_FILE") {
            Some(path) => load_ignored_strings(&path)?,
            None => Vec::new(),
        };

        let cache_enabled = match non_empty_var("MT_CACHE_ENABLED") {
            Some(value) => parse_bool(&value)
                .with_context(|| format!("MT_CACHE_ENABLED has invalid value '{}'", value))?,
            None => true,
        };

        Ok(Self {
            // Engine selection
            engine: std::env::var("MT_ENGINE").unwrap_or_else(|_| "deepl".to_string()),

            // DeepL
            deepl: DeepLConfig {
                auth_key: non_empty_var("DEEPL_AUTH_KEY"),
                api_url: non_empty_var("DEEPL_API_URL"),
                formality: non_empty_var("DEEPL_FORMALITY"),
                ignored_strings,
            },

            // Google Cloud Translation
            google: GoogleConfig {
                api_key: non_empty_var("GOOGLE_API_KEY"),
                api_url: std::env::var("GOOGLE_API_URL")
                    .unwrap_or_else(|_| DEFAULT_GOOGLE_API_URL.to_string()),
                display_language: std::env::var("GOOGLE_DISPLAY_LANGUAGE")
                    .unwrap_or_else(|_| "en".to_string()),
            },

            // Cache
            cache_enabled,
            cache_path: std::env::var("MT_CACHE_PATH")
                .unwrap_or_else(|_| "data/mt_cache.db".to_string()),

            // HTTP
            connect_timeout: std::env::var("MT_HTTP_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// One string per line; blank lines are skipped.
fn load_ignored_strings(path: &str) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ignored strings file {}", path))?;

    Ok(contents
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const VARS: &[&str] = &[
        "MT_ENGINE",
        "DEEPL_AUTH_KEY",
        "DEEPL_API_URL",
        "DEEPL_FORMALITY",
        "DEEPL_IGNORED_STRINGS_FILE",
        "GOOGLE_API_KEY",
        "GOOGLE_API_URL",
        "GOOGLE_DISPLAY_LANGUAGE",
        "MT_CACHE_ENABLED",
        "MT_CACHE_PATH",
        "MT_HTTP_CONNECT_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();

        assert_eq!(config.engine, "deepl");
        assert!(config.deepl.auth_key.is_none());
        assert!(config.deepl.ignored_strings.is_empty());
        assert_eq!(config.google.api_url, DEFAULT_GOOGLE_API_URL);
        assert_eq!(config.google.display_language, "en");
        assert!(config.cache_enabled);
        assert_eq!(config.cache_path, "data/mt_cache.db");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_reads_provider_settings() {
        clear_env();
        std::env::set_var("MT_ENGINE", "google_cloud");
        std::env::set_var("DEEPL_AUTH_KEY", "abc:fx");
        std::env::set_var("DEEPL_FORMALITY", "less");
        std::env::set_var("GOOGLE_API_KEY", "g-key");
        std::env::set_var("GOOGLE_DISPLAY_LANGUAGE", "de");
        std::env::set_var("MT_CACHE_PATH", ":memory:");
        std::env::set_var("MT_HTTP_CONNECT_TIMEOUT_SECS", "2");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.engine, "google_cloud");
        assert_eq!(config.deepl.auth_key.as_deref(), Some("abc:fx"));
        assert_eq!(config.deepl.formality.as_deref(), Some("less"));
        assert_eq!(config.google.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.google.display_language, "de");
        assert_eq!(config.cache_path, ":memory:");
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    #[serial]
    fn test_blank_key_counts_as_missing() {
        clear_env();
        std::env::set_var("DEEPL_AUTH_KEY", "  ");
        let config = Config::from_env().unwrap();
        clear_env();
        assert!(config.deepl.auth_key.is_none());
    }

    #[test]
    #[serial]
    fn test_cache_enabled_flag() {
        clear_env();
        std::env::set_var("MT_CACHE_ENABLED", "false");
        assert!(!Config::from_env().unwrap().cache_enabled);

        std::env::set_var("MT_CACHE_ENABLED", "maybe");
        let result = Config::from_env();
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_invalid_timeout_falls_back_to_default() {
        clear_env();
        std::env::set_var("MT_HTTP_CONNECT_TIMEOUT_SECS", "soon");
        let config = Config::from_env().unwrap();
        clear_env();
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    #[serial]
    fn test_loads_ignored_strings_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Acme").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "Widget Co\r").unwrap();
        std::env::set_var("DEEPL_IGNORED_STRINGS_FILE", file.path());

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(
            config.deepl.ignored_strings,
            vec!["Acme".to_string(), "Widget Co".to_string()]
        );
    }

    #[test]
    #[serial]
    fn test_missing_ignored_strings_file_is_error() {
        clear_env();
        std::env::set_var("DEEPL_IGNORED_STRINGS_FILE", "/nonexistent/ignored.txt");
        let result = Config::from_env();
        clear_env();

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("/nonexistent/ignored.txt"));
    }
}
