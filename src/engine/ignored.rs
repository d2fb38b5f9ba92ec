//! Do-not-translate strings.
//!
//! Configured strings are wrapped in a reserved inline tag before dispatch so
//! the provider (with XML tag handling and `ignore_tags`) leaves them alone.
//! The tags are stripped from the translation afterwards.

use crate::error::{MtError, MtResult};
use regex::Regex;

/// Tag name handed to the provider as `ignore_tags`.
pub const IGNORE_TAG: &str = "mt-ignore";

#[derive(Debug, Clone)]
pub struct IgnoredStrings {
    strings: Vec<String>,
    pattern: Regex,
    replacement: String,
}

impl IgnoredStrings {
    /// Build the matcher. Blank and duplicate entries are dropped.
    ///
    /// # Returns
    /// * `Ok(None)` when nothing is left to ignore
    pub fn new<I, S>(strings: I) -> MtResult<Option<Self>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut strings: Vec<String> = strings
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.trim().is_empty())
            .collect();
        // Longest first so "Acme Corp" wins over "Acme" in the alternation.
        strings.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        strings.dedup();

        if strings.is_empty() {
            return Ok(None);
        }

        let alternation = strings
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&alternation)
            .map_err(|e| MtError::Config(format!("invalid ignored strings: {}", e)))?;

        Ok(Some(Self {
            strings,
            pattern,
            replacement: format!("<{0}>$0</{0}>", IGNORE_TAG),
        }))
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Wrap every occurrence of every ignored string. Matching is literal and
    /// case-sensitive.
    pub fn wrap(&self, text: &str) -> String {
        self.pattern
            .replace_all(text, self.replacement.as_str())
            .into_owned()
    }

    /// Remove the ignore tags the provider echoed back.
    pub fn unwrap(&self, text: &str) -> String {
        text.replace(&format!("<{}>", IGNORE_TAG), "")
            .replace(&format!("</{}>", IGNORE_TAG), "")
    }

    /// Ignored strings whose occurrence count differs between source and
    /// translation, with a human-readable note for each.
    pub fn check_preserved(&self, original: &str, translated: &str) -> Vec<String> {
        self.strings
            .iter()
            .filter_map(|s| {
                let expected = original.matches(s.as_str()).count();
                let actual = translated.matches(s.as_str()).count();
                (expected != actual).then(|| {
                    format!(
                        "'{}' appears {} time(s) in the source but {} in the translation",
                        s, expected, actual
                    )
                })
            })
            .collect()
    }
}
