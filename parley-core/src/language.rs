//! ISO 639-1 language codes.
//!
//! Every language value that crosses the HTTP boundary or reaches a provider is
//! normalized to a two-letter lowercase code. English names for common
//! languages are accepted on input and mapped to their code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized language code: {0:?}")]
pub struct InvalidLanguage(pub String);

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("english", "en"),
    ("portuguese", "pt"),
    ("spanish", "es"),
    ("russian", "ru"),
    ("turkish", "tr"),
    ("french", "fr"),
    ("german", "de"),
    ("italian", "it"),
    ("japanese", "ja"),
    ("chinese", "zh"),
    ("korean", "ko"),
    ("arabic", "ar"),
    ("hindi", "hi"),
    ("dutch", "nl"),
    ("polish", "pl"),
];

/// A normalized ISO 639-1 language code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// English name for the code, when it is one we know.
    pub fn english_name(&self) -> Option<&'static str> {
        LANGUAGE_NAMES
            .iter()
            .find(|(_, code)| *code == self.0)
            .map(|(name, _)| *name)
    }
}

impl FromStr for LanguageCode {
    type Err = InvalidLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();

        // Region-qualified tags ("en-US", "pt_BR") keep only the primary subtag.
        let primary = normalized
            .split(['-', '_'])
            .next()
            .unwrap_or_default();

        if primary.len() == 2 && primary.chars().all(|c| c.is_ascii_lowercase()) {
            return Ok(Self(primary.to_string()));
        }

        LANGUAGE_NAMES
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, code)| Self((*code).to_string()))
            .ok_or_else(|| InvalidLanguage(s.to_string()))
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = InvalidLanguage;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source and target language for a translation, checked jointly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl LanguagePair {
    pub fn new(source: LanguageCode, target: LanguageCode) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Languages the remote translation endpoint accepts by default.
pub fn default_supported_languages() -> Vec<LanguageCode> {
    ["en", "pt", "es", "ru", "tr", "fr"]
        .iter()
        .map(|code| LanguageCode((*code).to_string()))
        .collect()
}
