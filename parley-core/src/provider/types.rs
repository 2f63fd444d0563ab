use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::capability::{CapabilityRequest, CapabilityStatus, DownloadProgress};
use crate::language::{LanguageCode, LanguagePair};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Capability unavailable: {0}")]
    Unavailable(CapabilityRequest),

    #[error("Model setup did not finish within {0:?}")]
    SetupTimeout(Duration),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Incremental text output from an on-device runtime.
///
/// Lazy, finite and not restartable. Consumers drain it completely before
/// using the text.
pub type TextStream = BoxStream<'static, Result<String>>;

/// One candidate language reported by a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionCandidate {
    pub language: String,
    pub confidence: f64,
}

impl DetectionCandidate {
    pub fn new(language: impl Into<String>, confidence: f64) -> Self {
        Self {
            language: language.into(),
            confidence,
        }
    }
}

/// The language surfaced to callers: the most confident candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub detected_language: String,
    pub confidence: f64,
}

impl DetectionResult {
    /// Picks the highest-confidence candidate.
    ///
    /// Labels are normalized to ISO 639-1 when they parse as a language;
    /// confidence is clamped into `0..=1`. Returns `None` for an empty list.
    pub fn best(candidates: impl IntoIterator<Item = DetectionCandidate>) -> Option<Self> {
        candidates
            .into_iter()
            .filter(|c| c.confidence.is_finite())
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .map(|c| Self {
                detected_language: c
                    .language
                    .parse::<LanguageCode>()
                    .map(String::from)
                    .unwrap_or(c.language),
                confidence: c.confidence.clamp(0.0, 1.0),
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryKind {
    Summary,
    Paraphrase,
    #[default]
    KeyPoints,
    Tldr,
    Teaser,
    Headline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryFormat {
    #[default]
    PlainText,
    Markdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    /// `(min, max)` output length in tokens for length-bounded summarizers.
    pub fn token_bounds(&self) -> (u32, u32) {
        match self {
            SummaryLength::Short => (20, 60),
            SummaryLength::Medium => (40, 130),
            SummaryLength::Long => (80, 250),
        }
    }
}

/// How a summary should look. Backends honor what they can.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeOptions {
    #[serde(default, rename = "type")]
    pub kind: SummaryKind,
    #[serde(default)]
    pub format: SummaryFormat,
    #[serde(default)]
    pub length: SummaryLength,
    #[serde(default)]
    pub shared_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_text: String,
}

/// Uniform surface over the language backends.
///
/// One implementation is chosen per feature at startup. Callers run
/// [`Provider::prepare`] before each operation; for remote backends it does
/// nothing, for on-device backends it probes the capability and waits for any
/// required download.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short backend name for logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Languages this backend accepts for translation, when it enforces a
    /// fixed list up front. `None` means support is discovered by probing.
    fn supported_languages(&self) -> Option<&[LanguageCode]> {
        None
    }

    async fn prepare(&self, request: &CapabilityRequest) -> Result<()>;

    async fn detect_language(&self, text: &str) -> Result<DetectionResult>;

    async fn summarize(&self, text: &str, options: &SummarizeOptions) -> Result<SummaryResult>;

    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<TranslationResult>;
}

/// A local inference runtime that has to be probed before use.
#[async_trait]
pub trait LocalRuntime: Send + Sync {
    async fn availability(&self, request: &CapabilityRequest) -> Result<CapabilityStatus>;

    /// Fetch whatever the runtime needs for `request`. May take minutes.
    async fn setup(
        &self,
        request: &CapabilityRequest,
        on_progress: &(dyn Fn(DownloadProgress) + Send + Sync),
    ) -> Result<()>;

    async fn detect(&self, text: &str) -> Result<Vec<DetectionCandidate>>;

    async fn summarize(&self, text: &str, options: &SummarizeOptions) -> Result<TextStream>;

    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<TextStream>;
}
