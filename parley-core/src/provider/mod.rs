//! Language provider abstraction layer.
//!
//! This module defines a common interface over the backends that can serve
//! language detection, summarization and translation: a local runtime that
//! must be probed before use, or a hosted inference API.

mod factory;
pub mod ollama;
pub mod on_device;
pub mod remote;
mod types;

// Re-export common types
pub use types::{
    DetectionCandidate, DetectionResult, LocalRuntime, Provider, ProviderError, Result,
    SummarizeOptions, SummaryFormat, SummaryKind, SummaryLength, SummaryResult, TextStream,
    TranslationResult,
};

// Re-export provider implementations
pub use factory::{create_provider, create_providers, ProviderSet};
pub use ollama::OllamaRuntime;
pub use on_device::{collect_text, OnDeviceProvider};
pub use remote::RemoteProvider;
