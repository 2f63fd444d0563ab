//! On-device provider.
//!
//! Wraps a [`LocalRuntime`] so it can sit behind the [`Provider`] trait:
//! `prepare` runs capability negotiation, and streamed output is drained into
//! a single string before anything is returned.

use async_trait::async_trait;
use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::*;
use crate::capability::{self, CapabilityRequest};
use crate::language::LanguagePair;

pub struct OnDeviceProvider {
    runtime: Arc<dyn LocalRuntime>,
    setup_timeout: Duration,
}

impl OnDeviceProvider {
    pub fn new(runtime: Arc<dyn LocalRuntime>, setup_timeout: Duration) -> Self {
        Self {
            runtime,
            setup_timeout,
        }
    }
}

/// Drains an incremental output stream into one string.
///
/// The first chunk error aborts the whole result; no partial text escapes.
pub async fn collect_text(stream: TextStream) -> Result<String> {
    stream
        .try_fold(String::new(), |mut acc, chunk| async move {
            acc.push_str(&chunk);
            Ok(acc)
        })
        .await
}

/// Trims drained output; a runtime that produced no text has failed.
fn non_empty(text: String, what: &str) -> Result<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ProviderError::MalformedResponse(format!(
            "runtime returned an empty {}",
            what
        )));
    }
    Ok(text.to_string())
}

#[async_trait]
impl Provider for OnDeviceProvider {
    fn name(&self) -> &'static str {
        "on_device"
    }

    async fn prepare(&self, request: &CapabilityRequest) -> Result<()> {
        capability::negotiate(self.runtime.as_ref(), request, self.setup_timeout).await
    }

    async fn detect_language(&self, text: &str) -> Result<DetectionResult> {
        let candidates = self.runtime.detect(text).await?;
        debug!(?candidates, "Detection candidates");

        DetectionResult::best(candidates)
            .ok_or_else(|| ProviderError::Runtime("Language could not be detected".to_string()))
    }

    async fn summarize(&self, text: &str, options: &SummarizeOptions) -> Result<SummaryResult> {
        let stream = self.runtime.summarize(text, options).await?;
        let summary = non_empty(collect_text(stream).await?, "summary")?;
        Ok(SummaryResult { summary })
    }

    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<TranslationResult> {
        let stream = self.runtime.translate(text, pair).await?;
        let translated_text = non_empty(collect_text(stream).await?, "translation")?;
        Ok(TranslationResult { translated_text })
    }
}
