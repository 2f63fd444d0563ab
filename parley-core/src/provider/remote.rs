//! Hosted inference provider.
//!
//! Every operation is a single POST of `{ inputs, parameters? }` to
//! `{base_url}/{model}` with a bearer token, in the shape used by the Hugging
//! Face Inference API. A non-success status or a body that does not match the
//! expected shape fails the call; nothing is retried.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::types::*;
use crate::capability::CapabilityRequest;
use crate::config::RemoteConfig;
use crate::language::{LanguageCode, LanguagePair};

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Classification {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary_text: String,
}

#[derive(Debug, Deserialize)]
struct TranslationOutput {
    translation_text: String,
}

pub struct RemoteProvider {
    client: Client,
    base_url: String,
    api_key: String,
    detect_model: String,
    summarize_model: String,
    translate_model: String,
    supported_languages: Vec<LanguageCode>,
}

impl RemoteProvider {
    /// Creates a remote provider from configuration.
    ///
    /// Fails when no API key is configured.
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Other("Remote provider requires an API key".to_string())
            })?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self::with_client(client, config, api_key))
    }

    /// Creates a remote provider with a custom HTTP client.
    pub fn with_client(client: Client, config: &RemoteConfig, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            detect_model: config.detect_model.clone(),
            summarize_model: config.summarize_model.clone(),
            translate_model: config.translate_model.clone(),
            supported_languages: config.supported_languages.clone(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}", self.base_url, model)
    }

    async fn infer(&self, model: &str, inputs: &str, parameters: Option<Value>) -> Result<Value> {
        let url = self.endpoint(model);
        debug!(%url, "Sending inference request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&InferenceRequest { inputs, parameters })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%url, %status, %body, "Inference request failed");
            return Err(ProviderError::Status(status));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("body is not JSON: {}", e)))?;
        debug!(%url, response = %data, "Inference response");

        Ok(data)
    }
}

/// Extracts the first element of an array response as `T`.
fn first_of<T: serde::de::DeserializeOwned>(data: Value, what: &str) -> Result<T> {
    let Value::Array(items) = data else {
        return Err(ProviderError::MalformedResponse(format!(
            "expected an array of {}",
            what
        )));
    };

    let first = items
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse(format!("empty {} array", what)))?;

    serde_json::from_value(first)
        .map_err(|e| ProviderError::MalformedResponse(format!("unexpected {} shape: {}", what, e)))
}

/// Text classification comes back either nested per input (`[[...]]`) or flat.
fn parse_classifications(data: Value) -> Result<Vec<Classification>> {
    let Value::Array(items) = data else {
        return Err(ProviderError::MalformedResponse(
            "expected an array of classifications".to_string(),
        ));
    };

    let nested = matches!(items.first(), Some(Value::Array(_)));
    let flat = if nested {
        items.into_iter().next().unwrap_or_default()
    } else {
        Value::Array(items)
    };

    serde_json::from_value(flat)
        .map_err(|e| {
            ProviderError::MalformedResponse(format!("unexpected classification shape: {}", e))
        })
}

#[async_trait]
impl Provider for RemoteProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn supported_languages(&self) -> Option<&[LanguageCode]> {
        Some(&self.supported_languages)
    }

    /// Remote endpoints are assumed ready; availability shows up in the
    /// response status instead.
    async fn prepare(&self, _request: &CapabilityRequest) -> Result<()> {
        Ok(())
    }

    async fn detect_language(&self, text: &str) -> Result<DetectionResult> {
        let data = self.infer(&self.detect_model, text, None).await?;
        let candidates = parse_classifications(data)?
            .into_iter()
            .map(|c| DetectionCandidate::new(c.label, c.score));

        DetectionResult::best(candidates)
            .ok_or_else(|| ProviderError::MalformedResponse("no language candidates".to_string()))
    }

    async fn summarize(&self, text: &str, options: &SummarizeOptions) -> Result<SummaryResult> {
        let (min_length, max_length) = options.length.token_bounds();
        let parameters = serde_json::json!({
            "min_length": min_length,
            "max_length": max_length,
        });

        let data = self
            .infer(&self.summarize_model, text, Some(parameters))
            .await?;
        let output: SummaryOutput = first_of(data, "summaries")?;

        Ok(SummaryResult {
            summary: output.summary_text,
        })
    }

    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<TranslationResult> {
        let parameters = serde_json::json!({
            "src_lang": pair.source.as_str(),
            "tgt_lang": pair.target.as_str(),
        });

        let data = self
            .infer(&self.translate_model, text, Some(parameters))
            .await?;
        let output: TranslationOutput = first_of(data, "translations")?;

        Ok(TranslationResult {
            translated_text: output.translation_text,
        })
    }
}
