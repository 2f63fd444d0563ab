//! Local runtime backed by an Ollama daemon.
//!
//! - availability: `GET /api/tags`; daemon unreachable means `Unavailable`,
//!   model not pulled yet means `ReadyAfterDownload`
//! - setup: streaming `POST /api/pull`, progress forwarded to the caller
//! - detect: `POST /api/generate` with JSON output
//! - summarize / translate: streaming `POST /api/generate` (NDJSON)

use async_trait::async_trait;
use futures::{future, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

use super::types::*;
use crate::capability::{CapabilityRequest, CapabilityStatus, DownloadProgress};
use crate::config::OnDeviceConfig;
use crate::language::{LanguageCode, LanguagePair};

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct PullStatus {
    #[serde(default)]
    status: String,
    total: Option<u64>,
    completed: Option<u64>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectionReply {
    Many { candidates: Vec<DetectionCandidate> },
    One(DetectionCandidate),
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct OllamaRuntime {
    client: Client,
    base_url: String,
    model: String,
    languages: Vec<LanguageCode>,
}

impl OllamaRuntime {
    /// Creates a runtime whose connections give up after
    /// `config.read_timeout()` of silence from the daemon.
    pub fn new(config: &OnDeviceConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(config.read_timeout())
            .build()?;

        Ok(Self::with_client(client, config))
    }

    /// Creates a runtime with a custom HTTP client.
    pub fn with_client(client: Client, config: &OnDeviceConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            languages: config.languages.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Whether `name` as listed by the daemon refers to the configured model.
    /// An untagged model name matches its `:latest` tag.
    fn is_configured_model(&self, name: &str) -> bool {
        if name == self.model {
            return true;
        }
        !self.model.contains(':') && name == format!("{}:latest", self.model)
    }

    fn supports_pair(&self, pair: &LanguagePair) -> bool {
        self.languages.contains(&pair.source) && self.languages.contains(&pair.target)
    }

    async fn generate_stream(&self, prompt: String) -> Result<TextStream> {
        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: true,
                format: None,
                options: GenerateOptions { temperature: 0.2 },
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let chunks = ndjson_lines(response).and_then(|line| future::ready(parse_chunk(&line)));
        Ok(Box::pin(chunks))
    }
}

/// Splits a streaming response body into non-empty lines.
fn ndjson_lines(
    response: reqwest::Response,
) -> impl futures::Stream<Item = Result<String>> + Send + 'static {
    let reader = StreamReader::new(response.bytes_stream().map_err(std::io::Error::other));

    FramedRead::new(reader, LinesCodec::new())
        .map_err(|e| ProviderError::Runtime(format!("Failed to read stream: {}", e)))
        .try_filter(|line| future::ready(!line.trim().is_empty()))
}

fn parse_chunk(line: &str) -> Result<String> {
    let chunk: GenerateChunk = serde_json::from_str(line)
        .map_err(|e| ProviderError::MalformedResponse(format!("bad generate chunk: {}", e)))?;

    match chunk.error {
        Some(error) => Err(ProviderError::Runtime(error)),
        None => Ok(chunk.response),
    }
}

fn language_label(code: &LanguageCode) -> String {
    match code.english_name() {
        Some(name) => format!("{} ({})", name, code),
        None => code.to_string(),
    }
}

fn summarize_prompt(text: &str, options: &SummarizeOptions) -> String {
    let kind = match options.kind {
        SummaryKind::Summary => "a concise summary",
        SummaryKind::Paraphrase => "a paraphrase that keeps every point in fewer words",
        SummaryKind::Tldr => "a short TL;DR",
        SummaryKind::KeyPoints => "the key points as a list",
        SummaryKind::Teaser => "an intriguing teaser",
        SummaryKind::Headline => "a single headline",
    };
    let length = match options.length {
        SummaryLength::Short => "Keep it very brief.",
        SummaryLength::Medium => "Keep it concise.",
        SummaryLength::Long => "Be thorough but do not pad.",
    };
    let format = match options.format {
        SummaryFormat::PlainText => "plain text without markup",
        SummaryFormat::Markdown => "Markdown",
    };

    let mut prompt = format!(
        "Summarize the text below as {}. {} Write the answer in {}. Reply with the summary only.\n",
        kind, length, format
    );
    if let Some(context) = options.shared_context.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("Context: {}\n", context));
    }
    prompt.push_str(&format!("\nText:\n{}\n", text));
    prompt
}

fn translate_prompt(text: &str, pair: &LanguagePair) -> String {
    format!(
        "Translate the text below from {} to {}. Reply with the translation only.\n\nText:\n{}\n",
        language_label(&pair.source),
        language_label(&pair.target),
        text
    )
}

fn detect_prompt(text: &str) -> String {
    format!(
        "Identify the language of the text below. Reply with JSON of the form \
         {{\"candidates\": [{{\"language\": \"<ISO 639-1 code>\", \"confidence\": <number between 0 and 1>}}]}} \
         listing the most likely languages.\n\nText:\n{}\n",
        text
    )
}

fn parse_detection_reply(reply: &str) -> Result<Vec<DetectionCandidate>> {
    let parsed: DetectionReply = serde_json::from_str(reply.trim())
        .map_err(|e| ProviderError::MalformedResponse(format!("bad detection reply: {}", e)))?;

    Ok(match parsed {
        DetectionReply::Many { candidates } => candidates,
        DetectionReply::One(candidate) => vec![candidate],
    })
}

#[async_trait]
impl LocalRuntime for OllamaRuntime {
    async fn availability(&self, request: &CapabilityRequest) -> Result<CapabilityStatus> {
        if let CapabilityRequest::Translate(pair) = request {
            if !self.supports_pair(pair) {
                return Ok(CapabilityStatus::Unavailable);
            }
        }

        let response = match self.client.get(self.url("/api/tags")).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Local runtime not reachable at {}: {}", self.base_url, e);
                return Ok(CapabilityStatus::Unavailable);
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "Local runtime refused tag listing");
            return Ok(CapabilityStatus::Unavailable);
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("bad tag listing: {}", e)))?;

        if tags.models.iter().any(|m| self.is_configured_model(&m.name)) {
            Ok(CapabilityStatus::ReadyImmediately)
        } else {
            Ok(CapabilityStatus::ReadyAfterDownload)
        }
    }

    async fn setup(
        &self,
        _request: &CapabilityRequest,
        on_progress: &(dyn Fn(DownloadProgress) + Send + Sync),
    ) -> Result<()> {
        info!("Pulling model {}", self.model);

        let response = self
            .client
            .post(self.url("/api/pull"))
            .json(&PullRequest {
                model: &self.model,
                stream: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let mut lines = Box::pin(ndjson_lines(response));
        let mut finished = false;

        while let Some(line) = lines.next().await {
            let status: PullStatus = serde_json::from_str(&line?)
                .map_err(|e| ProviderError::MalformedResponse(format!("bad pull status: {}", e)))?;

            if let Some(error) = status.error {
                return Err(ProviderError::Runtime(format!("Model pull failed: {}", error)));
            }

            if let Some(completed) = status.completed {
                on_progress(DownloadProgress {
                    loaded: completed,
                    total: status.total,
                });
            } else {
                debug!(status = %status.status, "Pull status");
            }

            if status.status == "success" {
                finished = true;
            }
        }

        if finished {
            Ok(())
        } else {
            Err(ProviderError::Runtime(
                "Model pull ended before reporting success".to_string(),
            ))
        }
    }

    async fn detect(&self, text: &str) -> Result<Vec<DetectionCandidate>> {
        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&GenerateRequest {
                model: &self.model,
                prompt: detect_prompt(text),
                stream: false,
                format: Some("json"),
                options: GenerateOptions { temperature: 0.0 },
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let body = response.text().await?;
        let reply = parse_chunk(&body)?;
        parse_detection_reply(&reply)
    }

    async fn summarize(&self, text: &str, options: &SummarizeOptions) -> Result<TextStream> {
        self.generate_stream(summarize_prompt(text, options)).await
    }

    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<TextStream> {
        self.generate_stream(translate_prompt(text, pair)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime(model: &str) -> OllamaRuntime {
        let config = OnDeviceConfig {
            model: model.to_string(),
            ..OnDeviceConfig::default()
        };
        OllamaRuntime::new(&config).unwrap()
    }

    #[test]
    fn test_model_name_matching() {
        let untagged = runtime("llama3");
        assert!(untagged.is_configured_model("llama3"));
        assert!(untagged.is_configured_model("llama3:latest"));
        assert!(!untagged.is_configured_model("llama3:8b"));

        let tagged = runtime("qwen2.5:1.5b");
        assert!(tagged.is_configured_model("qwen2.5:1.5b"));
        assert!(!tagged.is_configured_model("qwen2.5:1.5b:latest"));
    }

    #[test]
    fn test_pair_support_is_joint() {
        let rt = runtime("qwen2.5:1.5b");
        let ok = LanguagePair::new("en".parse().unwrap(), "fr".parse().unwrap());
        let bad = LanguagePair::new("en".parse().unwrap(), "ja".parse().unwrap());
        assert!(rt.supports_pair(&ok));
        assert!(!rt.supports_pair(&bad));
    }

    #[test]
    fn test_parse_chunk_error_line() {
        assert_eq!(parse_chunk(r#"{"response":"Hi","done":false}"#).unwrap(), "Hi");
        assert!(matches!(
            parse_chunk(r#"{"error":"model not found"}"#),
            Err(ProviderError::Runtime(_))
        ));
        assert!(matches!(parse_chunk("not json"), Err(ProviderError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_detection_reply_shapes() {
        let many = parse_detection_reply(
            r#"{"candidates":[{"language":"en","confidence":0.8},{"language":"nl","confidence":0.1}]}"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);

        let one = parse_detection_reply(r#" {"language":"ru","confidence":0.95} "#).unwrap();
        assert_eq!(one, vec![DetectionCandidate::new("ru", 0.95)]);

        assert!(parse_detection_reply("{}").is_err());
    }

    #[test]
    fn test_prompts_mention_inputs() {
        let pair = LanguagePair::new("en".parse().unwrap(), "tr".parse().unwrap());
        let prompt = translate_prompt("good morning", &pair);
        assert!(prompt.contains("english (en)"));
        assert!(prompt.contains("turkish (tr)"));
        assert!(prompt.contains("good morning"));

        let options = SummarizeOptions {
            shared_context: Some("a product changelog".to_string()),
            ..SummarizeOptions::default()
        };
        let prompt = summarize_prompt("lots of words", &options);
        assert!(prompt.contains("key points"));
        assert!(prompt.contains("Context: a product changelog"));
    }
}
