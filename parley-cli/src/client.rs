use anyhow::{anyhow, Context, Result};
use parley_core::provider::SummaryLength;
use parley_core::server::{DetectResponse, ErrorBody, SummarizeResponse, TranslateResponse};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

/// Blocking client for a running parley server.
pub struct ParleyClient {
    http: Client,
    base_url: String,
}

impl ParleyClient {
    pub fn new(base_url: &str) -> Result<Self> {
        // Model downloads can hold a request open for minutes.
        let http = Client::builder()
            .timeout(Duration::from_secs(900))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .with_context(|| format!("Failed to reach {}. Is the server running?", self.base_url))?;

        let status = response.status();
        let text = response.text().context("Failed to read response body")?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            return Err(anyhow!("{} ({})", message, status));
        }

        serde_json::from_str(&text).context(format!("Unexpected response: {}", text))
    }

    pub fn detect(&self, text: &str) -> Result<DetectResponse> {
        self.post("/api/detect-language", json!({ "text": text }))
    }

    pub fn summarize(&self, text: &str, length: SummaryLength) -> Result<SummarizeResponse> {
        self.post(
            "/api/summarize",
            json!({ "text": text, "type": "key-points", "format": "plain-text", "length": length }),
        )
    }

    pub fn translate(&self, text: &str, from: &str, to: &str) -> Result<TranslateResponse> {
        self.post(
            "/api/translate",
            json!({ "text": text, "sourceLanguage": from, "targetLanguage": to }),
        )
    }
}
