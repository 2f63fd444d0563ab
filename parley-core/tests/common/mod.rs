//! Shared helpers for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use futures::stream;
use http_body_util::BodyExt;
use parley_core::capability::{CapabilityRequest, CapabilityStatus, DownloadProgress};
use parley_core::config::{Backend, FeatureConfig, FeaturesConfig};
use parley_core::provider::{
    DetectionCandidate, LocalRuntime, OnDeviceProvider, ProviderError, ProviderSet, Result,
    SummarizeOptions, TextStream,
};
use parley_core::{router, AppState, LanguagePair};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// A scriptable on-device runtime that counts how it is used.
pub struct FakeRuntime {
    pub status: CapabilityStatus,
    pub candidates: Vec<DetectionCandidate>,
    pub chunks: Vec<String>,
    pub unsupported_target: Option<&'static str>,
    pub probes: AtomicUsize,
    pub setups: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeRuntime {
    pub fn ready() -> Self {
        Self {
            status: CapabilityStatus::ReadyImmediately,
            candidates: vec![
                DetectionCandidate::new("fr", 0.12),
                DetectionCandidate::new("en", 0.83),
                DetectionCandidate::new("es", 0.05),
            ],
            chunks: vec!["Sum".to_string(), "mary.".to_string()],
            unsupported_target: None,
            probes: AtomicUsize::new(0),
            setups: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_status(mut self, status: CapabilityStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_chunks(mut self, chunks: &[&str]) -> Self {
        self.chunks = chunks.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn without_target(mut self, target: &'static str) -> Self {
        self.unsupported_target = Some(target);
        self
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn setups(&self) -> usize {
        self.setups.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn stream(&self) -> TextStream {
        let chunks: Vec<Result<String>> = self.chunks.iter().cloned().map(Ok).collect();
        Box::pin(stream::iter(chunks))
    }
}

#[async_trait]
impl LocalRuntime for FakeRuntime {
    async fn availability(&self, request: &CapabilityRequest) -> Result<CapabilityStatus> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if let (CapabilityRequest::Translate(pair), Some(target)) =
            (request, self.unsupported_target)
        {
            if pair.target.as_str() == target {
                return Ok(CapabilityStatus::Unavailable);
            }
        }
        Ok(self.status)
    }

    async fn setup(
        &self,
        _request: &CapabilityRequest,
        on_progress: &(dyn Fn(DownloadProgress) + Send + Sync),
    ) -> Result<()> {
        self.setups.fetch_add(1, Ordering::SeqCst);
        on_progress(DownloadProgress {
            loaded: 1024,
            total: Some(1024),
        });
        Ok(())
    }

    async fn detect(&self, _text: &str) -> Result<Vec<DetectionCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.candidates.clone())
    }

    async fn summarize(&self, _text: &str, _options: &SummarizeOptions) -> Result<TextStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.stream())
    }

    async fn translate(&self, text: &str, pair: &LanguagePair) -> Result<TextStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text == "explode" {
            return Err(ProviderError::Runtime(format!("model crashed on {}", pair)));
        }
        Ok(self.stream())
    }
}

/// Features all served on-device, with trial tokens on detect and translate.
pub fn features() -> FeaturesConfig {
    FeaturesConfig {
        detect: FeatureConfig {
            backend: Backend::OnDevice,
            origin_trial: Some("detect-trial-token".to_string()),
        },
        summarize: FeatureConfig::new(Backend::OnDevice),
        translate: FeatureConfig {
            backend: Backend::OnDevice,
            origin_trial: Some("translate-trial-token".to_string()),
        },
    }
}

pub fn on_device_app(runtime: Arc<FakeRuntime>) -> Router {
    let provider = Arc::new(OnDeviceProvider::new(runtime, Duration::from_secs(5)));
    let state = AppState::new(ProviderSet::uniform(provider), &features()).unwrap();
    router(state)
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
