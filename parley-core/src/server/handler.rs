//! Request handlers for the three language features.
//!
//! Every handler runs the same sequence: validate the payload, let the
//! provider prepare (probe and set up on-device capabilities), invoke it, then
//! wrap the result with the feature's `Origin-Trial` header. Validation
//! failures return before the provider is touched.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ApiError, ApiResult};
use super::types::*;
use crate::capability::CapabilityRequest;
use crate::config::{ConfigError, FeatureConfig, FeaturesConfig};
use crate::language::{LanguageCode, LanguagePair};
use crate::provider::{Provider, ProviderSet};

pub const ORIGIN_TRIAL: HeaderName = HeaderName::from_static("origin-trial");

/// A feature's provider plus the trial token attached to its responses.
#[derive(Clone)]
pub struct FeatureHandle {
    provider: Arc<dyn Provider>,
    origin_trial: Option<HeaderValue>,
}

impl FeatureHandle {
    pub fn new(provider: Arc<dyn Provider>, config: &FeatureConfig) -> Result<Self, ConfigError> {
        let origin_trial = config
            .origin_trial
            .as_deref()
            .map(HeaderValue::from_str)
            .transpose()
            .map_err(|e| ConfigError::Invalid(format!("invalid origin trial token: {}", e)))?;

        Ok(Self {
            provider,
            origin_trial,
        })
    }

    fn respond<T: Serialize>(&self, body: T) -> Response {
        let mut response = Json(body).into_response();
        if let Some(token) = &self.origin_trial {
            response.headers_mut().insert(ORIGIN_TRIAL, token.clone());
        }
        response
    }
}

/// Shared, read-only state for the handlers.
#[derive(Clone)]
pub struct AppState {
    detect: FeatureHandle,
    summarize: FeatureHandle,
    translate: FeatureHandle,
}

impl AppState {
    pub fn new(providers: ProviderSet, features: &FeaturesConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            detect: FeatureHandle::new(providers.detect, &features.detect)?,
            summarize: FeatureHandle::new(providers.summarize, &features.summarize)?,
            translate: FeatureHandle::new(providers.translate, &features.translate)?,
        })
    }
}

/// JSON body extractor that ignores the content type and reports failures in
/// the `{ error }` envelope.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| {
                ApiError::Validation(format!("Failed to read request body: {}", e.body_text()))
            })?;

        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| ApiError::Validation(format!("Invalid JSON body: {}", e)))
    }
}

fn require_text(text: Option<String>) -> ApiResult<String> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ApiError::Validation("Text is required".to_string())),
    }
}

fn parse_language(value: &str, allowed: Option<&[LanguageCode]>) -> ApiResult<LanguageCode> {
    let code: LanguageCode = value
        .parse()
        .map_err(|_| ApiError::Validation(format!("Unsupported language: {}", value.trim())))?;

    if let Some(allowed) = allowed {
        if !allowed.contains(&code) {
            let supported: Vec<&str> = allowed.iter().map(|l| l.as_str()).collect();
            return Err(ApiError::Validation(format!(
                "Unsupported language: {}. Supported languages: {}",
                code,
                supported.join(", ")
            )));
        }
    }

    Ok(code)
}

/// `POST /api/detect-language`
pub async fn detect_language(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<DetectRequest>,
) -> ApiResult<Response> {
    let text = require_text(payload.text)?;
    let feature = &state.detect;
    let request = CapabilityRequest::DetectLanguage;

    feature
        .provider
        .prepare(&request)
        .await
        .map_err(|e| ApiError::from_provider(e, &request))?;

    let result = feature
        .provider
        .detect_language(&text)
        .await
        .map_err(|e| ApiError::from_provider(e, &request))?;

    info!(
        "Detected Language: {} (Confidence: {})",
        result.detected_language, result.confidence
    );

    Ok(feature.respond(DetectResponse {
        language: result.detected_language,
        confidence: result.confidence,
    }))
}

/// `POST /api/summarize`
pub async fn summarize(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SummarizeRequest>,
) -> ApiResult<Response> {
    let text = require_text(payload.text)?;
    let feature = &state.summarize;
    let request = CapabilityRequest::Summarize;

    feature
        .provider
        .prepare(&request)
        .await
        .map_err(|e| ApiError::from_provider(e, &request))?;

    let result = feature
        .provider
        .summarize(&text, &payload.options)
        .await
        .map_err(|e| ApiError::from_provider(e, &request))?;

    debug!(chars = result.summary.len(), "Summarized text");

    Ok(feature.respond(SummarizeResponse {
        summary: result.summary,
    }))
}

/// `POST /api/translate`
pub async fn translate(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<TranslateRequest>,
) -> ApiResult<Response> {
    let feature = &state.translate;

    let fields = (
        payload.text,
        payload.source_language,
        payload.target_language,
    );
    let (text, source, target) = match fields {
        (Some(text), Some(source), Some(target))
            if !text.trim().is_empty() && !source.trim().is_empty() && !target.trim().is_empty() =>
        {
            (text, source, target)
        }
        _ => {
            return Err(ApiError::Validation(
                "Text, sourceLanguage, and targetLanguage are required.".to_string(),
            ))
        }
    };

    let allowed = feature.provider.supported_languages();
    let pair = LanguagePair::new(
        parse_language(&source, allowed)?,
        parse_language(&target, allowed)?,
    );
    let request = CapabilityRequest::Translate(pair.clone());

    feature
        .provider
        .prepare(&request)
        .await
        .map_err(|e| ApiError::from_provider(e, &request))?;

    let result = feature
        .provider
        .translate(&text, &pair)
        .await
        .map_err(|e| ApiError::from_provider(e, &request))?;

    Ok(feature.respond(TranslateResponse::new(result.translated_text)))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backends: BackendReport {
            detect: state.detect.provider.name().to_string(),
            summarize: state.summarize.provider.name().to_string(),
            translate: state.translate.provider.name().to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_rejects_blank() {
        assert!(require_text(None).is_err());
        assert!(require_text(Some("   \n".to_string())).is_err());
        assert_eq!(require_text(Some("hi".to_string())).unwrap(), "hi");
    }

    #[test]
    fn test_parse_language_against_allowlist() {
        let allowed: Vec<LanguageCode> = vec!["en".parse().unwrap(), "es".parse().unwrap()];

        assert_eq!(parse_language("ES", Some(&allowed)).unwrap().as_str(), "es");
        assert!(matches!(
            parse_language("de", Some(&allowed)),
            Err(ApiError::Validation(_))
        ));
        assert!(parse_language("de", None).is_ok());
        assert!(parse_language("??", None).is_err());
    }
}
