//! Error envelope returned by the HTTP endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use super::types::ErrorBody;
use crate::capability::CapabilityRequest;
use crate::provider::ProviderError;

/// Result type for handler operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures surfaced to clients.
///
/// Only a short message reaches the client; provider detail is logged where
/// the error is converted.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    Validation(String),

    /// Feature or language pair not supported by the on-device runtime (500)
    #[error("{0}")]
    CapabilityUnavailable(String),

    /// Backend call failed or answered with something unusable (500)
    #[error("{0}")]
    Provider(String),

    /// Anything else (500)
    #[error("{0}")]
    Unknown(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::CapabilityUnavailable(_) | ApiError::Provider(_) | ApiError::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Normalizes a provider failure for `request` into a client-safe error.
    pub fn from_provider(err: ProviderError, request: &CapabilityRequest) -> Self {
        error!(capability = %request, error = %err, "Provider call failed");

        match err {
            ProviderError::Unavailable(_) => {
                ApiError::CapabilityUnavailable(unsupported_message(request))
            }
            ProviderError::SetupTimeout(_) => ApiError::CapabilityUnavailable(format!(
                "The {} model did not become ready in time.",
                request.feature_name()
            )),
            ProviderError::Http(_)
            | ProviderError::Status(_)
            | ProviderError::MalformedResponse(_)
            | ProviderError::Runtime(_) => ApiError::Provider(failure_message(request).to_string()),
            ProviderError::Other(_) => ApiError::Unknown("An unknown error occurred".to_string()),
        }
    }
}

fn unsupported_message(request: &CapabilityRequest) -> String {
    match request {
        CapabilityRequest::DetectLanguage => "Language detection not supported".to_string(),
        CapabilityRequest::Summarize => "Summarization not supported".to_string(),
        CapabilityRequest::Translate(pair) => format!(
            "Translation from {} to {} is not supported.",
            pair.source, pair.target
        ),
    }
}

fn failure_message(request: &CapabilityRequest) -> &'static str {
    match request {
        CapabilityRequest::DetectLanguage => "Failed to detect language",
        CapabilityRequest::Summarize => "Text summarization failed",
        CapabilityRequest::Translate(_) => "Failed to translate text.",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguagePair;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::CapabilityUnavailable("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Unknown("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unavailable_pair_names_languages() {
        let pair = LanguagePair::new("en".parse().unwrap(), "ja".parse().unwrap());
        let request = CapabilityRequest::Translate(pair);
        let err = ApiError::from_provider(ProviderError::Unavailable(request.clone()), &request);

        assert!(matches!(&err, ApiError::CapabilityUnavailable(_)));
        assert_eq!(err.to_string(), "Translation from en to ja is not supported.");
    }

    #[test]
    fn test_provider_detail_is_not_leaked() {
        let request = CapabilityRequest::Summarize;
        let err = ApiError::from_provider(
            ProviderError::MalformedResponse("secret upstream payload".into()),
            &request,
        );
        assert_eq!(err.to_string(), "Text summarization failed");

        let err =
            ApiError::from_provider(ProviderError::SetupTimeout(Duration::from_secs(1)), &request);
        assert!(matches!(err, ApiError::CapabilityUnavailable(_)));
    }
}
