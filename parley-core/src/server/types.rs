//! Wire types for the HTTP endpoints.

use serde::{Deserialize, Serialize};

use crate::provider::SummarizeOptions;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(flatten)]
    pub options: SummarizeOptions,
}

/// Translation request. Both the long and short language field names are
/// accepted since clients in the wild send either.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "sourceLanguage", alias = "sourceLang")]
    pub source_language: Option<String>,
    #[serde(default, rename = "targetLanguage", alias = "targetLang")]
    pub target_language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectResponse {
    pub language: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// `translation` mirrors `translatedText` for older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub translated_text: String,
    pub translation: String,
}

impl TranslateResponse {
    pub fn new(translated_text: String) -> Self {
        Self {
            translation: translated_text.clone(),
            translated_text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub backends: BackendReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendReport {
    pub detect: String,
    pub summarize: String,
    pub translate: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SummaryLength;
    use serde_json::json;

    #[test]
    fn test_translate_request_accepts_aliases() {
        let long: TranslateRequest = serde_json::from_value(json!({
            "text": "hi", "sourceLanguage": "en", "targetLanguage": "es"
        }))
        .unwrap();
        let short: TranslateRequest = serde_json::from_value(json!({
            "text": "hi", "sourceLang": "en", "targetLang": "es"
        }))
        .unwrap();

        assert_eq!(long.source_language, short.source_language);
        assert_eq!(short.target_language.as_deref(), Some("es"));
    }

    #[test]
    fn test_summarize_request_flattens_options() {
        let req: SummarizeRequest =
            serde_json::from_value(json!({"text": "abc", "length": "long"})).unwrap();
        assert_eq!(req.options.length, SummaryLength::Long);

        let req: SummarizeRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.text.is_none());
    }

    #[test]
    fn test_translate_response_carries_both_names() {
        let body = serde_json::to_value(TranslateResponse::new("hola".to_string())).unwrap();
        assert_eq!(body, json!({"translatedText": "hola", "translation": "hola"}));
    }
}
