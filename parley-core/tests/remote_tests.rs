//! HTTP endpoints served by the hosted inference provider, against a mock
//! inference API.

mod common;

use axum::http::StatusCode;
use axum::Router;
use common::{json_body, post_json, send};
use parley_core::config::{Backend, FeatureConfig, FeaturesConfig, RemoteConfig};
use parley_core::provider::{ProviderSet, RemoteProvider};
use parley_core::{router, AppState};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote_app(server: &MockServer) -> Router {
    let config = RemoteConfig {
        base_url: server.uri(),
        ..RemoteConfig::default()
    };
    let provider = RemoteProvider::with_client(reqwest::Client::new(), &config, "test-key");
    let features = FeaturesConfig {
        detect: FeatureConfig::new(Backend::Remote),
        summarize: FeatureConfig::new(Backend::Remote),
        translate: FeatureConfig::new(Backend::Remote),
    };

    let state = AppState::new(ProviderSet::uniform(Arc::new(provider)), &features).unwrap();
    router(state)
}

#[tokio::test]
async fn detection_picks_highest_score_and_authenticates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/papluca/xlm-roberta-base-language-detection"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"inputs": "Olá, tudo bem?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
            {"label": "es", "score": 0.21},
            {"label": "pt", "score": 0.74},
            {"label": "it", "score": 0.05}
        ]])))
        .expect(1)
        .mount(&server)
        .await;

    let app = remote_app(&server);
    let response = send(
        &app,
        post_json("/api/detect-language", r#"{"text":"Olá, tudo bem?"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"language": "pt", "confidence": 0.74})
    );
}

#[tokio::test]
async fn upstream_failure_returns_only_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
        .mount(&server)
        .await;

    let app = remote_app(&server);
    let response = send(&app, post_json("/api/detect-language", r#"{"text":"Hello"}"#)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(body["error"], "Failed to detect language");
}

#[tokio::test]
async fn unexpected_shape_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/facebook/bart-large-cnn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"generated": "?"})))
        .mount(&server)
        .await;

    let app = remote_app(&server);
    let response = send(&app, post_json("/api/summarize", r#"{"text":"Some text"}"#)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"error": "Text summarization failed"})
    );
}

#[tokio::test]
async fn summarize_sends_length_bounds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/facebook/bart-large-cnn"))
        .and(body_partial_json(json!({
            "parameters": {"min_length": 20, "max_length": 60}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"summary_text": "A short summary."}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = remote_app(&server);
    let response = send(
        &app,
        post_json("/api/summarize", r#"{"text":"A long text.","length":"short"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"summary": "A short summary."})
    );
}

#[tokio::test]
async fn translate_passes_language_pair() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/facebook/m2m100_418M"))
        .and(body_partial_json(json!({
            "inputs": "Good morning",
            "parameters": {"src_lang": "en", "tgt_lang": "tr"}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"translation_text": "Günaydın"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = remote_app(&server);
    let response = send(
        &app,
        post_json(
            "/api/translate",
            r#"{"text":"Good morning","sourceLang":"English","targetLang":"tr"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"translatedText": "Günaydın", "translation": "Günaydın"})
    );
}

#[tokio::test]
async fn disallowed_target_never_reaches_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"translation_text": "x"}])))
        .expect(0)
        .mount(&server)
        .await;

    let app = remote_app(&server);
    let response = send(
        &app,
        post_json(
            "/api/translate",
            r#"{"text":"Hello","sourceLang":"en","targetLang":"de"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Unsupported language: de"));
}
