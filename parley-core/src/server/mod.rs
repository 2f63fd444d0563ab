//! HTTP server for the language endpoints.
//!
//! The server is organized into separate concerns:
//! - `types`: Wire types for requests and responses
//! - `handler`: Validation, capability negotiation and provider invocation
//! - `error`: The `{ error }` envelope and its status codes

mod error;
mod handler;
mod types;

// Re-export types for external use
pub use error::{ApiError, ApiResult};
pub use handler::{AppState, FeatureHandle, JsonBody, ORIGIN_TRIAL};
pub use types::{
    BackendReport, DetectRequest, DetectResponse, ErrorBody, HealthResponse, SummarizeRequest,
    SummarizeResponse, TranslateRequest, TranslateResponse,
};

use crate::config::{Config, ConfigError};
use crate::provider::{create_providers, ProviderError};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// Builds the API router around `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/detect-language", post(handler::detect_language))
        .route("/api/summarize", post(handler::summarize))
        .route("/api/translate", post(handler::translate))
        .route("/health", get(handler::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> std::result::Result<CorsLayer, ConfigError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([ORIGIN_TRIAL]);

    if origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|_| ConfigError::Invalid(format!("invalid CORS origin: {}", o)))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

/// Main server binding the router to a TCP listener.
pub struct Server {
    app: Router,
    addr: String,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// Validates the configuration and resolves the provider for each feature
    /// (remote or on-device). Nothing is probed yet; on-device capabilities
    /// are checked per request.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let providers = create_providers(&config)?;
        let state = AppState::new(providers, &config.features)?;
        let app = router(state).layer(cors_layer(&config.server.cors_origins)?);

        info!(
            detect = config.features.detect.backend.as_str(),
            summarize = config.features.summarize.backend.as_str(),
            translate = config.features.translate.backend.as_str(),
            "Backends selected"
        );

        Ok(Self {
            app,
            addr: format!("{}:{}", config.server.host, config.server.port),
        })
    }

    /// Starts the server and serves until Ctrl-C.
    pub async fn start(self) -> Result<()> {
        let listener = TcpListener::bind(&self.addr).await?;
        let local: SocketAddr = listener.local_addr()?;

        info!("Language server listening on http://{}", local);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async {
                let _ = signal::ctrl_c().await;
                info!("Shutting down...");
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;

    #[test]
    fn test_cors_rejects_bad_origin() {
        assert!(cors_layer(&["*".to_string()]).is_ok());
        assert!(cors_layer(&["http://localhost:3000".to_string()]).is_ok());
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }

    #[test]
    fn test_server_new_validates_config() {
        let config = Config::default().with_backend(Backend::Remote);
        assert!(matches!(Server::new(config), Err(ServerError::Config(_))));

        let config = Config::default().with_backend(Backend::OnDevice).with_port(0);
        assert!(Server::new(config).is_ok());
    }
}
