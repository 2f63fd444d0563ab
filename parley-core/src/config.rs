use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::language::{default_supported_languages, LanguageCode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub const ENV_API_KEY: &str = "HUGGINGFACE_API_KEY";
pub const ENV_TRIAL_DETECT: &str = "ORIGIN_TRIAL_DETECT_LANGUAGE";
pub const ENV_TRIAL_SUMMARIZE: &str = "ORIGIN_TRIAL_SUMMARIZE";
pub const ENV_TRIAL_TRANSLATE: &str = "ORIGIN_TRIAL_TRANSLATE";

/// Configuration for the whole service.
///
/// Read once at startup and shared read-only afterwards. Secrets (API key and
/// trial tokens) are normally supplied through the environment and override
/// whatever the file contains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub on_device: OnDeviceConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser. `["*"]` allows any.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Which backend serves a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Hosted inference API reached over HTTP
    Remote,
    /// Local runtime that must be probed (and possibly downloaded) before use
    OnDevice,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Remote => "remote",
            Backend::OnDevice => "on_device",
        }
    }
}

/// Per-feature settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub backend: Backend,
    /// Value for the `Origin-Trial` response header. No header when unset.
    #[serde(default)]
    pub origin_trial: Option<String>,
}

impl FeatureConfig {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            origin_trial: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    pub detect: FeatureConfig,
    pub summarize: FeatureConfig,
    pub translate: FeatureConfig,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            detect: FeatureConfig::new(Backend::OnDevice),
            summarize: FeatureConfig::new(Backend::Remote),
            translate: FeatureConfig::new(Backend::OnDevice),
        }
    }
}

/// Configuration for the hosted inference API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL; the model id is appended as a path segment
    pub base_url: String,
    /// Bearer token. Usually taken from `HUGGINGFACE_API_KEY`.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub detect_model: String,
    pub summarize_model: String,
    pub translate_model: String,
    /// Languages accepted by the translate endpoint
    #[serde(default = "default_supported_languages")]
    pub supported_languages: Vec<LanguageCode>,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            api_key: None,
            detect_model: "papluca/xlm-roberta-base-language-detection".to_string(),
            summarize_model: "facebook/bart-large-cnn".to_string(),
            translate_model: "facebook/m2m100_418M".to_string(),
            supported_languages: default_supported_languages(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Configuration for the local model runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnDeviceConfig {
    /// Base URL of the local Ollama daemon
    pub base_url: String,
    /// Model used for every on-device feature
    pub model: String,
    /// Languages the local model is trusted to translate between
    #[serde(default = "default_supported_languages")]
    pub languages: Vec<LanguageCode>,
    /// Upper bound for a model download before the request gives up
    #[serde(default = "default_setup_timeout")]
    pub setup_timeout_secs: u64,
    /// Longest silence tolerated on a daemon connection, in seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_setup_timeout() -> u64 {
    600
}

fn default_read_timeout() -> u64 {
    120
}

impl Default for OnDeviceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:1.5b".to_string(),
            languages: default_supported_languages(),
            setup_timeout_secs: default_setup_timeout(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

impl OnDeviceConfig {
    pub fn setup_timeout(&self) -> Duration {
        Duration::from_secs(self.setup_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            features: FeaturesConfig::default(),
            remote: RemoteConfig::default(),
            on_device: OnDeviceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from `config.yaml` if it exists, otherwise use defaults.
    pub fn load_or_default() -> Self {
        Self::load("config.yaml").unwrap_or_else(|_| {
            let mut config = Self::default();
            config.apply_env(|key| std::env::var(key).ok());
            config
        })
    }

    /// Create a new Config with default values and builder-style configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay secrets from the environment. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_API_KEY) {
            self.remote.api_key = Some(key);
        }
        if let Some(token) = non_empty(ENV_TRIAL_DETECT) {
            self.features.detect.origin_trial = Some(token);
        }
        if let Some(token) = non_empty(ENV_TRIAL_SUMMARIZE) {
            self.features.summarize.origin_trial = Some(token);
        }
        if let Some(token) = non_empty(ENV_TRIAL_TRANSLATE) {
            self.features.translate.origin_trial = Some(token);
        }
    }

    /// Check invariants that must hold before the server starts.
    pub fn validate(&self) -> Result<()> {
        let uses_remote = [
            &self.features.detect,
            &self.features.summarize,
            &self.features.translate,
        ]
        .iter()
        .any(|f| f.backend == Backend::Remote);

        if uses_remote {
            let has_key = self
                .remote
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty());
            if !has_key {
                return Err(ConfigError::Invalid(format!(
                    "a remote backend is selected but no API key is set ({} or remote.api_key)",
                    ENV_API_KEY
                )));
            }
        }

        if self.features.translate.backend == Backend::Remote
            && self.remote.supported_languages.is_empty()
        {
            return Err(ConfigError::Invalid(
                "remote.supported_languages must not be empty".to_string(),
            ));
        }

        if self.features.translate.backend == Backend::OnDevice
            && self.on_device.languages.is_empty()
        {
            return Err(ConfigError::Invalid(
                "on_device.languages must not be empty".to_string(),
            ));
        }

        for (name, feature) in [
            ("detect", &self.features.detect),
            ("summarize", &self.features.summarize),
            ("translate", &self.features.translate),
        ] {
            if let Some(token) = &feature.origin_trial {
                if axum::http::HeaderValue::from_str(token).is_err() {
                    return Err(ConfigError::Invalid(format!(
                        "origin trial token for '{}' is not a valid header value",
                        name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Set the listening port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    /// Set the listening host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.server.host = host.into();
        self
    }

    /// Use the same backend for every feature.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.features.detect.backend = backend;
        self.features.summarize.backend = backend;
        self.features.translate.backend = backend;
        self
    }

    /// Set the remote inference API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.remote.api_key = Some(key.into());
        self
    }

    /// Set the remote inference base URL.
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote.base_url = url.into();
        self
    }

    /// Set the local runtime base URL.
    pub fn with_on_device_url(mut self, url: impl Into<String>) -> Self {
        self.on_device.base_url = url.into();
        self
    }

    /// Set the local runtime model.
    pub fn with_on_device_model(mut self, model: impl Into<String>) -> Self {
        self.on_device.model = model.into();
        self
    }
}
