//! Provider factory for wiring backends to features based on configuration.

use super::types::*;
use super::{OllamaRuntime, OnDeviceProvider, RemoteProvider};
use crate::config::{Backend, Config};
use std::sync::Arc;
use tracing::info;

/// The provider serving each feature, resolved once at startup.
#[derive(Clone)]
pub struct ProviderSet {
    pub detect: Arc<dyn Provider>,
    pub summarize: Arc<dyn Provider>,
    pub translate: Arc<dyn Provider>,
}

impl ProviderSet {
    /// Uses one provider for every feature.
    pub fn uniform(provider: Arc<dyn Provider>) -> Self {
        Self {
            detect: Arc::clone(&provider),
            summarize: Arc::clone(&provider),
            translate: provider,
        }
    }
}

/// Creates a provider instance for a backend.
///
/// Supported backends:
/// - `remote` - hosted inference API (requires an API key)
/// - `on_device` - local Ollama runtime, probed before every request
pub fn create_provider(backend: Backend, config: &Config) -> Result<Arc<dyn Provider>> {
    match backend {
        Backend::Remote => {
            info!("Using remote provider at {}", config.remote.base_url);
            Ok(Arc::new(RemoteProvider::new(&config.remote)?))
        }
        Backend::OnDevice => {
            info!(
                "Using on-device provider at {} with model: {}",
                config.on_device.base_url, config.on_device.model
            );
            let runtime = Arc::new(OllamaRuntime::new(&config.on_device)?);
            Ok(Arc::new(OnDeviceProvider::new(
                runtime,
                config.on_device.setup_timeout(),
            )))
        }
    }
}

/// Creates the provider for each feature.
///
/// Features sharing a backend share one provider instance.
pub fn create_providers(config: &Config) -> Result<ProviderSet> {
    let mut remote: Option<Arc<dyn Provider>> = None;
    let mut on_device: Option<Arc<dyn Provider>> = None;

    let mut resolve = |backend: Backend| -> Result<Arc<dyn Provider>> {
        let slot = match backend {
            Backend::Remote => &mut remote,
            Backend::OnDevice => &mut on_device,
        };
        if let Some(provider) = slot {
            return Ok(Arc::clone(provider));
        }
        let provider = create_provider(backend, config)?;
        *slot = Some(Arc::clone(&provider));
        Ok(provider)
    };

    Ok(ProviderSet {
        detect: resolve(config.features.detect.backend)?,
        summarize: resolve(config.features.summarize.backend)?,
        translate: resolve(config.features.translate.backend)?,
    })
}
