//! Capability probing for on-device runtimes.
//!
//! Before an on-device feature is used, the runtime is asked whether it can
//! serve the request right away, only after a model download, or not at all.
//! [`negotiate`] applies that answer: fail fast, run the bounded setup step, or
//! go straight through. Remote providers never come through here.

use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::language::LanguagePair;
use crate::provider::{LocalRuntime, ProviderError, Result};

/// Whether a capability can serve a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityStatus {
    Unavailable,
    ReadyImmediately,
    ReadyAfterDownload,
}

/// The feature a request needs, with the language pair for translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityRequest {
    DetectLanguage,
    Summarize,
    Translate(LanguagePair),
}

impl CapabilityRequest {
    pub fn feature_name(&self) -> &'static str {
        match self {
            CapabilityRequest::DetectLanguage => "detect-language",
            CapabilityRequest::Summarize => "summarize",
            CapabilityRequest::Translate(_) => "translate",
        }
    }
}

impl fmt::Display for CapabilityRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityRequest::Translate(pair) => write!(f, "translate ({})", pair),
            other => f.write_str(other.feature_name()),
        }
    }
}

/// Download progress reported during setup. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub loaded: u64,
    pub total: Option<u64>,
}

/// Upper bound for a single availability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Asks the runtime whether it can serve `request`.
///
/// A runtime that cannot be reached at all, or does not answer within
/// [`PROBE_TIMEOUT`], reports `Unavailable` rather than an error; only
/// failures of the probe itself propagate.
pub async fn probe<R>(runtime: &R, request: &CapabilityRequest) -> Result<CapabilityStatus>
where
    R: LocalRuntime + ?Sized,
{
    let status = match tokio::time::timeout(PROBE_TIMEOUT, runtime.availability(request)).await {
        Ok(status) => status?,
        Err(_) => {
            warn!(capability = %request, "Runtime did not answer the availability probe");
            CapabilityStatus::Unavailable
        }
    };
    debug!(capability = %request, ?status, "Probed capability");
    Ok(status)
}

/// Probes `request` and, when a download is needed, waits for the runtime's
/// setup to finish within `setup_timeout`.
///
/// Returns `Ok(())` once the capability is usable.
pub async fn negotiate<R>(
    runtime: &R,
    request: &CapabilityRequest,
    setup_timeout: Duration,
) -> Result<()>
where
    R: LocalRuntime + ?Sized,
{
    match probe(runtime, request).await? {
        CapabilityStatus::Unavailable => {
            warn!(capability = %request, "Capability unavailable on this device");
            Err(ProviderError::Unavailable(request.clone()))
        }
        CapabilityStatus::ReadyImmediately => Ok(()),
        CapabilityStatus::ReadyAfterDownload => {
            info!(capability = %request, "Waiting for the model to be ready...");

            let on_progress = |progress: DownloadProgress| match progress.total {
                Some(total) => debug!("Downloaded {} of {} bytes.", progress.loaded, total),
                None => debug!("Downloaded {} bytes.", progress.loaded),
            };

            match tokio::time::timeout(setup_timeout, runtime.setup(request, &on_progress)).await {
                Ok(result) => {
                    result?;
                    info!(capability = %request, "Model ready");
                    Ok(())
                }
                Err(_) => {
                    warn!(
                        capability = %request,
                        timeout_secs = setup_timeout.as_secs(),
                        "Model setup timed out"
                    );
                    Err(ProviderError::SetupTimeout(setup_timeout))
                }
            }
        }
    }
}
