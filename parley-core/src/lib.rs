//! parley-core - language capability negotiation and serving
//!
//! Provides the pieces behind the parley HTTP endpoints:
//! - Capability probing for on-device runtimes (download, readiness, timeouts)
//! - Providers for language detection, summarization and translation
//!   (local Ollama runtime or hosted inference API)
//! - Configuration management
//! - Server API (primary interface)
//!
//! ## Primary API
//!
//! Users should interact with parley via the `Server` API.

// Public modules
pub mod capability;
pub mod config;
pub mod language;
pub mod provider;
pub mod server;

// Public exports
pub use capability::{CapabilityRequest, CapabilityStatus, DownloadProgress};
pub use config::{Backend, Config, ConfigError};
pub use language::{LanguageCode, LanguagePair};
pub use provider::{Provider, ProviderError, ProviderSet};
pub use server::{router, AppState, Server};
