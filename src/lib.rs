//! parley - language detection, summarization and translation over HTTP.
//!
//! Re-exports [`parley_core`]. Each feature is served by either a local
//! runtime (probed, and downloaded on first use) or a hosted inference API,
//! chosen per feature in the configuration.
//!
//! ```no_run
//! use parley::{Backend, Config, Server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default()
//!         .with_backend(Backend::OnDevice)
//!         .with_port(3000);
//!
//!     Server::new(config)?.start().await?;
//!     Ok(())
//! }
//! ```

pub use parley_core::*;
