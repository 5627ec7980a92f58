//! Lumen Core - library behind the `lumen` vision CLI.
//!
//! Image inference happens on the Lumen service; this crate holds the pieces
//! that run locally:
//!
//! ```text
//! login  → DeviceAuthPoller ──token──▶ TokenStore
//! edit / describe / tag  → Session → VisionClient (bearer token)
//! search → ImageDiscovery → EmbeddingCache refresh → rank()
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use lumen_core::{Config, Session};
//! use lumen_core::index::{refresh_index, EmbeddingCache, ImageDiscovery};
//!
//! #[tokio::main]
//! async fn main() -> lumen_core::Result<()> {
//!     let session = Session::new(Config::load()?);
//!     let client = session.vision_client()?;
//!
//!     let dir = std::env::current_dir()?;
//!     let files = ImageDiscovery::new(&session.config().search).discover(&dir);
//!     let mut cache = EmbeddingCache::open(&dir)?;
//!     refresh_index(&mut cache, &files, &client, "default", |_| {}).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod index;
pub mod math;
pub mod search;
pub mod session;

// Re-exports for convenient access
pub use api::{Embedder, ImageInput, VisionClient};
pub use auth::{Credential, TokenStore};
pub use config::Config;
pub use error::{ApiError, AuthError, ConfigError, IndexError, LumenError, Result, StoreError};
pub use search::{rank, SearchResult};
pub use session::Session;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
