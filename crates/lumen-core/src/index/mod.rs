//! Local embedding index backing `lumen search`.
//!
//! - **discovery**: find images in the working directory
//! - **store**: the SQLite cache of `(path, mtime, mode, embedding)`
//! - **refresh**: re-embed only what changed since the last run

pub mod discovery;
pub mod refresh;
pub mod store;

pub use discovery::{DiscoveredImage, ImageDiscovery};
pub use refresh::{refresh_index, IndexEvent, RefreshStats};
pub use store::{EmbeddingCache, IndexEntry, DEFAULT_INDEX_FILE};
