//! Bringing the embedding cache up to date with the files on disk.

use std::collections::HashSet;

use super::discovery::DiscoveredImage;
use super::store::EmbeddingCache;
use crate::api::{EmbedInput, Embedder, ImageInput};
use crate::error::IndexError;

/// Progress notifications emitted while refreshing.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexEvent {
    /// Stale entries were dropped; `total` files will be checked
    Reconciled { total: usize, removed: usize },
    /// Entry was current, no remote call made
    Cached { path: String },
    /// Entry was (re)computed
    Embedded { path: String },
    /// Embedding failed; the file has no entry until a later run succeeds
    Failed { path: String, message: String },
}

/// Counts from one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub cached: usize,
    pub embedded: usize,
    pub failed: usize,
    pub removed: usize,
}

/// Sync `cache` with `files`, embedding whatever is new or changed.
///
/// An entry is reused when both its mtime and its mode match; anything else
/// triggers one remote embed call. Files are processed one at a time. A
/// per-file failure is reported and skipped, never fatal: only cache I/O
/// errors abort the pass.
pub async fn refresh_index<E, F>(
    cache: &mut EmbeddingCache,
    files: &[DiscoveredImage],
    embedder: &E,
    mode: &str,
    mut on_event: F,
) -> Result<RefreshStats, IndexError>
where
    E: Embedder + ?Sized,
    F: FnMut(IndexEvent),
{
    let current: HashSet<String> = files.iter().map(|f| f.path.clone()).collect();
    let mut stats = RefreshStats {
        removed: cache.reconcile(&current)?,
        ..RefreshStats::default()
    };
    on_event(IndexEvent::Reconciled {
        total: files.len(),
        removed: stats.removed,
    });

    for file in files {
        if let Some(entry) = cache.get(&file.path)? {
            if entry.mtime == file.mtime_ms && entry.mode == mode {
                stats.cached += 1;
                on_event(IndexEvent::Cached {
                    path: file.path.clone(),
                });
                continue;
            }
        }

        match embed_file(file, embedder, mode).await {
            Ok(embedding) => {
                cache.upsert(&file.path, file.mtime_ms, mode, &embedding)?;
                stats.embedded += 1;
                on_event(IndexEvent::Embedded {
                    path: file.path.clone(),
                });
            }
            Err(message) => {
                tracing::warn!("Failed to index {}: {}", file.path, message);
                cache.remove(&file.path)?;
                stats.failed += 1;
                on_event(IndexEvent::Failed {
                    path: file.path.clone(),
                    message,
                });
            }
        }
    }

    tracing::debug!(
        cached = stats.cached,
        embedded = stats.embedded,
        failed = stats.failed,
        removed = stats.removed,
        "Index refresh complete"
    );
    Ok(stats)
}

async fn embed_file<E>(file: &DiscoveredImage, embedder: &E, mode: &str) -> Result<Vec<f64>, String>
where
    E: Embedder + ?Sized,
{
    let image = ImageInput::from_path(&file.full_path).map_err(|e| e.to_string())?;
    embedder
        .embed(&EmbedInput::Image(image), mode)
        .await
        .map_err(|e| e.to_string())
}
