//! Finding images in the directory being searched.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

use crate::config::SearchConfig;

/// Discovers image files directly inside a directory (no recursion).
pub struct ImageDiscovery {
    supported_formats: Vec<String>,
}

/// An image found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredImage {
    /// Path relative to the scanned directory; the index key
    pub path: String,
    /// Full path for reading
    pub full_path: PathBuf,
    /// Modification time in milliseconds since the epoch
    pub mtime_ms: f64,
}

impl ImageDiscovery {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            supported_formats: config
                .supported_formats
                .iter()
                .map(|f| f.to_lowercase())
                .collect(),
        }
    }

    /// List supported images in `dir`, sorted by path.
    ///
    /// Entries whose metadata cannot be read are skipped.
    pub fn discover(&self, dir: &Path) -> Vec<DiscoveredImage> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if !entry_path.is_file() || !self.is_supported(entry_path) {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            let Some(mtime_ms) = meta.modified().ok().and_then(mtime_millis) else {
                tracing::debug!("No modification time for {:?}, skipping", entry_path);
                continue;
            };
            let relative = entry_path.strip_prefix(dir).unwrap_or(entry_path);
            files.push(DiscoveredImage {
                path: relative.to_string_lossy().into_owned(),
                full_path: entry_path.to_path_buf(),
                mtime_ms,
            });
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext_lower = ext.to_lowercase();
                self.supported_formats.iter().any(|fmt| *fmt == ext_lower)
            })
            .unwrap_or(false)
    }
}

fn mtime_millis(time: std::time::SystemTime) -> Option<f64> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs_f64() * 1000.0)
}
