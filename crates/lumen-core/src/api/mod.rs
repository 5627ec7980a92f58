//! Remote vision API boundary.
//!
//! All inference (describe, edit, tag, embed) runs server-side; this module
//! only packages image bytes and interprets the JSON responses.

pub mod client;
pub mod image;

pub use client::{EditedImage, EmbedInput, TagOptions, VisionClient};
pub use image::ImageInput;

use async_trait::async_trait;

use crate::error::ApiError;

/// Source of embedding vectors.
///
/// Indexing and search only need embeddings, so they depend on this trait
/// rather than on [`VisionClient`] directly.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed an image or text in the given mode.
    async fn embed(&self, input: &EmbedInput, mode: &str) -> Result<Vec<f64>, ApiError>;
}

#[async_trait]
impl Embedder for VisionClient {
    async fn embed(&self, input: &EmbedInput, mode: &str) -> Result<Vec<f64>, ApiError> {
        VisionClient::embed(self, input, mode).await
    }
}
