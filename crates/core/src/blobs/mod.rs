//! Durable blob storage contract for document PDFs.

use async_trait::async_trait;

use crate::errors::Result;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Durable storage for binary objects addressed by a relative path.
#[async_trait]
pub trait BlobStoreTrait: Send + Sync {
    /// Writes `bytes` at `path`, overwriting an existing object.
    ///
    /// Returns the stored path.
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    async fn exists(&self, path: &str) -> Result<bool>;
}
