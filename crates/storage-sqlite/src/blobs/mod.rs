//! Filesystem blob store for document PDFs.

use async_trait::async_trait;
use log::debug;
use std::path::{Component, Path, PathBuf};

use ledgerlink_core::blobs::BlobStoreTrait;
use ledgerlink_core::errors::{Error, Result};

/// Stores blobs as files under a root directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never sees a half-written PDF and a repeated put overwrites.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative blob path under the root. Absolute paths and
    /// parent components are rejected.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let is_safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_safe {
            return Err(Error::Storage(format!("Invalid blob path '{}'", path)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStoreTrait for FsBlobStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let staging = target.with_extension("part");
        tokio::fs::write(&staging, &bytes).await?;
        tokio::fs::rename(&staging, &target).await?;

        debug!(
            "[Blobs] Stored {} ({} bytes, {})",
            path,
            bytes.len(),
            content_type
        );
        Ok(path.to_string())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(target).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlink_core::blobs::PDF_CONTENT_TYPE;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_creates_directories_and_overwrites() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        let path = "org-1/invoice_42.pdf";
        store
            .put(path, b"first".to_vec(), PDF_CONTENT_TYPE)
            .await
            .unwrap();
        let stored = store
            .put(path, b"second".to_vec(), PDF_CONTENT_TYPE)
            .await
            .unwrap();

        assert_eq!(stored, path);
        assert!(store.exists(path).await.unwrap());
        let bytes = std::fs::read(dir.path().join(path)).unwrap();
        assert_eq!(bytes, b"second");
        assert!(!dir.path().join("org-1/invoice_42.part").exists());
    }

    #[tokio::test]
    async fn test_missing_blob_does_not_exist() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());
        assert!(!store.exists("org-1/nothing.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_escaping_paths_are_rejected() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("blobs"));

        for path in ["../outside.pdf", "/etc/passwd", ""] {
            let err = store
                .put(path, b"x".to_vec(), PDF_CONTENT_TYPE)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Storage(_)), "{path}");
        }
    }
}
