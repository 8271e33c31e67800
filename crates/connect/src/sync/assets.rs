//! PDF retrieval with bounded retry.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use ledgerlink_core::blobs::{BlobStoreTrait, PDF_CONTENT_TYPE};
use ledgerlink_core::documents::{pdf_blob_path, ExternalDocument};
use ledgerlink_core::errors::Result;

use crate::provider::{BillingApiClient, PdfStatus};

/// Polls the provider for a document PDF and stores it in the blob store.
#[derive(Clone)]
pub struct AssetFetcher {
    blob_store: Arc<dyn BlobStoreTrait>,
    attempts: u32,
    retry_delay: Duration,
}

impl AssetFetcher {
    pub fn new(blob_store: Arc<dyn BlobStoreTrait>, attempts: u32, retry_delay: Duration) -> Self {
        Self {
            blob_store,
            attempts: attempts.max(1),
            retry_delay,
        }
    }

    /// Returns the stored path, or `Ok(None)` when no PDF became available
    /// within the retry budget. Only a blob store failure is an error.
    pub async fn fetch(
        &self,
        client: &dyn BillingApiClient,
        session: Option<&str>,
        organization_id: &str,
        document: &ExternalDocument,
    ) -> Result<Option<String>> {
        let Some(url) = self.poll_until_ready(client, session, document).await else {
            warn!(
                "[Assets] No PDF for {} {} after {} attempts",
                document.document_type, document.external_id, self.attempts
            );
            return Ok(None);
        };

        let bytes = match client.download_pdf(&url).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                warn!("[Assets] Empty PDF for {} {}", document.document_type, document.external_id);
                return Ok(None);
            }
            Err(e) => {
                warn!(
                    "[Assets] Failed to download PDF for {} {}: {}",
                    document.document_type, document.external_id, e
                );
                return Ok(None);
            }
        };

        let path = pdf_blob_path(organization_id, document.document_type, &document.external_id);
        let stored = self.blob_store.put(&path, bytes, PDF_CONTENT_TYPE).await?;
        debug!("[Assets] Stored PDF at {}", stored);
        Ok(Some(stored))
    }

    async fn poll_until_ready(
        &self,
        client: &dyn BillingApiClient,
        session: Option<&str>,
        document: &ExternalDocument,
    ) -> Option<String> {
        for attempt in 1..=self.attempts {
            match client
                .poll_pdf(session, document.document_type, &document.external_id)
                .await
            {
                Ok(PdfStatus::Ready { url }) => return Some(url),
                Ok(PdfStatus::Pending) => {
                    debug!(
                        "[Assets] PDF for {} not ready (attempt {}/{})",
                        document.external_id, attempt, self.attempts
                    );
                }
                Err(e) => {
                    debug!(
                        "[Assets] PDF poll for {} failed (attempt {}/{}): {}",
                        document.external_id, attempt, self.attempts, e
                    );
                }
            }

            if attempt < self.attempts && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        None
    }
}
