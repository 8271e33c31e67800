//! Paginated document listing.

use log::{debug, error, info, warn};
use tokio::time::Instant;

use ledgerlink_core::documents::{DocumentType, ExternalDocument};

use crate::provider::BillingApiClient;

/// Result of walking the pages of one document type.
///
/// A listing error ends the walk but keeps whatever was fetched before it.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub document_type: DocumentType,
    pub documents: Vec<ExternalDocument>,
    pub pages_fetched: u32,
    /// Provider error that stopped the walk early.
    pub error: Option<String>,
    /// The walk ended at the page cap.
    pub capped: bool,
    pub timed_out: bool,
}

impl CrawlOutcome {
    fn new(document_type: DocumentType) -> Self {
        Self {
            document_type,
            documents: Vec::new(),
            pages_fetched: 0,
            error: None,
            capped: false,
            timed_out: false,
        }
    }
}

/// Walks provider pages until the provider returns no items or the page cap.
#[derive(Debug, Clone, Copy)]
pub struct DocumentCrawler {
    page_size: u32,
    max_pages: u32,
}

impl DocumentCrawler {
    pub fn new(page_size: u32, max_pages: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            max_pages,
        }
    }

    /// Fetches every page of `document_type`.
    ///
    /// Never fails: errors are captured on the outcome so the caller can move
    /// on to the next type. `deadline` is checked before each page.
    pub async fn crawl_type(
        &self,
        client: &dyn BillingApiClient,
        session: Option<&str>,
        document_type: DocumentType,
        deadline: Option<Instant>,
    ) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::new(document_type);
        let mut previous_first_id: Option<String> = None;

        for page in 1..=self.max_pages {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!("[Crawler] Deadline reached while listing {} (page {})", document_type, page);
                outcome.timed_out = true;
                break;
            }

            let listing = match client
                .list_documents(session, document_type, page, self.page_size)
                .await
            {
                Ok(listing) => listing,
                Err(e) => {
                    error!(
                        "[Crawler] Failed to list {} page {}: {}. Skipping remaining pages of this type.",
                        document_type, page, e
                    );
                    outcome.error = Some(e.to_string());
                    break;
                }
            };

            if listing.is_exhausted() {
                debug!("[Crawler] {}: empty page {}, done", document_type, page);
                break;
            }
            let documents = listing.documents;

            // Guard against APIs that ignore the page parameter
            let first_id = documents.first().map(|d| d.external_id.clone());
            if first_id.is_some() && first_id == previous_first_id {
                warn!(
                    "[Crawler] {}: page {} repeats the previous page, stopping pagination",
                    document_type, page
                );
                break;
            }
            previous_first_id = first_id;

            outcome.pages_fetched = page;
            outcome.documents.extend(documents);

            if page == self.max_pages {
                info!(
                    "[Crawler] {}: stopped at the {} page cap with {} documents",
                    document_type,
                    self.max_pages,
                    outcome.documents.len()
                );
                outcome.capped = true;
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::test_support::FakeClient;
    use ledgerlink_core::organizations::BillingProvider;
    use std::time::Duration;

    #[tokio::test]
    async fn test_walks_until_empty_page() {
        let client = FakeClient::new(BillingProvider::TokenApi);
        client.add_documents(DocumentType::Invoice, 120);

        let outcome = DocumentCrawler::new(50, 20)
            .crawl_type(&client, None, DocumentType::Invoice, None)
            .await;

        assert_eq!(outcome.documents.len(), 120);
        assert_eq!(outcome.pages_fetched, 3);
        assert_eq!(client.list_calls(DocumentType::Invoice), 4);
        assert!(!outcome.capped);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_stops_at_page_cap() {
        let client = FakeClient::new(BillingProvider::TokenApi);
        client.add_documents(DocumentType::Invoice, 25 * 50);

        let outcome = DocumentCrawler::new(50, 20)
            .crawl_type(&client, None, DocumentType::Invoice, None)
            .await;

        assert_eq!(outcome.documents.len(), 1000);
        assert_eq!(client.list_calls(DocumentType::Invoice), 20);
        assert!(outcome.capped);
    }

    #[tokio::test]
    async fn test_error_keeps_documents_already_fetched() {
        let client = FakeClient::new(BillingProvider::TokenApi);
        client.add_documents(DocumentType::Invoice, 120);
        client.fail_listing_from_page(DocumentType::Invoice, 2);

        let outcome = DocumentCrawler::new(50, 20)
            .crawl_type(&client, None, DocumentType::Invoice, None)
            .await;

        assert_eq!(outcome.documents.len(), 50);
        assert!(outcome.error.is_some());
    }

    #[tokio::test]
    async fn test_repeated_page_stops_walk() {
        let client = FakeClient::new(BillingProvider::TokenApi);
        client.add_documents(DocumentType::Invoice, 120);
        client.ignore_page_parameter();

        let outcome = DocumentCrawler::new(50, 20)
            .crawl_type(&client, None, DocumentType::Invoice, None)
            .await;

        assert_eq!(outcome.documents.len(), 50);
        assert_eq!(client.list_calls(DocumentType::Invoice), 2);
    }

    #[tokio::test]
    async fn test_expired_deadline_fetches_nothing() {
        let client = FakeClient::new(BillingProvider::TokenApi);
        client.add_documents(DocumentType::Invoice, 10);
        let deadline = Instant::now() - Duration::from_millis(1);

        let outcome = DocumentCrawler::new(50, 20)
            .crawl_type(&client, None, DocumentType::Invoice, Some(deadline))
            .await;

        assert!(outcome.timed_out);
        assert!(outcome.documents.is_empty());
        assert_eq!(client.list_calls(DocumentType::Invoice), 0);
    }
}
