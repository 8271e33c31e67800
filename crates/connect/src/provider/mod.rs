//! Billing provider clients.
//!
//! Both providers are reached through [`BillingApiClient`]. The sync engine
//! never branches on the concrete provider; the only auth difference it sees
//! is whether a session id must be obtained first.

mod catalog;
mod http;
mod models;
mod session_api;
mod token_api;

use std::sync::Arc;

use async_trait::async_trait;

use ledgerlink_core::documents::{DocumentType, ExternalDocument};
use ledgerlink_core::errors::{Error, Result};
use ledgerlink_core::organizations::BillingProvider;

pub use catalog::{session_api_code, token_api_endpoint, token_api_root};
pub use session_api::SessionApiClient;
pub use token_api::TokenApiClient;

/// Default timeout for provider requests, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Placeholder in the token API URL template replaced with the account name.
pub const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// State of an asynchronously generated PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfStatus {
    /// The provider accepted the request but has not produced the file yet.
    Pending,
    /// The file can be downloaded from `url`.
    Ready { url: String },
}

/// One listing page as returned by a provider.
///
/// `raw_len` counts every item the provider sent, including entries that
/// could not be parsed into `documents`. Only a page with no raw items ends
/// pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPage {
    pub documents: Vec<ExternalDocument>,
    pub raw_len: usize,
}

impl DocumentPage {
    pub fn new(documents: Vec<ExternalDocument>, raw_len: usize) -> Self {
        Self { documents, raw_len }
    }

    /// The provider returned no items at all.
    pub fn is_exhausted(&self) -> bool {
        self.raw_len == 0
    }
}

/// Credentials resolved from an organization's billing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub provider: BillingProvider,
    pub api_key: String,
    pub account_name: Option<String>,
    pub base_url: Option<String>,
}

/// Operations every billing provider supports.
///
/// `session` is the provider session id for session-auth providers and
/// `None` for providers that authenticate each request with the API key.
#[async_trait]
pub trait BillingApiClient: Send + Sync {
    fn provider(&self) -> BillingProvider;

    /// Exchanges the API key for a new session id.
    async fn authenticate(&self) -> Result<String>;

    /// Fetches one page (1-based) of documents of the given type.
    async fn list_documents(
        &self,
        session: Option<&str>,
        document_type: DocumentType,
        page: u32,
        per_page: u32,
    ) -> Result<DocumentPage>;

    /// Asks for the document's PDF. Generation may still be running.
    async fn poll_pdf(
        &self,
        session: Option<&str>,
        document_type: DocumentType,
        external_id: &str,
    ) -> Result<PdfStatus>;

    /// Downloads bytes from a URL returned by [`BillingApiClient::poll_pdf`].
    async fn download_pdf(&self, url: &str) -> Result<Vec<u8>>;

    /// Voids (cancels) a document upstream.
    async fn void_document(
        &self,
        session: Option<&str>,
        document_type: DocumentType,
        external_id: &str,
        reason: &str,
    ) -> Result<()>;
}

/// Builds a client for a set of credentials.
pub trait ProviderClientFactory: Send + Sync {
    fn create(&self, credentials: &ProviderCredentials) -> Result<Arc<dyn BillingApiClient>>;
}

/// Factory producing the reqwest-backed clients.
#[derive(Debug, Clone)]
pub struct HttpProviderClientFactory {
    token_api_url_template: Option<String>,
    session_api_url: Option<String>,
    timeout_ms: u64,
}

impl HttpProviderClientFactory {
    /// `token_api_url_template` may contain `{account}`, replaced with the
    /// organization's account name. An organization-level base URL always
    /// takes precedence over both defaults.
    pub fn new(
        token_api_url_template: Option<String>,
        session_api_url: Option<String>,
        timeout_ms: u64,
    ) -> Self {
        Self {
            token_api_url_template,
            session_api_url,
            timeout_ms,
        }
    }

    fn base_url(&self, credentials: &ProviderCredentials) -> Result<String> {
        if let Some(base) = credentials.base_url.as_deref().filter(|b| !b.trim().is_empty()) {
            return Ok(base.trim().to_string());
        }

        match credentials.provider {
            BillingProvider::TokenApi => {
                let template = self.token_api_url_template.as_deref().ok_or_else(|| {
                    Error::Configuration("no base URL configured for token_api".to_string())
                })?;
                if template.contains(ACCOUNT_PLACEHOLDER) {
                    let account = credentials.account_name.as_deref().ok_or_else(|| {
                        Error::Configuration("token_api requires an account name".to_string())
                    })?;
                    Ok(template.replace(ACCOUNT_PLACEHOLDER, account))
                } else {
                    Ok(template.to_string())
                }
            }
            BillingProvider::SessionApi => self.session_api_url.clone().ok_or_else(|| {
                Error::Configuration("no base URL configured for session_api".to_string())
            }),
        }
    }
}

impl ProviderClientFactory for HttpProviderClientFactory {
    fn create(&self, credentials: &ProviderCredentials) -> Result<Arc<dyn BillingApiClient>> {
        let base_url = self.base_url(credentials)?;
        let client: Arc<dyn BillingApiClient> = match credentials.provider {
            BillingProvider::TokenApi => Arc::new(TokenApiClient::new(
                &base_url,
                &credentials.api_key,
                self.timeout_ms,
            )?),
            BillingProvider::SessionApi => Arc::new(SessionApiClient::new(
                &base_url,
                &credentials.api_key,
                self.timeout_ms,
            )?),
        };
        Ok(client)
    }
}
