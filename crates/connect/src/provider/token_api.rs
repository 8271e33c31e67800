//! Client for the account-scoped token API.
//!
//! Every request carries the API key as a query parameter and JSON bodies
//! are wrapped in a singular root named after the document type.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::StatusCode;
use serde_json::{json, Value};

use ledgerlink_core::documents::DocumentType;
use ledgerlink_core::errors::{Error, Result};
use ledgerlink_core::organizations::BillingProvider;

use super::catalog::{token_api_endpoint, token_api_root};
use super::http::{build_client, download_bytes, parse_body, read_success, send};
use super::models::{TokenApiDocument, TokenApiPdfResponse};
use super::{BillingApiClient, DocumentPage, PdfStatus};

const LABEL: &str = "TokenApi";

/// HTTP client for the token API.
#[derive(Debug, Clone)]
pub struct TokenApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TokenApiClient {
    /// Create a new client.
    ///
    /// `base_url` is the account host, e.g. `https://acme.provider.example`.
    pub fn new(base_url: &str, api_key: &str, timeout_ms: u64) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Configuration("token_api requires an API key".to_string()));
        }
        Ok(Self {
            client: build_client(timeout_ms)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}{}?api_key={}",
            self.base_url,
            path,
            urlencoding::encode(&self.api_key)
        )
    }

    fn parse_listing(&self, document_type: DocumentType, body: &str) -> Result<DocumentPage> {
        let key = token_api_endpoint(document_type);
        let payload: Value = parse_body(LABEL, body)?;
        let items = match payload.get(key) {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(Error::Unexpected(format!(
                    "Unexpected '{}' payload: {}",
                    key,
                    other.to_string().chars().take(200).collect::<String>()
                )))
            }
        };

        let raw_len = items.len();
        let documents: Vec<_> = items
            .into_iter()
            .filter_map(|raw| {
                match serde_json::from_value::<TokenApiDocument>(raw.clone()) {
                    Ok(parsed) => parsed.into_external(document_type, raw),
                    Err(e) => {
                        warn!("[{}] Skipping malformed {} entry: {}", LABEL, key, e);
                        None
                    }
                }
            })
            .collect();
        if documents.len() < raw_len {
            warn!(
                "[{}] Dropped {} of {} {} entries without a usable id",
                LABEL,
                raw_len - documents.len(),
                raw_len,
                key
            );
        }
        Ok(DocumentPage::new(documents, raw_len))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BillingApiClient Trait Implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl BillingApiClient for TokenApiClient {
    fn provider(&self) -> BillingProvider {
        BillingProvider::TokenApi
    }

    /// The token API has no sessions; the API key is the credential.
    async fn authenticate(&self) -> Result<String> {
        Err(Error::Unexpected(
            "token_api does not issue sessions".to_string(),
        ))
    }

    async fn list_documents(
        &self,
        _session: Option<&str>,
        document_type: DocumentType,
        page: u32,
        per_page: u32,
    ) -> Result<DocumentPage> {
        let url = format!(
            "{}&page={}&per_page={}",
            self.url(&format!("/{}.json", token_api_endpoint(document_type))),
            page,
            per_page
        );
        debug!("[{}] GET {} page {}", LABEL, token_api_endpoint(document_type), page);

        let response = send(LABEL, self.client.get(&url).header("Accept", "application/json")).await?;
        let (_, body) = read_success(LABEL, response).await?;
        self.parse_listing(document_type, &body)
    }

    /// `202 Accepted` means generation is still running.
    async fn poll_pdf(
        &self,
        _session: Option<&str>,
        _document_type: DocumentType,
        external_id: &str,
    ) -> Result<PdfStatus> {
        let url = self.url(&format!("/api/pdf/{}.json", urlencoding::encode(external_id)));
        let response = send(LABEL, self.client.get(&url).header("Accept", "application/json")).await?;
        let (status, body) = read_success(LABEL, response).await?;

        if status == StatusCode::ACCEPTED || body.trim().is_empty() {
            return Ok(PdfStatus::Pending);
        }
        let pdf: TokenApiPdfResponse = parse_body(LABEL, &body)?;
        Ok(PdfStatus::Ready {
            url: pdf.output.pdf_url,
        })
    }

    async fn download_pdf(&self, url: &str) -> Result<Vec<u8>> {
        download_bytes(LABEL, &self.client, url).await
    }

    async fn void_document(
        &self,
        _session: Option<&str>,
        document_type: DocumentType,
        external_id: &str,
        reason: &str,
    ) -> Result<()> {
        let url = self.url(&format!(
            "/{}/{}/change-state.json",
            token_api_endpoint(document_type),
            urlencoding::encode(external_id)
        ));
        let body = json!({
            token_api_root(document_type): {
                "state": "canceled",
                "message": reason,
            }
        });
        debug!("[{}] Voiding {} {}", LABEL, document_type, external_id);

        let response = send(LABEL, self.client.put(&url).json(&body)).await?;
        read_success(LABEL, response).await?;
        Ok(())
    }
}
