//! Client for the session-auth API.
//!
//! The API key is exchanged for a session id on `/authenticate`; every other
//! call carries that id in the `sid` header.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde_json::json;

use ledgerlink_core::documents::DocumentType;
use ledgerlink_core::errors::{Error, Result};
use ledgerlink_core::organizations::BillingProvider;

use super::catalog::session_api_code;
use super::http::{build_client, download_bytes, parse_body, parse_response, read_success, send};
use super::models::{
    SessionApiDocument, SessionApiListResponse, SessionApiPdfResponse, SessionAuthResponse,
};
use super::{BillingApiClient, DocumentPage, PdfStatus};

const LABEL: &str = "SessionApi";

/// Header carrying the session id.
pub const SESSION_HEADER: &str = "sid";

/// HTTP client for the session API.
#[derive(Debug, Clone)]
pub struct SessionApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SessionApiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_ms: u64) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Configuration("session_api requires an API key".to_string()));
        }
        Ok(Self {
            client: build_client(timeout_ms)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Create default headers for authenticated requests.
    fn headers(&self, session: Option<&str>) -> Result<HeaderMap> {
        let sid = session.ok_or_else(|| {
            Error::Unexpected("session_api call made without a session".to_string())
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            SESSION_HEADER,
            HeaderValue::from_str(sid)
                .map_err(|e| Error::Unexpected(format!("Invalid session id format: {}", e)))?,
        );
        Ok(headers)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BillingApiClient Trait Implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl BillingApiClient for SessionApiClient {
    fn provider(&self) -> BillingProvider {
        BillingProvider::SessionApi
    }

    async fn authenticate(&self) -> Result<String> {
        let url = format!("{}/authenticate", self.base_url);
        debug!("[{}] POST {}", LABEL, url);

        let response = send(
            LABEL,
            self.client.post(&url).json(&json!({ "api_key": self.api_key })),
        )
        .await?;
        let status = response.status();
        let auth: SessionAuthResponse = parse_response(LABEL, response).await?;

        auth.sid
            .filter(|sid| !sid.trim().is_empty())
            .ok_or_else(|| Error::upstream(status.as_u16(), "authentication returned no session id"))
    }

    async fn list_documents(
        &self,
        session: Option<&str>,
        document_type: DocumentType,
        page: u32,
        per_page: u32,
    ) -> Result<DocumentPage> {
        let url = format!(
            "{}/documents?type={}&page={}&per_page={}",
            self.base_url,
            session_api_code(document_type),
            page,
            per_page
        );
        debug!("[{}] GET {}", LABEL, url);

        let response = send(LABEL, self.client.get(&url).headers(self.headers(session)?)).await?;
        let listing: SessionApiListResponse = parse_response(LABEL, response).await?;

        let raw_len = listing.documents.len();
        let documents = listing
            .documents
            .into_iter()
            .filter_map(|raw| {
                match serde_json::from_value::<SessionApiDocument>(raw.clone()) {
                    Ok(parsed) => parsed.into_external(document_type, raw),
                    Err(e) => {
                        warn!("[{}] Skipping malformed document: {}", LABEL, e);
                        None
                    }
                }
            })
            .collect();
        Ok(DocumentPage::new(documents, raw_len))
    }

    async fn poll_pdf(
        &self,
        session: Option<&str>,
        _document_type: DocumentType,
        external_id: &str,
    ) -> Result<PdfStatus> {
        let url = format!(
            "{}/documents/{}/pdf",
            self.base_url,
            urlencoding::encode(external_id)
        );
        let response = send(LABEL, self.client.get(&url).headers(self.headers(session)?)).await?;
        let (status, body) = read_success(LABEL, response).await?;

        if status == StatusCode::ACCEPTED || body.trim().is_empty() {
            return Ok(PdfStatus::Pending);
        }
        let pdf: SessionApiPdfResponse = parse_body(LABEL, &body)?;
        match (pdf.status.as_deref(), pdf.url) {
            (Some("ready") | None, Some(url)) if !url.is_empty() => Ok(PdfStatus::Ready { url }),
            _ => Ok(PdfStatus::Pending),
        }
    }

    async fn download_pdf(&self, url: &str) -> Result<Vec<u8>> {
        download_bytes(LABEL, &self.client, url).await
    }

    async fn void_document(
        &self,
        session: Option<&str>,
        document_type: DocumentType,
        external_id: &str,
        reason: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/documents/{}/void",
            self.base_url,
            urlencoding::encode(external_id)
        );
        debug!("[{}] Voiding {} {}", LABEL, document_type, external_id);

        let response = send(
            LABEL,
            self.client
                .post(&url)
                .headers(self.headers(session)?)
                .json(&json!({ "type": session_api_code(document_type), "reason": reason })),
        )
        .await?;
        read_success(LABEL, response).await?;
        Ok(())
    }
}
