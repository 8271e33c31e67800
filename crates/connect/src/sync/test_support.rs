//! In-memory repositories and a scripted provider client for engine tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use ledgerlink_core::blobs::BlobStoreTrait;
use ledgerlink_core::documents::{
    BillingDocument, BillingDocumentRepositoryTrait, CreditNote, CreditNoteRepositoryTrait,
    DocumentType, ExternalDocument, NewBillingDocument, NewCreditNote, UpsertOutcome,
};
use ledgerlink_core::errors::{DatabaseError, Error, Result};
use ledgerlink_core::ledger::{InvoiceLink, LedgerRepositoryTrait, LocalPayment, LocalSale};
use ledgerlink_core::organizations::{
    BillingProvider, BillingSettings, Membership, MembershipRepositoryTrait, Organization,
    OrganizationRepositoryTrait, ProviderSession,
};

use super::{CancellationCommand, Repositories, SessionManager, SyncOrchestrator};
use crate::config::SyncConfig;
use crate::provider::{
    BillingApiClient, DocumentPage, PdfStatus, ProviderClientFactory, ProviderCredentials,
};

// --- Organizations ---

#[derive(Default)]
pub struct MockOrganizations {
    organizations: Mutex<HashMap<String, Organization>>,
    sessions: Mutex<HashMap<String, ProviderSession>>,
}

impl MockOrganizations {
    fn add(&self, id: &str, billing: BillingSettings) {
        self.organizations.lock().unwrap().insert(
            id.to_string(),
            Organization {
                id: id.to_string(),
                name: id.to_uppercase(),
                billing,
                session: None,
            },
        );
    }

    pub fn add_token_org(&self, id: &str) {
        self.add(
            id,
            BillingSettings {
                provider: Some(BillingProvider::TokenApi),
                api_key: Some(format!("key-{}", id)),
                account_name: Some(id.to_string()),
                base_url: None,
            },
        );
    }

    pub fn add_session_org(&self, id: &str) {
        self.add(
            id,
            BillingSettings {
                provider: Some(BillingProvider::SessionApi),
                api_key: Some(format!("key-{}", id)),
                account_name: None,
                base_url: None,
            },
        );
    }

    /// Configured enough to be listed, but missing the token API account name.
    pub fn add_misconfigured_org(&self, id: &str) {
        self.add(
            id,
            BillingSettings {
                provider: Some(BillingProvider::TokenApi),
                api_key: Some(format!("key-{}", id)),
                account_name: None,
                base_url: None,
            },
        );
    }

    pub fn set_session(&self, id: &str, session: ProviderSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(id.to_string(), session);
    }
}

#[async_trait]
impl OrganizationRepositoryTrait for MockOrganizations {
    fn get_by_id(&self, organization_id: &str) -> Result<Organization> {
        self.organizations
            .lock()
            .unwrap()
            .get(organization_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("organization {}", organization_id)))
    }

    fn list_with_billing(&self) -> Result<Vec<Organization>> {
        let mut organizations: Vec<Organization> = self
            .organizations
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.billing.is_configured())
            .cloned()
            .collect();
        organizations.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(organizations)
    }

    fn get_session(&self, organization_id: &str) -> Result<Option<ProviderSession>> {
        Ok(self.sessions.lock().unwrap().get(organization_id).cloned())
    }

    async fn save_session(&self, organization_id: &str, session: ProviderSession) -> Result<()> {
        self.set_session(organization_id, session);
        Ok(())
    }
}

// --- Memberships ---

#[derive(Default)]
pub struct MockMemberships {
    memberships: Mutex<Vec<Membership>>,
}

impl MockMemberships {
    pub fn add(&self, organization_id: &str, user_id: &str, status: &str) {
        self.memberships.lock().unwrap().push(Membership {
            organization_id: organization_id.to_string(),
            user_id: user_id.to_string(),
            role: "member".to_string(),
            status: status.to_string(),
        });
    }
}

impl MembershipRepositoryTrait for MockMemberships {
    fn get_membership(&self, organization_id: &str, user_id: &str) -> Result<Option<Membership>> {
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned())
    }
}

// --- Ledger ---

#[derive(Default)]
pub struct MockLedger {
    sales: Mutex<Vec<LocalSale>>,
    payments: Mutex<Vec<LocalPayment>>,
}

fn fill(slot: &mut Option<String>, value: Option<&str>) {
    if slot.as_deref().map(str::is_empty).unwrap_or(true) {
        if let Some(value) = value {
            *slot = Some(value.to_string());
        }
    }
}

impl MockLedger {
    pub fn add_sale(&self, sale: LocalSale) {
        self.sales.lock().unwrap().push(sale);
    }

    pub fn add_payment(&self, payment: LocalPayment) {
        self.payments.lock().unwrap().push(payment);
    }

    pub fn sale(&self, id: &str) -> LocalSale {
        self.sales
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .unwrap()
    }

    pub fn payment(&self, id: &str) -> LocalPayment {
        self.payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl LedgerRepositoryTrait for MockLedger {
    fn list_sales(&self, organization_id: &str) -> Result<Vec<LocalSale>> {
        Ok(self
            .sales
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.organization_id == organization_id)
            .cloned()
            .collect())
    }

    fn list_payments(&self, organization_id: &str) -> Result<Vec<LocalPayment>> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.organization_id == organization_id)
            .cloned()
            .collect())
    }

    fn get_sale(&self, organization_id: &str, sale_id: &str) -> Result<Option<LocalSale>> {
        Ok(self
            .list_sales(organization_id)?
            .into_iter()
            .find(|s| s.id == sale_id))
    }

    fn get_payment(&self, organization_id: &str, payment_id: &str) -> Result<Option<LocalPayment>> {
        Ok(self
            .list_payments(organization_id)?
            .into_iter()
            .find(|p| p.id == payment_id))
    }

    async fn link_sale_invoice(&self, sale_id: &str, link: InvoiceLink) -> Result<()> {
        if let Some(sale) = self.sales.lock().unwrap().iter_mut().find(|s| s.id == sale_id) {
            fill(&mut sale.external_invoice_id, Some(&link.external_id));
            fill(&mut sale.invoice_reference, link.reference.as_deref());
            fill(&mut sale.invoice_file_url, link.file_url.as_deref());
        }
        Ok(())
    }

    async fn link_payment_invoice(&self, payment_id: &str, link: InvoiceLink) -> Result<()> {
        if let Some(payment) = self
            .payments
            .lock()
            .unwrap()
            .iter_mut()
            .find(|p| p.id == payment_id)
        {
            fill(&mut payment.external_invoice_id, Some(&link.external_id));
            fill(&mut payment.invoice_reference, link.reference.as_deref());
            fill(&mut payment.invoice_file_url, link.file_url.as_deref());
        }
        Ok(())
    }

    async fn link_sale_credit_note(&self, sale_id: &str, credit_note_external_id: &str) -> Result<()> {
        if let Some(sale) = self.sales.lock().unwrap().iter_mut().find(|s| s.id == sale_id) {
            fill(&mut sale.credit_note_external_id, Some(credit_note_external_id));
        }
        Ok(())
    }

    async fn clear_invoice_links(
        &self,
        organization_id: &str,
        sale_id: Option<&str>,
        payment_id: Option<&str>,
    ) -> Result<()> {
        if let Some(sale_id) = sale_id {
            for sale in self.sales.lock().unwrap().iter_mut() {
                if sale.id == sale_id && sale.organization_id == organization_id {
                    sale.external_invoice_id = None;
                    sale.invoice_reference = None;
                    sale.invoice_file_url = None;
                }
            }
        }
        if let Some(payment_id) = payment_id {
            for payment in self.payments.lock().unwrap().iter_mut() {
                if payment.id == payment_id && payment.organization_id == organization_id {
                    payment.external_invoice_id = None;
                    payment.invoice_reference = None;
                    payment.invoice_file_url = None;
                }
            }
        }
        Ok(())
    }
}

// --- Document mirror ---

#[derive(Default)]
pub struct MockDocuments {
    rows: Mutex<HashMap<(String, String), BillingDocument>>,
    pub fail_upserts: Mutex<bool>,
}

impl MockDocuments {
    pub fn count(&self, organization_id: &str) -> usize {
        self.list_for_organization(organization_id).unwrap().len()
    }
}

#[async_trait]
impl BillingDocumentRepositoryTrait for MockDocuments {
    fn get(&self, organization_id: &str, external_id: &str) -> Result<Option<BillingDocument>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(organization_id.to_string(), external_id.to_string()))
            .cloned())
    }

    fn list_for_organization(&self, organization_id: &str) -> Result<Vec<BillingDocument>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn upsert(&self, doc: NewBillingDocument) -> Result<UpsertOutcome> {
        if *self.fail_upserts.lock().unwrap() {
            return Err(DatabaseError::QueryFailed("disk I/O error".to_string()).into());
        }
        let key = (doc.organization_id.clone(), doc.external_id.clone());
        let mut rows = self.rows.lock().unwrap();
        let existing = rows.get(&key).cloned();
        let now = Utc::now();
        rows.insert(
            key,
            BillingDocument {
                id: existing
                    .as_ref()
                    .map(|e| e.id.clone())
                    .unwrap_or_else(|| format!("row-{}", doc.external_id)),
                organization_id: doc.organization_id,
                external_id: doc.external_id,
                reference: doc.reference,
                document_type: doc.document_type,
                status: doc.status,
                client_name: doc.client_name,
                total: doc.total,
                date: doc.date,
                due_date: doc.due_date,
                sale_id: doc.sale_id,
                payment_id: doc.payment_id,
                pdf_path: doc
                    .pdf_path
                    .or_else(|| existing.as_ref().and_then(|e| e.pdf_path.clone())),
                raw_data: doc.raw_data,
                created_at: existing.as_ref().map(|e| e.created_at).unwrap_or(now),
                updated_at: now,
            },
        );
        Ok(if existing.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }
}

#[derive(Default)]
pub struct MockCreditNotes {
    rows: Mutex<HashMap<(String, String), NewCreditNote>>,
}

#[async_trait]
impl CreditNoteRepositoryTrait for MockCreditNotes {
    fn get(&self, organization_id: &str, external_id: &str) -> Result<Option<CreditNote>> {
        let now = Utc::now();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(organization_id.to_string(), external_id.to_string()))
            .map(|n| CreditNote {
                id: format!("cn-{}", n.external_id),
                organization_id: n.organization_id.clone(),
                external_id: n.external_id.clone(),
                reference: n.reference.clone(),
                status: n.status.clone(),
                client_name: n.client_name.clone(),
                total: n.total,
                date: n.date,
                due_date: n.due_date,
                related_external_id: n.related_external_id.clone(),
                sale_id: n.sale_id.clone(),
                payment_id: n.payment_id.clone(),
                pdf_path: n.pdf_path.clone(),
                raw_data: n.raw_data.clone(),
                created_at: now,
                updated_at: now,
            }))
    }

    async fn upsert(&self, note: NewCreditNote) -> Result<UpsertOutcome> {
        let key = (note.organization_id.clone(), note.external_id.clone());
        let previous = self.rows.lock().unwrap().insert(key, note);
        Ok(if previous.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }
}

// --- Blob store ---

#[derive(Default)]
pub struct MockBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<usize>,
    fail: Mutex<bool>,
}

impl MockBlobStore {
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    pub fn fail_writes(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl BlobStoreTrait for MockBlobStore {
    async fn put(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        if *self.fail.lock().unwrap() {
            return Err(Error::Storage("bucket unavailable".to_string()));
        }
        *self.writes.lock().unwrap() += 1;
        self.objects.lock().unwrap().insert(path.to_string(), bytes);
        Ok(path.to_string())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.objects.lock().unwrap().contains_key(path))
    }
}

// --- Scripted provider client ---

#[derive(Default)]
struct FakeState {
    documents: HashMap<DocumentType, Vec<ExternalDocument>>,
    list_calls: HashMap<DocumentType, u32>,
    failing_pages: HashMap<DocumentType, u32>,
    ignore_page: bool,
    auth_calls: u32,
    pending_polls: HashMap<String, u32>,
    poll_calls: HashMap<String, u32>,
    voided: Vec<(DocumentType, String, String)>,
    fail_void: bool,
}

pub struct FakeClient {
    provider: BillingProvider,
    state: Mutex<FakeState>,
}

impl FakeClient {
    pub fn new(provider: BillingProvider) -> Self {
        Self {
            provider,
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Adds `count` documents with ids `{type}-{n}` and references `FT 2024/{n}`.
    pub fn add_documents(&self, document_type: DocumentType, count: usize) {
        let mut state = self.state.lock().unwrap();
        let docs = state.documents.entry(document_type).or_default();
        let start = docs.len() + 1;
        for n in start..start + count {
            let mut doc = ExternalDocument::new(format!("{}-{}", document_type, n), document_type);
            doc.reference = Some(format!("FT 2024/{:04}", n));
            doc.status = Some("final".to_string());
            docs.push(doc);
        }
    }

    pub fn push_document(&self, document: ExternalDocument) {
        self.state
            .lock()
            .unwrap()
            .documents
            .entry(document.document_type)
            .or_default()
            .push(document);
    }

    pub fn fail_listing_from_page(&self, document_type: DocumentType, page: u32) {
        self.state
            .lock()
            .unwrap()
            .failing_pages
            .insert(document_type, page);
    }

    pub fn ignore_page_parameter(&self) {
        self.state.lock().unwrap().ignore_page = true;
    }

    pub fn pdf_pending_polls(&self, external_id: &str, polls: u32) {
        self.state
            .lock()
            .unwrap()
            .pending_polls
            .insert(external_id.to_string(), polls);
    }

    pub fn fail_void(&self) {
        self.state.lock().unwrap().fail_void = true;
    }

    pub fn list_calls(&self, document_type: DocumentType) -> u32 {
        *self
            .state
            .lock()
            .unwrap()
            .list_calls
            .get(&document_type)
            .unwrap_or(&0)
    }

    pub fn auth_calls(&self) -> u32 {
        self.state.lock().unwrap().auth_calls
    }

    pub fn poll_calls(&self, external_id: &str) -> u32 {
        *self
            .state
            .lock()
            .unwrap()
            .poll_calls
            .get(external_id)
            .unwrap_or(&0)
    }

    pub fn voided(&self) -> Vec<(DocumentType, String, String)> {
        self.state.lock().unwrap().voided.clone()
    }
}

#[async_trait]
impl BillingApiClient for FakeClient {
    fn provider(&self) -> BillingProvider {
        self.provider
    }

    async fn authenticate(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.auth_calls += 1;
        Ok(format!("sid-{}", state.auth_calls))
    }

    async fn list_documents(
        &self,
        session: Option<&str>,
        document_type: DocumentType,
        page: u32,
        per_page: u32,
    ) -> Result<DocumentPage> {
        if self.provider.requires_session() && session.is_none() {
            return Err(Error::upstream(401, "missing session"));
        }
        let mut state = self.state.lock().unwrap();
        *state.list_calls.entry(document_type).or_default() += 1;
        if let Some(failing) = state.failing_pages.get(&document_type) {
            if page >= *failing {
                return Err(Error::upstream(500, "listing unavailable"));
            }
        }
        let page = if state.ignore_page { 1 } else { page };
        let docs = state.documents.get(&document_type).cloned().unwrap_or_default();
        let start = ((page - 1) * per_page) as usize;
        let documents: Vec<ExternalDocument> = docs
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();
        let raw_len = documents.len();
        Ok(DocumentPage::new(documents, raw_len))
    }

    async fn poll_pdf(
        &self,
        _session: Option<&str>,
        _document_type: DocumentType,
        external_id: &str,
    ) -> Result<PdfStatus> {
        let mut state = self.state.lock().unwrap();
        *state.poll_calls.entry(external_id.to_string()).or_default() += 1;
        match state.pending_polls.get_mut(external_id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Ok(PdfStatus::Pending)
            }
            _ => Ok(PdfStatus::Ready {
                url: format!("https://files.test/{}.pdf", external_id),
            }),
        }
    }

    async fn download_pdf(&self, _url: &str) -> Result<Vec<u8>> {
        Ok(b"%PDF-1.4 test".to_vec())
    }

    async fn void_document(
        &self,
        _session: Option<&str>,
        document_type: DocumentType,
        external_id: &str,
        reason: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_void {
            return Err(Error::upstream(422, "document cannot be canceled"));
        }
        state
            .voided
            .push((document_type, external_id.to_string(), reason.to_string()));
        Ok(())
    }
}

/// Hands out one shared client per API key, or the default client.
pub struct FakeFactory {
    default: Arc<FakeClient>,
    by_key: Mutex<HashMap<String, Arc<FakeClient>>>,
}

impl FakeFactory {
    pub fn new(default: Arc<FakeClient>) -> Self {
        Self {
            default,
            by_key: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, api_key: &str, client: Arc<FakeClient>) {
        self.by_key
            .lock()
            .unwrap()
            .insert(api_key.to_string(), client);
    }
}

impl ProviderClientFactory for FakeFactory {
    fn create(&self, credentials: &ProviderCredentials) -> Result<Arc<dyn BillingApiClient>> {
        let client = self
            .by_key
            .lock()
            .unwrap()
            .get(&credentials.api_key)
            .cloned()
            .unwrap_or_else(|| self.default.clone());
        Ok(client)
    }
}

// --- Harness ---

pub struct Harness {
    pub organizations: Arc<MockOrganizations>,
    pub memberships: Arc<MockMemberships>,
    pub ledger: Arc<MockLedger>,
    pub documents: Arc<MockDocuments>,
    pub credit_notes: Arc<MockCreditNotes>,
    pub blobs: Arc<MockBlobStore>,
    pub client: Arc<FakeClient>,
    pub factory: Arc<FakeFactory>,
}

impl Harness {
    /// One `org-1` with an active `user-1` membership on `provider`.
    pub fn new(provider: BillingProvider) -> Self {
        let organizations = Arc::new(MockOrganizations::default());
        match provider {
            BillingProvider::TokenApi => organizations.add_token_org("org-1"),
            BillingProvider::SessionApi => organizations.add_session_org("org-1"),
        }
        let memberships = Arc::new(MockMemberships::default());
        memberships.add("org-1", "user-1", "active");
        let client = Arc::new(FakeClient::new(provider));
        Self {
            organizations,
            memberships,
            ledger: Arc::new(MockLedger::default()),
            documents: Arc::new(MockDocuments::default()),
            credit_notes: Arc::new(MockCreditNotes::default()),
            blobs: Arc::new(MockBlobStore::default()),
            factory: Arc::new(FakeFactory::new(client.clone())),
            client,
        }
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            organizations: self.organizations.clone(),
            memberships: self.memberships.clone(),
            ledger: self.ledger.clone(),
            documents: self.documents.clone(),
            credit_notes: self.credit_notes.clone(),
        }
    }

    pub fn orchestrator(&self) -> SyncOrchestrator {
        self.orchestrator_with(SyncConfig::without_delays())
    }

    pub fn orchestrator_with(&self, config: SyncConfig) -> SyncOrchestrator {
        SyncOrchestrator::new(
            self.repositories(),
            self.factory.clone(),
            self.blobs.clone(),
            config,
        )
    }

    pub fn cancellation(&self) -> CancellationCommand {
        let config = SyncConfig::without_delays();
        CancellationCommand::new(
            self.repositories(),
            SessionManager::new(
                self.organizations.clone(),
                config.session_ttl,
                config.session_refresh_margin,
            ),
            self.factory.clone(),
        )
    }
}
