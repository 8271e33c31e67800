//! Voiding a document upstream and unlinking it locally.

use std::sync::Arc;

use log::{error, info};

use ledgerlink_core::errors::{Error, Result, ValidationError};

use super::access::ensure_active_member;
use super::credentials::CredentialResolver;
use super::models::{CancelRequest, CancelResponse};
use super::session::SessionManager;
use super::Repositories;
use crate::provider::ProviderClientFactory;

/// Entry point for user-initiated cancellations.
///
/// Local link fields are cleared only after the provider confirms the void.
/// The mirror row keeps its last synced state.
pub struct CancellationCommand {
    repositories: Repositories,
    credentials: CredentialResolver,
    sessions: SessionManager,
    factory: Arc<dyn ProviderClientFactory>,
}

impl CancellationCommand {
    pub fn new(
        repositories: Repositories,
        sessions: SessionManager,
        factory: Arc<dyn ProviderClientFactory>,
    ) -> Self {
        Self {
            credentials: CredentialResolver::new(repositories.organizations.clone()),
            repositories,
            sessions,
            factory,
        }
    }

    pub async fn execute(&self, user_id: &str, request: CancelRequest) -> Result<CancelResponse> {
        let sale_id = non_blank(request.sale_id.as_deref());
        let payment_id = non_blank(request.payment_id.as_deref());
        if sale_id.is_none() && payment_id.is_none() {
            return Err(ValidationError::MissingField("sale_id or payment_id".to_string()).into());
        }
        let external_id = non_blank(Some(request.external_id.as_str()))
            .ok_or_else(|| ValidationError::MissingField("external_id".to_string()))?;

        let organization_id = request.organization_id.as_str();
        ensure_active_member(
            self.repositories.memberships.as_ref(),
            organization_id,
            user_id,
        )?;

        if let Some(sale_id) = sale_id {
            self.repositories
                .ledger
                .get_sale(organization_id, sale_id)?
                .ok_or_else(|| Error::NotFound(format!("sale {}", sale_id)))?;
        }
        if let Some(payment_id) = payment_id {
            self.repositories
                .ledger
                .get_payment(organization_id, payment_id)?
                .ok_or_else(|| Error::NotFound(format!("payment {}", payment_id)))?;
        }

        let (_, credentials) = self.credentials.resolve(organization_id)?;
        let client = self.factory.create(&credentials)?;
        let session = self
            .sessions
            .session_for(organization_id, client.as_ref())
            .await?;

        if let Err(e) = client
            .void_document(
                session.as_deref(),
                request.document_type,
                external_id,
                request.reason.trim(),
            )
            .await
        {
            error!(
                "[Cancel] Provider refused to void {} {} for {}: {}",
                request.document_type, external_id, organization_id, e
            );
            return Err(e);
        }

        self.repositories
            .ledger
            .clear_invoice_links(organization_id, sale_id, payment_id)
            .await?;

        info!(
            "[Cancel] Voided {} {} for {} (sale: {:?}, payment: {:?})",
            request.document_type, external_id, organization_id, sale_id, payment_id
        );
        Ok(CancelResponse { success: true })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
