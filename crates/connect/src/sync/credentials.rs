//! Resolves an organization's billing credentials.

use std::sync::Arc;

use ledgerlink_core::errors::{Error, Result};
use ledgerlink_core::organizations::{BillingProvider, Organization, OrganizationRepositoryTrait};

use crate::provider::ProviderCredentials;

/// Reads provider selection and secrets from the organization row.
#[derive(Clone)]
pub struct CredentialResolver {
    organizations: Arc<dyn OrganizationRepositoryTrait>,
}

impl CredentialResolver {
    pub fn new(organizations: Arc<dyn OrganizationRepositoryTrait>) -> Self {
        Self { organizations }
    }

    /// Loads the organization and validates its billing settings.
    pub fn resolve(&self, organization_id: &str) -> Result<(Organization, ProviderCredentials)> {
        let organization = self.organizations.get_by_id(organization_id)?;
        let credentials = Self::credentials_for(&organization)?;
        Ok((organization, credentials))
    }

    /// Validates the settings already loaded on `organization`.
    ///
    /// Fails with `Error::Configuration` when no provider is selected, the
    /// API key is blank, or the token API has neither an account name nor a
    /// base URL to build its host from.
    pub fn credentials_for(organization: &Organization) -> Result<ProviderCredentials> {
        let billing = &organization.billing;
        let provider = billing.provider.ok_or_else(|| {
            Error::Configuration(format!(
                "organization {} has no billing provider selected",
                organization.id
            ))
        })?;
        let api_key = non_blank(billing.api_key.as_deref()).ok_or_else(|| {
            Error::Configuration(format!(
                "organization {} has no {} API key",
                organization.id, provider
            ))
        })?;
        let account_name = non_blank(billing.account_name.as_deref());
        let base_url = non_blank(billing.base_url.as_deref());

        if provider == BillingProvider::TokenApi && account_name.is_none() && base_url.is_none() {
            return Err(Error::Configuration(format!(
                "organization {} has no token_api account name",
                organization.id
            )));
        }

        Ok(ProviderCredentials {
            provider,
            api_key,
            account_name,
            base_url,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
