//! Ledger repository trait.

use async_trait::async_trait;

use super::ledger_model::{InvoiceLink, LocalPayment, LocalSale};
use crate::errors::Result;

#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    fn list_sales(&self, organization_id: &str) -> Result<Vec<LocalSale>>;

    fn list_payments(&self, organization_id: &str) -> Result<Vec<LocalPayment>>;

    fn get_sale(&self, organization_id: &str, sale_id: &str) -> Result<Option<LocalSale>>;

    fn get_payment(&self, organization_id: &str, payment_id: &str)
        -> Result<Option<LocalPayment>>;

    /// Fills the sale's empty link fields. Non-empty fields are left alone.
    async fn link_sale_invoice(&self, sale_id: &str, link: InvoiceLink) -> Result<()>;

    /// Fills the payment's empty link fields. Non-empty fields are left alone.
    async fn link_payment_invoice(&self, payment_id: &str, link: InvoiceLink) -> Result<()>;

    /// Records a credit note against a sale that has none yet.
    async fn link_sale_credit_note(&self, sale_id: &str, credit_note_external_id: &str)
        -> Result<()>;

    /// Clears external id, reference and file URL on the given sale and/or
    /// payment in a single write.
    async fn clear_invoice_links(
        &self,
        organization_id: &str,
        sale_id: Option<&str>,
        payment_id: Option<&str>,
    ) -> Result<()>;
}
