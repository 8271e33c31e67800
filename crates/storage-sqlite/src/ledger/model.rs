//! Database models for sales and payments.

use diesel::prelude::*;

use ledgerlink_core::ledger::{InvoiceLink, LocalPayment, LocalSale};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::sales)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct SaleDB {
    pub id: String,
    pub organization_id: String,
    pub client_name: Option<String>,
    pub external_invoice_id: Option<String>,
    pub invoice_reference: Option<String>,
    pub invoice_file_url: Option<String>,
    pub credit_note_external_id: Option<String>,
}

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::payments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct PaymentDB {
    pub id: String,
    pub organization_id: String,
    pub sale_id: Option<String>,
    pub external_invoice_id: Option<String>,
    pub invoice_reference: Option<String>,
    pub invoice_file_url: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// Copies `value` into `slot` when the slot is empty. Returns whether it changed.
fn fill(slot: &mut Option<String>, value: &Option<String>) -> bool {
    if is_blank(slot) && !is_blank(value) {
        *slot = value.clone();
        true
    } else {
        false
    }
}

impl SaleDB {
    pub fn fill_link(&mut self, link: &InvoiceLink) -> bool {
        let id = fill(&mut self.external_invoice_id, &Some(link.external_id.clone()));
        let reference = fill(&mut self.invoice_reference, &link.reference);
        let file = fill(&mut self.invoice_file_url, &link.file_url);
        id || reference || file
    }

    pub fn fill_credit_note(&mut self, credit_note_external_id: &str) -> bool {
        fill(
            &mut self.credit_note_external_id,
            &Some(credit_note_external_id.to_string()),
        )
    }

    pub fn clear_link(&mut self) {
        self.external_invoice_id = None;
        self.invoice_reference = None;
        self.invoice_file_url = None;
    }
}

impl PaymentDB {
    pub fn fill_link(&mut self, link: &InvoiceLink) -> bool {
        let id = fill(&mut self.external_invoice_id, &Some(link.external_id.clone()));
        let reference = fill(&mut self.invoice_reference, &link.reference);
        let file = fill(&mut self.invoice_file_url, &link.file_url);
        id || reference || file
    }

    pub fn clear_link(&mut self) {
        self.external_invoice_id = None;
        self.invoice_reference = None;
        self.invoice_file_url = None;
    }
}

impl From<SaleDB> for LocalSale {
    fn from(db: SaleDB) -> Self {
        Self {
            id: db.id,
            organization_id: db.organization_id,
            client_name: db.client_name,
            external_invoice_id: db.external_invoice_id,
            invoice_reference: db.invoice_reference,
            invoice_file_url: db.invoice_file_url,
            credit_note_external_id: db.credit_note_external_id,
        }
    }
}

impl From<LocalSale> for SaleDB {
    fn from(domain: LocalSale) -> Self {
        Self {
            id: domain.id,
            organization_id: domain.organization_id,
            client_name: domain.client_name,
            external_invoice_id: domain.external_invoice_id,
            invoice_reference: domain.invoice_reference,
            invoice_file_url: domain.invoice_file_url,
            credit_note_external_id: domain.credit_note_external_id,
        }
    }
}

impl From<PaymentDB> for LocalPayment {
    fn from(db: PaymentDB) -> Self {
        Self {
            id: db.id,
            organization_id: db.organization_id,
            sale_id: db.sale_id,
            external_invoice_id: db.external_invoice_id,
            invoice_reference: db.invoice_reference,
            invoice_file_url: db.invoice_file_url,
        }
    }
}

impl From<LocalPayment> for PaymentDB {
    fn from(domain: LocalPayment) -> Self {
        Self {
            id: domain.id,
            organization_id: domain.organization_id,
            sale_id: domain.sale_id,
            external_invoice_id: domain.external_invoice_id,
            invoice_reference: domain.invoice_reference,
            invoice_file_url: domain.invoice_file_url,
        }
    }
}
