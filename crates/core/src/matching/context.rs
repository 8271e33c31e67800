//! Per-organization snapshot the strategies match against.

use crate::documents::{BillingDocument, ExternalDocument, MatchResult};
use crate::ledger::{LocalPayment, LocalSale};

/// The parts of a mirror row the strategies read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirroredDocument {
    pub external_id: String,
    pub reference: Option<String>,
    pub sale_id: Option<String>,
    pub payment_id: Option<String>,
}

impl From<BillingDocument> for MirroredDocument {
    fn from(document: BillingDocument) -> Self {
        Self {
            external_id: document.external_id,
            reference: document.reference,
            sale_id: document.sale_id,
            payment_id: document.payment_id,
        }
    }
}

/// Sales, payments and already-mirrored documents of one organization.
///
/// Loaded once per sync run. Link write-backs and mirror upserts made during
/// the run are replayed into the snapshot through
/// [`MatchContext::record_match`] and [`MatchContext::record_mirrored`] so
/// later documents in the same run see them.
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    sales: Vec<LocalSale>,
    payments: Vec<LocalPayment>,
    documents: Vec<MirroredDocument>,
}

impl MatchContext {
    pub fn new(
        sales: Vec<LocalSale>,
        payments: Vec<LocalPayment>,
        documents: Vec<BillingDocument>,
    ) -> Self {
        Self {
            sales,
            payments,
            documents: documents.into_iter().map(MirroredDocument::from).collect(),
        }
    }

    pub fn sales(&self) -> &[LocalSale] {
        &self.sales
    }

    pub fn payments(&self) -> &[LocalPayment] {
        &self.payments
    }

    pub fn documents(&self) -> &[MirroredDocument] {
        &self.documents
    }

    pub fn sale(&self, sale_id: &str) -> Option<&LocalSale> {
        self.sales.iter().find(|s| s.id == sale_id)
    }

    pub fn mirrored(&self, external_id: &str) -> Option<&MirroredDocument> {
        self.documents.iter().find(|d| d.external_id == external_id)
    }

    /// Mirrors an upserted row into the snapshot, replacing any earlier
    /// state of the same external id.
    pub fn record_mirrored(&mut self, document: &ExternalDocument, result: &MatchResult) {
        let entry = MirroredDocument {
            external_id: document.external_id.clone(),
            reference: document.reference.clone(),
            sale_id: result.sale_id.clone(),
            payment_id: result.payment_id.clone(),
        };
        match self
            .documents
            .iter_mut()
            .find(|d| d.external_id == entry.external_id)
        {
            Some(existing) => *existing = entry,
            None => self.documents.push(entry),
        }
    }

    /// Mirrors a link write-back into the snapshot. Only empty fields are filled.
    pub fn record_match(&mut self, document: &ExternalDocument, result: &MatchResult) {
        if document.document_type.is_credit_note() {
            if let Some(sale) = result
                .sale_id
                .as_deref()
                .and_then(|id| self.sales.iter_mut().find(|s| s.id == id))
            {
                if !sale.has_credit_note() {
                    sale.credit_note_external_id = Some(document.external_id.clone());
                }
            }
            return;
        }

        if let Some(sale) = result
            .sale_id
            .as_deref()
            .and_then(|id| self.sales.iter_mut().find(|s| s.id == id))
        {
            fill(&mut sale.external_invoice_id, &document.external_id);
            if let Some(reference) = &document.reference {
                fill(&mut sale.invoice_reference, reference);
            }
        }

        if let Some(payment) = result
            .payment_id
            .as_deref()
            .and_then(|id| self.payments.iter_mut().find(|p| p.id == id))
        {
            fill(&mut payment.external_invoice_id, &document.external_id);
            if let Some(reference) = &document.reference {
                fill(&mut payment.invoice_reference, reference);
            }
        }
    }
}

fn fill(slot: &mut Option<String>, value: &str) {
    if slot.as_deref().map(str::is_empty).unwrap_or(true) {
        *slot = Some(value.to_string());
    }
}
