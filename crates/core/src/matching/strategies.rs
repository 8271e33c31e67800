//! The individual matching heuristics.
//!
//! Every function here is pure: `(document, context) -> Option<MatchResult>`.
//! The substring strategies have no minimum-length guard, so very short
//! references can match more than one record; the first hit in storage
//! order wins.

use lazy_static::lazy_static;
use regex::Regex;

use super::context::MatchContext;
use crate::documents::{ExternalDocument, MatchResult};
use crate::ledger::{LocalPayment, LocalSale};

lazy_static! {
    /// UUID-shaped substrings, used to pull a sale id out of a proprietary field.
    static ref UUID_REGEX: Regex = Regex::new(
        r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}"
    )
    .expect("Invalid regex pattern");

    /// Invoice numbers quoted in free text, e.g. "FT 2024/0001" or "FR A.2024/15".
    static ref INVOICE_NUMBER_REGEX: Regex = Regex::new(
        r"(?i)\b(FT|FR|FS)\s*([A-Z0-9._-]+)\s*/\s*(\d+)\b"
    )
    .expect("Invalid regex pattern");
}

// ============================================================================
// Exact identifier strategies
// ============================================================================

/// Strategy 1: a provider-side proprietary field embeds the internal sale id.
pub fn by_proprietary_sale_id(
    document: &ExternalDocument,
    context: &MatchContext,
) -> Option<MatchResult> {
    let proprietary = non_empty(document.proprietary_id.as_deref())?;

    let mut candidates: Vec<String> = UUID_REGEX
        .find_iter(proprietary)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect();
    candidates.push(proprietary.to_ascii_lowercase());

    context
        .sales()
        .iter()
        .find(|sale| candidates.iter().any(|c| c == &sale.id.to_ascii_lowercase()))
        .map(|sale| MatchResult::sale(sale.id.clone()))
}

/// Strategy 2: the external id is stored on a sale.
pub fn by_sale_external_id(
    document: &ExternalDocument,
    context: &MatchContext,
) -> Option<MatchResult> {
    context
        .sales()
        .iter()
        .find(|sale| sale.external_invoice_id.as_deref() == Some(document.external_id.as_str()))
        .map(|sale| MatchResult::sale(sale.id.clone()))
}

/// Strategy 3: the external id is stored on a payment.
pub fn by_payment_external_id(
    document: &ExternalDocument,
    context: &MatchContext,
) -> Option<MatchResult> {
    context
        .payments()
        .iter()
        .find(|p| p.external_invoice_id.as_deref() == Some(document.external_id.as_str()))
        .map(payment_match)
}

// ============================================================================
// Free-text reference strategies
// ============================================================================

/// Strategy 4: the reference's trailing segment appears in a payment's invoice reference.
pub fn by_reference_in_payment(
    document: &ExternalDocument,
    context: &MatchContext,
) -> Option<MatchResult> {
    let tail = document.reference_tail()?;
    find_payment_with_reference(context.payments(), tail).map(payment_match)
}

/// Strategy 5: the reference's trailing segment appears in a sale's invoice reference.
pub fn by_reference_in_sale(
    document: &ExternalDocument,
    context: &MatchContext,
) -> Option<MatchResult> {
    let tail = document.reference_tail()?;
    find_sale_with_reference(context.sales(), tail).map(|sale| MatchResult::sale(sale.id.clone()))
}

/// Strategy 6: the raw external id appears in a payment's invoice reference.
pub fn by_external_id_in_payment(
    document: &ExternalDocument,
    context: &MatchContext,
) -> Option<MatchResult> {
    let external_id = non_empty(Some(document.external_id.as_str()))?;
    find_payment_with_reference(context.payments(), external_id).map(payment_match)
}

// ============================================================================
// Credit-note strategies
// ============================================================================

/// Strategy 7a: follow the credit note's pointer to the document it corrects.
pub fn credit_note_by_related_document(
    document: &ExternalDocument,
    context: &MatchContext,
) -> Option<MatchResult> {
    if !document.document_type.is_credit_note() {
        return None;
    }
    let related = non_empty(document.related_external_id.as_deref())?;

    if let Some(mirrored) = context.mirrored(related) {
        let result = MatchResult {
            sale_id: mirrored.sale_id.clone(),
            payment_id: mirrored.payment_id.clone(),
        };
        if result.is_matched() {
            return Some(result);
        }
    }

    if let Some(sale) = context
        .sales()
        .iter()
        .find(|s| s.external_invoice_id.as_deref() == Some(related))
    {
        return Some(MatchResult::sale(sale.id.clone()));
    }

    context
        .payments()
        .iter()
        .find(|p| p.external_invoice_id.as_deref() == Some(related))
        .map(payment_match)
}

/// Strategy 7b: find an invoice number in the observations and match it.
pub fn credit_note_by_observed_invoice(
    document: &ExternalDocument,
    context: &MatchContext,
) -> Option<MatchResult> {
    if !document.document_type.is_credit_note() {
        return None;
    }
    let number = extract_invoice_number(document.observations.as_deref()?)?;

    if let Some(mirrored) = context.documents().iter().find(|d| {
        d.reference
            .as_deref()
            .map(|r| normalize_reference(r) == number)
            .unwrap_or(false)
    }) {
        let result = MatchResult {
            sale_id: mirrored.sale_id.clone(),
            payment_id: mirrored.payment_id.clone(),
        };
        if result.is_matched() {
            return Some(result);
        }
    }

    if let Some(sale) = context.sales().iter().find(|s| reference_contains_number(&s.invoice_reference, &number)) {
        return Some(MatchResult::sale(sale.id.clone()));
    }

    context
        .payments()
        .iter()
        .find(|p| reference_contains_number(&p.invoice_reference, &number))
        .map(payment_match)
}

/// Strategy 7c: first sale without a credit note whose client name overlaps.
pub fn credit_note_by_client_name(
    document: &ExternalDocument,
    context: &MatchContext,
) -> Option<MatchResult> {
    if !document.document_type.is_credit_note() {
        return None;
    }
    let client = non_empty(document.client_name.as_deref())?.to_lowercase();

    context
        .sales()
        .iter()
        .filter(|sale| !sale.has_credit_note())
        .find(|sale| {
            sale.client_name
                .as_deref()
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .map(|name| name.contains(&client) || client.contains(&name))
                .unwrap_or(false)
        })
        .map(|sale| MatchResult::sale(sale.id.clone()))
}

// ============================================================================
// Helpers
// ============================================================================

/// Extracts a normalized invoice number ("FT 2024/0001") from free text.
pub fn extract_invoice_number(text: &str) -> Option<String> {
    let captures = INVOICE_NUMBER_REGEX.captures(text)?;
    Some(format!(
        "{} {}/{}",
        captures[1].to_ascii_uppercase(),
        captures[2].to_ascii_uppercase(),
        &captures[3]
    ))
}

fn normalize_reference(reference: &str) -> String {
    extract_invoice_number(reference)
        .unwrap_or_else(|| reference.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase())
}

fn reference_contains_number(reference: &Option<String>, number: &str) -> bool {
    reference
        .as_deref()
        .map(|r| normalize_reference(r).contains(number))
        .unwrap_or(false)
}

fn find_payment_with_reference<'a>(
    payments: &'a [LocalPayment],
    needle: &str,
) -> Option<&'a LocalPayment> {
    payments.iter().find(|p| contains(&p.invoice_reference, needle))
}

fn find_sale_with_reference<'a>(sales: &'a [LocalSale], needle: &str) -> Option<&'a LocalSale> {
    sales.iter().find(|s| contains(&s.invoice_reference, needle))
}

fn contains(haystack: &Option<String>, needle: &str) -> bool {
    haystack
        .as_deref()
        .map(|h| !h.is_empty() && h.contains(needle))
        .unwrap_or(false)
}

fn payment_match(payment: &LocalPayment) -> MatchResult {
    MatchResult::payment(payment.id.clone(), payment.sale_id.clone())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
