//! First-match-wins combination of the matching strategies.

use log::debug;

use super::context::MatchContext;
use super::strategies;
use crate::documents::{ExternalDocument, MatchResult};

/// A single matching heuristic.
pub type MatchStrategy = fn(&ExternalDocument, &MatchContext) -> Option<MatchResult>;

/// A strategy with a stable name for logging.
#[derive(Clone, Copy)]
pub struct NamedStrategy {
    pub name: &'static str,
    pub apply: MatchStrategy,
}

impl NamedStrategy {
    pub const fn new(name: &'static str, apply: MatchStrategy) -> Self {
        Self { name, apply }
    }
}

impl std::fmt::Debug for NamedStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NamedStrategy").field(&self.name).finish()
    }
}

/// Result of running the chain over one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub result: MatchResult,
    /// Name of the strategy that produced the match, `None` when unmatched.
    pub strategy: Option<&'static str>,
}

impl Resolution {
    pub fn is_matched(&self) -> bool {
        self.result.is_matched()
    }
}

/// Runs strategies in order and keeps the first match.
#[derive(Debug, Clone)]
pub struct MatchResolver {
    strategies: Vec<NamedStrategy>,
}

impl Default for MatchResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchResolver {
    /// The standard chain. Credit-note-only strategies sit at the end.
    pub fn new() -> Self {
        Self::with_strategies(vec![
            NamedStrategy::new("proprietary_sale_id", strategies::by_proprietary_sale_id),
            NamedStrategy::new("sale_external_id", strategies::by_sale_external_id),
            NamedStrategy::new("payment_external_id", strategies::by_payment_external_id),
            NamedStrategy::new("reference_in_payment", strategies::by_reference_in_payment),
            NamedStrategy::new("reference_in_sale", strategies::by_reference_in_sale),
            NamedStrategy::new("external_id_in_payment", strategies::by_external_id_in_payment),
            NamedStrategy::new(
                "credit_note_related_document",
                strategies::credit_note_by_related_document,
            ),
            NamedStrategy::new(
                "credit_note_observed_invoice",
                strategies::credit_note_by_observed_invoice,
            ),
            NamedStrategy::new("credit_note_client_name", strategies::credit_note_by_client_name),
        ])
    }

    pub fn with_strategies(strategies: Vec<NamedStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name).collect()
    }

    pub fn resolve(&self, document: &ExternalDocument, context: &MatchContext) -> Resolution {
        for strategy in &self.strategies {
            if let Some(result) = (strategy.apply)(document, context) {
                if result.is_matched() {
                    debug!(
                        "[Matcher] {} {} matched by {}: sale={:?} payment={:?}",
                        document.document_type,
                        document.external_id,
                        strategy.name,
                        result.sale_id,
                        result.payment_id
                    );
                    return Resolution {
                        result,
                        strategy: Some(strategy.name),
                    };
                }
            }
        }

        Resolution {
            result: MatchResult::unmatched(),
            strategy: None,
        }
    }
}
