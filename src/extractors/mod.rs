//! Extraction strategies and the per-document reconciliation driver.
//!
//! Each strategy is an independent producer of candidate metrics with the
//! uniform [`Extractor::candidates`] contract; strategies are mutually
//! unaware and all precedence lives in [`CanonicalRecord::merge`]. Documents
//! are processed sequentially in an explicit priority order so the scalar
//! first-writer-wins policy is deterministic.

mod patterns;
mod state;
mod tables;

pub use patterns::PatternExtractor;
pub use state::EmbeddedStateExtractor;
pub use tables::TableExtractor;

use tracing::debug;

use crate::record::{CanonicalRecord, MetricKey, MetricValue};

/// The fixed family of source pages, in descending trust order for scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DocumentKind {
    Overview,
    Financials,
    CashFlow,
    BalanceSheet,
    Forecast,
}

impl DocumentKind {
    /// Visit order: the overview page comes first so its price/beta values
    /// take precedence over fallbacks found on lower-priority pages.
    pub const PRIORITY: [DocumentKind; 5] = [
        DocumentKind::Overview,
        DocumentKind::Financials,
        DocumentKind::CashFlow,
        DocumentKind::BalanceSheet,
        DocumentKind::Forecast,
    ];

    /// Path appended to the base location to reach this page.
    pub fn path_suffix(&self) -> &'static str {
        match self {
            DocumentKind::Overview => "",
            DocumentKind::Financials => "/financials/",
            DocumentKind::CashFlow => "/financials/cash-flow-statement/",
            DocumentKind::BalanceSheet => "/financials/balance-sheet/",
            DocumentKind::Forecast => "/forecast/",
        }
    }
}

/// One fetched page. `raw_markup` is empty on any transport failure and an
/// empty document is silently skipped by every stage.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub url: String,
    pub kind: DocumentKind,
    pub raw_markup: String,
}

impl SourceDocument {
    pub fn new(url: impl Into<String>, kind: DocumentKind, raw_markup: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            raw_markup: raw_markup.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.raw_markup.trim().is_empty()
    }
}

/// A candidate metric produced by one strategy on one document.
pub type Candidate = (MetricKey, MetricValue);

/// Uniform strategy contract: inspect one document, emit candidates.
/// Finding nothing is not an error — it simply contributes no candidates.
pub trait Extractor {
    fn name(&self) -> &'static str;
    fn candidates(&self, document: &SourceDocument) -> Vec<Candidate>;
}

/// Run every strategy over every document and fold all candidates into one
/// canonical record. Documents are visited in [`DocumentKind::PRIORITY`]
/// order regardless of the order they arrive in.
pub fn reconcile(documents: &[SourceDocument]) -> CanonicalRecord {
    let strategies: [&dyn Extractor; 3] =
        [&EmbeddedStateExtractor, &TableExtractor, &PatternExtractor];

    let mut record = CanonicalRecord::new();
    for kind in DocumentKind::PRIORITY {
        for document in documents.iter().filter(|d| d.kind == kind) {
            if document.is_blank() {
                debug!(url = %document.url, "skipping empty document");
                continue;
            }
            for strategy in &strategies {
                let candidates = strategy.candidates(document);
                if !candidates.is_empty() {
                    debug!(
                        url = %document.url,
                        strategy = strategy.name(),
                        count = candidates.len(),
                        "merging candidates"
                    );
                }
                for (key, value) in candidates {
                    record.merge(key, value);
                }
            }
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_documents_yield_empty_record() {
        let documents = vec![
            SourceDocument::new("https://example.com/a", DocumentKind::Overview, ""),
            SourceDocument::new("https://example.com/b", DocumentKind::Financials, "   "),
        ];
        assert!(reconcile(&documents).is_empty());
    }

    #[test]
    fn documents_are_visited_in_priority_order() {
        // The forecast document arrives first in the slice but its beta
        // must lose to the overview document's beta.
        let forecast = SourceDocument::new(
            "https://example.com/forecast/",
            DocumentKind::Forecast,
            "<p>Beta (5Y Monthly) 0.90</p>",
        );
        let overview = SourceDocument::new(
            "https://example.com",
            DocumentKind::Overview,
            "<p>Beta (5Y Monthly) 1.20</p>",
        );
        let record = reconcile(&[forecast, overview]);
        assert_eq!(record.scalar(MetricKey::Beta), Some(1.20));
    }
}
