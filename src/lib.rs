//! Fetch, extract, and reconcile fundamental metrics from statement pages.
//!
//! One call fans out to the fixed family of pages for a ticker's base
//! location, runs every extraction strategy over every page, folds the
//! candidates into a single canonical record, and renders it as flat
//! statement text. The same text format is accepted back by [`import`]
//! to fill calculator fields offline.

pub mod aliases;
pub mod extractors;
pub mod fetch;
pub mod growth;
pub mod import;
pub mod normalize;
pub mod record;
pub mod report;

use thiserror::Error;
use tracing::info;

pub use extractors::{reconcile, DocumentKind, SourceDocument};
pub use fetch::PageFetcher;
pub use import::{import, CalculatorFields};
pub use record::{CanonicalRecord, MetricKey, MetricValue};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("base location must not be empty")]
    InvalidInput,
    #[error("invalid base location: {0}")]
    InvalidBase(#[from] url::ParseError),
}

/// Outcome of one extraction run.
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub record: CanonicalRecord,
    pub flat_text: String,
    /// Forward growth suggested by the reconciled free-cash-flow series.
    pub fcf_growth_hint: Option<f64>,
}

/// Full pipeline: fetch the page family, reconcile, serialize.
pub async fn run(base: &str) -> Result<ScrapeReport, ExtractError> {
    let fetcher = PageFetcher::new();
    let documents = fetcher.fetch_all(base).await?;
    let fetched = documents.iter().filter(|d| !d.is_blank()).count();
    info!(base, fetched, of = documents.len(), "pages fetched");

    let record = reconcile(&documents);
    let flat_text = report::serialize(&record);
    let fcf_growth_hint = record
        .series(MetricKey::FreeCashFlow)
        .and_then(growth::estimate_growth);
    info!(metrics = record.len(), "extraction complete");

    Ok(ScrapeReport {
        record,
        flat_text,
        fcf_growth_hint,
    })
}

/// Convenience wrapper returning only the flat statement text.
pub async fn extract(base: &str) -> Result<String, ExtractError> {
    run(base).await.map(|report| report.flat_text)
}
