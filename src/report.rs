//! Flat-text rendering of a canonical record.
//!
//! The output is the paste-friendly interchange form: series metrics as a
//! label line followed by a tab-joined value line, scalar assumptions as
//! single `label<TAB>value` lines, and the comparison price as a `Compare`
//! line followed by the bare figure. The import parser reads this same
//! shape back, so everything serialized here must survive a round trip.

use std::fmt::Write;

use crate::record::{CanonicalRecord, MetricKey};

/// Series metrics in output order.
const SERIES_ORDER: [MetricKey; 7] = [
    MetricKey::FreeCashFlow,
    MetricKey::SharesOutstanding,
    MetricKey::TotalDebt,
    MetricKey::ShareholdersEquity,
    MetricKey::CashAndShortTermInvestments,
    MetricKey::EffectiveTaxRate,
    MetricKey::InterestExpense,
];

/// Scalar assumption lines in output order.
const RATE_ORDER: [MetricKey; 3] = [
    MetricKey::TerminalGrowthRate,
    MetricKey::RiskFreeRate,
    MetricKey::EquityRiskPremium,
];

/// Render the record as flat statement text with a trailing newline.
pub fn serialize(record: &CanonicalRecord) -> String {
    let mut out = String::new();

    for key in SERIES_ORDER {
        if let Some(series) = record.series(key) {
            let values: Vec<String> = series.iter().map(|v| format!("{v}")).collect();
            let _ = writeln!(out, "{}", key.label());
            let _ = writeln!(out, "{}", values.join("\t"));
        }
    }

    if let Some(rate) = derived_debt_rate(record) {
        let _ = writeln!(out, "{}\t{rate:.2}", MetricKey::DebtInterestRate.label());
    }

    for key in RATE_ORDER {
        if let Some(value) = record.series(key).and_then(|s| s.first().copied()) {
            let _ = writeln!(out, "{}\t{value}", key.label());
        }
    }

    if let Some(beta) = record.scalar(MetricKey::Beta) {
        let _ = writeln!(out, "{}\t{beta}", MetricKey::Beta.label());
    }

    if let Some(price) = record.scalar(MetricKey::CurrentPrice) {
        let _ = writeln!(out, "{}", MetricKey::CurrentPrice.label());
        let _ = writeln!(out, "{price}");
    }

    out
}

/// Annualized debt cost implied by the TTM interest expense against the TTM
/// total debt, as a percentage. Omitted when either side is missing or the
/// division is degenerate.
fn derived_debt_rate(record: &CanonicalRecord) -> Option<f64> {
    let interest = record
        .series(MetricKey::InterestExpense)?
        .first()
        .copied()?;
    let debt = record.series(MetricKey::TotalDebt)?.first().copied()?;
    if debt == 0.0 {
        return None;
    }
    let rate = (interest.abs() / debt.abs()) * 100.0;
    rate.is_finite().then_some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MetricValue;

    #[test]
    fn series_render_as_label_then_values() {
        let mut record = CanonicalRecord::new();
        record.merge(
            MetricKey::FreeCashFlow,
            MetricValue::Series(vec![77324.0, 60853.0, 27021.0]),
        );
        assert_eq!(
            serialize(&record),
            "Free Cash Flow\n77324\t60853\t27021\n"
        );
    }

    #[test]
    fn debt_rate_is_derived_from_ttm_values() {
        let mut record = CanonicalRecord::new();
        record.merge(
            MetricKey::TotalDebt,
            MetricValue::Series(vec![10481.0, 10270.0]),
        );
        record.merge(
            MetricKey::InterestExpense,
            MetricValue::Series(vec![-845.0, -912.0]),
        );
        let text = serialize(&record);
        assert!(text.contains("Debt Interest Rate\t8.06\n"), "{text}");
    }

    #[test]
    fn zero_debt_omits_derived_rate() {
        let mut record = CanonicalRecord::new();
        record.merge(MetricKey::TotalDebt, MetricValue::Series(vec![0.0]));
        record.merge(
            MetricKey::InterestExpense,
            MetricValue::Series(vec![-845.0]),
        );
        assert!(!serialize(&record).contains("Debt Interest Rate"));
    }

    #[test]
    fn price_renders_as_compare_block() {
        let mut record = CanonicalRecord::new();
        record.merge(MetricKey::CurrentPrice, MetricValue::Scalar(181.5));
        record.merge(MetricKey::Beta, MetricValue::Scalar(1.24));
        assert_eq!(serialize(&record), "Beta\t1.24\nCompare\n181.5\n");
    }

    #[test]
    fn empty_record_serializes_to_nothing() {
        assert_eq!(serialize(&CanonicalRecord::new()), "");
    }
}
