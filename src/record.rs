//! Canonical record of reconciled financial metrics.
//!
//! One record is created empty per extraction run, populated once, then
//! serialized and dropped. Every stage only adds or upgrades entries; a
//! validly set entry is never removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Closed set of metrics the pipeline recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricKey {
    FreeCashFlow,
    SharesOutstanding,
    TotalDebt,
    ShareholdersEquity,
    CashAndShortTermInvestments,
    EffectiveTaxRate,
    InterestExpense,
    /// Derived from InterestExpense / TotalDebt at serialization time.
    DebtInterestRate,
    TerminalGrowthRate,
    RiskFreeRate,
    EquityRiskPremium,
    Beta,
    CurrentPrice,
}

impl MetricKey {
    /// Canonical output label, also an alias the import parser accepts.
    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::FreeCashFlow => "Free Cash Flow",
            MetricKey::SharesOutstanding => "Total Common Shares Outstanding",
            MetricKey::TotalDebt => "Total Debt",
            MetricKey::ShareholdersEquity => "Shareholders' Equity",
            MetricKey::CashAndShortTermInvestments => "Cash & Short-Term Investments",
            MetricKey::EffectiveTaxRate => "Effective Tax Rate",
            MetricKey::InterestExpense => "Interest Expense",
            MetricKey::DebtInterestRate => "Debt Interest Rate",
            MetricKey::TerminalGrowthRate => "Terminal Growth Rate",
            MetricKey::RiskFreeRate => "Risk Free Rate",
            MetricKey::EquityRiskPremium => "Equity Risk Premium",
            MetricKey::Beta => "Beta",
            MetricKey::CurrentPrice => "Compare",
        }
    }

    /// Scalars take a single value and are merged first-writer-wins.
    pub fn is_scalar(&self) -> bool {
        matches!(self, MetricKey::Beta | MetricKey::CurrentPrice)
    }
}

/// A reconciled value: an ordered time series (index 0 = TTM, never empty)
/// or a single scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetricValue {
    Series(Vec<f64>),
    Scalar(f64),
}

impl MetricValue {
    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            MetricValue::Series(values) => Some(values),
            MetricValue::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetricValue::Scalar(value) => Some(*value),
            MetricValue::Series(_) => None,
        }
    }

    fn period_count(&self) -> usize {
        match self {
            MetricValue::Series(values) => values.len(),
            MetricValue::Scalar(_) => 1,
        }
    }
}

/// The sole mutable aggregate of the pipeline. Owns the merge policy:
/// a richer series supersedes a shorter one, scalars keep their first writer.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    metrics: BTreeMap<MetricKey, MetricValue>,
}

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one candidate under the documented precedence policy.
    ///
    /// Series: replace only when the candidate has strictly more periods —
    /// equal-length candidates keep the first one seen. Scalars: first
    /// writer wins; document visit order encodes the trust ranking.
    /// Empty series candidates are rejected outright.
    pub fn merge(&mut self, key: MetricKey, candidate: MetricValue) {
        let candidate = match (key.is_scalar(), candidate) {
            (_, MetricValue::Series(values)) if values.is_empty() => return,
            // A scalar-kind key fed a series keeps only the TTM value.
            (true, MetricValue::Series(values)) => MetricValue::Scalar(values[0]),
            // A series-kind key fed a scalar becomes a one-period series.
            (false, MetricValue::Scalar(value)) => MetricValue::Series(vec![value]),
            (_, other) => other,
        };

        match self.metrics.get(&key) {
            None => {
                self.metrics.insert(key, candidate);
            }
            Some(current) if !key.is_scalar() => {
                if candidate.period_count() > current.period_count() {
                    debug!(
                        ?key,
                        from = current.period_count(),
                        to = candidate.period_count(),
                        "upgrading series with richer candidate"
                    );
                    self.metrics.insert(key, candidate);
                }
            }
            Some(_) => {} // scalar already set; later writers lose
        }
    }

    pub fn get(&self, key: MetricKey) -> Option<&MetricValue> {
        self.metrics.get(&key)
    }

    pub fn series(&self, key: MetricKey) -> Option<&[f64]> {
        self.metrics.get(&key).and_then(MetricValue::as_series)
    }

    pub fn scalar(&self, key: MetricKey) -> Option<f64> {
        self.metrics.get(&key).and_then(MetricValue::as_scalar)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricKey, &MetricValue)> {
        self.metrics.iter()
    }
}
