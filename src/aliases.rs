//! Label recognition as data, not code.
//!
//! Every place a metric label can appear — table row labels, free-text
//! headers, pasted import lines — goes through the same declarative alias
//! table. Matching is exact on the normalized form, never substring, so a
//! short alias cannot fire inside an unrelated longer label.

use crate::record::MetricKey;

/// English and Turkish spellings seen in the source documents and in
/// user-pasted statement text. New locales or label variants are additive.
const ALIASES: &[(MetricKey, &[&str])] = &[
    (
        MetricKey::FreeCashFlow,
        &["Free Cash Flow", "FCF", "Serbest Nakit Akışı"],
    ),
    (
        MetricKey::SharesOutstanding,
        &[
            "Total Common Shares Outstanding",
            "Shares Outstanding (Diluted)",
            "Shares Outstanding",
            "Hisse Sayısı",
        ],
    ),
    (
        MetricKey::TotalDebt,
        &["Total Debt", "Borç", "Toplam Borç"],
    ),
    (
        MetricKey::ShareholdersEquity,
        &[
            "Shareholders' Equity",
            "Total Equity",
            "Özsermaye",
            "Toplam Özsermaye",
        ],
    ),
    (
        MetricKey::CashAndShortTermInvestments,
        &[
            "Cash & Short-Term Investments",
            "Cash and Short-Term Investments",
            "Cash Short-Term Investments",
            "Cash and Cash Equivalents",
            "Cash Equivalents",
            "Nakit ve Nakit Benzerleri",
        ],
    ),
    (
        MetricKey::EffectiveTaxRate,
        &[
            "Effective Tax Rate",
            "Tax Rate",
            "Vergi Oranı",
            "Efektif Vergi Oranı",
            "Vergiler",
        ],
    ),
    (
        MetricKey::InterestExpense,
        &["Interest Expense", "Faiz Gideri"],
    ),
    (
        MetricKey::DebtInterestRate,
        &["Debt Interest Rate", "Debt Rate", "Borç Faiz Oranı"],
    ),
    (
        MetricKey::TerminalGrowthRate,
        &["Terminal Growth Rate", "Terminal Büyüme Oranı"],
    ),
    (
        MetricKey::RiskFreeRate,
        &["Risk Free Rate", "Risksiz Faiz Oranı"],
    ),
    (
        MetricKey::EquityRiskPremium,
        &["Equity Risk Premium", "Özsermaye Risk Primi"],
    ),
    (MetricKey::Beta, &["Beta"]),
    (
        MetricKey::CurrentPrice,
        &["Current Market Price", "Mevcut Piyasa Fiyatı"],
    ),
];

/// Fold a label for comparison: case-fold, `&` → "and", strip punctuation
/// (apostrophes included, so straight/curly/absent variants all agree) while
/// keeping letters of any alphabet, collapse whitespace.
pub fn normalize_label(label: &str) -> String {
    let replaced = label.to_lowercase().replace('&', " and ");
    let stripped: String = replaced
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c.is_whitespace() {
                Some(' ')
            } else {
                None
            }
        })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a raw label to its metric key, or `None` for unrecognized text.
pub fn lookup(label: &str) -> Option<MetricKey> {
    let normalized = normalize_label(label);
    if normalized.is_empty() {
        return None;
    }
    for (key, aliases) in ALIASES {
        if aliases.iter().any(|a| normalize_label(a) == normalized) {
            return Some(*key);
        }
    }
    None
}
