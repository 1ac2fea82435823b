//! Last-resort extraction from flattened page text.
//!
//! When neither embedded state nor table markup yields a metric, the page is
//! flattened to plain text and scanned with one ordered rule per label
//! variant. A rule matches a label immediately followed by a run of numeric
//! tokens; the first match per metric wins within this strategy.

use regex::Regex;
use std::sync::OnceLock;

use super::{Candidate, DocumentKind, Extractor, SourceDocument};
use crate::normalize;
use crate::record::{MetricKey, MetricValue};

/// A label expression paired with the metric it yields. The numeric run is
/// appended to each label when the rule set is compiled.
const RULES: &[(MetricKey, &str)] = &[
    (MetricKey::FreeCashFlow, r"Free Cash Flow"),
    (
        MetricKey::SharesOutstanding,
        r"Total Common Shares Outstanding",
    ),
    (
        MetricKey::SharesOutstanding,
        r"Shares Outstanding \(Diluted\)",
    ),
    (MetricKey::SharesOutstanding, r"Shares Outstanding"),
    (MetricKey::TotalDebt, r"Total Debt"),
    (
        MetricKey::ShareholdersEquity,
        r"Shareholders['\u{2019}]? Equity",
    ),
    (MetricKey::ShareholdersEquity, r"Total Equity"),
    (
        MetricKey::CashAndShortTermInvestments,
        r"Cash (?:&|and) Short[- ]Term Investments",
    ),
    (
        MetricKey::CashAndShortTermInvestments,
        r"Cash and Cash Equivalents",
    ),
    (MetricKey::EffectiveTaxRate, r"Effective Tax Rate"),
    (MetricKey::Beta, r"Beta"),
    (MetricKey::InterestExpense, r"Interest Expense"),
];

fn compiled_rules() -> &'static Vec<(MetricKey, Regex)> {
    static RULES_RE: OnceLock<Vec<(MetricKey, Regex)>> = OnceLock::new();
    RULES_RE.get_or_init(|| {
        RULES
            .iter()
            .map(|(key, label)| {
                // Label, any parenthetical annotations ("(TTM, millions)",
                // "(5Y Monthly)"), a tight gap, then up to six tokens with
                // optional thousands separators and trailing percent signs.
                // Free-running words after the label still break the match.
                let pattern = format!(
                    r"(?i){label}(?:\s*\([^()]*\))*[\s:]*\$?((?:-?\d[\d,]*(?:\.\d+)?%?)(?:\s+-?\d[\d,]*(?:\.\d+)?%?){{0,5}})"
                );
                (*key, Regex::new(&pattern).unwrap())
            })
            .collect()
    })
}

/// Raw-markup fallbacks for the current price, tried in order. Only the
/// overview page is trusted for these.
fn price_fallbacks() -> &'static Vec<Regex> {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        vec![
            Regex::new(r#"(?i)<span[^>]*class="[^"]*price[^"]*"[^>]*>[^<0-9]*\$?\s*([\d,]+\.?\d*)"#)
                .unwrap(),
            Regex::new(r#"(?i)data-price="([\d.]+)""#).unwrap(),
            Regex::new(r#"(?i)class="[^"]*quote[^"]*"[^>]*>[^<0-9]*\$?\s*([\d,]+\.?\d*)"#).unwrap(),
        ]
    })
}

/// Beta stated inside inline script that never parsed as a whole document.
fn beta_fallback() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)"beta"[^:{}]{0,20}:\s*"?(-?[\d.]+)"#).unwrap())
}

pub struct PatternExtractor;

impl Extractor for PatternExtractor {
    fn name(&self) -> &'static str {
        "text-patterns"
    }

    fn candidates(&self, document: &SourceDocument) -> Vec<Candidate> {
        let text = normalize::flatten(&document.raw_markup);
        let mut out: Vec<Candidate> = Vec::new();

        for (key, rule) in compiled_rules() {
            if out.iter().any(|(k, _)| k == key) {
                continue;
            }
            let Some(caps) = rule.captures(&text) else {
                continue;
            };
            let values = normalize::tokenize_numbers(&caps[1]);
            if values.is_empty() {
                continue;
            }
            let value = if key.is_scalar() {
                MetricValue::Scalar(values[0])
            } else {
                MetricValue::Series(values)
            };
            out.push((*key, value));
        }

        if document.kind == DocumentKind::Overview {
            if !out.iter().any(|(k, _)| *k == MetricKey::CurrentPrice) {
                if let Some(price) = raw_price(&document.raw_markup) {
                    out.push((MetricKey::CurrentPrice, MetricValue::Scalar(price)));
                }
            }
            if !out.iter().any(|(k, _)| *k == MetricKey::Beta) {
                if let Some(caps) = beta_fallback().captures(&document.raw_markup) {
                    if let Ok(beta) = caps[1].parse::<f64>() {
                        out.push((MetricKey::Beta, MetricValue::Scalar(beta)));
                    }
                }
            }
        }
        out
    }
}

fn raw_price(markup: &str) -> Option<f64> {
    for rule in price_fallbacks() {
        if let Some(caps) = rule.captures(markup) {
            if let Ok(price) = caps[1].replace(',', "").parse::<f64>() {
                return Some(price);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(kind: DocumentKind, markup: &str) -> SourceDocument {
        SourceDocument::new("https://example.com", kind, markup)
    }

    #[test]
    fn labeled_runs_become_series() {
        let html = "<p>Free Cash Flow 77,324 60,853 27,021</p>\
                    <p>Total Debt 10,481 10,270</p>";
        let candidates = PatternExtractor.candidates(&doc(DocumentKind::CashFlow, html));
        assert!(candidates.contains(&(
            MetricKey::FreeCashFlow,
            MetricValue::Series(vec![77324.0, 60853.0, 27021.0])
        )));
        assert!(candidates.contains(&(
            MetricKey::TotalDebt,
            MetricValue::Series(vec![10481.0, 10270.0])
        )));
    }

    #[test]
    fn first_matching_variant_wins_per_metric() {
        let html = "<p>Shares Outstanding (Diluted) 15,550</p>\
                    <p>Shares Outstanding 15,600</p>";
        let candidates = PatternExtractor.candidates(&doc(DocumentKind::Financials, html));
        assert_eq!(
            candidates,
            vec![(
                MetricKey::SharesOutstanding,
                MetricValue::Series(vec![15550.0])
            )]
        );
    }

    #[test]
    fn percent_suffixes_are_tolerated() {
        let html = "<p>Effective Tax Rate 14.9% 13.3% 16.2%</p>";
        let candidates = PatternExtractor.candidates(&doc(DocumentKind::Financials, html));
        assert_eq!(
            candidates,
            vec![(
                MetricKey::EffectiveTaxRate,
                MetricValue::Series(vec![14.9, 13.3, 16.2])
            )]
        );
    }

    #[test]
    fn beta_is_emitted_as_scalar() {
        let html = "<p>Beta (5Y Monthly) 1.24 1.19</p>";
        let candidates = PatternExtractor.candidates(&doc(DocumentKind::Overview, html));
        assert_eq!(
            candidates,
            vec![(MetricKey::Beta, MetricValue::Scalar(1.24))]
        );
    }

    #[test]
    fn annotated_labels_still_match() {
        let html = "<p>Free Cash Flow (TTM, millions) 77,324 60,853</p>";
        let candidates = PatternExtractor.candidates(&doc(DocumentKind::CashFlow, html));
        assert_eq!(
            candidates,
            vec![(
                MetricKey::FreeCashFlow,
                MetricValue::Series(vec![77324.0, 60853.0])
            )]
        );
    }

    #[test]
    fn label_followed_by_words_does_not_match() {
        let html = "<p>Beta Industries Revenue 500</p>";
        assert!(PatternExtractor
            .candidates(&doc(DocumentKind::Financials, html))
            .is_empty());
    }

    #[test]
    fn overview_price_span_fallback() {
        let html = r#"<span class="stock-price large">$181.50</span>"#;
        let candidates = PatternExtractor.candidates(&doc(DocumentKind::Overview, html));
        assert_eq!(
            candidates,
            vec![(MetricKey::CurrentPrice, MetricValue::Scalar(181.50))]
        );
    }

    #[test]
    fn price_fallback_is_overview_only() {
        let html = r#"<span class="price">$181.50</span>"#;
        assert!(PatternExtractor
            .candidates(&doc(DocumentKind::Forecast, html))
            .is_empty());
    }

    #[test]
    fn data_price_attribute_fallback() {
        let html = r#"<div data-price="179.25">quote</div>"#;
        let candidates = PatternExtractor.candidates(&doc(DocumentKind::Overview, html));
        assert_eq!(
            candidates,
            vec![(MetricKey::CurrentPrice, MetricValue::Scalar(179.25))]
        );
    }

    #[test]
    fn beta_script_fallback_on_overview() {
        let html = r#"<script>var q = {"beta": 1.31, "x": 2};</script>"#;
        let candidates = PatternExtractor.candidates(&doc(DocumentKind::Overview, html));
        assert_eq!(
            candidates,
            vec![(MetricKey::Beta, MetricValue::Scalar(1.31))]
        );
    }
}
