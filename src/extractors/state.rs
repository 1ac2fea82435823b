//! Machine-readable data embedded in the page markup.
//!
//! Modern statement pages ship their numbers three ways before any visible
//! table renders: a server-rendered full-page-state block, linked-data
//! script blocks, and a global-state assignment in inline script. Candidates
//! are tried in that order; any parse failure is swallowed and falls through
//! to the next candidate.

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::{Candidate, Extractor, SourceDocument};
use crate::record::{MetricKey, MetricValue};

/// Property paths probed, most specific first.
const PROBE_PATHS: &[&[&str]] = &[
    &["props", "pageProps", "data"],
    &["props", "pageProps"],
    &["data"],
    &["quote"],
    &["financials"],
    &[],
];

/// Field spellings per metric; the first non-empty hit wins per field.
const FIELDS: &[(MetricKey, &[&str])] = &[
    (
        MetricKey::CurrentPrice,
        &["price", "regularMarketPrice", "currentPrice", "last"],
    ),
    (MetricKey::Beta, &["beta"]),
    (
        MetricKey::FreeCashFlow,
        &["freeCashFlow", "free_cash_flow", "fcf"],
    ),
    (
        MetricKey::SharesOutstanding,
        &["sharesOutstanding", "shares_outstanding"],
    ),
    (MetricKey::TotalDebt, &["totalDebt", "total_debt"]),
    (
        MetricKey::ShareholdersEquity,
        &["shareholdersEquity", "totalEquity", "shareholders_equity"],
    ),
];

pub struct EmbeddedStateExtractor;

impl Extractor for EmbeddedStateExtractor {
    fn name(&self) -> &'static str {
        "embedded-state"
    }

    fn candidates(&self, document: &SourceDocument) -> Vec<Candidate> {
        match extract_state(&document.raw_markup) {
            Some(state) => probe(&state),
            None => Vec::new(),
        }
    }
}

/// Pull the first parseable nested value out of the markup, or `None`.
fn extract_state(markup: &str) -> Option<Value> {
    let document = Html::parse_document(markup);

    // (a) Server-rendered full-page state under a well-known element id.
    if let Ok(sel) = Selector::parse("script#__NEXT_DATA__") {
        for script in document.select(&sel) {
            let raw = script.text().collect::<String>();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => return Some(value),
                Err(e) => debug!(error = %e, "page-state block failed to parse"),
            }
        }
    }

    // (b) Linked-data blocks: first one that parses wins.
    if let Ok(sel) = Selector::parse(r#"script[type="application/ld+json"]"#) {
        for script in document.select(&sel) {
            let raw = script.text().collect::<String>();
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => return Some(value),
                Err(e) => debug!(error = %e, "linked-data block failed to parse"),
            }
        }
    }

    // (c) Global-state assignment in inline script.
    global_state_assignment(markup)
}

/// Find `window.__INITIAL_STATE__ = {...}` (or the preloaded-state variant)
/// and parse the balanced object literal that follows the `=`.
fn global_state_assignment(markup: &str) -> Option<Value> {
    for variable in ["__INITIAL_STATE__", "__PRELOADED_STATE__"] {
        let needle = format!("window.{variable}");
        let Some(at) = markup.find(&needle) else {
            continue;
        };
        let after = &markup[at + needle.len()..];
        let Some(eq) = after.find('=') else {
            continue;
        };
        let Some(json) = balanced_object(&after[eq + 1..]) else {
            continue;
        };
        match serde_json::from_str::<Value>(json) {
            Ok(value) => return Some(value),
            Err(e) => debug!(variable, error = %e, "global-state assignment failed to parse"),
        }
    }
    None
}

/// Slice the first balanced `{...}` object literal, string-aware.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Inspect the fixed list of likely property paths for known field names
/// and emit the first hit per metric.
fn probe(state: &Value) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (key, names) in FIELDS {
        'field: for path in PROBE_PATHS {
            let Some(node) = walk(state, path) else {
                continue;
            };
            for name in *names {
                if let Some(value) = node.get(name).and_then(coerce) {
                    out.push((*key, value));
                    break 'field;
                }
            }
        }
    }
    out
}

fn walk<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut node = root;
    for segment in path {
        node = node.get(segment)?;
    }
    Some(node)
}

/// Accept numbers, numeric strings, and arrays of either; anything else is
/// treated as empty. Scalars are later coerced to one-period series where a
/// series is expected.
fn coerce(value: &Value) -> Option<MetricValue> {
    match value {
        Value::Number(n) => n.as_f64().map(MetricValue::Scalar),
        Value::String(s) => s.trim().replace(',', "").parse().ok().map(MetricValue::Scalar),
        Value::Array(items) => {
            let series: Vec<f64> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().replace(',', "").parse().ok(),
                    _ => None,
                })
                .take(crate::normalize::MAX_PERIODS)
                .collect();
            if series.is_empty() {
                None
            } else {
                Some(MetricValue::Series(series))
            }
        }
        _ => None,
    }
}
