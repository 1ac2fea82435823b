//! Statement tables rendered as real markup tables.
//!
//! Rows are read label-first: the leading cell names the metric, the rest
//! are period values newest-first. Header noise (period labels, bare years,
//! paywall teasers) is filtered per cell rather than per row, so a row that
//! mixes years and figures still contributes its figures.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

use super::{Candidate, Extractor, SourceDocument};
use crate::aliases;
use crate::normalize;
use crate::record::MetricValue;

/// A whole token that reads as a calendar year. Digits adjacent to `.` or
/// `,` are figure fragments, not years, and must survive.
fn year_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(^|[^\d.,])(19|20)\d{2}([^\d.,]|$)").unwrap())
}

pub struct TableExtractor;

impl Extractor for TableExtractor {
    fn name(&self) -> &'static str {
        "tables"
    }

    fn candidates(&self, document: &SourceDocument) -> Vec<Candidate> {
        let html = Html::parse_document(&document.raw_markup);
        let row_sel = Selector::parse("table tr").unwrap();
        let cell_sel = Selector::parse("th, td").unwrap();

        let mut out = Vec::new();
        for row in html.select(&row_sel) {
            let cells: Vec<String> = row
                .select(&cell_sel)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect();
            let Some((label, rest)) = cells.split_first() else {
                continue;
            };
            let Some(key) = aliases::lookup(label) else {
                continue;
            };

            let mut values = Vec::new();
            for cell in rest {
                if is_noise(cell) {
                    continue;
                }
                values.extend(normalize::tokenize_numbers(cell));
                if values.len() >= normalize::MAX_PERIODS {
                    values.truncate(normalize::MAX_PERIODS);
                    break;
                }
            }
            if !values.is_empty() {
                out.push((key, MetricValue::Series(values)));
            }
        }
        out
    }
}

/// Cells that carry no period figure: blanks, placeholder dashes, paywall
/// teasers, period headers, and bare calendar years.
fn is_noise(cell: &str) -> bool {
    if cell.is_empty() || cell == "-" || cell == "—" {
        return true;
    }
    let lower = cell.to_lowercase();
    if lower.contains("upgrade") || lower.contains("period") || lower.contains("fiscal") {
        return true;
    }
    year_pattern().is_match(cell)
}
