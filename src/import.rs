//! Parser for pasted or serialized flat statement text.
//!
//! Input is line oriented. A line splits into label and values on colons,
//! tabs, or runs of two or more spaces; a label with no values on its own
//! line claims the numbers on the following line. Recognized labels feed the
//! calculator fields; everything else is ignored, so whole statement pages
//! can be pasted unedited.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;
use tracing::debug;

use crate::aliases;
use crate::growth::{self, round2};
use crate::normalize;
use crate::record::MetricKey;

fn split_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[:\t]+|\s{2,}").unwrap())
}

fn compare_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^compare\b").unwrap())
}

fn bare_number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d[\d,]*\.?\d*)").unwrap())
}

/// Pasted text that is really page markup rather than statement copy.
fn markup_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[a-zA-Z/!][^>]*>").unwrap())
}

/// Lines naming a proxy for the risk-free rate that the alias table does
/// not cover, like a treasury-yield row.
fn risk_free_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)risk[\s-]*free[\s-]*rate|10[\s-]*year.*treasury.*yield").unwrap()
    })
}

/// Strip annotations that ride along with pasted figures: parentheticals,
/// currency and percent marks, thousands separators.
fn scrub(value: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\(.*?\)|[%\u{2030}\u{2031}$,]").unwrap());
    re.replace_all(value, "").to_string()
}

fn parse_values(text: &str) -> Vec<f64> {
    normalize::tokenize_numbers(&scrub(text))
}

/// Everything the downstream valuation form needs. Optional fields stay
/// `None` until the pasted text supplies them; assumption rates carry the
/// documented defaults and are overwritten in place.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorFields {
    pub current_price: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub beta: Option<f64>,
    pub total_debt: Option<f64>,
    pub shareholders_equity: Option<f64>,
    pub cash_and_short_term: Option<f64>,
    pub effective_tax_rate: Option<f64>,
    pub interest_expense: Option<f64>,
    pub debt_interest_rate: Option<f64>,
    pub projection_years: u32,
    pub fcf_growth_rate: f64,
    pub terminal_growth_rate: f64,
    pub risk_free_rate: f64,
    pub equity_risk_premium: f64,
}

impl Default for CalculatorFields {
    fn default() -> Self {
        Self {
            current_price: None,
            free_cash_flow: None,
            shares_outstanding: None,
            beta: None,
            total_debt: None,
            shareholders_equity: None,
            cash_and_short_term: None,
            effective_tax_rate: None,
            interest_expense: None,
            debt_interest_rate: None,
            projection_years: 5,
            fcf_growth_rate: 15.0,
            terminal_growth_rate: 3.0,
            risk_free_rate: 4.5,
            equity_risk_premium: 5.5,
        }
    }
}

/// Parse flat statement text into a fresh field set.
pub fn import(text: &str) -> CalculatorFields {
    let mut fields = CalculatorFields::default();
    fields.apply_import(text);
    fields
}

impl CalculatorFields {
    /// Fold pasted statement text into these fields. Only recognized lines
    /// write; the projection horizon resets to its default because a pasted
    /// statement never carries one.
    pub fn apply_import(&mut self, text: &str) {
        self.projection_years = 5;

        // Raw markup pastes go through the line-preserving view first so
        // each cell lands on its own line; plain statement copy keeps its
        // tabs, which the split pattern relies on.
        let text: Cow<str> = if markup_pattern().is_match(text) {
            Cow::Owned(normalize::lines(text))
        } else {
            Cow::Borrowed(text)
        };

        let mut fcf_series: Option<Vec<f64>> = None;
        let mut pending_label: Option<MetricKey> = None;
        let mut awaiting_price = false;
        let mut awaiting_risk_free = false;
        let mut explicit_terminal = false;
        let mut explicit_premium = false;
        let mut explicit_debt_rate = false;
        let mut risk_free_seen = false;

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.to_lowercase().contains("upgrade") {
                continue;
            }

            if awaiting_price {
                awaiting_price = false;
                if let Some(caps) = bare_number_pattern().captures(line) {
                    if let Ok(price) = caps[1].replace(',', "").parse() {
                        self.current_price = Some(price);
                        continue;
                    }
                }
            }
            if awaiting_risk_free {
                awaiting_risk_free = false;
                if let Some(caps) = bare_number_pattern().captures(line) {
                    if let Ok(rate) = caps[1].replace(',', "").parse() {
                        self.risk_free_rate = rate;
                        risk_free_seen = true;
                        continue;
                    }
                }
            }
            if compare_pattern().is_match(line) {
                awaiting_price = true;
                pending_label = None;
                continue;
            }

            let mut parts = split_pattern().split(line).filter(|p| !p.trim().is_empty());
            let label = parts.next().unwrap_or_default();
            let inline_values = parse_values(&parts.collect::<Vec<_>>().join(" "));

            // The label may itself contain digits ("10-Year Treasury
            // Yield"), so only the split-off value part is read as the rate.
            if risk_free_pattern().is_match(line) {
                match inline_values.first() {
                    Some(rate) => {
                        self.risk_free_rate = *rate;
                        risk_free_seen = true;
                    }
                    None => awaiting_risk_free = true,
                }
                pending_label = None;
                continue;
            }

            let key = aliases::lookup(label).or_else(|| aliases::lookup(line));
            match key {
                Some(key) if !inline_values.is_empty() => {
                    pending_label = None;
                    self.assign(key, &inline_values, &mut fcf_series);
                    note_explicit(
                        key,
                        &mut explicit_terminal,
                        &mut explicit_premium,
                        &mut explicit_debt_rate,
                        &mut risk_free_seen,
                    );
                }
                Some(key) => pending_label = Some(key),
                None => {
                    // A bare value line pays off whichever label came before.
                    let values = parse_values(line);
                    if values.is_empty() {
                        pending_label = None;
                        continue;
                    }
                    if let Some(key) = pending_label.take() {
                        self.assign(key, &values, &mut fcf_series);
                        note_explicit(
                            key,
                            &mut explicit_terminal,
                            &mut explicit_premium,
                            &mut explicit_debt_rate,
                            &mut risk_free_seen,
                        );
                    }
                }
            }
        }

        if !explicit_terminal {
            if let Some(series) = &fcf_series {
                self.terminal_growth_rate = growth::derive_terminal_growth(series);
            }
        }
        if risk_free_seen && !explicit_premium {
            self.equity_risk_premium = round2(10.0 - self.risk_free_rate);
        }
        if !explicit_debt_rate {
            if let (Some(interest), Some(debt)) = (self.interest_expense, self.total_debt) {
                if debt != 0.0 && interest != 0.0 {
                    self.debt_interest_rate = Some(round2(interest.abs() / debt.abs() * 100.0));
                }
            }
        }
    }

    fn assign(&mut self, key: MetricKey, values: &[f64], fcf_series: &mut Option<Vec<f64>>) {
        let first = values[0];
        match key {
            MetricKey::FreeCashFlow => {
                self.free_cash_flow = Some(first);
                if let Some(estimate) = growth::estimate_growth(values) {
                    debug!(estimate, "growth estimated from pasted series");
                    self.fcf_growth_rate = estimate;
                }
                *fcf_series = Some(values.to_vec());
            }
            MetricKey::SharesOutstanding => self.shares_outstanding = Some(first),
            MetricKey::TotalDebt => self.total_debt = Some(first),
            MetricKey::ShareholdersEquity => self.shareholders_equity = Some(first),
            MetricKey::CashAndShortTermInvestments => self.cash_and_short_term = Some(first),
            MetricKey::EffectiveTaxRate => self.effective_tax_rate = Some(first),
            MetricKey::InterestExpense => self.interest_expense = Some(first),
            MetricKey::DebtInterestRate => self.debt_interest_rate = Some(first),
            MetricKey::TerminalGrowthRate => self.terminal_growth_rate = first,
            MetricKey::RiskFreeRate => self.risk_free_rate = first,
            MetricKey::EquityRiskPremium => self.equity_risk_premium = first,
            MetricKey::Beta => self.beta = Some(first),
            MetricKey::CurrentPrice => self.current_price = Some(first),
        }
    }
}

fn note_explicit(
    key: MetricKey,
    terminal: &mut bool,
    premium: &mut bool,
    debt_rate: &mut bool,
    risk_free: &mut bool,
) {
    match key {
        MetricKey::TerminalGrowthRate => *terminal = true,
        MetricKey::EquityRiskPremium => *premium = true,
        MetricKey::DebtInterestRate => *debt_rate = true,
        MetricKey::RiskFreeRate => *risk_free = true,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_separated_lines_fill_fields() {
        let text = "Free Cash Flow\t77,324\t60,853\t27,021\n\
                    Total Debt\t10,481\t10,270\n\
                    Beta\t1.24\n";
        let fields = import(text);
        assert_eq!(fields.free_cash_flow, Some(77324.0));
        assert_eq!(fields.total_debt, Some(10481.0));
        assert_eq!(fields.beta, Some(1.24));
    }

    #[test]
    fn label_then_value_line_pairs_up() {
        let text = "Free Cash Flow\n77,324\t60,853\n\nTotal Debt\n10,481\n";
        let fields = import(text);
        assert_eq!(fields.free_cash_flow, Some(77324.0));
        assert_eq!(fields.total_debt, Some(10481.0));
    }

    #[test]
    fn growth_rate_is_estimated_from_fcf_series() {
        // 27% and 125% growth: spread over 80, most recent (27.07) wins.
        let fields = import("Free Cash Flow\t77,324\t60,853\t27,021\n");
        assert_eq!(fields.fcf_growth_rate, 27.07);
    }

    #[test]
    fn single_fcf_value_keeps_default_growth() {
        let fields = import("Free Cash Flow\t77,324\n");
        assert_eq!(fields.free_cash_flow, Some(77324.0));
        assert_eq!(fields.fcf_growth_rate, 15.0);
    }

    #[test]
    fn compare_block_sets_price() {
        let fields = import("Compare\n181.50\n");
        assert_eq!(fields.current_price, Some(181.5));
    }

    #[test]
    fn treasury_yield_line_sets_risk_free_and_premium() {
        let fields = import("10-Year Treasury Yield\t4.2%\n");
        assert_eq!(fields.risk_free_rate, 4.2);
        assert_eq!(fields.equity_risk_premium, 5.8);
    }

    #[test]
    fn treasury_rate_on_the_next_line_is_claimed() {
        let fields = import("10-Year Treasury Yield\n4.2\n");
        assert_eq!(fields.risk_free_rate, 4.2);
        assert_eq!(fields.equity_risk_premium, 5.8);
    }

    #[test]
    fn valueless_treasury_line_does_not_steal_later_values() {
        // The rate may only come from the treasury line itself or the very
        // next line; a label in between ends the search.
        let text = "10-Year Treasury Yield\nFree Cash Flow\n100\t90\t80\n";
        let fields = import(text);
        assert_eq!(fields.free_cash_flow, Some(100.0));
        assert_eq!(fields.risk_free_rate, 4.5);
        assert_eq!(fields.equity_risk_premium, 5.5);
    }

    #[test]
    fn compare_price_keeps_only_the_leading_figure() {
        let fields = import("Compare\n180.26 +1.2 (0.7%)\n");
        assert_eq!(fields.current_price, Some(180.26));
    }

    #[test]
    fn pasted_markup_is_read_line_by_line() {
        let text = "<table><tr><td>Total Debt</td><td>10,481</td></tr>\
                    <tr><td>Beta</td><td>1.24</td></tr></table>";
        let fields = import(text);
        assert_eq!(fields.total_debt, Some(10481.0));
        assert_eq!(fields.beta, Some(1.24));
    }

    #[test]
    fn explicit_premium_is_not_overwritten() {
        let text = "Risk Free Rate\t4.0\nEquity Risk Premium\t5.0\n";
        let fields = import(text);
        assert_eq!(fields.risk_free_rate, 4.0);
        assert_eq!(fields.equity_risk_premium, 5.0);
    }

    #[test]
    fn debt_rate_derived_from_interest_and_debt() {
        let text = "Total Debt\t10,481\nInterest Expense\t-845\n";
        let fields = import(text);
        assert_eq!(fields.debt_interest_rate, Some(8.06));
    }

    #[test]
    fn explicit_debt_rate_wins_over_derivation() {
        let text = "Total Debt\t10,481\nInterest Expense\t-845\nDebt Interest Rate\t7.5\n";
        let fields = import(text);
        assert_eq!(fields.debt_interest_rate, Some(7.5));
    }

    #[test]
    fn terminal_growth_derived_from_long_series() {
        // Growths 2% and 3% over three periods: average 2.5, inside band.
        let fields = import("Free Cash Flow\t102\t100\t97.0873786\n");
        assert_eq!(fields.terminal_growth_rate, 2.5);
    }

    #[test]
    fn explicit_terminal_growth_short_circuits_derivation() {
        let text = "Free Cash Flow\t102\t100\t97.0873786\nTerminal Growth Rate\t2.0\n";
        let fields = import(text);
        assert_eq!(fields.terminal_growth_rate, 2.0);
    }

    #[test]
    fn parenthetical_and_percent_noise_is_scrubbed() {
        let text = "Effective Tax Rate\t14.9% (est)\nShareholders' Equity\t$74,100\n";
        let fields = import(text);
        assert_eq!(fields.effective_tax_rate, Some(14.9));
        assert_eq!(fields.shareholders_equity, Some(74100.0));
    }

    #[test]
    fn unrelated_lines_are_ignored() {
        let text = "Some Navigation Link\nUpgrade to Pro\nRevenue\t400,000\n";
        let fields = import(text);
        assert_eq!(fields, CalculatorFields::default());
    }
}
