//! Forward growth assumptions derived from a raw free-cash-flow series.
//!
//! Sources rarely state a forward growth rate; it is estimated from recent
//! year-over-year moves with outlier dampening: a multi-year average is
//! distrusted under high volatility or negative swings, in which case the
//! most recent single-period move is taken as more representative.

use tracing::debug;

/// Percentage-point spread between growth figures beyond which the average
/// is considered distorted by a one-off spike.
const MAX_GROWTH_SPREAD: f64 = 80.0;
/// An average above this is treated as unsustainable and rejected.
const MAX_AVERAGE_GROWTH: f64 = 50.0;
/// Hard cap on the emitted estimate.
const GROWTH_CAP: f64 = 40.0;

/// Year-over-year growth figures for adjacent pairs among the most recent
/// `window` periods, most recent pair first. Pairs with a zero older value
/// are skipped. Series index 0 is the TTM period.
fn year_over_year(series: &[f64], window: usize) -> Vec<f64> {
    let span = series.len().min(window);
    let mut growths = Vec::new();
    for i in 0..span.saturating_sub(1) {
        let newer = series[i];
        let older = series[i + 1];
        if older == 0.0 {
            continue;
        }
        growths.push((newer - older) / older.abs() * 100.0);
    }
    growths
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Estimate a forward growth percentage from a series, TTM first.
///
/// Uses up to two growth figures over the most recent three periods. The
/// simple average is discarded in favor of the most recent single-period
/// growth when it is negative, when the figures spread more than 80
/// percentage points, or when it exceeds 50%. The final figure is capped at
/// +40% and, if negative, replaced by the most recent single-period growth.
/// Returns `None` when no adjacent pair yields a growth figure.
pub fn estimate_growth(series: &[f64]) -> Option<f64> {
    let growths = year_over_year(series, 3);
    let most_recent = *growths.first()?;

    let mut chosen = if growths.len() == 1 {
        most_recent
    } else {
        let average = growths.iter().sum::<f64>() / growths.len() as f64;
        let spread = growths.iter().cloned().fold(f64::MIN, f64::max)
            - growths.iter().cloned().fold(f64::MAX, f64::min);
        if average < 0.0 || spread > MAX_GROWTH_SPREAD || average > MAX_AVERAGE_GROWTH {
            debug!(
                average,
                spread, most_recent, "rejecting volatile multi-year average"
            );
            most_recent
        } else {
            average
        }
    };

    if chosen < 0.0 {
        chosen = most_recent;
    }
    if !chosen.is_finite() {
        return None;
    }
    Some(round2(chosen.min(GROWTH_CAP)))
}

/// Terminal (long-run) growth derived from up to three recent year-over-year
/// figures, clamped into [0%, 4%]. With fewer than three periods the safe
/// default of 3.0% applies.
pub fn derive_terminal_growth(series: &[f64]) -> f64 {
    if series.len() < 3 {
        return 3.0;
    }
    let growths = year_over_year(series, 4);
    if growths.is_empty() {
        return 3.0;
    }
    let average = growths.iter().sum::<f64>() / growths.len() as f64;
    round2(average.clamp(0.0, 4.0))
}
