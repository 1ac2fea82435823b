//! Plain-text views of raw page markup.
//!
//! Two modes are produced from the same cleanup passes: a flattened view
//! (every whitespace run and tag boundary becomes a single space) used by the
//! pattern extractor, and a line-preserving view (tag boundaries become
//! newlines) used by the import parser when raw markup is pasted, so
//! label/value rules can anchor on line context. Both are idempotent on
//! already-clean text and never fail on malformed markup.

use regex::Regex;

/// Upper bound on reporting periods kept from any one numeric run.
pub const MAX_PERIODS: usize = 6;

/// Flatten markup to a single-line plain-text view.
pub fn flatten(markup: &str) -> String {
    let text = strip_markup(markup, " ");
    let re_ws = Regex::new(r"\s+").unwrap();
    re_ws.replace_all(&text, " ").trim().to_string()
}

/// Line-preserving plain-text view: tag boundaries become newlines, only
/// intra-line whitespace is collapsed.
pub fn lines(markup: &str) -> String {
    let text = strip_markup(markup, "\n");
    let re_space = Regex::new(r"[ \t]+").unwrap();
    let re_blank = Regex::new(r"\n\s*\n+").unwrap();

    let collapsed = re_space.replace_all(&text, " ");
    let collapsed = re_blank.replace_all(&collapsed, "\n");
    collapsed
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove script/style blocks (with content), then all remaining tags,
/// replacing each with `tag_gap`, and decode character entities.
fn strip_markup(markup: &str, tag_gap: &str) -> String {
    let re_script = Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap();
    let re_style = Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap();
    let re_tag = Regex::new(r"<[^>]+>").unwrap();

    let text = re_script.replace_all(markup, tag_gap);
    let text = re_style.replace_all(&text, tag_gap);
    let text = re_tag.replace_all(&text, tag_gap);
    decode_entities(&text)
}

/// Replace common named entities and any numeric `&#NNN;` entity with its
/// literal character. Unknown named entities pass through untouched.
pub fn decode_entities(text: &str) -> String {
    let mut out = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'");

    if out.contains("&#") {
        let re_num = Regex::new(r"&#(\d+);").unwrap();
        out = re_num
            .replace_all(&out, |caps: &regex::Captures| {
                caps[1]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default()
            })
            .to_string();
    }
    out
}

/// Pull every signed decimal token out of a captured numeric run.
///
/// Tokens may carry thousands separators and one decimal point; bare
/// separator characters never produce a value. The result is truncated to
/// [`MAX_PERIODS`] values, most-recent first.
pub fn tokenize_numbers(run: &str) -> Vec<f64> {
    let re_num = Regex::new(r"-?\d[\d,]*(?:\.\d+)?").unwrap();
    re_num
        .find_iter(run)
        .take(MAX_PERIODS)
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_strips_script_content() {
        let html = "<html><script>var price = 999;</script><p>Free Cash Flow</p></html>";
        let text = flatten(html);
        assert_eq!(text, "Free Cash Flow");
        assert!(!text.contains("999"));
    }

    #[test]
    fn flatten_decodes_entities() {
        let text = flatten("Cash &amp; Short-Term&nbsp;Investments &#8212; TTM");
        assert_eq!(text, "Cash & Short-Term Investments \u{2014} TTM");
    }

    #[test]
    fn flatten_is_idempotent_on_clean_text() {
        let clean = "Total Debt 10481 10270 11056";
        assert_eq!(flatten(clean), clean);
        assert_eq!(flatten(&flatten(clean)), clean);
    }

    #[test]
    fn flatten_survives_malformed_markup() {
        let text = flatten("<div><p>Beta <b>1.2</div>");
        assert!(text.contains("Beta"));
        assert!(text.contains("1.2"));
    }

    #[test]
    fn lines_keeps_tag_boundaries_as_newlines() {
        let html = "<tr><td>Free Cash Flow</td><td>77324</td><td>60853</td></tr>";
        assert_eq!(lines(html), "Free Cash Flow\n77324\n60853");
    }

    #[test]
    fn tokenizer_handles_separators_and_signs() {
        let vals = tokenize_numbers("77,324  -60,853.5  27021");
        assert_eq!(vals, vec![77324.0, -60853.5, 27021.0]);
    }

    #[test]
    fn tokenizer_rejects_bare_separators() {
        assert!(tokenize_numbers(", . - ,,").is_empty());
    }

    #[test]
    fn tokenizer_caps_at_six_periods() {
        let vals = tokenize_numbers("1 2 3 4 5 6 7 8");
        assert_eq!(vals.len(), MAX_PERIODS);
        assert_eq!(vals[0], 1.0);
        assert_eq!(vals[5], 6.0);
    }
}
