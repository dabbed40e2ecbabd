use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

fn short_slash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})$").expect("invalid short date regex"))
}

fn short_kanji_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})月(\d{1,2})日$").expect("invalid kanji date regex"))
}

fn magnitude_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(\.\d+)?$").expect("invalid magnitude regex"))
}

/// Normalize a header cell for alias matching: drop spaces, tabs and
/// ideographic spaces anywhere in the cell, then case-fold.
pub fn normalize_header(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '\u{3000}'))
        .collect::<String>()
        .to_lowercase()
}

/// Normalize a data cell: trim edges, map interior ideographic spaces to
/// ordinary spaces.
pub fn normalize_cell(value: &str) -> String {
    value.trim().replace('\u{3000}', " ")
}

// %y must come before %Y: %Y accepts "25" as year 25, which would shadow the
// two-digit form. %y reads at most two digits, so four-digit years fall
// through to %Y.
const DATE_FORMATS: &[&str] = &[
    "%y/%m/%d",
    "%Y/%m/%d",
    "%Y-%m-%d",
    "%Y.%m.%d",
    "%Y年%m月%d日",
    "%Y%m%d",
];

/// Parse a vendor date cell into an ISO calendar date, or `""` when no format
/// matches. Month/day-only short forms (`3/4`, `3月4日`) are valid only when a
/// default year is supplied.
pub fn parse_date(raw: &str, default_year: Option<i32>) -> String {
    let value = normalize_cell(raw);
    if value.is_empty() {
        return String::new();
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&value, fmt) {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    if let Some(year) = default_year {
        for re in [short_slash_re(), short_kanji_re()] {
            if let Some(caps) = re.captures(&value) {
                let month: u32 = caps[1].parse().unwrap_or(0);
                let day: u32 = caps[2].parse().unwrap_or(0);
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    return date.format("%Y-%m-%d").to_string();
                }
            }
        }
    }

    String::new()
}

/// Parse an amount cell into signed integer yen, or `None` when the cell is
/// not a recognizable amount. Negative values may be written with a leading
/// minus, accounting parentheses, or the `▲`/`△` markers bank exports use.
/// The caller owns the sign convention; this only reads what is written.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let mut value = normalize_cell(raw);
    if value.is_empty() {
        return None;
    }

    let mut sign = 1i64;
    if value.starts_with('(') && value.ends_with(')') {
        sign = -1;
        value = value[1..value.len() - 1].to_string();
    }
    for marker in ['▲', '△', '-'] {
        if let Some(rest) = value.strip_prefix(marker) {
            sign = -1;
            value = rest.to_string();
            break;
        }
    }
    if let Some(rest) = value.strip_prefix('+') {
        value = rest.to_string();
    }

    let value: String = value
        .chars()
        .filter(|c| !matches!(c, ',' | '円' | '¥' | '\\'))
        .collect();
    let value = value.trim();
    if value.is_empty() || !magnitude_re().is_match(value) {
        return None;
    }

    let magnitude = if value.contains('.') {
        value.parse::<f64>().ok()?.round() as i64
    } else {
        value.parse::<i64>().ok()?
    };
    Some(sign * magnitude)
}
