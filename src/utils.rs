//! Number, text and formatting helpers shared by the parsers and analyses.

use crate::error::ReportError;
use crate::types::Money;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use scraper::ElementRef;
use std::str::FromStr;
use std::sync::LazyLock;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19\d{2}|20\d{2})\b").expect("valid year regex"));

/// Normalizes a character sequence, collapsing whitespace runs into one space.
fn normalize_chars<I: IntoIterator<Item = char>>(iter: I) -> String {
    let mut output = String::new();
    let mut prev_space = false;
    for ch in iter {
        let is_space = ch.is_whitespace();
        if is_space {
            if !prev_space {
                output.push(' ');
            }
        } else {
            output.push(ch);
        }
        prev_space = is_space;
    }
    output.trim().to_string()
}

/// Collects the text of all descendants of an element with normalized whitespace.
pub fn collect_text(element: ElementRef) -> String {
    normalize_chars(element.text().flat_map(str::chars))
}

/// Collapses whitespace in free text.
pub fn normalize_text(text: &str) -> String {
    normalize_chars(text.chars())
}

const fn fold_accent(ch: char) -> char {
    match ch {
        'Á' | 'À' | 'Â' | 'Ä' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Ö' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        other => other,
    }
}

/// Key used by every matching rule: uppercase, accent-folded, single-spaced.
pub fn rule_key(text: &str) -> String {
    normalize_chars(text.chars())
        .chars()
        .flat_map(char::to_uppercase)
        .map(fold_accent)
        .collect()
}

/// Parses a localized amount: `1,234.56`, `(1,234)` and `-1,234`.
///
/// Commas are thousands separators, the dot is the decimal separator. Blank cells,
/// dashes and cells without digits read as zero.
pub fn parse_amount(value: &str, account: &str) -> Result<Money, ReportError> {
    let normalized = normalize_text(value);
    let mut text = normalized.as_str();
    if matches!(text, "" | "-" | "--" | "&nbsp;") {
        return Ok(Decimal::ZERO);
    }

    let mut negative = false;
    if let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        negative = true;
        text = inner.trim();
    }
    if let Some(rest) = text.strip_prefix('-') {
        negative = true;
        text = rest.trim();
    }

    let digits: String = text
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    if !digits.chars().any(|ch| ch.is_ascii_digit()) {
        return Ok(Decimal::ZERO);
    }

    let amount = Decimal::from_str(&digits).map_err(|_| ReportError::Number {
        value: normalized.clone(),
        account: account.to_string(),
    })?;
    Ok(if negative { -amount } else { amount })
}

/// First four-digit year (19xx/20xx) in a text.
pub fn find_year(text: &str) -> Option<i32> {
    years_in(text).next()
}

/// All four-digit years (19xx/20xx) in a text, in order of appearance.
pub fn years_in(text: &str) -> impl Iterator<Item = i32> + '_ {
    YEAR_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse().ok())
}

/// `value / base × 100`, `None` when the base is zero.
#[inline]
pub fn percent_of(value: Money, base: Money) -> Option<Decimal> {
    value
        .checked_div(base)
        .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
}

/// `numerator / denominator`, `None` when the denominator is zero.
#[inline]
pub fn ratio(numerator: Money, denominator: Money) -> Option<Decimal> {
    numerator.checked_div(denominator)
}

/// Rounds half away from zero, as reports are printed.
#[inline]
pub fn round_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats an amount the way the reports print it: `1,234` or `(1,234)`.
pub fn format_amount(value: Money) -> String {
    let rounded = round_dp(value, 0);
    if rounded.is_zero() {
        return "0".to_string();
    }
    let grouped = group_thousands(&rounded.abs().trunc().to_string());
    if rounded.is_sign_negative() {
        format!("({grouped})")
    } else {
        grouped
    }
}

/// Formats a percentage as `12.34%`, `N/A` when unavailable.
pub fn format_percent(value: Option<Decimal>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}%", round_dp(v, 2)))
}

/// Formats a ratio with two decimals, `N/A` when unavailable.
pub fn format_ratio(value: Option<Decimal>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}", round_dp(v, 2)))
}
