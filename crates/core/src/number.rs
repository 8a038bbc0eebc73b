//! Permissive numeric extraction for amounts embedded in noisy text.
//!
//! Accepts currency symbols, thousands separators and trailing currency codes
//! (`$100`, `£1,250.00`, `100 USD`) while rejecting strings whose digits belong
//! to something else, such as dates (`2024-01-15`) or words (`TH3`).

use std::sync::OnceLock;

use regex::Regex;

/// A numeric literal located inside a larger string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericLiteral {
    pub value: f64,
    /// Byte offset of the first character of the literal.
    pub start: usize,
    /// Length of the literal exactly as written. `100.50` is six characters
    /// even though its value prints as `100.5`.
    pub len: usize,
}

fn is_numeric_start(c: char) -> bool {
    c == '-' || c == '.' || c.is_ascii_digit()
}

/// Scans the longest numeric literal at the very start of `s`: an optional
/// minus sign, digits (optionally grouped in threes by commas), an optional
/// decimal point and fractional digits. Returns the value and the literal's
/// length in bytes.
fn scan_literal(s: &str) -> Option<(f64, usize)> {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        i
    };

    let int_start = usize::from(bytes.first() == Some(&b'-'));
    let mut end = digits_from(int_start);
    let int_digits = end - int_start;

    // Thousands groups only make sense after a short leading group.
    if (1..=3).contains(&int_digits) {
        while bytes.get(end) == Some(&b',') && digits_from(end + 1) == end + 4 {
            end += 4;
        }
    }

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        frac_digits = frac_end - end - 1;
        if int_digits > 0 || frac_digits > 0 {
            end = frac_end;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    let value: f64 = s[..end].replace(',', "").parse().ok()?;
    value.is_finite().then_some((value, end))
}

/// Locates the first numeric literal in `text` and checks that it consumed
/// all of the adjacent numeric content.
pub fn find_literal(text: &str) -> Option<NumericLiteral> {
    let start = text.find(is_numeric_start)?;
    let (value, len) = scan_literal(&text[start..])?;

    // `2024-01-15` scans as `2024` followed by `-01-15`: not a number.
    if text[start + len..].starts_with(is_numeric_start) {
        return None;
    }

    Some(NumericLiteral { value, start, len })
}

/// Extracts a number from a string that may carry currency symbols, thousands
/// separators or a trailing currency code. Returns `None` for pure text,
/// date-shaped strings and non-finite values.
pub fn try_parse_number(text: &str) -> Option<f64> {
    find_literal(text).map(|literal| literal.value)
}

/// Parses an amount field: leading whitespace and a sign are allowed, then the
/// longest numeric literal; anything after it is ignored. `$100` is not an
/// amount under this rule, `100 USD` is.
pub fn parse_amount(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    scan_literal(s).map(|(value, _)| value)
}

/// Minimum share of the trimmed string a literal must occupy to count as a
/// real number, by how many of its sides touch a letter.
const ISOLATED_SHARE: f64 = 0.10;
const ONE_SIDED_SHARE: f64 = 0.25;
const EMBEDDED_SHARE: f64 = 0.50;

/// Like [`try_parse_number`] but also rejects literals that are an incidental
/// part of surrounding text, so `CAFE*TH3 BREWHOUSE` is not read as `3`.
pub fn parse_significant_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let literal = find_literal(trimmed)?;

    let is_letter = |c: Option<char>| c.is_some_and(char::is_alphabetic);
    let before = is_letter(trimmed[..literal.start].chars().next_back());
    let after = is_letter(trimmed[literal.start + literal.len..].chars().next());

    let required = match (before, after) {
        (false, false) => ISOLATED_SHARE,
        (true, true) => EMBEDDED_SHARE,
        _ => ONE_SIDED_SHARE,
    };

    // Literals are ASCII, so their byte length is their character count.
    let share = literal.len as f64 / trimmed.chars().count() as f64;
    (share >= required).then_some(literal.value)
}

fn re_amount_shape() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"^-?(?:[\d,]+\.?\d*|\.\d+)$").expect("invalid regex"))
}

fn re_currency_code() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\s*[A-Za-z]{3}$").expect("invalid regex"))
}

/// Whether a cell reads as a monetary amount: numeric, currency/number shaped
/// once symbols and a trailing currency code are removed, and significant.
pub fn looks_like_amount(text: &str) -> bool {
    if try_parse_number(text).is_none() || parse_significant_number(text).is_none() {
        return false;
    }
    let stripped = text.replace(['$', '£', '€', '¥'], "");
    let stripped = re_currency_code().replace(stripped.trim(), "");
    re_amount_shape().is_match(stripped.trim())
}
