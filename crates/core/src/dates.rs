//! Batch date parsing.
//!
//! A batch is parsed with a single layout: the first layout under which every
//! value parses wins, so a column mixing `01/04/2024` and `13/04/2024` is read
//! day-first throughout rather than flipping per row.

use std::sync::OnceLock;

use chrono::NaiveDate;

use crate::layout::{compile_all, probe, Captured, Layout, ParseError};

const BASE_LAYOUTS: [&str; 6] = [
    "yyyy/MM/dd",
    "yyyy/M/d",
    "dd/MM/yyyy",
    "d/M/yyyy",
    "MM/dd/yyyy",
    "M/d/yyyy",
];

const NAMED_MONTH_LAYOUTS: [&str; 4] = [
    "d MMMM yyyy",
    "dd MMM yyyy",
    "MMMM d yyyy",
    "MMM dd yyyy",
];

/// The layouts tried when the caller supplies none, in priority order. Each
/// numeric base is tried with `/`, `-` and no separator before moving on.
pub fn default_date_layouts() -> Vec<String> {
    let mut layouts = Vec::new();
    for base in BASE_LAYOUTS {
        layouts.push(base.to_string());
        layouts.push(base.replace('/', "-"));
        layouts.push(base.replace('/', ""));
    }
    layouts.extend(NAMED_MONTH_LAYOUTS.iter().map(|s| s.to_string()));
    layouts
}

fn compiled_defaults() -> &'static [Layout] {
    static LAYOUTS: OnceLock<Vec<Layout>> = OnceLock::new();
    LAYOUTS.get_or_init(|| {
        compile_all(&default_date_layouts()).expect("invalid built-in date layout")
    })
}

fn build_date(c: &Captured) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(c.year?, c.month?, c.day?)
}

fn parse_with<S: AsRef<str>>(values: &[S], layouts: &[Layout]) -> Result<Vec<NaiveDate>, ParseError> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let trimmed: Vec<&str> = values.iter().map(|v| v.as_ref().trim()).collect();
    match probe(&trimmed, layouts, build_date) {
        Some((layout, dates)) => {
            tracing::debug!(layout = %layout, count = dates.len(), "Accepted date layout");
            Ok(dates)
        }
        None => Err(ParseError::UnparseableDates(values.len())),
    }
}

/// Parses every value with the first default layout that fits the whole batch.
pub fn parse_date_strings<S: AsRef<str>>(values: &[S]) -> Result<Vec<NaiveDate>, ParseError> {
    parse_with(values, compiled_defaults())
}

/// Like [`parse_date_strings`] with a caller-supplied layout list.
pub fn parse_date_strings_with<S, L>(values: &[S], layouts: &[L]) -> Result<Vec<NaiveDate>, ParseError>
where
    S: AsRef<str>,
    L: AsRef<str>,
{
    let layouts = compile_all(layouts)?;
    parse_with(values, &layouts)
}

/// Parses a single value against the default layouts.
pub fn parse_date_string(value: &str) -> Option<NaiveDate> {
    parse_date_strings(&[value]).ok()?.pop()
}

/// Parses a single value and renders it as `YYYY-MM-DD`.
pub fn try_parse_date(value: &str) -> Option<String> {
    parse_date_string(value).map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn default_layout_order() {
        let layouts = default_date_layouts();
        assert_eq!(&layouts[..3], &["yyyy/MM/dd", "yyyy-MM-dd", "yyyyMMdd"]);
        assert_eq!(layouts.len(), 22);
        assert_eq!(layouts.last().map(String::as_str), Some("MMM dd yyyy"));
    }

    // ── batch parsing ─────────────────────────────────────────────────────────

    #[test]
    fn parses_iso_dates() {
        let dates = parse_date_strings(&["2024-04-01", "2024-12-31"]).unwrap();
        assert_eq!(dates, vec![ymd(2024, 4, 1), ymd(2024, 12, 31)]);
    }

    #[test]
    fn parses_compact_dates() {
        let dates = parse_date_strings(&["20240401"]).unwrap();
        assert_eq!(dates, vec![ymd(2024, 4, 1)]);
    }

    #[test]
    fn ambiguous_batch_prefers_day_first() {
        let dates = parse_date_strings(&["01/04/2024", "02/04/2024"]).unwrap();
        assert_eq!(dates, vec![ymd(2024, 4, 1), ymd(2024, 4, 2)]);
    }

    #[test]
    fn one_value_decides_layout_for_whole_batch() {
        // 04/13 only works month-first, so every value is read month-first.
        let dates = parse_date_strings(&["04/01/2024", "04/13/2024"]).unwrap();
        assert_eq!(dates, vec![ymd(2024, 4, 1), ymd(2024, 4, 13)]);
    }

    #[test]
    fn unpadded_values_fall_through_to_loose_layouts() {
        let dates = parse_date_strings(&["1/4/2024", "13/11/2024"]).unwrap();
        assert_eq!(dates, vec![ymd(2024, 4, 1), ymd(2024, 11, 13)]);
    }

    #[test]
    fn parses_month_names() {
        assert_eq!(parse_date_string("1 April 2024"), Some(ymd(2024, 4, 1)));
        assert_eq!(parse_date_string("01 Apr 2024"), Some(ymd(2024, 4, 1)));
        assert_eq!(parse_date_string("April 1 2024"), Some(ymd(2024, 4, 1)));
        assert_eq!(parse_date_string("Apr 01 2024"), Some(ymd(2024, 4, 1)));
    }

    #[test]
    fn rejects_impossible_calendar_dates() {
        assert_eq!(parse_date_string("2023-02-29"), None);
        assert_eq!(parse_date_string("2024-02-29"), Some(ymd(2024, 2, 29)));
    }

    #[test]
    fn two_digit_years_fail() {
        assert!(parse_date_strings(&["01/04/24"]).is_err());
    }

    #[test]
    fn unparseable_batch_reports_count() {
        let err = parse_date_strings(&["2024-04-01", "yesterday", "2024-04-03"]).unwrap_err();
        assert_eq!(err, ParseError::UnparseableDates(3));
    }

    #[test]
    fn empty_batch_is_ok() {
        let empty: [&str; 0] = [];
        assert_eq!(parse_date_strings(&empty).unwrap(), Vec::<NaiveDate>::new());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(parse_date_string("  2024-04-01 "), Some(ymd(2024, 4, 1)));
    }

    // ── custom layouts ────────────────────────────────────────────────────────

    #[test]
    fn custom_layouts_are_used_in_order() {
        let dates = parse_date_strings_with(&["01.04.2024"], &["MM.dd.yyyy", "dd.MM.yyyy"]).unwrap();
        assert_eq!(dates, vec![ymd(2024, 1, 4)]);
    }

    #[test]
    fn custom_layouts_do_not_fall_back_to_defaults() {
        let err = parse_date_strings_with(&["2024-04-01"], &["dd.MM.yyyy"]).unwrap_err();
        assert_eq!(err, ParseError::UnparseableDates(1));
    }

    #[test]
    fn invalid_custom_layout_is_an_error() {
        assert!(matches!(
            parse_date_strings_with(&["01/04/24"], &["dd/MM/yy"]),
            Err(ParseError::InvalidLayout { .. })
        ));
    }

    // ── try_parse_date ────────────────────────────────────────────────────────

    #[test]
    fn try_parse_date_renders_iso() {
        assert_eq!(try_parse_date("15/01/2024").as_deref(), Some("2024-01-15"));
        assert_eq!(try_parse_date("Coffee Shop"), None);
    }
}
