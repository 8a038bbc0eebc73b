//! A small token-based interpreter for date and time layouts.
//!
//! Layouts use the familiar pattern letters:
//!
//! | Token | Meaning |
//! |---|---|
//! | `yyyy` | four-digit year |
//! | `MM` / `M` | month, two digits / one or two digits |
//! | `MMMM` / `MMM` | month name, full / three-letter |
//! | `dd` / `d` | day of month |
//! | `HH` / `H` | hour, 0-23 |
//! | `hh` / `h` | hour, 1-12 (paired with `a`) |
//! | `mm` / `m` | minute |
//! | `ss` / `s` | second |
//! | `SSS` | millisecond |
//! | `a` | `AM`/`PM` marker, any case |
//!
//! Any other non-letter character is matched literally, and text inside single
//! quotes is literal (`''` is a quote). Doubled tokens require exactly two
//! digits. Matching is anchored at both ends and never backtracks.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Could not parse dates: no single layout fits all {0} values")]
    UnparseableDates(usize),
    #[error("Could not parse times: no single layout fits all {0} values")]
    UnparseableTimes(usize),
    #[error("Invalid layout '{layout}': {reason}")]
    InvalidLayout { layout: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Year,
    Month { padded: bool },
    MonthName { full: bool },
    Day { padded: bool },
    Hour24 { padded: bool },
    Hour12 { padded: bool },
    Minute { padded: bool },
    Second { padded: bool },
    Millisecond,
    Meridiem,
}

/// Raw components captured by a successful scan. Range checks beyond digit
/// counts are left to the date and time builders.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Captured {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub twelve_hour: bool,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    pub millisecond: Option<u32>,
    pub pm: Option<bool>,
}

/// A compiled layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    source: String,
    tokens: Vec<Token>,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Layout {
    pub fn compile(source: &str) -> Result<Layout, ParseError> {
        let invalid = |reason: String| ParseError::InvalidLayout {
            layout: source.to_string(),
            reason,
        };

        let chars: Vec<char> = source.chars().collect();
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '\'' {
                if chars.get(i + 1) == Some(&'\'') {
                    literal.push('\'');
                    i += 2;
                    continue;
                }
                let close = chars[i + 1..]
                    .iter()
                    .position(|&q| q == '\'')
                    .ok_or_else(|| invalid("unterminated quote".to_string()))?;
                literal.extend(&chars[i + 1..i + 1 + close]);
                i += close + 2;
                continue;
            }

            if !c.is_ascii_alphabetic() {
                literal.push(c);
                i += 1;
                continue;
            }

            let run = chars[i..].iter().take_while(|&&x| x == c).count();
            let token = match (c, run) {
                ('y', 4) => Token::Year,
                ('M', 1) => Token::Month { padded: false },
                ('M', 2) => Token::Month { padded: true },
                ('M', 3) => Token::MonthName { full: false },
                ('M', 4) => Token::MonthName { full: true },
                ('d', 1 | 2) => Token::Day { padded: run == 2 },
                ('H', 1 | 2) => Token::Hour24 { padded: run == 2 },
                ('h', 1 | 2) => Token::Hour12 { padded: run == 2 },
                ('m', 1 | 2) => Token::Minute { padded: run == 2 },
                ('s', 1 | 2) => Token::Second { padded: run == 2 },
                ('S', 3) => Token::Millisecond,
                ('a', 1..=3) => Token::Meridiem,
                _ => {
                    let pattern: String = std::iter::repeat(c).take(run).collect();
                    return Err(invalid(format!("unsupported token '{pattern}'")));
                }
            };

            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(token);
            i += run;
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Layout {
            source: source.to_string(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Matches the whole of `input` against this layout.
    pub(crate) fn scan(&self, input: &str) -> Option<Captured> {
        let mut rest = input;
        let mut captured = Captured::default();

        for token in &self.tokens {
            rest = match token {
                Token::Literal(lit) => rest.strip_prefix(lit.as_str())?,
                Token::Year => {
                    let (year, r) = take_digits(rest, 4, 4)?;
                    captured.year = Some(year as i32);
                    r
                }
                Token::Month { padded } => {
                    let (month, r) = take_field(rest, *padded)?;
                    captured.month = Some(month);
                    r
                }
                Token::MonthName { full } => {
                    let (month, r) = take_month_name(rest, *full)?;
                    captured.month = Some(month);
                    r
                }
                Token::Day { padded } => {
                    let (day, r) = take_field(rest, *padded)?;
                    captured.day = Some(day);
                    r
                }
                Token::Hour24 { padded } => {
                    let (hour, r) = take_field(rest, *padded)?;
                    captured.hour = Some(hour);
                    captured.twelve_hour = false;
                    r
                }
                Token::Hour12 { padded } => {
                    let (hour, r) = take_field(rest, *padded)?;
                    if !(1..=12).contains(&hour) {
                        return None;
                    }
                    captured.hour = Some(hour);
                    captured.twelve_hour = true;
                    r
                }
                Token::Minute { padded } => {
                    let (minute, r) = take_field(rest, *padded)?;
                    captured.minute = Some(minute);
                    r
                }
                Token::Second { padded } => {
                    let (second, r) = take_field(rest, *padded)?;
                    captured.second = Some(second);
                    r
                }
                Token::Millisecond => {
                    let (ms, r) = take_digits(rest, 3, 3)?;
                    captured.millisecond = Some(ms);
                    r
                }
                Token::Meridiem => {
                    let (pm, r) = take_meridiem(rest)?;
                    captured.pm = Some(pm);
                    r
                }
            };
        }

        rest.is_empty().then_some(captured)
    }
}

/// Compiles a caller-supplied layout list, failing on the first bad layout.
pub(crate) fn compile_all<S: AsRef<str>>(sources: &[S]) -> Result<Vec<Layout>, ParseError> {
    sources.iter().map(|s| Layout::compile(s.as_ref())).collect()
}

/// Tries each layout in order against the whole batch and returns the first
/// layout under which every value both scans and builds, with the results.
pub(crate) fn probe<'l, S, T>(
    values: &[S],
    layouts: &'l [Layout],
    build: impl Fn(&Captured) -> Option<T>,
) -> Option<(&'l Layout, Vec<T>)>
where
    S: AsRef<str>,
{
    layouts.iter().find_map(|layout| {
        let parsed: Option<Vec<T>> = values
            .iter()
            .map(|v| layout.scan(v.as_ref()).as_ref().and_then(&build))
            .collect();
        parsed.map(|parsed| (layout, parsed))
    })
}

fn take_digits(s: &str, min: usize, max: usize) -> Option<(u32, &str)> {
    let count = s.bytes().take(max).take_while(u8::is_ascii_digit).count();
    if count < min {
        return None;
    }
    let value = s[..count].parse().ok()?;
    Some((value, &s[count..]))
}

fn take_field(s: &str, padded: bool) -> Option<(u32, &str)> {
    if padded {
        take_digits(s, 2, 2)
    } else {
        take_digits(s, 1, 2)
    }
}

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

fn starts_with_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn take_month_name(s: &str, full: bool) -> Option<(u32, &str)> {
    let by_name = |len: Option<usize>| {
        MONTHS.iter().zip(1u32..).find_map(|(name, n)| {
            let name = len.map_or(*name, |l| &name[..l]);
            starts_with_ignore_case(s, name).map(|rest| (n, rest))
        })
    };
    if full {
        by_name(None).or_else(|| by_name(Some(3)))
    } else {
        by_name(Some(3))
    }
}

fn take_meridiem(s: &str) -> Option<(bool, &str)> {
    for (marker, pm) in [("a.m.", false), ("p.m.", true), ("am", false), ("pm", true)] {
        if let Some(rest) = starts_with_ignore_case(s, marker) {
            return Some((pm, rest));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(layout: &str, input: &str) -> Option<Captured> {
        Layout::compile(layout).unwrap().scan(input)
    }

    // ── compile ───────────────────────────────────────────────────────────────

    #[test]
    fn compile_splits_tokens_and_literals() {
        let layout = Layout::compile("yyyy-MM-dd").unwrap();
        assert_eq!(
            layout.tokens,
            vec![
                Token::Year,
                Token::Literal("-".into()),
                Token::Month { padded: true },
                Token::Literal("-".into()),
                Token::Day { padded: true },
            ]
        );
    }

    #[test]
    fn compile_quoted_literals() {
        let layout = Layout::compile("HH'h'mm'm'").unwrap();
        assert_eq!(
            layout.tokens,
            vec![
                Token::Hour24 { padded: true },
                Token::Literal("h".into()),
                Token::Minute { padded: true },
                Token::Literal("m".into()),
            ]
        );
        let quote = Layout::compile("HH''mm").unwrap();
        assert_eq!(quote.tokens[1], Token::Literal("'".into()));
    }

    #[test]
    fn compile_rejects_unknown_tokens() {
        assert!(matches!(
            Layout::compile("yy/MM/dd"),
            Err(ParseError::InvalidLayout { .. })
        ));
        assert!(matches!(
            Layout::compile("HH:mm Q"),
            Err(ParseError::InvalidLayout { .. })
        ));
        assert!(matches!(
            Layout::compile("HH'h"),
            Err(ParseError::InvalidLayout { .. })
        ));
    }

    // ── scan ──────────────────────────────────────────────────────────────────

    #[test]
    fn scan_iso_date() {
        let c = scan("yyyy-MM-dd", "2024-04-01").unwrap();
        assert_eq!((c.year, c.month, c.day), (Some(2024), Some(4), Some(1)));
    }

    #[test]
    fn scan_requires_full_match() {
        assert!(scan("yyyy-MM-dd", "2024-04-01T00:00").is_none());
        assert!(scan("yyyy-MM-dd", "2024-04").is_none());
    }

    #[test]
    fn scan_year_needs_four_digits() {
        assert!(scan("yyyy/MM/dd", "24/04/01").is_none());
        assert!(scan("d/M/yyyy", "1/4/24").is_none());
    }

    #[test]
    fn scan_padded_versus_unpadded() {
        assert!(scan("dd/MM/yyyy", "1/4/2024").is_none());
        let c = scan("d/M/yyyy", "1/4/2024").unwrap();
        assert_eq!((c.day, c.month), (Some(1), Some(4)));
        let c = scan("d/M/yyyy", "13/11/2024").unwrap();
        assert_eq!((c.day, c.month), (Some(13), Some(11)));
    }

    #[test]
    fn scan_month_names_any_case() {
        let c = scan("d MMMM yyyy", "1 april 2024").unwrap();
        assert_eq!(c.month, Some(4));
        let c = scan("dd MMM yyyy", "01 APR 2024").unwrap();
        assert_eq!(c.month, Some(4));
        let c = scan("MMMM d yyyy", "September 9 2024").unwrap();
        assert_eq!(c.month, Some(9));
        assert!(scan("dd MMM yyyy", "01 April 2024").is_none());
    }

    #[test]
    fn scan_twelve_hour_with_marker() {
        let c = scan("h:mm a", "2:30 PM").unwrap();
        assert_eq!(c.hour, Some(2));
        assert!(c.twelve_hour);
        assert_eq!(c.pm, Some(true));
        assert!(scan("h:mm a", "13:30 PM").is_none());
        assert!(scan("h:mm a", "0:30 AM").is_none());
    }

    #[test]
    fn scan_milliseconds() {
        let c = scan("HH:mm:ss.SSS", "14:30:00.250").unwrap();
        assert_eq!(c.millisecond, Some(250));
        assert!(scan("HH:mm:ss.SSS", "14:30:00.25").is_none());
    }

    #[test]
    fn scan_unicode_input_does_not_panic() {
        assert!(scan("MMM dd yyyy", "É 01 2024").is_none());
        assert!(scan("dd MMM yyyy", "01 ñov 2024").is_none());
    }

    // ── probe ─────────────────────────────────────────────────────────────────

    #[test]
    fn probe_picks_first_layout_fitting_whole_batch() {
        let layouts = compile_all(&["dd/MM/yyyy", "MM/dd/yyyy"]).unwrap();
        let days = |c: &Captured| c.day;

        let (layout, days_found) =
            probe(&["01/04/2024", "13/04/2024"], &layouts, days).unwrap();
        assert_eq!(layout.as_str(), "dd/MM/yyyy");
        assert_eq!(days_found, vec![1, 13]);

        // A month of 13 rules out the day-first layout for the whole batch.
        let (layout, _) = probe(&["04/01/2024", "04/13/2024"], &layouts, |c: &Captured| {
            (c.month? <= 12).then_some(())
        })
        .unwrap();
        assert_eq!(layout.as_str(), "MM/dd/yyyy");
    }

    #[test]
    fn probe_fails_when_no_layout_fits() {
        let layouts = compile_all(&["yyyy-MM-dd"]).unwrap();
        assert!(probe(&["2024-01-01", "nope"], &layouts, |c: &Captured| c.day).is_none());
    }
}
