//! Batch time-of-day parsing and the millisecond representation used by
//! [`Transaction::time`](crate::Transaction::time).

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::layout::{compile_all, probe, Captured, Layout, ParseError};

const MS_PER_SECOND: u32 = 1_000;
const MS_PER_MINUTE: u32 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u32 = 60 * MS_PER_MINUTE;

pub const DEFAULT_TIME_LAYOUTS: [&str; 23] = [
    // 24-hour
    "HH:mm:ss",
    "HH:mm:ss.SSS",
    "HH:mm",
    "HHmmss",
    "HHmm",
    "HH.mm.ss",
    "HH.mm",
    // 24-hour, single-digit hours allowed
    "H:mm:ss",
    "H:mm:ss.SSS",
    "H:mm",
    "H.mm.ss",
    "H.mm",
    // 12-hour
    "hh:mm:ss a",
    "hh:mm a",
    "h:mm:ss a",
    "h:mm a",
    "hh:mm:ssa",
    "hh:mma",
    "h:mm:ssa",
    "h:mma",
    "hh.mm.ss a",
    "hh.mm a",
    "h.mm a",
];

/// A time of day split into its parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeComponents {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub milliseconds: u32,
}

impl TimeComponents {
    pub fn from_ms(ms: u32) -> Self {
        TimeComponents {
            hours: ms / MS_PER_HOUR,
            minutes: ms % MS_PER_HOUR / MS_PER_MINUTE,
            seconds: ms % MS_PER_MINUTE / MS_PER_SECOND,
            milliseconds: ms % MS_PER_SECOND,
        }
    }

    pub fn to_ms(self) -> u32 {
        to_ms(self.hours, self.minutes, self.seconds, self.milliseconds)
    }
}

/// Milliseconds since midnight. Components are not range-checked.
pub fn to_ms(hours: u32, minutes: u32, seconds: u32, milliseconds: u32) -> u32 {
    hours * MS_PER_HOUR + minutes * MS_PER_MINUTE + seconds * MS_PER_SECOND + milliseconds
}

pub fn to_time_components(ms: u32) -> TimeComponents {
    TimeComponents::from_ms(ms)
}

/// Renders milliseconds since midnight as `HH:mm:ss`, dropping sub-second
/// precision.
pub fn format_time_string(ms: u32) -> String {
    let t = TimeComponents::from_ms(ms);
    format!("{:02}:{:02}:{:02}", t.hours, t.minutes, t.seconds)
}

fn compiled_defaults() -> &'static [Layout] {
    static LAYOUTS: OnceLock<Vec<Layout>> = OnceLock::new();
    LAYOUTS.get_or_init(|| {
        compile_all(&DEFAULT_TIME_LAYOUTS).expect("invalid built-in time layout")
    })
}

fn build_time(c: &Captured) -> Option<u32> {
    let mut hours = c.hour?;
    if c.twelve_hour {
        hours = match (hours, c.pm?) {
            (12, false) => 0,
            (12, true) => 12,
            (h, false) => h,
            (h, true) => h + 12,
        };
    }
    let minutes = c.minute.unwrap_or(0);
    let seconds = c.second.unwrap_or(0);
    let millis = c.millisecond.unwrap_or(0);
    if hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }
    Some(to_ms(hours, minutes, seconds, millis))
}

fn parse_with<S: AsRef<str>>(values: &[S], layouts: &[Layout]) -> Result<Vec<u32>, ParseError> {
    if values.is_empty() {
        return Ok(Vec::new());
    }
    let trimmed: Vec<&str> = values.iter().map(|v| v.as_ref().trim()).collect();
    match probe(&trimmed, layouts, build_time) {
        Some((layout, times)) => {
            tracing::debug!(layout = %layout, count = times.len(), "Accepted time layout");
            Ok(times)
        }
        None => Err(ParseError::UnparseableTimes(values.len())),
    }
}

/// Parses every value with the first default layout that fits the whole batch,
/// returning milliseconds since midnight.
pub fn parse_time_strings<S: AsRef<str>>(values: &[S]) -> Result<Vec<u32>, ParseError> {
    parse_with(values, compiled_defaults())
}

pub fn parse_time_strings_with<S, L>(values: &[S], layouts: &[L]) -> Result<Vec<u32>, ParseError>
where
    S: AsRef<str>,
    L: AsRef<str>,
{
    let layouts = compile_all(layouts)?;
    parse_with(values, &layouts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(h: u32, m: u32, s: u32) -> u32 {
        to_ms(h, m, s, 0)
    }

    // ── components ────────────────────────────────────────────────────────────

    #[test]
    fn to_ms_values() {
        assert_eq!(to_ms(0, 0, 0, 0), 0);
        assert_eq!(to_ms(1, 0, 0, 0), 3_600_000);
        assert_eq!(to_ms(0, 1, 0, 0), 60_000);
        assert_eq!(to_ms(0, 0, 1, 0), 1_000);
        assert_eq!(to_ms(0, 0, 0, 1), 1);
        assert_eq!(to_ms(14, 30, 0, 0), 52_200_000);
        assert_eq!(to_ms(23, 59, 59, 999), 86_399_999);
    }

    #[test]
    fn components_from_ms() {
        assert_eq!(
            to_time_components(52_200_000),
            TimeComponents { hours: 14, minutes: 30, seconds: 0, milliseconds: 0 }
        );
        assert_eq!(
            to_time_components(86_399_999),
            TimeComponents { hours: 23, minutes: 59, seconds: 59, milliseconds: 999 }
        );
    }

    #[test]
    fn components_roundtrip_over_the_day() {
        for ms in (0..86_400_000).step_by(7_919) {
            assert_eq!(TimeComponents::from_ms(ms).to_ms(), ms);
        }
        assert_eq!(TimeComponents::from_ms(86_399_999).to_ms(), 86_399_999);
    }

    #[test]
    fn format_time_string_pads() {
        assert_eq!(format_time_string(0), "00:00:00");
        assert_eq!(format_time_string(hms(9, 5, 3)), "09:05:03");
        assert_eq!(format_time_string(hms(23, 59, 59) + 999), "23:59:59");
    }

    // ── batch parsing ─────────────────────────────────────────────────────────

    #[test]
    fn parses_24_hour_variants() {
        let cases: [(&[&str], Vec<u32>); 5] = [
            (&["00:00:00", "18:45:15"], vec![0, hms(18, 45, 15)]),
            (&["09:15", "23:59"], vec![hms(9, 15, 0), hms(23, 59, 0)]),
            (&["091530", "235959"], vec![hms(9, 15, 30), hms(23, 59, 59)]),
            (&["0915", "1430"], vec![hms(9, 15, 0), hms(14, 30, 0)]),
            (&["09.15.30", "14.30.00"], vec![hms(9, 15, 30), hms(14, 30, 0)]),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_time_strings(input).unwrap(), expected, "input {input:?}");
        }
    }

    #[test]
    fn parses_single_digit_24_hour_times() {
        let cases: [(&[&str], Vec<u32>); 4] = [
            (&["9:15", "14:30"], vec![hms(9, 15, 0), hms(14, 30, 0)]),
            (&["9:15:30"], vec![hms(9, 15, 30)]),
            (&["9.15", "23.05"], vec![hms(9, 15, 0), hms(23, 5, 0)]),
            (&["7:05:00.125"], vec![to_ms(7, 5, 0, 125)]),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_time_strings(input).unwrap(), expected, "input {input:?}");
        }
    }

    #[test]
    fn single_digit_minutes_still_fail() {
        assert_eq!(
            parse_time_strings(&["9:5"]).unwrap_err(),
            ParseError::UnparseableTimes(1)
        );
    }

    #[test]
    fn parses_milliseconds() {
        assert_eq!(
            parse_time_strings(&["14:30:00.250"]).unwrap(),
            vec![to_ms(14, 30, 0, 250)]
        );
    }

    #[test]
    fn parses_12_hour_variants() {
        let upper = parse_time_strings(&["12:00:00 AM", "12:00:00 PM", "11:59:59 PM"]).unwrap();
        assert_eq!(upper, vec![0, hms(12, 0, 0), hms(23, 59, 59)]);

        let lower = parse_time_strings(&["01:30 am", "06:45 pm"]).unwrap();
        assert_eq!(lower, vec![hms(1, 30, 0), hms(18, 45, 0)]);

        let no_space = parse_time_strings(&["09:15:30AM", "02:30:00PM"]).unwrap();
        assert_eq!(no_space, vec![hms(9, 15, 30), hms(14, 30, 0)]);

        let single = parse_time_strings(&["1:30 AM", "1:00 PM", "11:59 PM"]).unwrap();
        assert_eq!(single, vec![hms(1, 30, 0), hms(13, 0, 0), hms(23, 59, 0)]);

        let dotted = parse_time_strings(&["2.30 p.m."]).unwrap();
        assert_eq!(dotted, vec![hms(14, 30, 0)]);
    }

    #[test]
    fn rejects_out_of_range_and_words() {
        for bad in ["25:00:00", "12:60:00", "12:00:60", "noon", "1pm", "morning"] {
            assert_eq!(
                parse_time_strings(&[bad]).unwrap_err(),
                ParseError::UnparseableTimes(1),
                "input {bad}"
            );
        }
    }

    #[test]
    fn one_bad_value_fails_the_batch() {
        let err = parse_time_strings(&["14:30:00", "noon"]).unwrap_err();
        assert_eq!(err, ParseError::UnparseableTimes(2));
    }

    // ── custom layouts ────────────────────────────────────────────────────────

    #[test]
    fn custom_layout_with_quoted_literals() {
        let times = parse_time_strings_with(&["14h30m", "09h15m"], &["HH'h'mm'm'"]).unwrap();
        assert_eq!(times, vec![hms(14, 30, 0), hms(9, 15, 0)]);
    }
}
