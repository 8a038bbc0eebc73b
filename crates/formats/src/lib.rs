pub mod csv;
pub mod inspect;
pub mod json;
pub mod parse;
pub mod qif;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use txserde_core::{
    parse_date_strings, parse_date_strings_with, parse_time_strings, parse_time_strings_with,
    ParseError,
};

pub use crate::csv::{CsvError, CsvOptions};
pub use inspect::{inspect, InspectOptions, InspectResult};
pub use json::JsonError;
pub use parse::{
    detect_format, metadata_from_value, parse_csv, parse_json, parse_metadata, CsvParseResult,
    DataFormat, JsonParseResult,
};
pub use qif::{QifError, QifHeader, QifOptions};

/// Custom date and time layouts for the deserialisers. An empty list means
/// the built-in layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub date: Vec<String>,
    pub time: Vec<String>,
}

impl LayoutOptions {
    pub fn parse_dates(&self, values: &[String]) -> Result<Vec<NaiveDate>, ParseError> {
        if self.date.is_empty() {
            parse_date_strings(values)
        } else {
            parse_date_strings_with(values, &self.date)
        }
    }

    pub fn parse_times(&self, values: &[String]) -> Result<Vec<u32>, ParseError> {
        if self.time.is_empty() {
            parse_time_strings(values)
        } else {
            parse_time_strings_with(values, &self.time)
        }
    }
}
