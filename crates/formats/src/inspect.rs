use serde::{Deserialize, Serialize};
use txserde_core::{parse_significant_number, try_parse_date, FieldValue, Record};

use crate::parse::{detect_format, parse_csv, parse_json, DataFormat};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectOptions {
    /// Records to include in the sample.
    pub sample_size: usize,
    /// Present sampled text as numbers or ISO dates where it reads as one.
    pub attempt_parsing: bool,
    /// Lines to drop before the CSV header row.
    pub skip_rows: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            sample_size: 3,
            attempt_parsing: false,
            skip_rows: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectResult {
    pub format: DataFormat,
    pub fields: Vec<String>,
    pub sample: Vec<Record>,
    pub record_count: usize,
}

/// Describes unknown CSV or JSON input: its format, field names, a few
/// records and how many there are.
pub fn inspect(input: &str, options: &InspectOptions) -> InspectResult {
    let (format, data, fields) = match detect_format(input) {
        DataFormat::Json => match parse_json(input) {
            Ok(parsed) => (DataFormat::Json, parsed.data, parsed.fields),
            Err(e) => {
                tracing::debug!(error = %e, "JSON inspection failed, reading as CSV");
                csv_records(input, options.skip_rows)
            }
        },
        DataFormat::Csv => csv_records(input, options.skip_rows),
    };

    let record_count = data.len();
    let sample = data
        .into_iter()
        .take(options.sample_size)
        .map(|record| {
            if options.attempt_parsing {
                record
                    .into_iter()
                    .map(|(key, value)| (key, preview_value(value)))
                    .collect()
            } else {
                record
            }
        })
        .collect();

    InspectResult {
        format,
        fields,
        sample,
        record_count,
    }
}

fn csv_records(input: &str, skip_rows: usize) -> (DataFormat, Vec<Record>, Vec<String>) {
    let parsed = parse_csv(input, true, skip_rows);
    if !parsed.errors.is_empty() {
        tracing::debug!(errors = ?parsed.errors, "CSV tokenizer reported problems");
    }
    (DataFormat::Csv, parsed.data, parsed.fields)
}

/// Best-guess typed form of one sampled value: a number, else an ISO date,
/// else the value unchanged.
fn preview_value(value: FieldValue) -> FieldValue {
    let FieldValue::Text(text) = &value else {
        return value;
    };
    if let Some(n) = parse_significant_number(text) {
        FieldValue::Number(n)
    } else if let Some(iso) = try_parse_date(text) {
        FieldValue::Text(iso)
    } else {
        value
    }
}
