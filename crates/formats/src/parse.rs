//! Generic record parsing shared by inspection and the deserialisers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use txserde_core::{FieldValue, Metadata, Record};

use crate::json::JsonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Csv,
    Json,
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataFormat::Csv => "csv",
            DataFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvParseResult {
    pub data: Vec<Record>,
    /// Header names, or column indices when the input has no header row.
    pub fields: Vec<String>,
    /// Tokenizer problems. Rows are still recovered where possible.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonParseResult {
    pub data: Vec<Record>,
    /// Every key seen across all records, in first-seen order.
    pub fields: Vec<String>,
}

/// Tokenizes delimited text into records.
///
/// The input is trimmed and its first `skip_rows` lines dropped before
/// tokenizing. Rows whose width differs from the header are kept, keyed up to
/// the shorter of the two, and reported in `errors`.
pub fn parse_csv(input: &str, headers: bool, skip_rows: usize) -> CsvParseResult {
    let body = input
        .trim()
        .splitn(skip_rows.saturating_add(1), '\n')
        .nth(skip_rows)
        .unwrap_or_default();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut result = CsvParseResult::default();
    let mut rows = Vec::new();
    for (index, row) in reader.records().enumerate() {
        match row {
            Ok(row) => rows.push(row),
            Err(e) => result.errors.push(format!("Row {index}: {e}")),
        }
    }

    let mut rows = rows.into_iter();
    if headers {
        match rows.next() {
            Some(header) => result.fields = header.iter().map(str::to_string).collect(),
            None => return result,
        }
    } else {
        let widest = rows.as_slice().iter().map(|r| r.len()).max().unwrap_or(0);
        result.fields = (0..widest).map(|i| i.to_string()).collect();
    }

    for (index, row) in rows.enumerate() {
        if headers && row.len() != result.fields.len() {
            result.errors.push(format!(
                "Row {index}: expected {} fields, found {}",
                result.fields.len(),
                row.len()
            ));
        }
        let record: Record = result
            .fields
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.clone(), FieldValue::from(value)))
            .collect();
        result.data.push(record);
    }

    result
}

/// Parses JSON text into records. A lone object is treated as a one-record
/// batch and non-object elements are dropped.
pub fn parse_json(input: &str) -> Result<JsonParseResult, JsonError> {
    let parsed: Value =
        serde_json::from_str(input.trim()).map_err(|e| JsonError::NotJson(e.to_string()))?;

    let items = match parsed {
        Value::Array(items) => items,
        other => vec![other],
    };

    let mut result = JsonParseResult::default();
    for item in items {
        let Value::Object(object) = item else {
            continue;
        };
        let mut record = Record::new();
        for (key, value) in object {
            if !result.fields.contains(&key) {
                result.fields.push(key.clone());
            }
            record.insert(key, FieldValue::from(value));
        }
        result.data.push(record);
    }

    Ok(result)
}

/// JSON when the trimmed input opens like JSON and parses as JSON, CSV
/// otherwise.
pub fn detect_format(input: &str) -> DataFormat {
    let trimmed = input.trim();
    let looks_like_json = trimmed.starts_with('[') || trimmed.starts_with('{');
    if looks_like_json && serde_json::from_str::<serde::de::IgnoredAny>(trimmed).is_ok() {
        DataFormat::Json
    } else {
        DataFormat::Csv
    }
}

/// Reads metadata from JSON object text.
pub fn parse_metadata(text: &str) -> Option<Metadata> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Reads metadata from an already-parsed value: an object, or a string
/// holding JSON object text.
pub fn metadata_from_value(value: &Value) -> Option<Metadata> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(text) => parse_metadata(text),
        _ => None,
    }
}
