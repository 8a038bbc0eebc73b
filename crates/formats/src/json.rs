use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use txserde_core::{format_time_string, parse_amount, Metadata, ParseError, Transaction};

use crate::parse::metadata_from_value;
use crate::LayoutOptions;

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Input is not valid JSON: {0}")]
    NotJson(String),
    #[error("Input is not an array")]
    NotArray,
    #[error("Could not parse amount: '{0}'")]
    InvalidAmount(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Deserialises a JSON array of transaction objects.
pub fn deserialise(input: &str) -> Result<Vec<Transaction>, JsonError> {
    deserialise_with(input, &LayoutOptions::default())
}

/// Elements that are not objects, or lack a non-empty string `date` or an
/// `amount` that is a number or non-empty string, are skipped.
pub fn deserialise_with(input: &str, layouts: &LayoutOptions) -> Result<Vec<Transaction>, JsonError> {
    let parsed: Value =
        serde_json::from_str(input).map_err(|e| JsonError::NotJson(e.to_string()))?;
    let Value::Array(items) = parsed else {
        return Err(JsonError::NotArray);
    };

    let mut transactions = Vec::new();
    let mut dates = Vec::new();
    let mut times: Vec<(usize, String)> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            tracing::debug!(index, "Skipping non-object element");
            continue;
        };
        let Some(date) = non_empty_str(object, "date") else {
            tracing::debug!(index, "Skipping element without date");
            continue;
        };
        let amount = match object.get("amount") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) if !s.is_empty() => {
                Some(parse_amount(s).ok_or_else(|| JsonError::InvalidAmount(s.clone()))?)
            }
            _ => None,
        };
        let Some(amount) = amount else {
            tracing::debug!(index, "Skipping element without amount");
            continue;
        };

        if let Some(time) = non_empty_str(object, "time") {
            times.push((transactions.len(), time.to_string()));
        }
        dates.push(date.to_string());
        transactions.push(Transaction {
            date: None,
            time: None,
            amount: Some(amount),
            payee: text_field(object, "payee"),
            description: text_field(object, "description"),
            category: text_field(object, "category"),
            metadata: object.get("metadata").and_then(metadata_from_value),
        });
    }

    let parsed_dates = layouts.parse_dates(&dates)?;
    for (transaction, date) in transactions.iter_mut().zip(parsed_dates) {
        transaction.date = Some(date);
    }

    if !times.is_empty() {
        let (indices, values): (Vec<usize>, Vec<String>) = times.into_iter().unzip();
        let parsed_times = layouts.parse_times(&values)?;
        for (index, time) in indices.into_iter().zip(parsed_times) {
            transactions[index].time = Some(time);
        }
    }

    Ok(transactions)
}

fn non_empty_str<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

#[derive(Serialize)]
struct JsonTransaction<'a> {
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_amount")]
    amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payee: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a Metadata>,
}

/// Whole amounts are written as integers (`-100`, not `-100.0`).
fn serialize_amount<S: Serializer>(amount: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    match *amount {
        Some(a) if a.fract() == 0.0 && a.abs() < MAX_EXACT => serializer.serialize_i64(a as i64),
        Some(a) => serializer.serialize_f64(a),
        None => serializer.serialize_none(),
    }
}

/// Serialises transactions to a compact JSON array. Undated transactions are
/// skipped.
pub fn serialise(transactions: &[Transaction]) -> Result<String, JsonError> {
    let rows: Vec<JsonTransaction<'_>> = transactions
        .iter()
        .filter_map(|t| {
            Some(JsonTransaction {
                date: t.date?.format("%Y-%m-%d").to_string(),
                time: t.time.map(format_time_string),
                amount: t.amount,
                payee: t.payee.as_deref(),
                description: t.description.as_deref(),
                category: t.category.as_deref(),
                metadata: t.metadata.as_ref(),
            })
        })
        .collect();
    Ok(serde_json::to_string(&rows)?)
}
