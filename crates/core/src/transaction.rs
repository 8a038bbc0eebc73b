use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form data carried alongside a transaction without interpretation.
pub type Metadata = Map<String, Value>;

/// A loosely-typed source row, keyed by column or property name in source order.
pub type Record = IndexMap<String, FieldValue>;

/// The normalized transaction. Every field is optional; deserialisers only
/// emit records that carry both a date and an amount.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    pub date: Option<NaiveDate>,
    /// Milliseconds since midnight (0..86_400_000).
    pub time: Option<u32>,
    pub amount: Option<f64>,
    pub payee: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub metadata: Option<Metadata>,
}

impl Transaction {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Transaction {
            date: Some(date),
            amount: Some(amount),
            ..Default::default()
        }
    }
}

/// The closed set of transaction fields the mapping machinery can target.
///
/// Declaration order is significant: the guesser walks targets in this order
/// and `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKey {
    Date,
    Time,
    Amount,
    Payee,
    Description,
    Category,
    Metadata,
}

impl TransactionKey {
    pub const ALL: [TransactionKey; 7] = [
        TransactionKey::Date,
        TransactionKey::Time,
        TransactionKey::Amount,
        TransactionKey::Payee,
        TransactionKey::Description,
        TransactionKey::Category,
        TransactionKey::Metadata,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKey::Date => "date",
            TransactionKey::Time => "time",
            TransactionKey::Amount => "amount",
            TransactionKey::Payee => "payee",
            TransactionKey::Description => "description",
            TransactionKey::Category => "category",
            TransactionKey::Metadata => "metadata",
        }
    }
}

impl fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown transaction field: '{s}'"))
    }
}

/// An all-string intermediate record, produced by a field mapper before
/// values are coerced into a [`Transaction`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionLike {
    pub date: Option<String>,
    pub time: Option<String>,
    pub amount: Option<String>,
    pub payee: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub metadata: Option<String>,
}

impl TransactionLike {
    pub fn get(&self, key: TransactionKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    pub fn set(&mut self, key: TransactionKey, value: String) {
        *self.slot_mut(key) = Some(value);
    }

    fn slot(&self, key: TransactionKey) -> &Option<String> {
        match key {
            TransactionKey::Date => &self.date,
            TransactionKey::Time => &self.time,
            TransactionKey::Amount => &self.amount,
            TransactionKey::Payee => &self.payee,
            TransactionKey::Description => &self.description,
            TransactionKey::Category => &self.category,
            TransactionKey::Metadata => &self.metadata,
        }
    }

    fn slot_mut(&mut self, key: TransactionKey) -> &mut Option<String> {
        match key {
            TransactionKey::Date => &mut self.date,
            TransactionKey::Time => &mut self.time,
            TransactionKey::Amount => &mut self.amount,
            TransactionKey::Payee => &mut self.payee,
            TransactionKey::Description => &mut self.description,
            TransactionKey::Category => &mut self.category,
            TransactionKey::Metadata => &mut self.metadata,
        }
    }
}

/// A single cell of a loosely-typed source record.
///
/// Absent values are represented by the key being missing from the [`Record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Objects and arrays, kept as raw JSON.
    Nested(Value),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// String form used when mapping a cell onto a transaction field.
    /// `None` for null; numbers use their shortest round-trip form.
    pub fn to_field_string(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Nested(v) => Some(v.to_string()),
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_f64() {
                Some(f) => FieldValue::Number(f),
                None => FieldValue::Nested(Value::Number(n)),
            },
            Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Nested(other),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}
