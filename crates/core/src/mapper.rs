use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::guess::GuessResult;
use crate::transaction::{FieldValue, Record, TransactionKey, TransactionLike};

/// Computes a field from the whole source record. Returning `None` leaves the
/// field unset.
pub type Transform = Arc<dyn Fn(&Record) -> Option<String> + Send + Sync>;

/// Where a transaction field comes from.
#[derive(Clone)]
pub enum FieldSource {
    Column(String),
    Transform(Transform),
}

impl FieldSource {
    pub fn column(name: impl Into<String>) -> Self {
        FieldSource::Column(name.into())
    }

    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Option<String> + Send + Sync + 'static,
    {
        FieldSource::Transform(Arc::new(f))
    }

    fn resolve(&self, record: &Record) -> Option<String> {
        match self {
            FieldSource::Column(name) => record.get(name).and_then(FieldValue::to_field_string),
            FieldSource::Transform(f) => f(record),
        }
    }
}

impl fmt::Debug for FieldSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSource::Column(name) => f.debug_tuple("Column").field(name).finish(),
            FieldSource::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

impl From<&str> for FieldSource {
    fn from(name: &str) -> Self {
        FieldSource::column(name)
    }
}

impl From<String> for FieldSource {
    fn from(name: String) -> Self {
        FieldSource::Column(name)
    }
}

pub type FieldMapping = BTreeMap<TransactionKey, FieldSource>;

/// Turns loosely-typed source records into [`TransactionLike`]s.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    mapping: FieldMapping,
}

impl Default for FieldMapper {
    /// Reads each transaction field from the column of the same name.
    fn default() -> Self {
        let mapping = TransactionKey::ALL
            .into_iter()
            .map(|key| (key, FieldSource::column(key.as_str())))
            .collect();
        FieldMapper { mapping }
    }
}

impl FieldMapper {
    pub fn new(mapping: FieldMapping) -> Self {
        FieldMapper { mapping }
    }

    /// Column mapping taken from a guesser result. Unguessed keys stay unmapped.
    pub fn from_guess(result: &GuessResult) -> Self {
        Self::from_columns(result.mapping.iter().map(|(k, v)| (*k, v.clone())))
    }

    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (TransactionKey, S)>,
        S: Into<String>,
    {
        let mapping = columns
            .into_iter()
            .map(|(key, name)| (key, FieldSource::Column(name.into())))
            .collect();
        FieldMapper { mapping }
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Replaces or adds the source for one key.
    pub fn with(mut self, key: TransactionKey, source: impl Into<FieldSource>) -> Self {
        self.mapping.insert(key, source.into());
        self
    }

    /// Maps one record. Null, missing and empty values leave the field unset.
    pub fn map(&self, record: &Record) -> TransactionLike {
        let mut like = TransactionLike::default();
        for (key, source) in &self.mapping {
            if let Some(value) = source.resolve(record).filter(|v| !v.is_empty()) {
                like.set(*key, value);
            }
        }
        like
    }
}
