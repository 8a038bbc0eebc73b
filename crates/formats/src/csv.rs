use std::string::FromUtf8Error;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use txserde_core::{
    format_time_string, parse_amount, FieldMapper, ParseError, Transaction, TransactionLike,
};

use crate::parse::{parse_csv, parse_metadata};
use crate::LayoutOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Whether the first row names the columns.
    pub headers: bool,
    /// Lines to drop before the header row.
    pub skip_rows: usize,
    pub layouts: LayoutOptions,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            headers: true,
            skip_rows: 0,
            layouts: LayoutOptions::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("Invalid CSV data: {0}")]
    InvalidData(String),
    #[error("Could not parse amount: '{0}'")]
    InvalidAmount(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Output is not UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Deserialises CSV whose columns are named after transaction fields.
pub fn deserialise(input: &str) -> Result<Vec<Transaction>, CsvError> {
    deserialise_with(input, &CsvOptions::default(), &FieldMapper::default())
}

/// Deserialises CSV, mapping each row through `mapper`.
///
/// Rows without a date or an amount are skipped. An amount that is present but
/// not numeric fails the whole input, as does a date or time column that no
/// single layout can read.
pub fn deserialise_with(
    input: &str,
    options: &CsvOptions,
    mapper: &FieldMapper,
) -> Result<Vec<Transaction>, CsvError> {
    let parsed = parse_csv(input, options.headers, options.skip_rows);
    if !parsed.errors.is_empty() {
        tracing::debug!(errors = ?parsed.errors, "CSV tokenizer reported problems");
        if parsed.data.is_empty() {
            return Err(CsvError::InvalidData(parsed.errors.join("; ")));
        }
    }

    let mut transactions = Vec::new();
    let mut dates = Vec::new();
    let mut times: Vec<(usize, String)> = Vec::new();

    for (row, record) in parsed.data.iter().enumerate() {
        let TransactionLike {
            date,
            time,
            amount,
            payee,
            description,
            category,
            metadata,
        } = mapper.map(record);

        let (Some(date), Some(amount)) = (date, amount) else {
            tracing::debug!(row, "Skipping row without date or amount");
            continue;
        };

        let amount = parse_amount(&amount).ok_or(CsvError::InvalidAmount(amount))?;

        let metadata = metadata.and_then(|text| {
            let parsed = parse_metadata(&text);
            if parsed.is_none() {
                tracing::debug!(row, "Dropping metadata that is not a JSON object");
            }
            parsed
        });

        if let Some(time) = time {
            times.push((transactions.len(), time));
        }
        dates.push(date);
        transactions.push(Transaction {
            date: None,
            time: None,
            amount: Some(amount),
            payee,
            description,
            category,
            metadata,
        });
    }

    let parsed_dates = options.layouts.parse_dates(&dates)?;
    for (transaction, date) in transactions.iter_mut().zip(parsed_dates) {
        transaction.date = Some(date);
    }

    if !times.is_empty() {
        let (indices, values): (Vec<usize>, Vec<String>) = times.into_iter().unzip();
        let parsed_times = options.layouts.parse_times(&values)?;
        for (index, time) in indices.into_iter().zip(parsed_times) {
            transactions[index].time = Some(time);
        }
    }

    Ok(transactions)
}

const COLUMNS: [&str; 7] = ["date", "amount", "payee", "description", "category", "time", "metadata"];

/// Serialises transactions to CSV with a header row.
///
/// Undated transactions are skipped. Only columns that some written row
/// carries are emitted, in a fixed order. Every cell is quoted except those
/// of the `amount` column, header included.
pub fn serialise(transactions: &[Transaction]) -> Result<String, CsvError> {
    let dated: Vec<&Transaction> = transactions.iter().filter(|t| t.date.is_some()).collect();

    let cells = |t: &Transaction| -> [Option<String>; 7] {
        [
            t.date.map(|d| d.format("%Y-%m-%d").to_string()),
            t.amount.map(|a| a.to_string()),
            t.payee.clone(),
            t.description.clone(),
            t.category.clone(),
            t.time.map(format_time_string),
            t.metadata
                .as_ref()
                .map(|m| serde_json::Value::Object(m.clone()).to_string()),
        ]
    };
    let rows: Vec<[Option<String>; 7]> = dated.iter().map(|&t| cells(t)).collect();

    let present: Vec<usize> = (0..COLUMNS.len())
        .filter(|&i| rows.iter().any(|row| row[i].is_some()))
        .collect();

    let encode = |column: usize, cell: &str| -> Result<String, CsvError> {
        if COLUMNS[column] == AMOUNT_COLUMN {
            Ok(cell.to_string())
        } else {
            quoted(cell)
        }
    };

    // Cells arrive already encoded, so the row writer must not quote again.
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let header = present
        .iter()
        .map(|&i| encode(i, COLUMNS[i]))
        .collect::<Result<Vec<_>, _>>()?;
    writer.write_record(&header)?;
    for row in &rows {
        let record = present
            .iter()
            .map(|&i| encode(i, row[i].as_deref().unwrap_or_default()))
            .collect::<Result<Vec<_>, _>>()?;
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let mut output = String::from_utf8(bytes)?;
    if output.ends_with('\n') {
        output.pop();
    }
    Ok(output)
}

const AMOUNT_COLUMN: &str = "amount";

/// One field, always quoted, with embedded quotes doubled.
fn quoted(value: &str) -> Result<String, CsvError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_field(value)?;
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
