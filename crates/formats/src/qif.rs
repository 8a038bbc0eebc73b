//! Quicken Interchange Format.
//!
//! A QIF file is a header line followed by entries of single-letter field
//! lines, each entry closed by a `^` line:
//!
//! ```text
//! !Type:Bank
//! D2024-01-15
//! T-12.50
//! PCorner Cafe
//! ^
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use txserde_core::{parse_amount, ParseError, Transaction};

use crate::LayoutOptions;

const ENTRY_END: &str = "^";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QifHeader {
    #[default]
    #[serde(rename = "!Type:Bank")]
    Bank,
    #[serde(rename = "!Type:Cash")]
    Cash,
    #[serde(rename = "!Type:CCard")]
    CreditCard,
    #[serde(rename = "!Type:Oth A")]
    Assets,
    #[serde(rename = "!Type:Oth L")]
    Liabilities,
}

impl QifHeader {
    pub const ALL: [QifHeader; 5] = [
        QifHeader::Bank,
        QifHeader::Cash,
        QifHeader::CreditCard,
        QifHeader::Assets,
        QifHeader::Liabilities,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QifHeader::Bank => "!Type:Bank",
            QifHeader::Cash => "!Type:Cash",
            QifHeader::CreditCard => "!Type:CCard",
            QifHeader::Assets => "!Type:Oth A",
            QifHeader::Liabilities => "!Type:Oth L",
        }
    }

    /// Exact match against a header line as it appears in a file.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim_end();
        Self::ALL.into_iter().find(|h| h.as_str() == line)
    }
}

impl fmt::Display for QifHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QifHeader {
    type Err = String;

    /// Accepts the full header (`!Type:CCard`) or just the account type
    /// (`ccard`), ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|h| {
                let full = h.as_str();
                full.eq_ignore_ascii_case(s) || full["!Type:".len()..].eq_ignore_ascii_case(s)
            })
            .ok_or_else(|| format!("Unknown QIF header: '{s}'"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QifOptions {
    pub header: QifHeader,
}

#[derive(Error, Debug)]
pub enum QifError {
    #[error("Unknown header: '{0}'")]
    UnknownHeader(String),
    #[error("Could not parse amount: '{0}'")]
    InvalidAmount(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Default)]
struct BuildingEntry {
    date: Option<String>,
    amount: Option<f64>,
    payee: Option<String>,
    description: Option<String>,
    category: Option<String>,
    touched: bool,
}

fn finish(entry: BuildingEntry, entries: &mut Vec<(String, Transaction)>) {
    match (entry.date, entry.amount) {
        (Some(date), Some(amount)) => entries.push((
            date,
            Transaction {
                amount: Some(amount),
                payee: entry.payee,
                description: entry.description,
                category: entry.category,
                ..Default::default()
            },
        )),
        _ if entry.touched => tracing::debug!("Dropping QIF entry without date or amount"),
        _ => {}
    }
}

pub fn deserialise(input: &str) -> Result<Vec<Transaction>, QifError> {
    deserialise_with(input, &LayoutOptions::default())
}

/// Parses a QIF document. Entries missing a date or an amount are dropped;
/// unknown field indicators are ignored.
pub fn deserialise_with(input: &str, layouts: &LayoutOptions) -> Result<Vec<Transaction>, QifError> {
    let mut lines = input.trim().lines();
    let header = lines.next().unwrap_or_default();
    if QifHeader::from_line(header).is_none() {
        return Err(QifError::UnknownHeader(header.to_string()));
    }

    let mut entries: Vec<(String, Transaction)> = Vec::new();
    let mut current = BuildingEntry::default();

    for line in lines {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if line.trim_end() == ENTRY_END {
            finish(std::mem::take(&mut current), &mut entries);
            continue;
        }

        let mut chars = line.chars();
        let Some(indicator) = chars.next() else {
            continue;
        };
        let value = chars.as_str();
        current.touched = true;
        match indicator {
            'D' => current.date = Some(value.trim().to_string()),
            'T' => {
                let cleaned = value.trim().replace(',', "");
                let amount = parse_amount(&cleaned)
                    .ok_or_else(|| QifError::InvalidAmount(value.to_string()))?;
                current.amount = Some(amount);
            }
            'P' => current.payee = Some(value.to_string()),
            'M' => current.description = Some(value.to_string()),
            'L' => current.category = Some(value.to_string()),
            _ => {}
        }
    }
    finish(current, &mut entries);

    let (dates, mut transactions): (Vec<String>, Vec<Transaction>) = entries.into_iter().unzip();
    let parsed_dates = layouts.parse_dates(&dates)?;
    for (transaction, date) in transactions.iter_mut().zip(parsed_dates) {
        transaction.date = Some(date);
    }
    Ok(transactions)
}

/// Writes the header, then one entry per transaction with `D`, `T`, `P`, `L`
/// and `M` lines for the fields it has.
pub fn serialise(transactions: &[Transaction], options: &QifOptions) -> String {
    let mut output = vec![options.header.as_str().to_string()];
    for t in transactions {
        if let Some(date) = t.date {
            output.push(format!("D{}", date.format("%Y-%m-%d")));
        }
        if let Some(amount) = t.amount {
            output.push(format!("T{amount}"));
        }
        for (indicator, value) in [('P', &t.payee), ('L', &t.category), ('M', &t.description)] {
            if let Some(value) = value {
                output.push(format!("{indicator}{value}"));
            }
        }
        output.push(ENTRY_END.to_string());
    }
    output.join("\n")
}
