//! CLI argument definitions using clap
//!
//! Every flag is optional so that values from `--config` show through when it
//! is not given. The command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use txserde_core::Confidence;
use txserde_formats::QifHeader;

/// txserde - Inspect, map and convert bank transaction files
#[derive(Parser)]
#[command(name = "txserde")]
#[command(about = "Convert transaction data between CSV, JSON and QIF", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with [csv], [qif], [inspect], [guess], [mapping] and [formats] tables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Report the format, fields and a sample of records
    Inspect {
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,

        /// Number of sample records
        #[arg(long)]
        sample_size: Option<usize>,

        /// Show sampled values as numbers and ISO dates where possible
        #[arg(long)]
        parse: bool,

        /// Lines to skip before the CSV header
        #[arg(long)]
        skip_rows: Option<usize>,
    },

    /// Guess which columns hold which transaction fields
    Guess {
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,

        /// Lowest confidence to report: high, medium
        #[arg(long)]
        min_confidence: Option<Confidence>,

        /// Records used to check column values
        #[arg(long)]
        sample: Option<usize>,

        /// Lines to skip before the CSV header
        #[arg(long)]
        skip_rows: Option<usize>,
    },

    /// Convert transactions from one format to another
    Convert {
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,

        #[arg(long, value_enum)]
        from: Format,

        #[arg(long, value_enum)]
        to: Format,

        /// Map CSV columns from guessed field names instead of exact names
        #[arg(long)]
        guess: bool,

        /// QIF account type for output, e.g. Bank, CCard, "Oth A"
        #[arg(long)]
        qif_header: Option<QifHeader>,

        /// Lines to skip before the CSV header
        #[arg(long)]
        skip_rows: Option<usize>,

        /// CSV input has no header row
        #[arg(long)]
        no_headers: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Csv,
    Json,
    Qif,
}
