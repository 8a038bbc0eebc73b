//! txserde - transaction file converter
//!
//! Usage:
//!   txserde inspect statement.csv              Show format, fields and sample rows
//!   txserde guess statement.csv                Suggest a column mapping
//!   txserde convert statement.csv --from csv --to qif --guess

mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();

    let config = Config::load(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Inspect {
            file,
            sample_size,
            parse,
            skip_rows,
        } => {
            let input = commands::read_input(file.as_deref())?;
            commands::cmd_inspect(&input, &config, sample_size, parse, skip_rows)?
        }
        Commands::Guess {
            file,
            min_confidence,
            sample,
            skip_rows,
        } => {
            let input = commands::read_input(file.as_deref())?;
            commands::cmd_guess(&input, &config, min_confidence, sample, skip_rows)?
        }
        Commands::Convert {
            file,
            from,
            to,
            guess,
            qif_header,
            skip_rows,
            no_headers,
        } => {
            let input = commands::read_input(file.as_deref())?;
            let flags = commands::ConvertFlags {
                guess,
                qif_header,
                skip_rows,
                no_headers,
            };
            commands::cmd_convert(&input, &config, from, to, &flags)?
        }
    };

    println!("{output}");
    Ok(())
}
