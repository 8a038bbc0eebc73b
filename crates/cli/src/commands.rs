//! Command implementations. Each returns the text to print on stdout.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use txserde_core::{guess, merge_options, Confidence, FieldMapper, GuessOptions, GuessResult, Transaction};
use txserde_formats::{self as formats, CsvOptions, InspectOptions, QifHeader, QifOptions};

use crate::cli::Format;
use crate::config::Config;

/// Reads the whole input from `file`, or from stdin when there is none.
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input: {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

fn inspect_options(config: &Config, overrides: serde_json::Value) -> Result<InspectOptions> {
    merge_options(&InspectOptions::default(), &[config.inspect.clone(), overrides])
        .context("Invalid inspect options")
}

pub fn cmd_inspect(
    input: &str,
    config: &Config,
    sample_size: Option<usize>,
    parse: bool,
    skip_rows: Option<usize>,
) -> Result<String> {
    let options = inspect_options(
        config,
        json!({
            "sample_size": sample_size,
            "attempt_parsing": parse.then_some(true),
            "skip_rows": skip_rows,
        }),
    )?;
    let report = formats::inspect(input, &options);
    tracing::debug!(format = %report.format, records = report.record_count, "Inspected input");
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Inspects the input and guesses a mapping from its fields, checking values
/// against the sampled records.
fn guess_mapping(
    input: &str,
    config: &Config,
    inspect: &InspectOptions,
    min_confidence: Option<Confidence>,
) -> Result<GuessResult> {
    let report = formats::inspect(input, inspect);
    let mut options: GuessOptions = merge_options(
        &GuessOptions::default(),
        &[config.guess.clone(), json!({ "min_confidence": min_confidence })],
    )
    .context("Invalid guess options")?;
    options.sample = report.sample;
    Ok(guess(&report.fields, &options))
}

pub fn cmd_guess(
    input: &str,
    config: &Config,
    min_confidence: Option<Confidence>,
    sample: Option<usize>,
    skip_rows: Option<usize>,
) -> Result<String> {
    let inspect = inspect_options(config, json!({ "sample_size": sample, "skip_rows": skip_rows }))?;
    let result = guess_mapping(input, config, &inspect, min_confidence)?;
    Ok(serde_json::to_string_pretty(&result)?)
}

#[derive(Debug, Clone, Default)]
pub struct ConvertFlags {
    pub guess: bool,
    pub qif_header: Option<QifHeader>,
    pub skip_rows: Option<usize>,
    pub no_headers: bool,
}

pub fn cmd_convert(
    input: &str,
    config: &Config,
    from: Format,
    to: Format,
    flags: &ConvertFlags,
) -> Result<String> {
    let transactions = read_transactions(input, config, from, flags)?;

    let output = match to {
        Format::Csv => formats::csv::serialise(&transactions).context("Failed to write CSV")?,
        Format::Json => formats::json::serialise(&transactions).context("Failed to write JSON")?,
        Format::Qif => {
            let options: QifOptions = merge_options(
                &QifOptions::default(),
                &[config.qif.clone(), json!({ "header": flags.qif_header })],
            )
            .context("Invalid qif options")?;
            formats::qif::serialise(&transactions, &options)
        }
    };

    tracing::info!(count = transactions.len(), ?from, ?to, "Converted transactions");
    Ok(output)
}

fn read_transactions(
    input: &str,
    config: &Config,
    from: Format,
    flags: &ConvertFlags,
) -> Result<Vec<Transaction>> {
    match from {
        Format::Csv => {
            let defaults = CsvOptions {
                layouts: config.formats.clone(),
                ..Default::default()
            };
            let options: CsvOptions = merge_options(
                &defaults,
                &[
                    config.csv.clone(),
                    json!({
                        "skip_rows": flags.skip_rows,
                        "headers": flags.no_headers.then_some(false),
                    }),
                ],
            )
            .context("Invalid csv options")?;
            let mapper = csv_mapper(input, config, &options, flags.guess)?;
            formats::csv::deserialise_with(input, &options, &mapper).context("Failed to read CSV input")
        }
        Format::Json => formats::json::deserialise_with(input, &config.formats)
            .context("Failed to read JSON input"),
        Format::Qif => formats::qif::deserialise_with(input, &config.formats)
            .context("Failed to read QIF input"),
    }
}

/// Identity or guessed column mapping, with `[mapping]` entries on top.
fn csv_mapper(input: &str, config: &Config, options: &CsvOptions, use_guess: bool) -> Result<FieldMapper> {
    let mut mapper = if use_guess {
        let inspect = inspect_options(config, json!({ "skip_rows": options.skip_rows }))?;
        let result = guess_mapping(input, config, &inspect, None)?;
        tracing::info!(mapping = ?result.mapping, "Guessed column mapping");
        if !result.unmapped_fields.is_empty() {
            tracing::debug!(fields = ?result.unmapped_fields, "Unmapped columns");
        }
        FieldMapper::from_guess(&result)
    } else {
        FieldMapper::default()
    };

    for (key, column) in config.column_overrides()? {
        mapper = mapper.with(key, column);
    }
    Ok(mapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const BANK_CSV: &str = "Transaction Date,Amount,Merchant,Memo
15/01/2024,-12.50,Corner Cafe,Flat white
16/01/2024,1500,Acme Ltd,Salary";

    fn parse_json(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    // ── inspect ───────────────────────────────────────────────────────────────

    #[test]
    fn inspect_reports_csv() {
        let out = cmd_inspect(BANK_CSV, &Config::default(), Some(1), false, None).unwrap();
        let report = parse_json(&out);
        assert_eq!(report["format"], "csv");
        assert_eq!(report["recordCount"], 2);
        assert_eq!(report["sample"].as_array().unwrap().len(), 1);
        assert_eq!(report["sample"][0]["Amount"], "-12.50");
    }

    #[test]
    fn inspect_parse_flag() {
        let out = cmd_inspect(BANK_CSV, &Config::default(), None, true, None).unwrap();
        let report = parse_json(&out);
        assert_eq!(report["sample"][0]["Amount"], -12.5);
        assert_eq!(report["sample"][0]["Merchant"], "Corner Cafe");

        let out = cmd_inspect("Date\n15-01-2024", &Config::default(), None, true, None).unwrap();
        assert_eq!(parse_json(&out)["sample"][0]["Date"], "2024-01-15");
    }

    #[test]
    fn inspect_flags_override_config() {
        let config = Config::from_toml("[inspect]\nsample_size = 1\nattempt_parsing = true").unwrap();
        let report = parse_json(&cmd_inspect(BANK_CSV, &config, Some(2), false, None).unwrap());
        assert_eq!(report["sample"].as_array().unwrap().len(), 2);
        assert_eq!(report["sample"][1]["Amount"], 1500.0);
    }

    // ── guess ─────────────────────────────────────────────────────────────────

    #[test]
    fn guess_maps_bank_headers() {
        let out = cmd_guess(BANK_CSV, &Config::default(), None, None, None).unwrap();
        let result = parse_json(&out);
        assert_eq!(result["mapping"]["date"], "Transaction Date");
        assert_eq!(result["mapping"]["amount"], "Amount");
        assert_eq!(result["mapping"]["payee"], "Merchant");
        assert_eq!(result["mapping"]["description"], "Memo");
        assert_eq!(result["unmappedFields"], serde_json::json!([]));
    }

    #[test]
    fn guess_min_confidence() {
        let input = "Settlement Date,Amount\n2024-01-15,1";
        let out = cmd_guess(input, &Config::default(), Some(Confidence::High), Some(0), None).unwrap();
        let result = parse_json(&out);
        assert_eq!(result["unmappedFields"], serde_json::json!(["Settlement Date"]));
    }

    // ── convert ───────────────────────────────────────────────────────────────

    #[test]
    fn convert_csv_to_qif_with_guess() {
        let flags = ConvertFlags {
            guess: true,
            ..Default::default()
        };
        let out = cmd_convert(BANK_CSV, &Config::default(), Format::Csv, Format::Qif, &flags).unwrap();
        assert_eq!(
            out,
            "!Type:Bank\nD2024-01-15\nT-12.5\nPCorner Cafe\nMFlat white\n^\nD2024-01-16\nT1500\nPAcme Ltd\nMSalary\n^"
        );
    }

    #[test]
    fn convert_csv_without_guess_needs_field_names() {
        let out = cmd_convert(BANK_CSV, &Config::default(), Format::Csv, Format::Json, &ConvertFlags::default())
            .unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn convert_with_config_mapping() {
        let config = Config::from_toml(
            "[mapping]\ndate = \"Transaction Date\"\namount = \"Amount\"\npayee = \"Merchant\"",
        )
        .unwrap();
        let out = cmd_convert(BANK_CSV, &config, Format::Csv, Format::Json, &ConvertFlags::default()).unwrap();
        assert_eq!(
            out,
            r#"[{"date":"2024-01-15","amount":-12.5,"payee":"Corner Cafe"},{"date":"2024-01-16","amount":1500,"payee":"Acme Ltd"}]"#
        );
    }

    #[test]
    fn convert_mapping_overrides_guess() {
        let config = Config::from_toml("[mapping]\npayee = \"Memo\"").unwrap();
        let flags = ConvertFlags {
            guess: true,
            ..Default::default()
        };
        let out = cmd_convert(BANK_CSV, &config, Format::Csv, Format::Json, &flags).unwrap();
        assert_eq!(parse_json(&out)[0]["payee"], "Flat white");
    }

    #[test]
    fn convert_skip_rows_and_custom_layout() {
        let input = "Statement export\ndate,amount\n15.01.2024,3";
        let config = Config::from_toml("[formats]\ndate = [\"dd.MM.yyyy\"]").unwrap();
        let flags = ConvertFlags {
            skip_rows: Some(1),
            ..Default::default()
        };
        let out = cmd_convert(input, &config, Format::Csv, Format::Json, &flags).unwrap();
        assert_eq!(out, r#"[{"date":"2024-01-15","amount":3}]"#);
    }

    #[test]
    fn convert_qif_header_flag_beats_config() {
        let input = r#"[{"date":"2024-01-15","amount":-3}]"#;
        let config = Config::from_toml("[qif]\nheader = \"!Type:Cash\"").unwrap();
        let out = cmd_convert(input, &config, Format::Json, Format::Qif, &ConvertFlags::default()).unwrap();
        assert!(out.starts_with("!Type:Cash\n"));

        let flags = ConvertFlags {
            qif_header: Some(QifHeader::CreditCard),
            ..Default::default()
        };
        let out = cmd_convert(input, &config, Format::Json, Format::Qif, &flags).unwrap();
        assert_eq!(out, "!Type:CCard\nD2024-01-15\nT-3\n^");
    }

    #[test]
    fn convert_reports_input_errors() {
        let err = cmd_convert("!Type:Invst\n^", &Config::default(), Format::Qif, Format::Csv, &ConvertFlags::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read QIF input"));
    }
}
