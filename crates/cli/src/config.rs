use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use txserde_core::TransactionKey;
use txserde_formats::LayoutOptions;

/// Settings read from `--config`. Option tables stay untyped so they can be
/// layered with `merge_options` between the defaults and command-line flags.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub csv: Value,
    pub qif: Value,
    pub inspect: Value,
    pub guess: Value,
    /// Transaction field to source column.
    pub mapping: BTreeMap<String, String>,
    pub formats: LayoutOptions,
}

impl Config {
    pub fn from_toml(toml_content: &str) -> Result<Self> {
        toml::from_str(toml_content).context("Failed to parse config TOML")
    }

    /// No path means every setting keeps its default.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn column_overrides(&self) -> Result<Vec<(TransactionKey, String)>> {
        self.mapping
            .iter()
            .map(|(key, column)| {
                let key: TransactionKey = key.parse().map_err(|e: String| anyhow::anyhow!(e))?;
                Ok((key, column.clone()))
            })
            .collect()
    }
}
