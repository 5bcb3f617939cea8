//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.cohort-stats.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".cohort-stats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Source dataset settings.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Where the cohort file lives and how to read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Path of the delimited cohort file.
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Field delimiter. Must be a single ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Raw cell spellings read as null.
    #[serde(default = "default_null_values")]
    pub null_values: Vec<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            delimiter: default_delimiter(),
            null_values: default_null_values(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("data/prospective_cohort.csv")
}

fn default_delimiter() -> char {
    ','
}

fn default_null_values() -> Vec<String> {
    vec![
        "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
        "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Pretty-print JSON envelopes.
    #[serde(default)]
    pub pretty: bool,

    /// Output format.
    #[serde(default)]
    pub format: crate::cli::OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            format: crate::cli::OutputFormat::default(),
        }
    }
}

/// Check that a character can serve as a CSV field delimiter.
pub fn check_delimiter(delimiter: char) -> std::result::Result<(), String> {
    if !delimiter.is_ascii() {
        return Err(format!(
            "Delimiter must be a single ASCII character, got '{}'",
            delimiter
        ));
    }
    if delimiter == '\n' || delimiter == '\r' || delimiter == '"' {
        return Err(format!("Delimiter {:?} is not allowed", delimiter));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.cohort-stats.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref data) = args.data {
            self.dataset.path = data.clone();
        }
        if let Some(delimiter) = args.delimiter {
            self.dataset.delimiter = delimiter;
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }

        // Flags always override
        if args.pretty {
            self.report.pretty = true;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<()> {
        if let Err(e) = check_delimiter(self.dataset.delimiter) {
            bail!(e);
        }
        if self.dataset.path.as_os_str().is_empty() {
            bail!("Dataset path must not be empty");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
