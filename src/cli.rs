//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::ReportKind;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// cohort-stats - patient-count reports over a clinical cohort CSV
///
/// Computes the CKD stage distribution (data1) and the comorbidity
/// prevalence (data2) envelopes consumed by the dashboard charts.
///
/// Examples:
///   cohort-stats --data cohort.csv
///   cohort-stats --data cohort.csv --report data2 --pretty
///   cohort-stats --data cohort.csv --format markdown -o report.md
///   cohort-stats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Cohort CSV file to aggregate
    ///
    /// Overrides the dataset path from the config file.
    #[arg(short, long, value_name = "FILE", env = "COHORT_STATS_DATA")]
    pub data: Option<PathBuf>,

    /// Report to compute (all, stage/data1, comorbidity/data2)
    #[arg(short, long, default_value = "all", value_name = "REPORT")]
    pub report: ReportSelection,

    /// Output format (json, markdown)
    ///
    /// Defaults to the config file setting, or json.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Field delimiter of the cohort file
    ///
    /// Example: --delimiter ';'
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .cohort-stats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .cohort-stats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON envelopes (default)
    #[default]
    Json,
    /// Markdown summary tables
    Markdown,
}

/// Which reports to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportSelection {
    /// Both reports
    All,
    /// CKD stage distribution
    #[value(alias = "data1")]
    Stage,
    /// Comorbidity prevalence
    #[value(alias = "data2")]
    Comorbidity,
}

impl ReportSelection {
    /// The report kinds this selection covers, in endpoint order.
    pub fn kinds(&self) -> Vec<ReportKind> {
        match self {
            ReportSelection::All => ReportKind::ALL.to_vec(),
            ReportSelection::Stage => vec![ReportKind::Stage],
            ReportSelection::Comorbidity => vec![ReportKind::Comorbidity],
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(delimiter) = self.delimiter {
            crate::config::check_delimiter(delimiter)?;
        }

        if let Some(ref data) = self.data {
            if data.as_os_str().is_empty() {
                return Err("Dataset path must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            data: Some(PathBuf::from("cohort.csv")),
            report: ReportSelection::All,
            format: None,
            output: None,
            pretty: false,
            delimiter: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_report_aliases() {
        let args = Args::try_parse_from(["cohort-stats", "--report", "data1"]).unwrap();
        assert_eq!(args.report, ReportSelection::Stage);

        let args = Args::try_parse_from(["cohort-stats", "-r", "data2"]).unwrap();
        assert_eq!(args.report, ReportSelection::Comorbidity);

        let args = Args::try_parse_from(["cohort-stats"]).unwrap();
        assert_eq!(args.report, ReportSelection::All);
    }

    #[test]
    fn test_selection_kinds() {
        assert_eq!(
            ReportSelection::All.kinds(),
            vec![ReportKind::Stage, ReportKind::Comorbidity]
        );
        assert_eq!(ReportSelection::Comorbidity.kinds(), vec![ReportKind::Comorbidity]);
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_delimiter() {
        let mut args = make_args();
        args.delimiter = Some('\t');
        assert!(args.validate().is_ok());

        args.delimiter = Some('é');
        assert!(args.validate().is_err());

        args.delimiter = Some('"');
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_data_path() {
        let mut args = make_args();
        args.data = Some(PathBuf::new());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
