//! cohort-stats - patient-count reports over a clinical cohort CSV
//!
//! Loads the cohort file, computes the CKD stage (`data1`) and
//! comorbidity (`data2`) envelopes, and prints them for the dashboard.
//!
//! Exit codes:
//!   0 - Success (including reports degraded to zero by a missing file)
//!   1 - Runtime error (bad arguments, unreadable config, output failure)

mod analysis;
mod cli;
mod config;
mod dataset;
mod models;
mod report;

use analysis::Aggregator;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use dataset::{DatasetLoader, LoadOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Where the effective configuration came from.
enum ConfigSource {
    Explicit(PathBuf),
    Default,
    BuiltIn,
    Fallback(String),
}

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let (config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("cohort-stats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match source {
        ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
        ConfigSource::Default => info!("Loaded default config from {}", DEFAULT_CONFIG_FILE),
        ConfigSource::BuiltIn => debug!("No config file found, using defaults"),
        ConfigSource::Fallback(reason) => warn!("Failed to load config: {}", reason),
    }

    if let Err(e) = run(args, config) {
        error!("Report failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .cohort-stats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr; stdout carries only the report.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Compute the selected reports and emit them.
fn run(args: Args, mut config: Config) -> Result<()> {
    config.merge_with_args(&args);
    config.validate()?;

    let loader = DatasetLoader::new(LoadOptions::from(&config.dataset));
    let aggregator = Aggregator::new(loader);
    info!("Dataset: {}", aggregator.loader().path().display());

    let envelopes: Vec<_> = args
        .report
        .kinds()
        .into_iter()
        .map(|kind| {
            let envelope = report::build_envelope(&aggregator.report(kind));
            debug!("Response data ({}): {:?}", kind.envelope_name(), envelope);
            (kind, envelope)
        })
        .collect();

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&envelopes, config.report.pretty)?,
        OutputFormat::Markdown => report::generate_markdown_report(
            &envelopes,
            aggregator.loader().path(),
            Utc::now(),
        ),
    };

    match args.output {
        Some(ref path) => {
            report::write_report(&output, path)?;
            info!("Report saved to: {}", path.display());
        }
        None => println!("{}", output),
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// An explicit `--config` that cannot be read is an error; a broken
/// default file falls back to built-in settings.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::Default)),
        Ok(None) => Ok((Config::default(), ConfigSource::BuiltIn)),
        Err(e) => Ok((Config::default(), ConfigSource::Fallback(format!("{:#}", e)))),
    }
}
