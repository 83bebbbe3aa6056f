//! Command-line parsing for the `stars` measure risk analyzer.
//!
//! Argument parsing and command dispatch stay separate from the classification
//! and aggregation code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::FormatType;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "stars", version, about = "Medicare Advantage star measure risk analyzer")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `STARS_LOG` overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify every measure of a contract and print the full report.
    Report(ReportArgs),
    /// Print one `code status gap` line per measure (useful for scripting).
    Status(ReportArgs),
    /// Parse a single cut-point string and show how it is read.
    Band(BandArgs),
}

/// Where measures come from, plus what-if and export options.
#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Measure CSV (one row per measure; `code` column required).
    #[arg(short = 'f', long, value_name = "CSV", conflicts_with = "json")]
    pub file: Option<PathBuf>,

    /// Contract JSON file (as written by `--export-json`).
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,

    /// Contract id. Without a file, the contract is fetched from the measure service.
    #[arg(short = 'c', long)]
    pub contract: Option<String>,

    /// Measure service base URL (default: `STARS_API_URL` or http://localhost:8000).
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Hypothetical performance, e.g. `--what-if C01=85`. Repeatable; `0` clears.
    #[arg(short = 'w', long = "what-if", value_name = "CODE=VALUE", value_parser = parse_what_if)]
    pub what_if: Vec<(String, f64)>,

    /// Local cut-point CSV: fills missing current bands and resolves what-ifs
    /// instead of the measure service.
    #[arg(long, value_name = "CSV")]
    pub cut_points: Option<PathBuf>,

    /// Overall Final Adjustment Category; adds CAI-adjusted averages to the headline.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub fac: Option<u8>,

    /// Per-contract FAC CSV (`contract_id`, `part_c_fac`, `part_d_mapd_fac`,
    /// `part_d_pdp_fac`, `overall_fac`).
    #[arg(long = "fac-file", value_name = "CSV")]
    pub fac_file: Option<PathBuf>,

    /// Export per-measure classification to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the contract, what-if map, and headline to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for `stars band`.
#[derive(Debug, Args)]
pub struct BandArgs {
    /// Cut-point string, e.g. ">= 71 % to < 76 %".
    pub threshold: String,

    /// How values are rendered.
    #[arg(long, value_enum, default_value_t = FormatType::Percentage)]
    pub format: FormatType,
}

/// Parse `CODE=VALUE`.
pub fn parse_what_if(raw: &str) -> Result<(String, f64), String> {
    let (code, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=VALUE, got '{raw}'"))?;
    let code = code.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Err(format!("missing measure code in '{raw}'"));
    }
    let value: f64 = value
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    if !value.is_finite() {
        return Err(format!("'{}' is not a finite number", value));
    }
    Ok((code, value))
}
