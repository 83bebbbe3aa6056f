//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads the measure set (CSV, contract JSON, or the measure service)
//! - resolves what-if values and classifies every measure
//! - prints reports and writes optional exports

use clap::Parser;

use crate::cli::{BandArgs, Command, ReportArgs};
use crate::domain::{AnalyzerConfig, MeasureSourceSpec};
use crate::error::AppError;
use crate::session::WhatIfOutcome;

pub mod pipeline;

/// Entry point for the `stars` binary.
pub fn run() -> Result<(), AppError> {
    // `stars -f m.csv` should behave like `stars report -f m.csv`; clap needs
    // the subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Report(args) => handle_report(args, OutputMode::Full),
        Command::Status(args) => handle_report(args, OutputMode::StatusOnly),
        Command::Band(args) => handle_band(args),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    StatusOnly,
}

fn handle_report(args: ReportArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = config_from_args(&args)?;
    let run = pipeline::run_analysis(&config)?;

    match mode {
        OutputMode::Full => {
            println!(
                "{}",
                crate::report::format::format_report(&run.session, &run.assessments, &run.headline, &run.facs)
            );
            if !run.what_ifs.is_empty() {
                println!("{}", format_what_ifs(&run.what_ifs));
            }
        }
        OutputMode::StatusOnly => {
            print!("{}", crate::report::format::format_statuses(&run.assessments));
        }
    }

    if let Some(path) = &config.export_csv {
        crate::io::write_assessments_csv(path, &run.session, &run.assessments)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_contract_json(path, &run.session, &run.headline)?;
    }

    Ok(())
}

fn format_what_ifs(reports: &[pipeline::WhatIfReport]) -> String {
    let mut out = String::from("What-if:\n");
    for r in reports {
        let outcome = match &r.outcome {
            WhatIfOutcome::Set(star) => format!("{star} stars"),
            WhatIfOutcome::Unset => "no rating".to_string(),
            WhatIfOutcome::Superseded => "superseded".to_string(),
            WhatIfOutcome::Failed(err) => format!("failed ({err})"),
        };
        out.push_str(&format!("  {} = {} -> {outcome}\n", r.code, r.value));
    }
    out
}

fn handle_band(args: BandArgs) -> Result<(), AppError> {
    let band = crate::threshold::parse_threshold_band(&args.threshold)?;
    print!("{}", crate::report::format::format_band(&args.threshold, &band, args.format));
    Ok(())
}

/// Resolve CLI flags plus environment into a run configuration.
pub fn config_from_args(args: &ReportArgs) -> Result<AnalyzerConfig, AppError> {
    let contract_id = args
        .contract
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_ascii_uppercase);

    let source = match (&args.file, &args.json, &contract_id) {
        (Some(path), _, _) => MeasureSourceSpec::Csv(path.clone()),
        (None, Some(path), _) => MeasureSourceSpec::Json(path.clone()),
        (None, None, Some(id)) => MeasureSourceSpec::Api {
            contract_id: id.clone(),
        },
        (None, None, None) => {
            return Err(AppError::input(
                "No measure source: pass --file <CSV>, --json <JSON>, or --contract <ID>.",
            ));
        }
    };

    let api_url = match &args.api_url {
        Some(url) => url.trim().trim_end_matches('/').to_string(),
        None => crate::data::client::api_url_from_env(),
    };

    Ok(AnalyzerConfig {
        source,
        contract_id,
        api_url,
        what_ifs: args.what_if.clone(),
        cut_points: args.cut_points.clone(),
        fac: args.fac,
        fac_file: args.fac_file.clone(),
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    })
}

/// Rewrite argv so bare flags default to `stars report`.
///
/// Rules:
/// - `stars`                       -> `stars report` (reports the missing source)
/// - `stars -f m.csv ...`          -> `stars report -f m.csv ...`
/// - `stars -v status ...`         -> unchanged
/// - `stars --help/--version/-h`   -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let first = argv
        .iter()
        .skip(1)
        .find(|a| !is_verbosity_flag(a))
        .cloned();

    let Some(first) = first else {
        argv.insert(1.min(argv.len()), "report".to_string());
        return argv;
    };

    let leave_as_is = matches!(
        first.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help" | "report" | "status" | "band"
    );
    if !leave_as_is {
        argv.insert(1.min(argv.len()), "report".to_string());
    }
    argv
}

fn is_verbosity_flag(arg: &str) -> bool {
    arg == "--verbose" || (arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v'))
}
