//! Input/output helpers.
//!
//! - measure CSV ingest + validation (`ingest`)
//! - contract JSON read/write (`contract`)
//! - assessment CSV export (`export`)

pub mod contract;
pub mod export;
pub mod ingest;

pub use contract::*;
pub use export::*;
pub use ingest::*;

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::error::AppError;

/// A row-level problem found while reading a CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub code: Option<String>,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "line {} ({code}): {}", self.line, self.message),
            None => write!(f, "line {}: {}", self.line, self.message),
        }
    }
}

/// Combine collected row errors into one input error.
pub(crate) fn row_errors_to_error(what: &str, path: &Path, errors: &[RowError]) -> AppError {
    let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
    AppError::input(format!(
        "Invalid {what} '{}':\n  {}",
        path.display(),
        lines.join("\n  ")
    ))
}

/// Open a CSV file and index its (normalized) header names.
pub(crate) fn open_csv(path: &Path) -> Result<(csv::Reader<File>, HashMap<String, usize>), AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers in '{}': {e}", path.display())))?
        .clone();

    Ok((reader, build_header_map(&headers)))
}

pub(crate) fn require_columns(
    path: &Path,
    header_map: &HashMap<String, usize>,
    names: &[&str],
) -> Result<(), AppError> {
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| !header_map.contains_key(*n))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::input(format!(
            "CSV '{}' is missing required column(s): {}",
            path.display(),
            missing.join(", ")
        )))
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase().replace([' ', '-'], "_")
}

/// Non-empty trimmed cell for `name`, if the column exists.
pub(crate) fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}
