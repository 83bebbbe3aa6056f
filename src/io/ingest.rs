//! CSV measure ingest and normalization.
//!
//! Turns a measure CSV (one row per measure) into validated `Measure` records.
//! Only `code` is required; metadata columns that are missing or blank are
//! filled in from the measure catalog. Every row problem is collected and the
//! load fails once with all of them (exit code 2).

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::data::{catalog, values};
use crate::domain::{FormatType, Measure};
use crate::error::AppError;
use crate::io::{RowError, get_optional, open_csv, require_columns, row_errors_to_error};
use crate::threshold::parse_threshold_band;

/// Ingest output: validated measures plus bookkeeping for logs and reports.
#[derive(Debug, Clone)]
pub struct IngestedMeasures {
    pub measures: Vec<Measure>,
    /// First non-empty `contract_id` cell, when the file carries one.
    pub contract_id: Option<String>,
    pub rows_read: usize,
    /// Catalog measures with zero weight, dropped before validation.
    pub skipped_zero_weight: Vec<String>,
}

pub fn load_measures_csv(path: &Path) -> Result<IngestedMeasures, AppError> {
    let (mut reader, header_map) = open_csv(path)?;
    require_columns(path, &header_map, &["code"])?;

    let mut measures: Vec<Measure> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut errors = Vec::new();
    let mut skipped_zero_weight = Vec::new();
    let mut contract_id = None;
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                errors.push(RowError {
                    line,
                    code: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if contract_id.is_none() {
            contract_id = get_optional(&record, &header_map, "contract_id").map(str::to_string);
        }

        let measure = match parse_row(&record, &header_map) {
            Ok(RowOutcome::Measure(m)) => m,
            Ok(RowOutcome::ZeroWeight(code)) => {
                debug!(%code, line, "skipping zero-weight catalog measure");
                skipped_zero_weight.push(code);
                continue;
            }
            Err((code, message)) => {
                errors.push(RowError { line, code, message });
                continue;
            }
        };

        if let Err(message) = measure.validate() {
            errors.push(RowError {
                line,
                code: Some(measure.code.clone()),
                message,
            });
            continue;
        }
        if let Some(first) = seen.insert(measure.code.clone(), line) {
            errors.push(RowError {
                line,
                code: Some(measure.code.clone()),
                message: format!("duplicate measure code (first seen on line {first})"),
            });
            continue;
        }
        measures.push(measure);
    }

    if !errors.is_empty() {
        return Err(row_errors_to_error("measure CSV", path, &errors));
    }
    if measures.is_empty() {
        return Err(AppError::no_data(format!(
            "No measures found in '{}'.",
            path.display()
        )));
    }

    info!(
        path = %path.display(),
        rows = rows_read,
        measures = measures.len(),
        skipped = skipped_zero_weight.len(),
        "loaded measure CSV"
    );

    Ok(IngestedMeasures {
        measures,
        contract_id,
        rows_read,
        skipped_zero_weight,
    })
}

enum RowOutcome {
    Measure(Measure),
    ZeroWeight(String),
}

type RowResult = Result<RowOutcome, (Option<String>, String)>;

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> RowResult {
    let field = |name: &str| get_optional(record, header_map, name);

    let code = field("code")
        .map(|c| c.to_ascii_uppercase())
        .ok_or((None, "missing code".to_string()))?;
    let fail = |message: String| (Some(code.clone()), message);
    let spec = catalog::lookup(&code);

    let weight = match field("weight") {
        Some(raw) => parse_f64(raw).map_err(|e| fail(format!("weight: {e}")))?,
        None => match spec {
            Some(spec) if spec.weight == 0.0 => return Ok(RowOutcome::ZeroWeight(code)),
            Some(spec) => spec.weight,
            None => return Err(fail("weight missing and measure is not in the catalog".to_string())),
        },
    };

    let format_type = match field("format_type") {
        Some(raw) => FormatType::parse(raw).ok_or_else(|| fail(format!("unknown format_type '{raw}'")))?,
        None => spec.map(|s| s.format_type).unwrap_or(FormatType::Percentage),
    };

    let is_inverse = match field("is_inverse") {
        Some(raw) => parse_bool(raw).ok_or_else(|| fail(format!("is_inverse: expected true/false, got '{raw}'")))?,
        None => spec.map(|s| s.is_inverse).unwrap_or(false),
    };

    let star_rating = match field("star_rating").or_else(|| field("star")) {
        Some(raw) => values::parse_star(raw).map_err(fail)?,
        None => None,
    };

    let performance_cell = field("performance");
    let performance = performance_cell.and_then(|raw| values::parse_performance(raw, format_type));
    let no_value = performance_cell.and_then(values::special_value);

    let mut threshold_lower = match field("threshold_lower") {
        Some(raw) => Some(parse_f64(raw).map_err(|e| fail(format!("threshold_lower: {e}")))?),
        None => None,
    };
    let mut threshold_upper = match field("threshold_upper") {
        Some(raw) => Some(parse_f64(raw).map_err(|e| fail(format!("threshold_upper: {e}")))?),
        None => None,
    };
    let band_label = field("threshold").map(str::to_string);
    if threshold_lower.is_none() && threshold_upper.is_none() {
        if let Some(raw) = &band_label {
            let band = parse_threshold_band(raw).map_err(|e| fail(e.message().to_string()))?;
            threshold_lower = band.lower;
            threshold_upper = band.upper;
        }
    }

    let name = field("name")
        .map(str::to_string)
        .or_else(|| spec.map(|s| s.name.to_string()))
        .unwrap_or_default();
    let domain = field("domain")
        .map(str::to_string)
        .or_else(|| spec.map(|s| s.domain.to_string()));

    Ok(RowOutcome::Measure(Measure {
        code,
        name,
        weight,
        star_rating,
        performance,
        threshold_lower,
        threshold_upper,
        is_inverse,
        format_type,
        band_label,
        domain,
        no_value,
    }))
}

fn parse_f64(raw: &str) -> Result<f64, String> {
    let v = raw
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("'{raw}' is not a finite number"))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::SpecialValue;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn fills_metadata_from_catalog() {
        let file = write_csv(
            "\u{feff}Code,Star_Rating,Performance,Threshold_Lower,Threshold_Upper\n\
             C01,3,80%,76,84\n\
             C18,2,11,10,12\n\
             C30,4,Medicare shows only a Star Rating for this topic,,\n",
        );
        let ingested = load_measures_csv(file.path()).unwrap();
        assert_eq!(ingested.rows_read, 3);
        assert_eq!(ingested.measures.len(), 3);

        let c18 = &ingested.measures[1];
        assert!(c18.is_inverse);
        assert_eq!(c18.weight, 3.0);
        assert_eq!(c18.performance, Some(11.0));
        assert_eq!(c18.domain.as_deref(), Some("HD2"));

        let c30 = &ingested.measures[2];
        assert_eq!(c30.format_type, FormatType::NoNumeric);
        assert_eq!(c30.performance, None);
        assert_eq!(c30.star_rating, Some(4));
        assert_eq!(c30.no_value, Some(SpecialValue::StarOnly));
        assert_eq!(ingested.measures[0].no_value, None);
    }

    #[test]
    fn threshold_string_supplies_bounds() {
        let file = write_csv(
            "code,star,performance,threshold,contract_id\n\
             C01,5,90,\">= 84 %\",H1234\n\
             C28,3,0.5,\"> 0.32 to <= 0.63\",\n",
        );
        let ingested = load_measures_csv(file.path()).unwrap();
        assert_eq!(ingested.contract_id.as_deref(), Some("H1234"));

        let c01 = &ingested.measures[0];
        assert_eq!((c01.threshold_lower, c01.threshold_upper), (Some(84.0), None));
        assert_eq!(c01.band_label.as_deref(), Some(">= 84 %"));

        let c28 = &ingested.measures[1];
        assert_eq!((c28.threshold_lower, c28.threshold_upper), (Some(0.32), Some(0.63)));
    }

    #[test]
    fn zero_weight_catalog_measures_are_skipped() {
        let file = write_csv("code,star,performance\nD02,4,0.2\nD04,3,\n");
        let ingested = load_measures_csv(file.path()).unwrap();
        assert_eq!(ingested.skipped_zero_weight, vec!["D02".to_string()]);
        assert_eq!(ingested.measures.len(), 1);
        assert_eq!(ingested.measures[0].code, "D04");
    }

    #[test]
    fn collects_every_row_error() {
        let file = write_csv(
            "code,weight,star_rating,threshold_lower,threshold_upper,format_type\n\
             C01,0,3,76,84,\n\
             C02,1,4.5,70,80,\n\
             C03,1,3,80,70,\n\
             C04,1,3,70,80,RATIO\n\
             X99,,3,70,80,\n\
             C05,1,3,70,80,\n\
             C05,1,3,70,80,\n",
        );
        let err = load_measures_csv(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        let msg = err.message();
        for needle in [
            "line 2 (C01)",
            "line 3 (C02): star rating must be 1-5 (got 4.5)",
            "line 4 (C03)",
            "line 5 (C04)",
            "line 6 (X99)",
            "line 8 (C05): duplicate",
        ] {
            assert!(msg.contains(needle), "missing '{needle}' in:\n{msg}");
        }
    }

    #[test]
    fn missing_code_column_and_empty_files() {
        let file = write_csv("measure,star\nC01,3\n");
        let err = load_measures_csv(file.path()).unwrap_err();
        assert!(err.message().contains("code"));

        let file = write_csv("code,star\n");
        let err = load_measures_csv(file.path()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_NO_DATA);
    }

    #[test]
    fn zero_performance_is_kept() {
        let file = write_csv("code,performance,threshold_upper\nC29,0,5\n");
        let ingested = load_measures_csv(file.path()).unwrap();
        assert_eq!(ingested.measures[0].performance, Some(0.0));
    }
}
