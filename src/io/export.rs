//! Export per-measure classification to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::classify::Assessment;
use crate::domain::{Measure, Position, RiskStatus, SpecialValue};
use crate::error::AppError;
use crate::session::Session;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    contract_id: &'a str,
    code: &'a str,
    name: &'a str,
    weight: f64,
    star_rating: Option<u8>,
    what_if_star: Option<u8>,
    performance: Option<f64>,
    no_value: Option<SpecialValue>,
    threshold_lower: Option<f64>,
    threshold_upper: Option<f64>,
    is_inverse: bool,
    status: &'static str,
    position: Option<Position>,
    band_lower: Option<f64>,
    band_upper: Option<f64>,
    assumed_upper_bound: bool,
    to_next: String,
}

fn row<'a>(session: &'a Session, measure: &'a Measure, assessment: &Assessment) -> ExportRow<'a> {
    ExportRow {
        contract_id: session.contract_id(),
        code: &measure.code,
        name: &measure.name,
        weight: measure.weight,
        star_rating: measure.star_rating,
        what_if_star: session.what_if().get(&measure.code),
        performance: measure.performance,
        no_value: measure.no_value,
        threshold_lower: measure.threshold_lower,
        threshold_upper: measure.threshold_upper,
        is_inverse: measure.is_inverse,
        status: status_label(assessment.status),
        position: assessment.position,
        band_lower: assessment.band.map(|b| b.lower),
        band_upper: assessment.band.map(|b| b.upper),
        assumed_upper_bound: assessment.band.is_some_and(|b| b.assumed_upper_bound),
        to_next: assessment.gap.to_string(),
    }
}

fn status_label(status: RiskStatus) -> &'static str {
    match status {
        RiskStatus::AtRisk => "at_risk",
        RiskStatus::Neutral => "neutral",
        RiskStatus::Upside => "upside",
        RiskStatus::NotApplicable => "not_applicable",
    }
}

/// Write one row per measure, in measure-set order.
pub fn write_assessments_csv(path: &Path, session: &Session, assessments: &[Assessment]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    for (measure, assessment) in session.measures().iter().zip(assessments) {
        writer
            .serialize(row(session, measure, assessment))
            .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to write export CSV: {e}")))?;

    info!(path = %path.display(), rows = assessments.len(), "wrote assessment CSV");
    Ok(())
}
