//! Per-measure classification.
//!
//! Flow for one measure:
//! band resolution (`threshold::resolve_band`) → position (`position`) →
//! status (`status`), with the gap to the next tier computed independently (`gap`).
//!
//! Missing data never errors: it degrades to `RiskStatus::NotApplicable`.

pub mod gap;
pub mod position;
pub mod status;

use serde::Serialize;

use crate::domain::{Measure, Position, ResolvedBand, RiskStatus};
use crate::threshold::{BandResolution, resolve_band};

pub use gap::{GapToNext, gap_to_next};
pub use position::{DiscreteBounds, SplitRegime, classify_position, discrete_group_sizes, split_regime};
pub use status::{barely_qualified_status, translate};

/// Everything the classifier derives for one measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub code: String,
    pub status: RiskStatus,
    /// `None` when classification short-circuited before a position was known.
    pub position: Option<Position>,
    pub band: Option<ResolvedBand>,
    pub gap: GapToNext,
}

/// Risk status for a single measure.
pub fn risk_status(measure: &Measure) -> RiskStatus {
    classify(measure).0
}

/// Classify one measure: status plus the intermediate band/position.
fn classify(measure: &Measure) -> (RiskStatus, Option<Position>, Option<ResolvedBand>) {
    let Some(performance) = measure.performance else {
        return (RiskStatus::NotApplicable, None, None);
    };
    let top = measure.is_top_tier();

    match resolve_band(
        measure.threshold_lower,
        measure.threshold_upper,
        measure.is_inverse,
        performance,
    ) {
        BandResolution::Unresolvable => (RiskStatus::NotApplicable, None, None),
        BandResolution::AtOpenLowerBound => {
            (barely_qualified_status(measure.is_inverse, top), None, None)
        }
        BandResolution::Resolved(band) => {
            let position = classify_position(performance, &band, measure.is_inverse, top);
            (translate(position, measure.is_inverse, top), Some(position), Some(band))
        }
    }
}

/// Full assessment of one measure.
pub fn assess(measure: &Measure) -> Assessment {
    let (status, position, band) = classify(measure);
    Assessment {
        code: measure.code.clone(),
        status,
        position,
        band,
        gap: gap_to_next(measure),
    }
}

/// Assess every measure, preserving input order.
pub fn assess_all(measures: &[Measure]) -> Vec<Assessment> {
    measures.iter().map(assess).collect()
}
