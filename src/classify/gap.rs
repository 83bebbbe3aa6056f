//! Distance from current performance to the next scoring tier.

use std::fmt;

use serde::Serialize;

use crate::domain::{FormatType, Measure};
use crate::math::to_fixed;

/// Gap to the next tier, before or after formatting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GapToNext {
    /// Top tier; nothing left to gain.
    AlreadyAtMaximum,
    /// No performance or no upper bound to measure against.
    NotApplicable,
    /// Performance already meets or passes the upper bound.
    AtThreshold,
    Distance { gap: f64, format_type: FormatType },
}

impl fmt::Display for GapToNext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GapToNext::AlreadyAtMaximum => write!(f, "Already at max"),
            GapToNext::NotApplicable => write!(f, "N/A"),
            GapToNext::AtThreshold => write!(f, "At threshold"),
            GapToNext::Distance { gap, format_type } => match format_type {
                FormatType::Percentage => write!(f, "{}%", to_fixed(gap, 1)),
                FormatType::Integer => write!(f, "{}", gap.trunc() as i64),
                FormatType::Decimal => write!(f, "{}", to_fixed(gap, 2)),
                FormatType::NoNumeric => write!(f, "{}", to_fixed(gap, 1)),
            },
        }
    }
}

/// Compute the gap for `measure` against its given upper bound.
///
/// Assumed upper bounds (open `>= X` bands) are not tier cutoffs, so only the
/// upper bound supplied with the measure is used.
pub fn gap_to_next(measure: &Measure) -> GapToNext {
    if measure.is_top_tier() {
        return GapToNext::AlreadyAtMaximum;
    }
    let (Some(performance), Some(upper)) = (measure.performance, measure.threshold_upper) else {
        return GapToNext::NotApplicable;
    };

    let gap = upper - performance;
    if gap <= 0.0 {
        return GapToNext::AtThreshold;
    }
    GapToNext::Distance {
        gap,
        format_type: measure.format_type,
    }
}
