//! Threshold band resolution.
//!
//! Raw bounds come from the cut-point table for the measure's current tier and
//! may be open-ended (`< X` for a bottom tier, `>= X` for a top tier). The
//! classifier needs a closed interval, so open sides are filled in here.

use crate::domain::ResolvedBand;

/// Upper bound assumed for a normal-polarity `>= X` band.
pub const ASSUMED_UPPER_NORMAL: f64 = 100.0;
/// Multiplier applied to `X` to assume an upper bound for an inverse `>= X` band.
pub const ASSUMED_UPPER_INVERSE_FACTOR: f64 = 2.0;

/// Outcome of resolving a measure's raw bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandResolution {
    Resolved(ResolvedBand),
    /// Open upper bound and performance sits exactly on the lower bound:
    /// the measure barely qualified for its tier.
    AtOpenLowerBound,
    /// No upper bound is obtainable.
    Unresolvable,
}

/// Normalize raw bounds into a closed band.
///
/// Rules, in order:
/// 1. lower absent, upper present: lower is `0`
/// 2. lower present, upper absent: `performance == lower` short-circuits to
///    `AtOpenLowerBound`; otherwise upper is `lower * 2` (inverse) or `100`
/// 3. upper still absent: `Unresolvable`
pub fn resolve_band(
    lower: Option<f64>,
    upper: Option<f64>,
    is_inverse: bool,
    performance: f64,
) -> BandResolution {
    match (lower, upper) {
        (None, Some(upper)) => BandResolution::Resolved(ResolvedBand {
            lower: 0.0,
            upper,
            assumed_upper_bound: false,
        }),
        (Some(lower), None) => {
            if performance == lower {
                return BandResolution::AtOpenLowerBound;
            }
            let upper = if is_inverse {
                lower * ASSUMED_UPPER_INVERSE_FACTOR
            } else {
                ASSUMED_UPPER_NORMAL
            };
            BandResolution::Resolved(ResolvedBand {
                lower,
                upper,
                assumed_upper_bound: true,
            })
        }
        (Some(lower), Some(upper)) => BandResolution::Resolved(ResolvedBand {
            lower,
            upper,
            assumed_upper_bound: false,
        }),
        (None, None) => BandResolution::Unresolvable,
    }
}
