//! Position classification inside a resolved band.
//!
//! Given a performance value and its tier's band, decide whether performance is
//! below / in the lower third / middle / upper third / above the band.
//!
//! Bands wider than half a unit are treated as sets of discrete values (CMS
//! scores most measures on whole numbers) and split by counting values; narrow
//! bands are split as continuous intervals.

use crate::domain::{Position, ResolvedBand};
use crate::math::round_to_i64;

/// How the inside of a band is split into thirds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRegime {
    Discrete(DiscreteBounds),
    Continuous,
}

/// Inclusive integer range of achievable values inside a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscreteBounds {
    pub lower: i64,
    pub upper: i64,
    /// Values are counted in hundredths (fractional inverse top-tier bands).
    pub hundredths: bool,
}

impl DiscreteBounds {
    pub fn total_values(&self) -> i64 {
        self.upper - self.lower + 1
    }

    /// Map a performance value onto the integer scale of these bounds.
    pub fn to_scale(&self, performance: f64) -> i64 {
        if self.hundredths {
            round_to_i64(performance * 100.0)
        } else {
            round_to_i64(performance)
        }
    }
}

/// Sizes of the (lower, middle, upper) groups for `total` discrete values.
///
/// Outer groups get `total / 3` each; the remainder always lands in the middle.
pub fn discrete_group_sizes(total: i64) -> (i64, i64, i64) {
    let outer = total / 3;
    (outer, total - 2 * outer, outer)
}

/// Whether a top-tier inverse band like `<= 0.11` should be counted in hundredths.
///
/// Complaint-rate style measures never realistically reach zero, so the band
/// starts at 0.01 rather than 0.
fn is_hundredths_carve_out(band: &ResolvedBand, is_inverse: bool, is_top_tier: bool) -> bool {
    is_inverse && band.lower == 0.0 && band.range() < 1.0 && is_top_tier
}

/// Choose the splitting regime for `band`.
pub fn split_regime(band: &ResolvedBand, is_inverse: bool, is_top_tier: bool) -> SplitRegime {
    let carve_out = is_hundredths_carve_out(band, is_inverse, is_top_tier);
    if !(band.range() > 0.5 || carve_out) {
        return SplitRegime::Continuous;
    }

    // Inverse bands read "> X to <= Y": lower exclusive, upper inclusive.
    // Normal bands read ">= X to < Y": lower inclusive, upper exclusive unless assumed.
    let (lower, upper) = if is_inverse {
        if carve_out {
            (1, round_to_i64(band.upper * 100.0))
        } else if band.lower == 0.0 {
            (0, band.upper.floor() as i64)
        } else {
            (band.lower.floor() as i64 + 1, band.upper.floor() as i64)
        }
    } else {
        let upper = if band.assumed_upper_bound {
            band.upper.floor() as i64
        } else {
            band.upper.floor() as i64 - 1
        };
        (band.lower.floor() as i64, upper)
    };

    SplitRegime::Discrete(DiscreteBounds {
        lower,
        upper,
        hundredths: carve_out,
    })
}

/// Classify `performance` against `band`.
pub fn classify_position(
    performance: f64,
    band: &ResolvedBand,
    is_inverse: bool,
    is_top_tier: bool,
) -> Position {
    if band.lower == band.upper {
        return Position::ExactBand;
    }

    let range = band.range();
    if range > 0.5 && range <= 1.0 {
        let inside = if is_inverse {
            performance > band.lower && performance <= band.upper
        } else {
            performance >= band.lower && performance < band.upper
        };
        if inside {
            return Position::OneValueInside;
        }
    }

    if performance >= band.upper {
        return Position::Above;
    }
    if performance < band.lower {
        return Position::Below;
    }

    match split_regime(band, is_inverse, is_top_tier) {
        SplitRegime::Discrete(bounds) => discrete_position(performance, &bounds),
        SplitRegime::Continuous => continuous_position(performance, band),
    }
}

fn discrete_position(performance: f64, bounds: &DiscreteBounds) -> Position {
    let total = bounds.total_values();
    let value = bounds.to_scale(performance);

    if total <= 1 {
        return Position::Middle;
    }
    if total == 2 {
        return if value == bounds.lower {
            Position::LowerThird
        } else {
            Position::UpperThird
        };
    }

    let (outer, _, _) = discrete_group_sizes(total);
    let first_end = bounds.lower + outer - 1;
    let last_start = bounds.upper - outer + 1;
    if value <= first_end {
        Position::LowerThird
    } else if value >= last_start {
        Position::UpperThird
    } else {
        Position::Middle
    }
}

// Strict on both sides: a value exactly on a third boundary is Middle.
fn continuous_position(performance: f64, band: &ResolvedBand) -> Position {
    let third = band.range() / 3.0;
    if performance < band.lower + third {
        Position::LowerThird
    } else if performance > band.upper - third {
        Position::UpperThird
    } else {
        Position::Middle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(lower: f64, upper: f64) -> ResolvedBand {
        ResolvedBand {
            lower,
            upper,
            assumed_upper_bound: false,
        }
    }

    #[test]
    fn group_sizes_put_remainder_in_middle() {
        assert_eq!(discrete_group_sizes(9), (3, 3, 3));
        assert_eq!(discrete_group_sizes(8), (2, 4, 2));
        assert_eq!(discrete_group_sizes(11), (3, 5, 3));
        assert_eq!(discrete_group_sizes(7), (2, 3, 2));
        assert_eq!(discrete_group_sizes(15), (5, 5, 5));
    }

    #[test]
    fn exact_band_is_terminal() {
        assert_eq!(classify_position(100.0, &band(100.0, 100.0), false, true), Position::ExactBand);
        assert_eq!(classify_position(42.0, &band(100.0, 100.0), true, false), Position::ExactBand);
    }

    #[test]
    fn one_value_band_inclusion_depends_on_polarity() {
        // Normal "88 to <89": only 88 is inside.
        assert_eq!(classify_position(88.0, &band(88.0, 89.0), false, false), Position::OneValueInside);
        assert_eq!(classify_position(89.0, &band(88.0, 89.0), false, false), Position::Above);

        // Inverse ">9 to <=10": only 10 is inside.
        assert_eq!(classify_position(10.0, &band(9.0, 10.0), true, false), Position::OneValueInside);
        // 9 is not inside and the band holds a single inverse value (10): Middle.
        assert_eq!(classify_position(9.0, &band(9.0, 10.0), true, false), Position::Middle);
    }

    #[test]
    fn outside_band() {
        assert_eq!(classify_position(85.0, &band(76.0, 84.0), false, false), Position::Above);
        assert_eq!(classify_position(84.0, &band(76.0, 84.0), false, false), Position::Above);
        assert_eq!(classify_position(70.0, &band(76.0, 84.0), false, false), Position::Below);
        assert_eq!(classify_position(0.08, &band(0.10, 0.20), true, true), Position::Below);
    }

    #[test]
    fn discrete_normal_band_splits_by_value_count() {
        // ">= 76 to < 84" holds 76..=83 (8 values): 76-77 | 78-81 | 82-83.
        let b = band(76.0, 84.0);
        assert_eq!(split_regime(&b, false, false), SplitRegime::Discrete(DiscreteBounds {
            lower: 76,
            upper: 83,
            hundredths: false,
        }));
        assert_eq!(classify_position(76.0, &b, false, false), Position::LowerThird);
        assert_eq!(classify_position(77.0, &b, false, false), Position::LowerThird);
        assert_eq!(classify_position(78.0, &b, false, false), Position::Middle);
        assert_eq!(classify_position(81.0, &b, false, false), Position::Middle);
        assert_eq!(classify_position(82.0, &b, false, false), Position::UpperThird);
        assert_eq!(classify_position(83.0, &b, false, false), Position::UpperThird);
    }

    #[test]
    fn discrete_assumed_upper_is_inclusive() {
        let b = ResolvedBand {
            lower: 86.0,
            upper: 100.0,
            assumed_upper_bound: true,
        };
        let SplitRegime::Discrete(bounds) = split_regime(&b, false, true) else {
            panic!("expected discrete regime");
        };
        assert_eq!((bounds.lower, bounds.upper), (86, 100));
        assert_eq!(bounds.total_values(), 15);
    }

    #[test]
    fn discrete_two_value_band() {
        // Normal "88 to <90": 88 | 89.
        assert_eq!(classify_position(88.0, &band(88.0, 90.0), false, true), Position::LowerThird);
        assert_eq!(classify_position(89.0, &band(88.0, 90.0), false, true), Position::UpperThird);
        // Inverse ">10 to <=12": 11 | 12.
        assert_eq!(classify_position(11.0, &band(10.0, 12.0), true, false), Position::LowerThird);
        // The inclusive inverse upper is still caught by the `>= upper` check.
        assert_eq!(classify_position(12.0, &band(10.0, 12.0), true, false), Position::Above);
    }

    #[test]
    fn discrete_inverse_from_zero_includes_zero() {
        // Inverse "<= 8%": 0..=8 (9 values) → 0-2 | 3-5 | 6-8.
        let b = band(0.0, 8.0);
        assert_eq!(split_regime(&b, true, false), SplitRegime::Discrete(DiscreteBounds {
            lower: 0,
            upper: 8,
            hundredths: false,
        }));
        assert_eq!(classify_position(2.0, &b, true, false), Position::LowerThird);
        assert_eq!(classify_position(3.0, &b, true, false), Position::Middle);
        assert_eq!(classify_position(6.0, &b, true, false), Position::UpperThird);
    }

    #[test]
    fn top_tier_inverse_fraction_counts_hundredths() {
        // "<= 0.11" at 5 stars: 0.01..=0.11 (11 values) → 1-3 | 4-8 | 9-11.
        let b = band(0.0, 0.11);
        assert_eq!(split_regime(&b, true, true), SplitRegime::Discrete(DiscreteBounds {
            lower: 1,
            upper: 11,
            hundredths: true,
        }));
        assert_eq!(classify_position(0.03, &b, true, true), Position::LowerThird);
        assert_eq!(classify_position(0.08, &b, true, true), Position::Middle);
        assert_eq!(classify_position(0.09, &b, true, true), Position::UpperThird);

        // The same band below the top tier is continuous.
        assert_eq!(split_regime(&b, true, false), SplitRegime::Continuous);
    }

    #[test]
    fn continuous_ties_go_to_middle() {
        // [0.30, 0.60]: thirds end at 0.40 and start at 0.50.
        let b = band(0.30, 0.60);
        assert_eq!(split_regime(&b, false, false), SplitRegime::Continuous);
        assert_eq!(classify_position(0.35, &b, false, false), Position::LowerThird);
        assert_eq!(classify_position(0.55, &b, false, false), Position::UpperThird);
        assert_eq!(classify_position(0.45, &b, false, false), Position::Middle);

        // Exact boundaries with representable thirds: [0, 0.375], third = 0.125.
        let b = band(0.0, 0.375);
        assert_eq!(classify_position(0.125, &b, false, false), Position::Middle);
        assert_eq!(classify_position(0.25, &b, false, false), Position::Middle);
    }

    #[test]
    fn half_unit_band_is_continuous() {
        // Range exactly 0.5 stays continuous; thirds are 1/6 wide.
        let b = band(0.0, 0.5);
        assert_eq!(split_regime(&b, false, false), SplitRegime::Continuous);
        assert_eq!(split_regime(&b, true, false), SplitRegime::Continuous);
        assert_eq!(classify_position(0.1, &b, false, false), Position::LowerThird);
        assert_eq!(classify_position(0.5 / 3.0, &b, false, false), Position::Middle);
        assert_eq!(classify_position(0.5 - 0.5 / 3.0, &b, false, false), Position::Middle);
        assert_eq!(classify_position(0.4, &b, false, false), Position::UpperThird);
        assert_eq!(classify_position(0.5, &b, false, false), Position::Above);
    }

    #[test]
    fn just_over_half_unit_is_one_value() {
        let b = band(10.0, 10.51);
        assert!(matches!(split_regime(&b, false, false), SplitRegime::Discrete(_)));
        assert_eq!(classify_position(10.0, &b, false, false), Position::OneValueInside);
        assert_eq!(classify_position(10.3, &b, false, false), Position::OneValueInside);
        assert_eq!(classify_position(10.51, &b, false, false), Position::Above);
        assert_eq!(classify_position(10.2, &b, true, false), Position::OneValueInside);
        assert_eq!(classify_position(10.51, &b, true, false), Position::OneValueInside);
    }

    #[test]
    fn range_of_exactly_one_takes_one_value_path() {
        let normal = band(88.0, 89.0);
        assert_eq!(classify_position(88.0, &normal, false, false), Position::OneValueInside);
        assert_eq!(classify_position(88.5, &normal, false, false), Position::OneValueInside);
        assert_eq!(classify_position(89.0, &normal, false, false), Position::Above);

        let inverse = band(9.0, 10.0);
        assert_eq!(classify_position(9.5, &inverse, true, false), Position::OneValueInside);
        assert_eq!(classify_position(10.0, &inverse, true, false), Position::OneValueInside);

        // Slightly wider than one unit falls through to the discrete split.
        let wider = band(88.0, 89.01);
        assert_eq!(classify_position(88.0, &wider, false, false), Position::Middle);
    }

    #[test]
    fn single_discrete_value_is_middle() {
        // ">= 5 to < 6.5" is discrete (range 1.5) but holds only 5 once the
        // exclusive upper is applied: 5..=5.
        let b = band(5.0, 6.5);
        assert_eq!(classify_position(6.0, &b, false, false), Position::Middle);
    }
}
