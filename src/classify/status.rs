//! Position → risk status translation.
//!
//! A "would improve" position maps to `Upside` unless the measure is already at
//! the top tier, where it collapses to `Neutral`. A "would worsen" position is
//! always `AtRisk`. Polarity decides which side of the band is which.

use crate::domain::{Position, RiskStatus};

/// Translate a classifier position into a risk status.
pub fn translate(position: Position, is_inverse: bool, is_top_tier: bool) -> RiskStatus {
    let improve = if is_top_tier {
        RiskStatus::Neutral
    } else {
        RiskStatus::Upside
    };

    match position {
        Position::Middle | Position::ExactBand | Position::OneValueInside => RiskStatus::Neutral,
        Position::Below | Position::LowerThird => {
            if is_inverse {
                improve
            } else {
                RiskStatus::AtRisk
            }
        }
        Position::UpperThird | Position::Above => {
            if is_inverse {
                RiskStatus::AtRisk
            } else {
                improve
            }
        }
    }
}

/// Status for a measure sitting exactly on the lower bound of an open-ended band.
pub fn barely_qualified_status(is_inverse: bool, is_top_tier: bool) -> RiskStatus {
    if is_inverse || is_top_tier {
        RiskStatus::AtRisk
    } else {
        RiskStatus::Upside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_POSITIONS: [Position; 7] = [
        Position::Below,
        Position::LowerThird,
        Position::Middle,
        Position::UpperThird,
        Position::Above,
        Position::ExactBand,
        Position::OneValueInside,
    ];

    #[test]
    fn normal_polarity_table() {
        assert_eq!(translate(Position::Below, false, false), RiskStatus::AtRisk);
        assert_eq!(translate(Position::LowerThird, false, true), RiskStatus::AtRisk);
        assert_eq!(translate(Position::Middle, false, false), RiskStatus::Neutral);
        assert_eq!(translate(Position::UpperThird, false, false), RiskStatus::Upside);
        assert_eq!(translate(Position::UpperThird, false, true), RiskStatus::Neutral);
        assert_eq!(translate(Position::Above, false, false), RiskStatus::Upside);
        assert_eq!(translate(Position::Above, false, true), RiskStatus::Neutral);
    }

    #[test]
    fn inverse_polarity_table() {
        assert_eq!(translate(Position::Below, true, false), RiskStatus::Upside);
        assert_eq!(translate(Position::Below, true, true), RiskStatus::Neutral);
        assert_eq!(translate(Position::LowerThird, true, false), RiskStatus::Upside);
        assert_eq!(translate(Position::UpperThird, true, true), RiskStatus::AtRisk);
        assert_eq!(translate(Position::Above, true, false), RiskStatus::AtRisk);
    }

    #[test]
    fn top_tier_never_has_upside() {
        for position in ALL_POSITIONS {
            for inverse in [false, true] {
                assert_ne!(translate(position, inverse, true), RiskStatus::Upside, "{position:?}");
            }
        }
        for inverse in [false, true] {
            assert_ne!(barely_qualified_status(inverse, true), RiskStatus::Upside);
        }
    }

    #[test]
    fn on_target_positions_are_neutral() {
        for position in [Position::ExactBand, Position::OneValueInside, Position::Middle] {
            for inverse in [false, true] {
                for top in [false, true] {
                    assert_eq!(translate(position, inverse, top), RiskStatus::Neutral);
                }
            }
        }
    }

    #[test]
    fn barely_qualified_cases() {
        assert_eq!(barely_qualified_status(false, true), RiskStatus::AtRisk);
        assert_eq!(barely_qualified_status(false, false), RiskStatus::Upside);
        assert_eq!(barely_qualified_status(true, false), RiskStatus::AtRisk);
        assert_eq!(barely_qualified_status(true, true), RiskStatus::AtRisk);
    }
}
