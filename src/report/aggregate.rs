//! Weighted roll-up of per-measure stars and risk statuses.
//!
//! Everything here is recomputed from scratch on each call; callers re-invoke
//! after any change to the measures or the what-if map.

use serde::Serialize;

use crate::classify::{Assessment, assess_all};
use crate::data::catalog;
use crate::domain::{Measure, Part, RiskStatus, TOP_TIER};
use crate::math::to_fixed;
use crate::session::WhatIfState;

/// Contract-level headline metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    /// Weighted average of actual stars; `0` when no measure is rated.
    pub actual_average: f64,
    /// Weighted average with what-if stars substituted where set.
    pub hypothetical_average: f64,
    /// `Σ weight(Upside) - Σ weight(AtRisk)`.
    pub net_risk_score: f64,
    pub status_counts: StatusCounts,
    /// Actual weighted average over rated Part C measures only.
    pub part_c_average: Option<f64>,
    pub part_d_average: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub at_risk: usize,
    pub neutral: usize,
    pub upside: usize,
    pub not_applicable: usize,
}

impl StatusCounts {
    fn record(&mut self, status: RiskStatus) {
        match status {
            RiskStatus::AtRisk => self.at_risk += 1,
            RiskStatus::Neutral => self.neutral += 1,
            RiskStatus::Upside => self.upside += 1,
            RiskStatus::NotApplicable => self.not_applicable += 1,
        }
    }
}

impl Headline {
    /// `"3.45"`, or `"0.00"` when undefined.
    pub fn actual_display(&self) -> String {
        to_fixed(self.actual_average, 2)
    }

    pub fn hypothetical_display(&self) -> String {
        to_fixed(self.hypothetical_average, 2)
    }

    /// Signed with one decimal: `"+4.0"`, `"-2.5"`.
    pub fn net_risk_display(&self) -> String {
        if self.net_risk_score >= 0.0 {
            format!("+{}", to_fixed(self.net_risk_score, 1))
        } else {
            to_fixed(self.net_risk_score, 1)
        }
    }
}

/// Weighted average of `(star, weight)` pairs; `0` for an empty set.
pub fn weighted_average(pairs: impl IntoIterator<Item = (u8, f64)>) -> f64 {
    let (sum, total) = pairs
        .into_iter()
        .fold((0.0, 0.0), |(sum, total), (star, weight)| {
            (sum + f64::from(star) * weight, total + weight)
        });
    if total > 0.0 { sum / total } else { 0.0 }
}

/// Compute headline metrics, classifying each measure along the way.
pub fn summarize(measures: &[Measure], what_if: &WhatIfState) -> Headline {
    summarize_assessed(measures, &assess_all(measures), what_if)
}

/// Compute headline metrics from existing assessments (parallel to `measures`).
pub fn summarize_assessed(measures: &[Measure], assessments: &[Assessment], what_if: &WhatIfState) -> Headline {
    let rated = |part: Option<Part>| {
        measures
            .iter()
            .filter(move |m| part.is_none_or(|p| catalog::part_of(&m.code) == Some(p)))
            .filter_map(|m| m.star_rating.map(|star| (star, m.weight)))
    };
    let part_average = |part: Part| {
        let mut pairs = rated(Some(part)).peekable();
        pairs.peek().is_some().then(|| weighted_average(pairs))
    };

    let actual_average = weighted_average(rated(None));
    let hypothetical_average = weighted_average(measures.iter().filter_map(|m| {
        what_if
            .get(&m.code)
            .or(m.star_rating)
            .map(|star| (star, m.weight))
    }));

    let mut net_risk_score = 0.0;
    let mut status_counts = StatusCounts::default();
    for (m, a) in measures.iter().zip(assessments) {
        status_counts.record(a.status);
        match a.status {
            RiskStatus::AtRisk => net_risk_score -= m.weight,
            RiskStatus::Upside => net_risk_score += m.weight,
            RiskStatus::Neutral | RiskStatus::NotApplicable => {}
        }
    }

    Headline {
        actual_average,
        hypothetical_average,
        net_risk_score,
        status_counts,
        part_c_average: part_average(Part::C),
        part_d_average: part_average(Part::D),
    }
}

/// Count of measures per actual star (index 0 is 1 star).
pub fn star_distribution(measures: &[Measure]) -> [usize; TOP_TIER as usize] {
    let mut counts = [0usize; TOP_TIER as usize];
    for star in measures.iter().filter_map(|m| m.star_rating) {
        if (1..=TOP_TIER).contains(&star) {
            counts[usize::from(star - 1)] += 1;
        }
    }
    counts
}
