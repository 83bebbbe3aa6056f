//! Formatted terminal output.
//!
//! We keep formatting code in one place so the classifier and aggregator stay
//! free of presentation concerns and output changes stay localized.

use crate::classify::Assessment;
use crate::data::{catalog, values};
use crate::domain::{ContractInfo, FormatType, Measure, TOP_TIER};
use crate::math::to_fixed;
use crate::report::cai::{ContractFacs, adjust};
use crate::report::{Headline, star_distribution};
use crate::session::Session;
use crate::threshold::{BoundOp, ThresholdBand};

/// Full report: contract header, measure table by domain, stars, headline.
pub fn format_report(session: &Session, assessments: &[Assessment], headline: &Headline, facs: &ContractFacs) -> String {
    let mut out = String::new();

    out.push_str("=== stars - Star Measure Risk Report ===\n");
    out.push_str(&format_contract_header(session.info()));
    out.push('\n');

    out.push_str(&format_measure_tables(session, assessments));
    out.push('\n');

    out.push_str(&format_star_distribution(session.measures()));
    out.push('\n');

    out.push_str(&format_headline(headline, facs));
    out
}

fn format_contract_header(info: &ContractInfo) -> String {
    let mut out = String::new();
    match info.marketing_name.as_deref().or(info.contract_name.as_deref()) {
        Some(name) => out.push_str(&format!("Contract: {} - {name}\n", info.contract_id)),
        None => out.push_str(&format!("Contract: {}\n", info.contract_id)),
    }
    if let Some(org_type) = &info.org_type {
        out.push_str(&format!("Type: {org_type}\n"));
    }
    if let Some(parent) = &info.parent_org {
        out.push_str(&format!("Parent: {parent}\n"));
    }
    if info.overall_rating.is_some() || info.part_c_rating.is_some() || info.part_d_rating.is_some() {
        out.push_str(&format!(
            "Ratings: overall {} | Part C {} | Part D {}\n",
            fmt_rating(info.overall_rating),
            fmt_rating(info.part_c_rating),
            fmt_rating(info.part_d_rating),
        ));
    }
    out
}

fn fmt_rating(rating: Option<f64>) -> String {
    rating.map(|r| to_fixed(r, 1)).unwrap_or_else(|| "-".to_string())
}

/// Measures grouped by domain in catalog order; unknown domains go last.
fn format_measure_tables(session: &Session, assessments: &[Assessment]) -> String {
    let rows: Vec<(&Measure, &Assessment)> = session.measures().iter().zip(assessments).collect();
    let mut out = String::new();

    for domain in catalog::DOMAIN_ORDER {
        let group: Vec<_> = rows
            .iter()
            .filter(|(m, _)| m.domain.as_deref() == Some(domain))
            .copied()
            .collect();
        if group.is_empty() {
            continue;
        }
        let title = catalog::domain_name(domain).unwrap_or(domain);
        out.push_str(&format!("{domain}: {title}\n"));
        out.push_str(&format_table(session, &group));
        out.push('\n');
    }

    let other: Vec<_> = rows
        .iter()
        .filter(|(m, _)| {
            m.domain
                .as_deref()
                .is_none_or(|d| !catalog::DOMAIN_ORDER.contains(&d))
        })
        .copied()
        .collect();
    if !other.is_empty() {
        out.push_str("Other measures\n");
        out.push_str(&format_table(session, &other));
        out.push('\n');
    }

    out
}

fn format_table(session: &Session, rows: &[(&Measure, &Assessment)]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<5} {:<32} {:>4} {:>5} {:>8} {:<18} {:<8} {:>14} {:>7}",
            "code", "name", "wt", "stars", "perf", "band", "status", "to next", "what-if"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<5} {:-<32} {:-<4} {:-<5} {:-<8} {:-<18} {:-<8} {:-<14} {:-<7}",
            "", "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for (m, a) in rows {
        let what_if = session
            .what_if()
            .get(&m.code)
            .map(|s| s.to_string())
            .unwrap_or_default();
        out.push_str(
            format!(
                "{:<5} {:<32} {:>4} {:>5} {:>8} {:<18} {:<8} {:>14} {:>7}",
                m.code,
                truncate(display_name(m), 32),
                fmt_weight(m.weight),
                m.star_rating.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                performance_text(m),
                truncate(&band_text(m), 18),
                a.status.label(),
                a.gap.to_string(),
                what_if,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn display_name(m: &Measure) -> &str {
    if m.name.is_empty() {
        catalog::lookup(&m.code).map(|s| s.name).unwrap_or("")
    } else {
        &m.name
    }
}

fn performance_text(m: &Measure) -> String {
    match (m.performance, m.no_value) {
        (Some(v), _) => values::format_value(v, m.format_type),
        (None, Some(reason)) => reason.label().to_string(),
        (None, None) => "-".to_string(),
    }
}

fn band_text(m: &Measure) -> String {
    if let Some(label) = &m.band_label {
        return label.clone();
    }
    ThresholdBand::from_bounds(m.threshold_lower, m.threshold_upper, m.is_inverse)
        .map(|b| b.display(m.format_type))
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{}", weight as i64)
    } else {
        to_fixed(weight, 1)
    }
}

fn format_star_distribution(measures: &[Measure]) -> String {
    let counts = star_distribution(measures);
    let parts: Vec<String> = (1..=TOP_TIER)
        .rev()
        .map(|star| format!("{star}*: {}", counts[usize::from(star - 1)]))
        .collect();
    format!("Star distribution: {}\n", parts.join(" | "))
}

/// Headline block; with FACs, averages are also shown CAI-adjusted.
pub fn format_headline(headline: &Headline, facs: &ContractFacs) -> String {
    let mut out = String::new();
    let c = &headline.status_counts;

    out.push_str("Headline:\n");
    out.push_str(&format!("  Weighted average (actual):  {}\n", headline.actual_display()));
    out.push_str(&format!("  Weighted average (what-if): {}\n", headline.hypothetical_display()));
    if let Some(avg) = headline.part_c_average {
        out.push_str(&format!("  Part C average (actual):    {}\n", to_fixed(avg, 2)));
    }
    if let Some(avg) = headline.part_d_average {
        out.push_str(&format!("  Part D average (actual):    {}\n", to_fixed(avg, 2)));
    }
    out.push_str(&format!("  Net risk score:             {}\n", headline.net_risk_display()));
    out.push_str(&format!(
        "  Status: at risk {} | neutral {} | upside {} | n/a {}\n",
        c.at_risk, c.neutral, c.upside, c.not_applicable
    ));

    if let Some((fac, cai)) = facs.overall() {
        out.push_str(&format!(
            "  CAI-adjusted (FAC {fac}, CAI {cai:+.6}): actual {} | what-if {}\n",
            to_fixed(adjust(headline.actual_average, cai), 2),
            to_fixed(adjust(headline.hypothetical_average, cai), 2),
        ));
    }
    if let (Some((fac, cai)), Some(avg)) = (facs.part_c(), headline.part_c_average) {
        out.push_str(&format!(
            "  CAI-adjusted Part C (FAC {fac}, CAI {cai:+.6}): {}\n",
            to_fixed(adjust(avg, cai), 2)
        ));
    }
    if let (Some((scope, fac, cai)), Some(avg)) = (facs.part_d(), headline.part_d_average) {
        out.push_str(&format!(
            "  CAI-adjusted {} (FAC {fac}, CAI {cai:+.6}): {}\n",
            scope.label(),
            to_fixed(adjust(avg, cai), 2)
        ));
    }
    out
}

/// One `code<TAB>status<TAB>gap` line per measure, for scripting.
pub fn format_statuses(assessments: &[Assessment]) -> String {
    let mut out = String::new();
    for a in assessments {
        out.push_str(&format!("{}\t{}\t{}\n", a.code, a.status.label(), a.gap));
    }
    out
}

/// Normalized view of one parsed threshold string.
pub fn format_band(raw: &str, band: &ThresholdBand, format_type: FormatType) -> String {
    let side = |value: Option<f64>, op: Option<BoundOp>| match (value, op) {
        (Some(v), Some(op)) => format!("{} {}", op.symbol(), v),
        _ => "open".to_string(),
    };
    let mut out = String::new();
    out.push_str(&format!("input:   {}\n", raw.trim()));
    out.push_str(&format!("lower:   {}\n", side(band.lower, band.lower_op)));
    out.push_str(&format!("upper:   {}\n", side(band.upper, band.upper_op)));
    out.push_str(&format!("display: {}\n", band.display(format_type)));
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
