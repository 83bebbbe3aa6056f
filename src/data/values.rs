//! Raw performance / star values as they appear in CMS exports.
//!
//! Cells hold either a number in the measure's format (`"76%"`, `"87"`,
//! `"0.16"`) or one of a handful of status phrases. Status phrases parse to
//! "no value" and are categorized so reports can say why.

use crate::domain::{FormatType, SpecialValue, TOP_TIER};
use crate::math::to_fixed;

const PHRASES: [(&str, SpecialValue); 9] = [
    ("Plan too small to be measured", SpecialValue::InsufficientSample),
    ("Plan too new to be measured", SpecialValue::HoldHarmless),
    ("Not enough data available", SpecialValue::InsufficientData),
    ("Plan not required to report measure", SpecialValue::NotRequired),
    ("No data available", SpecialValue::MissingData),
    ("Medicare shows only a Star Rating for this topic", SpecialValue::StarOnly),
    ("CMS identified issues with this plan's data", SpecialValue::DataQualityIssue),
    ("Benefit not offered by plan", SpecialValue::NotOffered),
    ("Not required to report", SpecialValue::NotRequired),
];

/// Status category of a raw cell, or `None` when the cell may be numeric.
///
/// Blank cells count as `MissingData`.
pub fn special_value(raw: &str) -> Option<SpecialValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(SpecialValue::MissingData);
    }
    PHRASES
        .iter()
        .find(|(phrase, _)| raw.contains(phrase))
        .map(|(_, category)| *category)
}

/// Parse a performance cell according to the measure's format.
///
/// Returns `None` for status phrases, star-only measures, and anything that
/// does not read as a number. A trailing `%` is optional for percentages.
pub fn parse_performance(raw: &str, format_type: FormatType) -> Option<f64> {
    if special_value(raw).is_some() {
        return None;
    }
    let raw = raw.trim();
    let value = match format_type {
        FormatType::Percentage => raw.strip_suffix('%').unwrap_or(raw).trim().parse::<f64>().ok()?,
        FormatType::Integer => {
            if raw.contains('%') {
                return None;
            }
            let v = raw.parse::<f64>().ok()?;
            if v.fract() != 0.0 {
                return None;
            }
            v
        }
        FormatType::Decimal => {
            if raw.contains('%') {
                return None;
            }
            raw.parse::<f64>().ok()?
        }
        FormatType::NoNumeric => return None,
    };
    value.is_finite().then_some(value)
}

/// Parse a star cell. Status phrases mean "no star"; numbers must be whole
/// stars 1 through 5.
pub fn parse_star(raw: &str) -> Result<Option<u8>, String> {
    if special_value(raw).is_some() {
        return Ok(None);
    }
    let v = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("star rating '{}' is not a number", raw.trim()))?;
    if v.fract() == 0.0 && (1.0..=f64::from(TOP_TIER)).contains(&v) {
        Ok(Some(v as u8))
    } else {
        Err(format!("star rating must be 1-5 (got {})", raw.trim()))
    }
}

/// Display form of a numeric performance value.
pub fn format_value(value: f64, format_type: FormatType) -> String {
    match format_type {
        FormatType::Percentage => format!("{}%", to_fixed(value, 1)),
        FormatType::Integer => format!("{}", value.trunc() as i64),
        FormatType::Decimal => to_fixed(value, 2),
        FormatType::NoNumeric => to_fixed(value, 1),
    }
}
