//! Shared domain types.
//!
//! These types are kept serializable so the same records can be:
//!
//! - loaded from CSV / JSON / the measure service
//! - classified and aggregated in-memory
//! - written back out as contract files or CSV exports

use std::collections::HashSet;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Highest star tier. A measure at this tier cannot improve.
pub const TOP_TIER: u8 = 5;

/// How a measure's raw performance is expressed.
///
/// Only affects parsing of raw strings and formatting of gaps/bands; the
/// classification engine works on plain `f64` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormatType {
    Percentage,
    Integer,
    Decimal,
    /// Star-only measures (e.g. quality improvement) with no numeric performance.
    NoNumeric,
}

impl FormatType {
    /// Parse the upper-case labels used by CMS tables and the measure service.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "PERCENTAGE" | "PERCENT" | "%" => Some(FormatType::Percentage),
            "INTEGER" | "INT" => Some(FormatType::Integer),
            "DECIMAL" => Some(FormatType::Decimal),
            "NO_NUMERIC" | "NONE" => Some(FormatType::NoNumeric),
            _ => None,
        }
    }

    pub fn unit_suffix(self) -> &'static str {
        match self {
            FormatType::Percentage => "%",
            _ => "",
        }
    }
}

/// Why a measure carries no numeric performance, from CMS status phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpecialValue {
    InsufficientSample,
    HoldHarmless,
    InsufficientData,
    NotRequired,
    MissingData,
    StarOnly,
    DataQualityIssue,
    NotOffered,
}

impl SpecialValue {
    /// Short form for table cells.
    pub fn label(self) -> &'static str {
        match self {
            SpecialValue::InsufficientSample => "too small",
            SpecialValue::HoldHarmless => "too new",
            SpecialValue::InsufficientData => "low data",
            SpecialValue::NotRequired => "not req.",
            SpecialValue::MissingData => "no data",
            SpecialValue::StarOnly => "star only",
            SpecialValue::DataQualityIssue => "data issue",
            SpecialValue::NotOffered => "not offrd",
        }
    }
}

/// Medicare part a measure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Part {
    C,
    D,
}

/// One quality measure of a contract, as supplied by the measure source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub weight: f64,
    #[serde(default)]
    pub star_rating: Option<u8>,
    #[serde(default, alias = "performance_numeric")]
    pub performance: Option<f64>,
    #[serde(default)]
    pub threshold_lower: Option<f64>,
    #[serde(default)]
    pub threshold_upper: Option<f64>,
    #[serde(default)]
    pub is_inverse: bool,
    pub format_type: FormatType,
    /// Display form of the current tier's band (e.g. `"76.0% to <84.0%"`).
    #[serde(default, alias = "threshold_band", skip_serializing_if = "Option::is_none")]
    pub band_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Set when the performance cell held a status phrase instead of a number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_value: Option<SpecialValue>,
}

impl Measure {
    pub fn is_top_tier(&self) -> bool {
        self.star_rating == Some(TOP_TIER)
    }

    /// Check the load-time invariants of a single record.
    pub fn validate(&self) -> Result<(), String> {
        if self.code.trim().is_empty() {
            return Err("empty measure code".to_string());
        }
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(format!("weight must be a positive number (got {})", self.weight));
        }
        if let Some(star) = self.star_rating {
            if !(1..=TOP_TIER).contains(&star) {
                return Err(format!("star rating must be 1-5 (got {star})"));
            }
        }
        for (label, value) in [
            ("performance", self.performance),
            ("threshold_lower", self.threshold_lower),
            ("threshold_upper", self.threshold_upper),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(format!("{label} is not a finite number"));
                }
            }
        }
        if let (Some(lower), Some(upper)) = (self.threshold_lower, self.threshold_upper) {
            if lower > upper {
                return Err(format!("threshold_lower {lower} exceeds threshold_upper {upper}"));
            }
        }
        Ok(())
    }
}

/// Validate a whole measure set: per-record invariants plus unique codes.
pub fn validate_measures(measures: &[Measure]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    let mut problems = Vec::new();
    for m in measures {
        if let Err(msg) = m.validate() {
            problems.push(format!("{}: {msg}", m.code));
        }
        if !seen.insert(m.code.as_str()) {
            problems.push(format!("{}: duplicate measure code", m.code));
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::input(format!(
            "Invalid measure data:\n  {}",
            problems.join("\n  ")
        )))
    }
}

/// Contract-level metadata. Not used by the classification engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub contract_id: String,
    #[serde(default)]
    pub org_type: Option<String>,
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub marketing_name: Option<String>,
    #[serde(default)]
    pub parent_org: Option<String>,
    #[serde(default)]
    pub overall_rating: Option<f64>,
    #[serde(default)]
    pub part_c_rating: Option<f64>,
    #[serde(default)]
    pub part_d_rating: Option<f64>,
}

/// A contract plus its ordered measure set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    #[serde(alias = "contract_info")]
    pub info: ContractInfo,
    pub measures: Vec<Measure>,
}

/// Per-measure risk signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    /// Performance sits where a small change would drop the measure a tier.
    AtRisk,
    Neutral,
    /// Performance sits where a small change would lift the measure a tier.
    Upside,
    /// No performance or no usable band.
    NotApplicable,
}

impl RiskStatus {
    pub fn label(self) -> &'static str {
        match self {
            RiskStatus::AtRisk => "At Risk",
            RiskStatus::Neutral => "Neutral",
            RiskStatus::Upside => "Upside",
            RiskStatus::NotApplicable => "N/A",
        }
    }
}

/// Where performance falls relative to its resolved band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Below,
    LowerThird,
    Middle,
    UpperThird,
    Above,
    /// `lower == upper`: performance is on the single target value.
    ExactBand,
    /// Inside a band that admits exactly one discrete value.
    OneValueInside,
}

/// A usable closed interval derived from raw (possibly open-ended) bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBand {
    pub lower: f64,
    pub upper: f64,
    /// True when `upper` was inferred rather than given.
    pub assumed_upper_bound: bool,
}

impl ResolvedBand {
    pub fn range(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Where the measure set for a run comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureSourceSpec {
    Csv(PathBuf),
    Json(PathBuf),
    Api { contract_id: String },
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, `.env`, and defaults.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub source: MeasureSourceSpec,
    /// Overrides/sets the contract id (used for what-if requests and Part D set selection).
    pub contract_id: Option<String>,
    pub api_url: String,
    /// Hypothetical performance values to resolve, in order.
    pub what_ifs: Vec<(String, f64)>,
    /// Local cut-point table; when absent, what-ifs go to the measure service.
    pub cut_points: Option<PathBuf>,
    /// Overall Final Adjustment Category; overrides the one from `fac_file`.
    pub fac: Option<u8>,
    /// Per-contract FAC lookup CSV.
    pub fac_file: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure(code: &str) -> Measure {
        Measure {
            code: code.to_string(),
            name: String::new(),
            weight: 1.0,
            star_rating: Some(3),
            performance: Some(80.0),
            threshold_lower: Some(76.0),
            threshold_upper: Some(84.0),
            is_inverse: false,
            format_type: FormatType::Percentage,
            band_label: None,
            no_value: None,
            domain: None,
        }
    }

    #[test]
    fn validate_rejects_bad_weight_and_stars() {
        let mut m = measure("C01");
        assert!(m.validate().is_ok());

        m.weight = 0.0;
        assert!(m.validate().is_err());
        m.weight = -1.5;
        assert!(m.validate().is_err());

        let mut m = measure("C01");
        m.star_rating = Some(6);
        assert!(m.validate().is_err());
        m.star_rating = Some(0);
        assert!(m.validate().is_err());
    }

    #[test]
    fn validate_allows_exact_value_band_and_rejects_inverted_bounds() {
        let mut m = measure("C01");
        m.threshold_lower = Some(100.0);
        m.threshold_upper = Some(100.0);
        assert!(m.validate().is_ok());

        m.threshold_lower = Some(90.0);
        m.threshold_upper = Some(80.0);
        assert!(m.validate().is_err());
    }

    #[test]
    fn validate_measures_reports_duplicates() {
        let err = validate_measures(&[measure("C01"), measure("C01")]).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("duplicate"));
    }

    #[test]
    fn format_type_parses_service_labels() {
        assert_eq!(FormatType::parse("percentage"), Some(FormatType::Percentage));
        assert_eq!(FormatType::parse("NO_NUMERIC"), Some(FormatType::NoNumeric));
        assert_eq!(FormatType::parse("no-numeric"), Some(FormatType::NoNumeric));
        assert_eq!(FormatType::parse("ratio"), None);
    }

    #[test]
    fn measure_deserializes_service_field_names() {
        let json = r#"{
            "code": "C18", "name": "Plan All-Cause Readmissions", "weight": 3,
            "star_rating": 2, "performance_numeric": 11.0,
            "threshold_lower": 10.0, "threshold_upper": 12.0,
            "is_inverse": true, "format_type": "PERCENTAGE",
            "threshold_band": ">10.0% to 12.0%"
        }"#;
        let m: Measure = serde_json::from_str(json).unwrap();
        assert_eq!(m.performance, Some(11.0));
        assert!(m.is_inverse);
        assert_eq!(m.band_label.as_deref(), Some(">10.0% to 12.0%"));
    }
}
