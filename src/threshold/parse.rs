//! Cut-point string parsing.
//!
//! CMS publishes each tier's band as a short string. Seven shapes occur:
//!
//! | example               | lower      | upper      |
//! |-----------------------|------------|------------|
//! | `>= 71 % to < 76 %`   | `>= 71`    | `< 76`     |
//! | `> 0.11 to <= 0.32`   | `> 0.11`   | `<= 0.32`  |
//! | `>= 84 %`             | `>= 84`    | open       |
//! | `<= 7 %`              | open       | `<= 7`     |
//! | `< 58 %`              | open       | `< 58`     |
//! | `> 39 %`              | `> 39`     | open       |
//! | `100%`                | `= 100`    | `= 100`    |

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::FormatType;
use crate::error::AppError;

const NUM: &str = r"(-?\d+\.?\d*)";

static INCLUSIVE_UPPER_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(>=?)\s*{NUM}\s*%?\s*to\s*(<=)\s*{NUM}\s*%?")).expect("valid regex")
});
static STANDARD_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)>=\s*{NUM}\s*%?\s*to\s*<\s*{NUM}\s*%?")).expect("valid regex")
});
static OPEN_UPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r">=\s*{NUM}\s*%?\s*$")).expect("valid regex"));
static INCLUSIVE_CEILING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^<=\s*{NUM}\s*%?\s*$")).expect("valid regex"));
static EXCLUSIVE_CEILING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^<\s*{NUM}\s*%?\s*$")).expect("valid regex"));
static EXCLUSIVE_FLOOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^>\s*{NUM}\s*%?\s*$")).expect("valid regex"));
static EXACT_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\s*{NUM}\s*%?\s*$")).expect("valid regex"));

/// Comparison operator attached to one side of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundOp {
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "=")]
    Eq,
}

impl BoundOp {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">=" => Some(BoundOp::Ge),
            ">" => Some(BoundOp::Gt),
            "<" => Some(BoundOp::Lt),
            "<=" => Some(BoundOp::Le),
            "=" => Some(BoundOp::Eq),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BoundOp::Ge => ">=",
            BoundOp::Gt => ">",
            BoundOp::Lt => "<",
            BoundOp::Le => "<=",
            BoundOp::Eq => "=",
        }
    }
}

/// A parsed cut-point band with its operators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub lower_op: Option<BoundOp>,
    pub upper_op: Option<BoundOp>,
}

impl ThresholdBand {
    fn new(lower: Option<(f64, BoundOp)>, upper: Option<(f64, BoundOp)>) -> Self {
        Self {
            lower: lower.map(|(v, _)| v),
            upper: upper.map(|(v, _)| v),
            lower_op: lower.map(|(_, op)| op),
            upper_op: upper.map(|(_, op)| op),
        }
    }

    /// Rebuild a band from numeric bounds using the measure's polarity
    /// conventions (`>= X to < Y` normal, `> X to <= Y` inverse).
    pub fn from_bounds(lower: Option<f64>, upper: Option<f64>, is_inverse: bool) -> Option<Self> {
        let (lower_op, upper_op) = if is_inverse {
            (BoundOp::Gt, BoundOp::Le)
        } else {
            (BoundOp::Ge, BoundOp::Lt)
        };
        match (lower, upper) {
            (Some(l), Some(u)) if l == u => Some(Self::new(Some((l, BoundOp::Eq)), Some((u, BoundOp::Eq)))),
            (None, None) => None,
            (l, u) => Some(Self::new(l.map(|v| (v, lower_op)), u.map(|v| (v, upper_op)))),
        }
    }

    /// Whether `value` satisfies both sides of the band.
    pub fn contains(&self, value: f64) -> bool {
        if let (Some(lower), Some(op)) = (self.lower, self.lower_op) {
            let ok = match op {
                BoundOp::Ge => value >= lower,
                BoundOp::Gt => value > lower,
                BoundOp::Eq => value == lower,
                BoundOp::Lt | BoundOp::Le => true,
            };
            if !ok {
                return false;
            }
        }
        if let (Some(upper), Some(op)) = (self.upper, self.upper_op) {
            let ok = match op {
                BoundOp::Lt => value < upper,
                BoundOp::Le => value <= upper,
                BoundOp::Eq => value == upper,
                BoundOp::Ge | BoundOp::Gt => true,
            };
            if !ok {
                return false;
            }
        }
        true
    }

    /// Human-readable form, e.g. `"76.0% to <84.0%"`, `"78 to <80"`, `">0.11 to 0.32"`.
    pub fn display(&self, format_type: FormatType) -> String {
        let suffix = format_type.unit_suffix();
        let fmt = |v: f64| -> String {
            match format_type {
                FormatType::Decimal => format!("{v:.2}{suffix}"),
                FormatType::Integer => format!("{v:.0}{suffix}"),
                FormatType::Percentage | FormatType::NoNumeric => format!("{v:.1}{suffix}"),
            }
        };

        let mut out = String::new();
        if let (Some(lower), Some(op)) = (self.lower, self.lower_op) {
            match op {
                BoundOp::Ge | BoundOp::Eq => out.push_str(&fmt(lower)),
                BoundOp::Gt => out.push_str(&format!(">{}", fmt(lower))),
                BoundOp::Lt | BoundOp::Le => {}
            }
        }
        if let (Some(upper), Some(op)) = (self.upper, self.upper_op) {
            if self.lower.is_some() {
                match op {
                    BoundOp::Lt => out.push_str(&format!(" to <{}", fmt(upper))),
                    BoundOp::Le => out.push_str(&format!(" to {}", fmt(upper))),
                    _ => {}
                }
            } else {
                match op {
                    BoundOp::Lt => out.push_str(&format!("<{}", fmt(upper))),
                    BoundOp::Le => out.push_str(&format!("≤{}", fmt(upper))),
                    _ => {}
                }
            }
        }
        if self.lower.is_some()
            && self.upper.is_none()
            && matches!(self.lower_op, Some(BoundOp::Ge | BoundOp::Gt))
        {
            out.push('+');
        }
        out
    }
}

/// Parse a cut-point string. Shapes are tried most specific first.
pub fn parse_threshold_band(raw: &str) -> Result<ThresholdBand, AppError> {
    let normalized = raw.trim().replace('≥', ">=").replace('≤', "<=");
    let s = normalized.as_str();
    let has_to = s.to_ascii_lowercase().contains(" to ");

    if let Some(c) = INCLUSIVE_UPPER_RANGE.captures(s) {
        let lower_op = BoundOp::from_symbol(&c[1]);
        let upper_op = BoundOp::from_symbol(&c[3]);
        if let (Some(lower_op), Some(upper_op)) = (lower_op, upper_op) {
            return Ok(ThresholdBand::new(
                Some((num(&c[2])?, lower_op)),
                Some((num(&c[4])?, upper_op)),
            ));
        }
    }
    if let Some(c) = STANDARD_RANGE.captures(s) {
        return Ok(ThresholdBand::new(
            Some((num(&c[1])?, BoundOp::Ge)),
            Some((num(&c[2])?, BoundOp::Lt)),
        ));
    }
    if !has_to {
        if let Some(c) = OPEN_UPPER.captures(s) {
            return Ok(ThresholdBand::new(Some((num(&c[1])?, BoundOp::Ge)), None));
        }
    }
    if let Some(c) = INCLUSIVE_CEILING.captures(s) {
        return Ok(ThresholdBand::new(None, Some((num(&c[1])?, BoundOp::Le))));
    }
    if let Some(c) = EXCLUSIVE_CEILING.captures(s) {
        return Ok(ThresholdBand::new(None, Some((num(&c[1])?, BoundOp::Lt))));
    }
    if !has_to {
        if let Some(c) = EXCLUSIVE_FLOOR.captures(s) {
            return Ok(ThresholdBand::new(Some((num(&c[1])?, BoundOp::Gt)), None));
        }
    }
    if !s.contains('<') && !s.contains('>') && !has_to {
        if let Some(c) = EXACT_VALUE.captures(s) {
            let v = num(&c[1])?;
            return Ok(ThresholdBand::new(Some((v, BoundOp::Eq)), Some((v, BoundOp::Eq))));
        }
    }

    Err(AppError::input(format!("Could not parse threshold: '{}'", raw.trim())))
}

fn num(raw: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .map_err(|e| AppError::input(format!("Invalid threshold number '{raw}': {e}")))
}
