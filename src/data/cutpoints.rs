//! Local cut-point table: resolves what-if values without the measure service
//! and supplies current-tier bands for measures loaded without bounds.
//!
//! CSV layout, one row per measure, threshold set, and star:
//!
//! ```text
//! measure_code,set,star,threshold
//! C01,,5,>= 84%
//! D08,MA-PD,5,>= 91%
//! D08,PDP,5,>= 93%
//! ```
//!
//! `set` only matters for Part D measures and may be blank for Part C.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::data::catalog;
use crate::domain::{ContractInfo, Measure, Part, TOP_TIER};
use crate::error::AppError;
use crate::io::{RowError, get_optional, open_csv, require_columns, row_errors_to_error};
use crate::session::{WhatIfRequest, WhatIfResolver};
use crate::threshold::{ThresholdBand, parse_threshold_band};

/// Which Part D cut-point set a contract is rated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartDSet {
    #[serde(rename = "MA-PD")]
    MaPd,
    #[serde(rename = "PDP")]
    Pdp,
}

impl PartDSet {
    /// `S` contracts are stand-alone drug plans; `H`/`R` contracts are MA-PD.
    /// Otherwise the organization type decides.
    pub fn for_contract(contract_id: &str, org_type: Option<&str>) -> Self {
        let id = contract_id.trim();
        if id.starts_with('S') {
            PartDSet::Pdp
        } else if id.starts_with('H') || id.starts_with('R') {
            PartDSet::MaPd
        } else if org_type.is_some_and(|t| t.contains("PDP")) {
            PartDSet::Pdp
        } else {
            PartDSet::MaPd
        }
    }

    pub fn for_info(info: &ContractInfo) -> Self {
        Self::for_contract(&info.contract_id, info.org_type.as_deref())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().replace(['-', '_', ' '], "").as_str() {
            "MAPD" => Some(PartDSet::MaPd),
            "PDP" => Some(PartDSet::Pdp),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PartDSet::MaPd => "MA-PD",
            PartDSet::Pdp => "PDP",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct CutPoint {
    set: Option<PartDSet>,
    star: u8,
    band: ThresholdBand,
}

#[derive(Debug, Clone, Default)]
pub struct CutPointTable {
    by_code: HashMap<String, Vec<CutPoint>>,
}

impl CutPointTable {
    pub fn load_csv(path: &Path) -> Result<Self, AppError> {
        let (mut reader, header_map) = open_csv(path)?;
        require_columns(path, &header_map, &["measure_code", "star", "threshold"])?;

        let mut table = CutPointTable::default();
        let mut errors = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            let line = idx + 2;
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(RowError {
                        line,
                        code: None,
                        message: format!("CSV parse error: {e}"),
                    });
                    continue;
                }
            };

            let Some(code) = get_optional(&record, &header_map, "measure_code") else {
                errors.push(RowError {
                    line,
                    code: None,
                    message: "missing measure_code".to_string(),
                });
                continue;
            };
            let row_error = |message: String| RowError {
                line,
                code: Some(code.to_string()),
                message,
            };

            let set = match get_optional(&record, &header_map, "set") {
                None => None,
                Some(raw) => match PartDSet::parse(raw) {
                    Some(set) => Some(set),
                    None => {
                        errors.push(row_error(format!("unknown threshold set '{raw}'")));
                        continue;
                    }
                },
            };
            let star = match get_optional(&record, &header_map, "star").map(str::parse::<u8>) {
                Some(Ok(star)) if (1..=TOP_TIER).contains(&star) => star,
                _ => {
                    errors.push(row_error("star must be 1-5".to_string()));
                    continue;
                }
            };
            let band = match get_optional(&record, &header_map, "threshold").map(parse_threshold_band) {
                Some(Ok(band)) => band,
                Some(Err(e)) => {
                    errors.push(row_error(e.message().to_string()));
                    continue;
                }
                None => {
                    errors.push(row_error("missing threshold".to_string()));
                    continue;
                }
            };

            if let Err(message) = table.insert(code, set, star, band) {
                errors.push(row_error(message));
            }
        }

        if !errors.is_empty() {
            return Err(row_errors_to_error("cut-point file", path, &errors));
        }
        if table.is_empty() {
            return Err(AppError::no_data(format!(
                "Cut-point file '{}' has no rows.",
                path.display()
            )));
        }
        info!(path = %path.display(), measures = table.by_code.len(), "loaded cut points");
        Ok(table)
    }

    /// Add one band. Fails on a repeated `(code, set, star)`.
    pub fn insert(
        &mut self,
        code: &str,
        set: Option<PartDSet>,
        star: u8,
        band: ThresholdBand,
    ) -> Result<(), String> {
        let rows = self.by_code.entry(code.trim().to_ascii_uppercase()).or_default();
        if rows.iter().any(|r| r.set == set && r.star == star) {
            return Err(format!("duplicate cut point for star {star}"));
        }
        rows.push(CutPoint { set, star, band });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    pub fn covers(&self, code: &str) -> bool {
        self.by_code.contains_key(&code.trim().to_ascii_uppercase())
    }

    /// Band for one tier. Part D measures prefer rows for `set` and fall back
    /// to set-less rows.
    pub fn band_for(&self, code: &str, star: u8, set: PartDSet) -> Option<&ThresholdBand> {
        let rows = self.by_code.get(&code.trim().to_ascii_uppercase())?;
        let row = if catalog::part_of(code) == Some(Part::D) {
            rows.iter()
                .find(|r| r.star == star && r.set == Some(set))
                .or_else(|| rows.iter().find(|r| r.star == star && r.set.is_none()))
        } else {
            rows.iter().find(|r| r.star == star)
        };
        row.map(|r| &r.band)
    }

    /// Star earned by `value`, scanning from the top tier down.
    pub fn star_for(&self, code: &str, value: f64, set: PartDSet) -> Option<u8> {
        (1..=TOP_TIER)
            .rev()
            .find(|&star| self.band_for(code, star, set).is_some_and(|b| b.contains(value)))
    }

    /// Fill bounds and band label of rated measures that carry no bounds.
    /// Returns how many measures were filled.
    pub fn fill_missing_bands(&self, measures: &mut [Measure], set: PartDSet) -> usize {
        let mut filled = 0;
        for m in measures.iter_mut() {
            if m.threshold_lower.is_some() || m.threshold_upper.is_some() {
                continue;
            }
            let Some(band) = m.star_rating.and_then(|star| self.band_for(&m.code, star, set)) else {
                continue;
            };
            m.threshold_lower = band.lower;
            m.threshold_upper = band.upper;
            if m.band_label.is_none() {
                m.band_label = Some(band.display(m.format_type));
            }
            debug!(code = %m.code, star = ?m.star_rating, set = set.label(), "band from cut points");
            filled += 1;
        }
        filled
    }

    pub fn resolver(&self, set: PartDSet) -> CutPointResolver<'_> {
        CutPointResolver { table: self, set }
    }
}

/// A cut-point table bound to one contract's Part D set.
pub struct CutPointResolver<'a> {
    table: &'a CutPointTable,
    set: PartDSet,
}

impl WhatIfResolver for CutPointResolver<'_> {
    fn resolve(&self, request: &WhatIfRequest) -> Result<Option<u8>, AppError> {
        if !self.table.covers(&request.measure_code) {
            return Err(AppError::input(format!(
                "No cut points for measure {}.",
                request.measure_code
            )));
        }
        let star = self
            .table
            .star_for(&request.measure_code, request.value, self.set);
        debug!(code = %request.measure_code, value = request.value, set = self.set.label(), star = ?star, "cut-point lookup");
        Ok(star)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn band(raw: &str) -> ThresholdBand {
        parse_threshold_band(raw).unwrap()
    }

    fn c01_table() -> CutPointTable {
        let mut t = CutPointTable::default();
        t.insert("C01", None, 5, band(">= 84%")).unwrap();
        t.insert("C01", None, 4, band(">= 76% to < 84%")).unwrap();
        t.insert("C01", None, 3, band(">= 68% to < 76%")).unwrap();
        t.insert("C01", None, 2, band(">= 55% to < 68%")).unwrap();
        t.insert("C01", None, 1, band("< 55%")).unwrap();
        t
    }

    #[test]
    fn part_d_set_from_contract() {
        assert_eq!(PartDSet::for_contract("S5601", None), PartDSet::Pdp);
        assert_eq!(PartDSet::for_contract("H1234", Some("PDP")), PartDSet::MaPd);
        assert_eq!(PartDSet::for_contract("R5826", None), PartDSet::MaPd);
        assert_eq!(PartDSet::for_contract("E0654", Some("Employer/Union Only Direct Contract PDP")), PartDSet::Pdp);
        assert_eq!(PartDSet::for_contract("E0654", Some("Local CCP")), PartDSet::MaPd);
        assert_eq!(PartDSet::parse("ma_pd"), Some(PartDSet::MaPd));
    }

    #[test]
    fn scans_from_top_tier() {
        let t = c01_table();
        assert_eq!(t.star_for("C01", 90.0, PartDSet::MaPd), Some(5));
        assert_eq!(t.star_for("C01", 84.0, PartDSet::MaPd), Some(5));
        assert_eq!(t.star_for("c01", 83.9, PartDSet::MaPd), Some(4));
        assert_eq!(t.star_for("C01", 54.0, PartDSet::MaPd), Some(1));
        assert_eq!(t.star_for("C02", 54.0, PartDSet::MaPd), None);
    }

    #[test]
    fn inverse_bands_respect_operators() {
        let mut t = CutPointTable::default();
        t.insert("C18", None, 5, band("<= 9%")).unwrap();
        t.insert("C18", None, 4, band("> 9% to <= 10%")).unwrap();
        t.insert("C18", None, 3, band("> 10% to <= 12%")).unwrap();
        t.insert("C18", None, 1, band("> 14%")).unwrap();
        assert_eq!(t.star_for("C18", 9.0, PartDSet::MaPd), Some(5));
        assert_eq!(t.star_for("C18", 10.0, PartDSet::MaPd), Some(4));
        assert_eq!(t.star_for("C18", 13.0, PartDSet::MaPd), None);
        assert_eq!(t.star_for("C18", 15.0, PartDSet::MaPd), Some(1));
    }

    #[test]
    fn part_d_prefers_matching_set() {
        let mut t = CutPointTable::default();
        t.insert("D08", Some(PartDSet::MaPd), 5, band(">= 91%")).unwrap();
        t.insert("D08", Some(PartDSet::Pdp), 5, band(">= 93%")).unwrap();
        t.insert("D08", None, 4, band(">= 80% to < 93%")).unwrap();
        assert_eq!(t.star_for("D08", 92.0, PartDSet::MaPd), Some(5));
        assert_eq!(t.star_for("D08", 92.0, PartDSet::Pdp), Some(4));
        assert!(t.insert("D08", Some(PartDSet::Pdp), 5, band(">= 94%")).is_err());
    }

    #[test]
    fn fills_only_measures_without_bounds() {
        let mut t = c01_table();
        t.insert("D08", Some(PartDSet::Pdp), 4, band(">= 86% to < 93%")).unwrap();
        t.insert("D08", Some(PartDSet::MaPd), 4, band(">= 85% to < 89%")).unwrap();
        let measure = |code: &str, star: Option<u8>, bounds: Option<(f64, f64)>| Measure {
            code: code.to_string(),
            name: String::new(),
            weight: 1.0,
            star_rating: star,
            performance: Some(80.0),
            threshold_lower: bounds.map(|b| b.0),
            threshold_upper: bounds.map(|b| b.1),
            is_inverse: false,
            format_type: crate::domain::FormatType::Percentage,
            band_label: None,
            no_value: None,
            domain: None,
        };
        let mut measures = vec![
            measure("C01", Some(4), None),
            measure("C01", Some(3), Some((60.0, 70.0))),
            measure("C01", None, None),
            measure("D08", Some(4), None),
            measure("C02", Some(4), None),
        ];

        assert_eq!(t.fill_missing_bands(&mut measures, PartDSet::Pdp), 2);
        assert_eq!((measures[0].threshold_lower, measures[0].threshold_upper), (Some(76.0), Some(84.0)));
        assert_eq!(measures[0].band_label.as_deref(), Some("76.0% to <84.0%"));
        assert_eq!((measures[1].threshold_lower, measures[1].threshold_upper), (Some(60.0), Some(70.0)));
        assert_eq!(measures[2].threshold_lower, None);
        assert_eq!((measures[3].threshold_lower, measures[3].threshold_upper), (Some(86.0), Some(93.0)));
        assert_eq!(measures[4].threshold_lower, None);
    }

    #[test]
    fn resolver_rejects_unknown_measure() {
        let t = c01_table();
        let resolver = t.resolver(PartDSet::MaPd);
        let request = WhatIfRequest {
            measure_code: "C01".to_string(),
            value: 77.0,
            contract_id: "H1234".to_string(),
        };
        assert_eq!(resolver.resolve(&request).unwrap(), Some(4));

        let request = WhatIfRequest {
            measure_code: "C99".to_string(),
            ..request
        };
        assert!(resolver.resolve(&request).is_err());
    }

    #[test]
    fn loads_csv_and_collects_row_errors() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "measure_code,set,star,threshold").unwrap();
        writeln!(good, "C01,,5,\">= 84%\"").unwrap();
        writeln!(good, "D08,MA-PD,5,\">= 91%\"").unwrap();
        let table = CutPointTable::load_csv(good.path()).unwrap();
        assert!(table.covers("C01"));
        assert_eq!(table.star_for("D08", 95.0, PartDSet::MaPd), Some(5));

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "measure_code,set,star,threshold").unwrap();
        writeln!(bad, "C01,,7,\">= 84%\"").unwrap();
        writeln!(bad, "C02,XYZ,5,\">= 80%\"").unwrap();
        writeln!(bad, "C03,,5,sometimes").unwrap();
        let err = CutPointTable::load_csv(bad.path()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("line 2 (C01)"));
        assert!(err.message().contains("line 3 (C02)"));
        assert!(err.message().contains("line 4 (C03)"));
    }
}
