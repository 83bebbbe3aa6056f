//! Categorical Adjustment Index (CAI).
//!
//! CMS adjusts summary star ratings by a small CAI value chosen from the
//! contract's Final Adjustment Category (FAC). Values are the published 2026
//! tables; Part D PDP values are approximate.
//!
//! Per-contract FACs come from a CSV with one row per contract:
//!
//! ```text
//! contract_id,part_c_fac,part_d_mapd_fac,part_d_pdp_fac,overall_fac
//! H1234,5,3,N/A,6
//! ```

use std::collections::HashMap;
use std::path::Path;

use csv::StringRecord;
use tracing::info;

use crate::error::AppError;
use crate::io::{RowError, get_optional, open_csv, require_columns, row_errors_to_error};

/// Which summary rating a FAC applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaiScope {
    Overall,
    PartC,
    PartDMapd,
    PartDPdp,
}

const OVERALL: [f64; 9] = [
    -0.063262, -0.040422, -0.017803, 0.003256, 0.018790, 0.045683, 0.058145, 0.101257, 0.145515,
];
const PART_C: [f64; 8] = [
    -0.058259, -0.036927, -0.013699, 0.004022, 0.032302, 0.059788, 0.080451, 0.102370,
];
const PART_D_MAPD: [f64; 6] = [-0.033144, -0.014987, -0.002688, 0.046282, 0.072332, 0.128476];
const PART_D_PDP: [f64; 4] = [-0.028, -0.010, 0.015, 0.045];

impl CaiScope {
    fn table(self) -> &'static [f64] {
        match self {
            CaiScope::Overall => &OVERALL,
            CaiScope::PartC => &PART_C,
            CaiScope::PartDMapd => &PART_D_MAPD,
            CaiScope::PartDPdp => &PART_D_PDP,
        }
    }

    /// Highest FAC defined for this scope.
    pub fn max_fac(self) -> u8 {
        self.table().len() as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            CaiScope::Overall => "overall",
            CaiScope::PartC => "Part C",
            CaiScope::PartDMapd => "Part D MA-PD",
            CaiScope::PartDPdp => "Part D PDP",
        }
    }
}

/// CAI value for a 1-based FAC, or `None` when the FAC is outside the table.
pub fn cai_value(scope: CaiScope, fac: u8) -> Option<f64> {
    let idx = usize::from(fac).checked_sub(1)?;
    scope.table().get(idx).copied()
}

/// Apply a CAI value to a raw (unadjusted) rating.
pub fn adjust(rating: f64, cai: f64) -> f64 {
    rating + cai
}

/// A contract's FAC per scope. Any of them may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractFacs {
    pub overall: Option<u8>,
    pub part_c: Option<u8>,
    pub part_d_mapd: Option<u8>,
    pub part_d_pdp: Option<u8>,
}

impl ContractFacs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn overall(&self) -> Option<(u8, f64)> {
        with_cai(CaiScope::Overall, self.overall)
    }

    pub fn part_c(&self) -> Option<(u8, f64)> {
        with_cai(CaiScope::PartC, self.part_c)
    }

    /// Part D uses the MA-PD FAC when present, else the PDP FAC.
    pub fn part_d(&self) -> Option<(CaiScope, u8, f64)> {
        [
            (CaiScope::PartDMapd, self.part_d_mapd),
            (CaiScope::PartDPdp, self.part_d_pdp),
        ]
        .into_iter()
        .find_map(|(scope, fac)| with_cai(scope, fac).map(|(fac, cai)| (scope, fac, cai)))
    }
}

fn with_cai(scope: CaiScope, fac: Option<u8>) -> Option<(u8, f64)> {
    let fac = fac?;
    cai_value(scope, fac).map(|cai| (fac, cai))
}

/// FAC table keyed by upper-case contract id.
#[derive(Debug, Clone, Default)]
pub struct FacTable {
    by_contract: HashMap<String, ContractFacs>,
}

impl FacTable {
    pub fn load_csv(path: &Path) -> Result<Self, AppError> {
        let (mut reader, header_map) = open_csv(path)?;
        require_columns(path, &header_map, &["contract_id"])?;

        let mut table = FacTable::default();
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
            let Some(contract_id) = get_optional(&record, &header_map, "contract_id") else {
                errors.push(RowError {
                    line,
                    code: None,
                    message: "missing contract_id".to_string(),
                });
                continue;
            };

            let parsed = parse_fac_row(&record, &header_map);
            match parsed {
                Ok(facs) => {
                    table.by_contract.insert(contract_id.to_ascii_uppercase(), facs);
                }
                Err(message) => errors.push(RowError {
                    line,
                    code: Some(contract_id.to_string()),
                    message,
                }),
            }
        }

        if !errors.is_empty() {
            return Err(row_errors_to_error("FAC file", path, &errors));
        }
        info!(path = %path.display(), contracts = table.by_contract.len(), "loaded FAC table");
        Ok(table)
    }

    pub fn get(&self, contract_id: &str) -> Option<ContractFacs> {
        self.by_contract.get(&contract_id.trim().to_ascii_uppercase()).copied()
    }
}

fn parse_fac_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<ContractFacs, String> {
    let column = |names: &[&str]| names.iter().find_map(|n| get_optional(record, header_map, n));
    Ok(ContractFacs {
        overall: parse_fac(column(&["overall_fac"]), CaiScope::Overall)?,
        part_c: parse_fac(column(&["part_c_fac"]), CaiScope::PartC)?,
        part_d_mapd: parse_fac(column(&["part_d_mapd_fac", "part_d_ma_pd_fac"]), CaiScope::PartDMapd)?,
        part_d_pdp: parse_fac(column(&["part_d_pdp_fac"]), CaiScope::PartDPdp)?,
    })
}

/// `N/A` and blanks mean no FAC; `5.0` reads as `5`.
fn parse_fac(raw: Option<&str>, scope: CaiScope) -> Result<Option<u8>, String> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if matches!(raw.to_ascii_uppercase().as_str(), "N/A" | "NA") {
        return Ok(None);
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("{} FAC '{raw}' is not a number", scope.label()))?;
    if value.fract() != 0.0 || value < 1.0 || value > f64::from(scope.max_fac()) {
        return Err(format!(
            "{} FAC must be 1-{} (got {raw})",
            scope.label(),
            scope.max_fac()
        ));
    }
    Ok(Some(value as u8))
}
