//! Read/write contract JSON files.
//!
//! A contract file is the portable form of one analysis: contract metadata, the
//! measure set, and (when written by `stars`) the what-if map and headline at
//! the time of export.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{Contract, ContractInfo, Measure, validate_measures};
use crate::error::AppError;
use crate::report::Headline;
use crate::session::{Session, WhatIfState};

/// On-disk schema written by `write_contract_json`.
#[derive(Debug, Clone, Serialize)]
pub struct ContractFile<'a> {
    pub tool: &'static str,
    pub generated_at: DateTime<Utc>,
    pub contract: &'a ContractInfo,
    pub measures: &'a [Measure],
    pub what_if: &'a WhatIfState,
    pub headline: &'a Headline,
}

/// Input schema. Extra fields (`what_if`, `headline`, ...) are ignored.
#[derive(Debug, Deserialize)]
struct ContractFileIn {
    #[serde(alias = "contract_info", alias = "info")]
    contract: ContractInfo,
    measures: Vec<Measure>,
}

pub fn read_contract_json(path: &Path) -> Result<Contract, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open contract JSON '{}': {e}", path.display())))?;
    let parsed: ContractFileIn = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::input(format!("Failed to parse contract JSON '{}': {e}", path.display())))?;

    if parsed.measures.is_empty() {
        return Err(AppError::no_data(format!(
            "Contract JSON '{}' has no measures.",
            path.display()
        )));
    }
    validate_measures(&parsed.measures)?;

    info!(path = %path.display(), measures = parsed.measures.len(), "loaded contract JSON");
    Ok(Contract {
        info: parsed.contract,
        measures: parsed.measures,
    })
}

pub fn write_contract_json(path: &Path, session: &Session, headline: &Headline) -> Result<(), AppError> {
    let out = ContractFile {
        tool: "stars",
        generated_at: Utc::now(),
        contract: session.info(),
        measures: session.measures(),
        what_if: session.what_if(),
        headline,
    };

    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create contract JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::input(format!("Failed to write contract JSON: {e}")))?;

    info!(path = %path.display(), "wrote contract JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FormatType;

    fn contract() -> Contract {
        Contract {
            info: ContractInfo {
                contract_id: "H1234".to_string(),
                org_type: Some("Local CCP".to_string()),
                ..ContractInfo::default()
            },
            measures: vec![Measure {
                code: "C01".to_string(),
                name: "Breast Cancer Screening".to_string(),
                weight: 1.0,
                star_rating: Some(3),
                performance: Some(82.0),
                threshold_lower: Some(76.0),
                threshold_upper: Some(84.0),
                is_inverse: false,
                format_type: FormatType::Percentage,
                band_label: None,
                no_value: None,
                domain: Some("HD1".to_string()),
            }],
        }
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h1234.json");

        let mut session = Session::new(contract()).unwrap();
        let resolver = |_: &crate::session::WhatIfRequest| -> Result<Option<u8>, AppError> { Ok(Some(4)) };
        session.apply_what_if(&resolver, "C01", 85.0).unwrap();
        write_contract_json(&path, &session, &session.headline()).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["what_if"]["C01"], 4);
        assert_eq!(raw["tool"], "stars");
        assert!(raw["generated_at"].is_string());

        let back = read_contract_json(&path).unwrap();
        assert_eq!(back, contract());
    }

    #[test]
    fn accepts_service_style_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svc.json");
        std::fs::write(
            &path,
            r#"{"contract_info": {"contract_id": "S5601"},
                "measures": [{"code": "D08", "weight": 3, "star_rating": 4,
                              "performance_numeric": 88.0, "threshold_lower": 86.0,
                              "threshold_upper": 89.0, "format_type": "PERCENTAGE"}]}"#,
        )
        .unwrap();
        let back = read_contract_json(&path).unwrap();
        assert_eq!(back.info.contract_id, "S5601");
        assert_eq!(back.measures[0].performance, Some(88.0));
    }

    #[test]
    fn rejects_invalid_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{"contract": {"contract_id": "H1"},
                "measures": [{"code": "C01", "weight": 0, "format_type": "PERCENTAGE"}]}"#,
        )
        .unwrap();
        assert_eq!(read_contract_json(&path).unwrap_err().exit_code(), crate::error::EXIT_INPUT);

        std::fs::write(&path, r#"{"contract": {"contract_id": "H1"}, "measures": []}"#).unwrap();
        assert_eq!(read_contract_json(&path).unwrap_err().exit_code(), crate::error::EXIT_NO_DATA);
    }
}
