//! Shared analysis pipeline used by the `report` and `status` commands.
//!
//! load measures -> build session -> resolve what-ifs -> classify
//!
//! Presentation (printing, exports) stays in `app`.

use tracing::{info, warn};

use crate::classify::Assessment;
use crate::data::client::StarsClient;
use crate::data::cutpoints::{CutPointTable, PartDSet};
use crate::domain::{AnalyzerConfig, Contract, ContractInfo, MeasureSourceSpec};
use crate::error::AppError;
use crate::io::{load_measures_csv, read_contract_json};
use crate::report::Headline;
use crate::report::cai::{ContractFacs, FacTable};
use crate::session::{Session, WhatIfOutcome, WhatIfResolver};

/// Contract id used when a measure CSV names none.
pub const LOCAL_CONTRACT_ID: &str = "LOCAL";

/// One requested what-if and what became of it.
#[derive(Debug, Clone, PartialEq)]
pub struct WhatIfReport {
    pub code: String,
    pub value: f64,
    pub outcome: WhatIfOutcome,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub session: Session,
    pub assessments: Vec<Assessment>,
    pub headline: Headline,
    pub facs: ContractFacs,
    pub what_ifs: Vec<WhatIfReport>,
}

/// Load the configured measure source and run the analysis.
pub fn run_analysis(config: &AnalyzerConfig) -> Result<RunOutput, AppError> {
    let contract = load_contract(config)?;
    run_with_contract(config, contract)
}

pub fn load_contract(config: &AnalyzerConfig) -> Result<Contract, AppError> {
    let mut contract = match &config.source {
        MeasureSourceSpec::Csv(path) => {
            let ingested = load_measures_csv(path)?;
            let contract_id = config
                .contract_id
                .clone()
                .or(ingested.contract_id)
                .unwrap_or_else(|| LOCAL_CONTRACT_ID.to_string());
            Contract {
                info: ContractInfo {
                    contract_id,
                    ..ContractInfo::default()
                },
                measures: ingested.measures,
            }
        }
        MeasureSourceSpec::Json(path) => read_contract_json(path)?,
        MeasureSourceSpec::Api { contract_id } => StarsClient::new(config.api_url.clone()).fetch_contract(contract_id)?,
    };

    // An explicit --contract overrides the id carried by a file.
    if let (Some(id), MeasureSourceSpec::Json(_)) = (&config.contract_id, &config.source) {
        contract.info.contract_id = id.clone();
    }
    Ok(contract)
}

/// Run the analysis on an already-loaded contract.
pub fn run_with_contract(config: &AnalyzerConfig, mut contract: Contract) -> Result<RunOutput, AppError> {
    let cut_points = config.cut_points.as_deref().map(CutPointTable::load_csv).transpose()?;
    let set = PartDSet::for_info(&contract.info);
    if let Some(table) = &cut_points {
        let filled = table.fill_missing_bands(&mut contract.measures, set);
        info!(set = set.label(), filled, "current bands from cut points");
    }

    let mut session = Session::new(contract)?;
    info!(
        contract = session.contract_id(),
        measures = session.measures().len(),
        "session ready"
    );

    let mut what_ifs = Vec::with_capacity(config.what_ifs.len());
    if !config.what_ifs.is_empty() {
        match &cut_points {
            Some(table) => {
                info!(set = set.label(), "resolving what-ifs from cut points");
                apply_all(&mut session, &table.resolver(set), &config.what_ifs, &mut what_ifs)?;
            }
            None => {
                let client = StarsClient::new(config.api_url.clone());
                apply_all(&mut session, &client, &config.what_ifs, &mut what_ifs)?;
            }
        }
    }

    let facs = contract_facs(config, session.contract_id())?;
    let assessments = session.assessments();
    let headline = session.headline_for(&assessments);
    Ok(RunOutput {
        session,
        assessments,
        headline,
        facs,
        what_ifs,
    })
}

/// FACs from the lookup file, with `--fac` overriding the overall FAC.
fn contract_facs(config: &AnalyzerConfig, contract_id: &str) -> Result<ContractFacs, AppError> {
    let mut facs = match &config.fac_file {
        Some(path) => FacTable::load_csv(path)?.get(contract_id).unwrap_or_else(|| {
            warn!(contract = contract_id, "contract not in FAC file; no CAI adjustment");
            ContractFacs::default()
        }),
        None => ContractFacs::default(),
    };
    if let Some(fac) = config.fac {
        facs.overall = Some(fac);
    }
    Ok(facs)
}

fn apply_all(
    session: &mut Session,
    resolver: &dyn WhatIfResolver,
    requests: &[(String, f64)],
    out: &mut Vec<WhatIfReport>,
) -> Result<(), AppError> {
    for (code, value) in requests {
        let outcome = session.apply_what_if(resolver, code, *value)?;
        out.push(WhatIfReport {
            code: code.clone(),
            value: *value,
            outcome,
        });
    }
    Ok(())
}
