//! Blocking client for the contract measure service.
//!
//! Two endpoints are used:
//!
//! - `GET  /api/contract/{id}` for a contract's measure set
//! - `POST /api/whatif` for the star a hypothetical value would earn

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::data::{catalog, values};
use crate::domain::{Contract, ContractInfo, FormatType, Measure};
use crate::error::AppError;
use crate::session::{WhatIfRequest, WhatIfResolver};

pub const API_URL_ENV: &str = "STARS_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Base URL from `STARS_API_URL` (after loading `.env`), else the local default.
pub fn api_url_from_env() -> String {
    dotenvy::dotenv().ok();
    std::env::var(API_URL_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

pub struct StarsClient {
    client: Client,
    base_url: String,
}

impl StarsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn fetch_contract(&self, contract_id: &str) -> Result<Contract, AppError> {
        let url = format!("{}/api/contract/{}", self.base_url, contract_id.trim());
        info!(%url, "fetching contract");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AppError::upstream(format!("Contract request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(AppError::upstream(format!(
                "Contract request for {contract_id} failed with status {}.",
                resp.status()
            )));
        }
        let body: WireContract = resp
            .json()
            .map_err(|e| AppError::upstream(format!("Failed to parse contract response: {e}")))?;

        let contract = body.into_contract();
        if contract.measures.is_empty() {
            return Err(AppError::no_data(format!(
                "Contract {contract_id} has no rated measures."
            )));
        }
        Ok(contract)
    }

    pub fn fetch_what_if(&self, request: &WhatIfRequest) -> Result<Option<u8>, AppError> {
        let url = format!("{}/api/whatif", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(request)
            .send()
            .map_err(|e| AppError::upstream(format!("What-if request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(AppError::upstream(format!(
                "What-if request for {} failed with status {}.",
                request.measure_code,
                resp.status()
            )));
        }
        let body: WhatIfResponse = resp
            .json()
            .map_err(|e| AppError::upstream(format!("Failed to parse what-if response: {e}")))?;
        debug!(code = %request.measure_code, value = request.value, star = ?body.star, "what-if resolved");
        Ok(body.star)
    }
}

impl WhatIfResolver for StarsClient {
    fn resolve(&self, request: &WhatIfRequest) -> Result<Option<u8>, AppError> {
        self.fetch_what_if(request)
    }
}

#[derive(Debug, Deserialize)]
struct WhatIfResponse {
    #[serde(default)]
    star: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct WireContract {
    contract_info: WireInfo,
    #[serde(default)]
    part_d_set: Option<String>,
    #[serde(default)]
    measures: Vec<WireMeasure>,
}

/// Ratings arrive as numbers or status strings ("Not enough data available").
#[derive(Debug, Deserialize)]
struct WireInfo {
    contract_id: String,
    #[serde(default)]
    org_type: Option<Value>,
    #[serde(default)]
    contract_name: Option<Value>,
    #[serde(default)]
    marketing_name: Option<Value>,
    #[serde(default)]
    parent_org: Option<Value>,
    #[serde(default)]
    overall_rating: Option<Value>,
    #[serde(default)]
    part_c_rating: Option<Value>,
    #[serde(default)]
    part_d_rating: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct WireMeasure {
    code: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    is_inverse: Option<bool>,
    #[serde(default)]
    star_rating: Option<u8>,
    /// Display string; may be a status phrase.
    #[serde(default)]
    performance: Option<Value>,
    #[serde(default)]
    performance_numeric: Option<f64>,
    #[serde(default)]
    threshold_band: Option<String>,
    #[serde(default)]
    threshold_lower: Option<f64>,
    #[serde(default)]
    threshold_upper: Option<f64>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    format_type: Option<String>,
}

impl WireContract {
    fn into_contract(self) -> Contract {
        if let Some(set) = &self.part_d_set {
            debug!(contract = %self.contract_info.contract_id, part_d_set = %set, "service threshold set");
        }
        let measures = self
            .measures
            .into_iter()
            .filter_map(WireMeasure::into_measure)
            .collect();
        Contract {
            info: self.contract_info.into_info(),
            measures,
        }
    }
}

impl WireInfo {
    fn into_info(self) -> ContractInfo {
        ContractInfo {
            contract_id: self.contract_id.trim().to_string(),
            org_type: text(self.org_type),
            contract_name: text(self.contract_name),
            marketing_name: text(self.marketing_name),
            parent_org: text(self.parent_org),
            overall_rating: rating(self.overall_rating),
            part_c_rating: rating(self.part_c_rating),
            part_d_rating: rating(self.part_d_rating),
        }
    }
}

impl WireMeasure {
    /// Zero-weight measures (Part D twins of Part C measures) are dropped.
    fn into_measure(self) -> Option<Measure> {
        let spec = catalog::lookup(&self.code);
        let weight = self.weight.or(spec.map(|s| s.weight)).unwrap_or(1.0);
        if weight <= 0.0 {
            debug!(code = %self.code, "skipping zero-weight measure");
            return None;
        }
        let format_type = self
            .format_type
            .as_deref()
            .and_then(FormatType::parse)
            .or(spec.map(|s| s.format_type))
            .unwrap_or(FormatType::Percentage);
        let name = if self.name.is_empty() {
            spec.map(|s| s.name.to_string()).unwrap_or_default()
        } else {
            self.name
        };
        let no_value = match &self.performance {
            Some(Value::String(raw)) if self.performance_numeric.is_none() => values::special_value(raw),
            _ => None,
        };
        Some(Measure {
            is_inverse: self
                .is_inverse
                .or(spec.map(|s| s.is_inverse))
                .unwrap_or(false),
            domain: self.domain.or(spec.map(|s| s.domain.to_string())),
            code: self.code,
            name,
            weight,
            star_rating: self.star_rating,
            performance: self.performance_numeric,
            threshold_lower: self.threshold_lower,
            threshold_upper: self.threshold_upper,
            format_type,
            band_label: self.threshold_band.filter(|b| !b.trim().is_empty()),
            no_value,
        })
    }
}

fn text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn rating(value: Option<Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}
