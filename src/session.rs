//! Analysis session: one contract's measures plus the what-if state.
//!
//! The session is the only owner of the what-if map. Hypothetical stars come
//! from a `WhatIfResolver`; every request is stamped with a sequence number so
//! that a result arriving after a newer edit of the same measure is dropped
//! instead of overwriting it.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{Assessment, assess_all};
use crate::domain::{Contract, ContractInfo, Measure, TOP_TIER, validate_measures};
use crate::error::AppError;
use crate::report::{Headline, summarize, summarize_assessed};

/// Hypothetical star per measure code. Absent key means "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WhatIfState {
    stars: BTreeMap<String, u8>,
}

impl WhatIfState {
    pub fn get(&self, code: &str) -> Option<u8> {
        self.stars.get(code).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.stars.iter().map(|(code, star)| (code.as_str(), *star))
    }

    fn set(&mut self, code: &str, star: u8) {
        self.stars.insert(code.to_string(), star);
    }

    fn unset(&mut self, code: &str) {
        self.stars.remove(code);
    }
}

/// One hypothetical-value lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhatIfRequest {
    pub measure_code: String,
    pub value: f64,
    pub contract_id: String,
}

/// Computes the star a hypothetical performance value would earn.
///
/// `Ok(None)` means no rating is derivable for that value.
pub trait WhatIfResolver {
    fn resolve(&self, request: &WhatIfRequest) -> Result<Option<u8>, AppError>;
}

impl<F> WhatIfResolver for F
where
    F: Fn(&WhatIfRequest) -> Result<Option<u8>, AppError>,
{
    fn resolve(&self, request: &WhatIfRequest) -> Result<Option<u8>, AppError> {
        self(request)
    }
}

/// An in-flight what-if request.
#[derive(Debug, Clone, PartialEq)]
pub struct WhatIfTicket {
    pub request: WhatIfRequest,
    sequence: u64,
}

/// What happened to the what-if map when a request completed.
#[derive(Debug, Clone, PartialEq)]
pub enum WhatIfOutcome {
    Set(u8),
    /// Resolver found no rating, or the value was cleared.
    Unset,
    /// A newer request or clear for the same measure exists; result dropped.
    Superseded,
    /// Resolver failed; previous state kept.
    Failed(AppError),
}

#[derive(Debug, Clone)]
pub struct Session {
    info: ContractInfo,
    measures: Vec<Measure>,
    what_if: WhatIfState,
    latest: HashMap<String, u64>,
    next_sequence: u64,
}

impl Session {
    /// Start a session. Measures are validated here, once, at load time.
    pub fn new(contract: Contract) -> Result<Self, AppError> {
        if contract.measures.is_empty() {
            return Err(AppError::no_data(format!(
                "Contract '{}' has no measures.",
                contract.info.contract_id
            )));
        }
        validate_measures(&contract.measures)?;
        Ok(Self {
            info: contract.info,
            measures: contract.measures,
            what_if: WhatIfState::default(),
            latest: HashMap::new(),
            next_sequence: 0,
        })
    }

    pub fn info(&self) -> &ContractInfo {
        &self.info
    }

    pub fn contract_id(&self) -> &str {
        &self.info.contract_id
    }

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    pub fn what_if(&self) -> &WhatIfState {
        &self.what_if
    }

    pub fn measure(&self, code: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.code == code)
    }

    /// Per-measure assessments in measure order.
    pub fn assessments(&self) -> Vec<Assessment> {
        assess_all(&self.measures)
    }

    /// Headline metrics, recomputed from scratch.
    pub fn headline(&self) -> Headline {
        summarize(&self.measures, &self.what_if)
    }

    /// Headline metrics reusing assessments from [`Session::assessments`].
    pub fn headline_for(&self, assessments: &[Assessment]) -> Headline {
        summarize_assessed(&self.measures, assessments, &self.what_if)
    }

    /// Register a hypothetical value for `code`.
    ///
    /// A value of `0` clears the measure instead and returns `None`. Any ticket
    /// issued earlier for the same measure is superseded either way.
    pub fn request_what_if(&mut self, code: &str, value: f64) -> Result<Option<WhatIfTicket>, AppError> {
        self.ensure_known(code)?;
        if !value.is_finite() {
            return Err(AppError::input(format!("What-if value for {code} must be a finite number.")));
        }
        if value == 0.0 {
            self.clear_what_if(code)?;
            return Ok(None);
        }

        let sequence = self.bump(code);
        debug!(code, value, sequence, "what-if requested");
        Ok(Some(WhatIfTicket {
            request: WhatIfRequest {
                measure_code: code.to_string(),
                value,
                contract_id: self.info.contract_id.clone(),
            },
            sequence,
        }))
    }

    /// Apply a resolver result for `ticket`.
    pub fn complete_what_if(
        &mut self,
        ticket: WhatIfTicket,
        result: Result<Option<u8>, AppError>,
    ) -> WhatIfOutcome {
        let code = ticket.request.measure_code.as_str();
        if self.latest.get(code) != Some(&ticket.sequence) {
            warn!(code, sequence = ticket.sequence, "discarding superseded what-if result");
            return WhatIfOutcome::Superseded;
        }

        match result {
            Ok(Some(star)) if (1..=TOP_TIER).contains(&star) => {
                self.what_if.set(code, star);
                WhatIfOutcome::Set(star)
            }
            Ok(Some(star)) => {
                let err = AppError::upstream(format!("What-if resolver returned invalid star {star} for {code}."));
                warn!(code, error = %err, "what-if result rejected");
                WhatIfOutcome::Failed(err)
            }
            Ok(None) => {
                self.what_if.unset(code);
                WhatIfOutcome::Unset
            }
            Err(err) => {
                warn!(code, error = %err, "what-if resolution failed; keeping previous state");
                WhatIfOutcome::Failed(err)
            }
        }
    }

    /// Remove any hypothetical star for `code` and supersede in-flight requests.
    pub fn clear_what_if(&mut self, code: &str) -> Result<(), AppError> {
        self.ensure_known(code)?;
        self.bump(code);
        self.what_if.unset(code);
        Ok(())
    }

    /// Request, resolve, and complete a what-if in one step.
    pub fn apply_what_if(
        &mut self,
        resolver: &dyn WhatIfResolver,
        code: &str,
        value: f64,
    ) -> Result<WhatIfOutcome, AppError> {
        let Some(ticket) = self.request_what_if(code, value)? else {
            return Ok(WhatIfOutcome::Unset);
        };
        let result = resolver.resolve(&ticket.request);
        Ok(self.complete_what_if(ticket, result))
    }

    fn bump(&mut self, code: &str) -> u64 {
        self.next_sequence += 1;
        self.latest.insert(code.to_string(), self.next_sequence);
        self.next_sequence
    }

    fn ensure_known(&self, code: &str) -> Result<(), AppError> {
        if self.measure(code).is_some() {
            Ok(())
        } else {
            Err(AppError::input(format!(
                "Unknown measure code '{code}' for contract '{}'.",
                self.info.contract_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FormatType;

    fn measure(code: &str, star: u8, weight: f64) -> Measure {
        Measure {
            code: code.to_string(),
            name: String::new(),
            weight,
            star_rating: Some(star),
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

    fn session() -> Session {
        Session::new(Contract {
            info: ContractInfo {
                contract_id: "H0001".to_string(),
                ..ContractInfo::default()
            },
            measures: vec![measure("C01", 3, 1.0), measure("C02", 4, 3.0)],
        })
        .unwrap()
    }

    #[test]
    fn new_rejects_invalid_and_empty_sets() {
        let err = Session::new(Contract {
            info: ContractInfo::default(),
            measures: vec![measure("C01", 3, -1.0)],
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);

        let err = Session::new(Contract {
            info: ContractInfo::default(),
            measures: vec![],
        })
        .unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_NO_DATA);
    }

    #[test]
    fn resolved_star_is_set_and_none_unsets() {
        let mut s = session();
        let resolver = |req: &WhatIfRequest| -> Result<Option<u8>, AppError> {
            assert_eq!(req.contract_id, "H0001");
            Ok(if req.value >= 84.0 { Some(4) } else { None })
        };

        assert_eq!(s.apply_what_if(&resolver, "C01", 85.0).unwrap(), WhatIfOutcome::Set(4));
        assert_eq!(s.what_if().get("C01"), Some(4));

        assert_eq!(s.apply_what_if(&resolver, "C01", 10.0).unwrap(), WhatIfOutcome::Unset);
        assert_eq!(s.what_if().get("C01"), None);
    }

    #[test]
    fn failure_keeps_previous_state() {
        let mut s = session();
        let ok = |_: &WhatIfRequest| -> Result<Option<u8>, AppError> { Ok(Some(5)) };
        let down = |_: &WhatIfRequest| -> Result<Option<u8>, AppError> { Err(AppError::upstream("offline")) };

        s.apply_what_if(&ok, "C01", 90.0).unwrap();
        let outcome = s.apply_what_if(&down, "C01", 91.0).unwrap();
        assert!(matches!(outcome, WhatIfOutcome::Failed(_)));
        assert_eq!(s.what_if().get("C01"), Some(5));
    }

    #[test]
    fn out_of_range_star_is_rejected() {
        let mut s = session();
        let bad = |_: &WhatIfRequest| -> Result<Option<u8>, AppError> { Ok(Some(7)) };
        let outcome = s.apply_what_if(&bad, "C01", 90.0).unwrap();
        assert!(matches!(outcome, WhatIfOutcome::Failed(_)));
        assert!(s.what_if().is_empty());
    }

    #[test]
    fn newer_request_wins_over_late_result() {
        let mut s = session();
        let older = s.request_what_if("C01", 80.0).unwrap().unwrap();
        let newer = s.request_what_if("C01", 90.0).unwrap().unwrap();

        assert_eq!(s.complete_what_if(newer, Ok(Some(4))), WhatIfOutcome::Set(4));
        assert_eq!(s.complete_what_if(older, Ok(Some(2))), WhatIfOutcome::Superseded);
        assert_eq!(s.what_if().get("C01"), Some(4));
    }

    #[test]
    fn requests_for_different_measures_do_not_interfere() {
        let mut s = session();
        let a = s.request_what_if("C01", 80.0).unwrap().unwrap();
        let b = s.request_what_if("C02", 90.0).unwrap().unwrap();

        assert_eq!(s.complete_what_if(b, Ok(Some(5))), WhatIfOutcome::Set(5));
        assert_eq!(s.complete_what_if(a, Ok(Some(2))), WhatIfOutcome::Set(2));
    }

    #[test]
    fn clearing_supersedes_in_flight_request() {
        let mut s = session();
        let ticket = s.request_what_if("C01", 80.0).unwrap().unwrap();
        assert!(s.request_what_if("C01", 0.0).unwrap().is_none());
        assert_eq!(s.complete_what_if(ticket, Ok(Some(4))), WhatIfOutcome::Superseded);
        assert_eq!(s.what_if().get("C01"), None);
    }

    #[test]
    fn rejects_unknown_codes_and_non_finite_values() {
        let mut s = session();
        assert!(s.request_what_if("Z99", 1.0).is_err());
        assert!(s.request_what_if("C01", f64::NAN).is_err());
        assert!(s.clear_what_if("Z99").is_err());
    }

    #[test]
    fn headline_reflects_what_if() {
        let mut s = session();
        let before = s.headline();
        assert!((before.actual_average - 3.75).abs() < 1e-12);

        let five = |_: &WhatIfRequest| -> Result<Option<u8>, AppError> { Ok(Some(5)) };
        s.apply_what_if(&five, "C01", 95.0).unwrap();
        let after = s.headline();
        assert!((after.actual_average - 3.75).abs() < 1e-12);
        assert!((after.hypothetical_average - 4.25).abs() < 1e-12);
        assert_eq!(s.headline_for(&s.assessments()), after);
    }
}
