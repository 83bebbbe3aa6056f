//! Domain types used throughout the analyzer.
//!
//! This module defines:
//!
//! - measure records and contract metadata (`Measure`, `Contract`)
//! - classification outputs (`ResolvedBand`, `Position`, `RiskStatus`)
//! - the resolved run configuration (`AnalyzerConfig`)

pub mod types;

pub use types::*;
