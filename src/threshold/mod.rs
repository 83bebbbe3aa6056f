//! Threshold bands: parsing CMS cut-point strings and resolving raw bounds.
//!
//! - `parse`: `">= 71 % to < 76 %"` → `ThresholdBand` (operators preserved)
//! - `band`: raw, possibly open-ended bounds → `ResolvedBand` usable by the classifier

pub mod band;
pub mod parse;

pub use band::*;
pub use parse::*;
