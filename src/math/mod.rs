//! Numeric helpers: half-up rounding and fixed-decimal formatting.

pub mod rounding;

pub use rounding::*;
