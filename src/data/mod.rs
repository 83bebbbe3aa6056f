//! Measure metadata and measure-service access.

pub mod catalog;
pub mod client;
pub mod cutpoints;
pub mod values;
