//! Reporting: headline aggregation, CAI adjustment, and terminal output.

pub mod aggregate;
pub mod cai;
pub mod format;

pub use aggregate::{Headline, StatusCounts, star_distribution, summarize, summarize_assessed, weighted_average};
