//! `stars-risk` library crate.
//!
//! The binary (`stars`) is a thin wrapper around this library so that:
//!
//! - the classification engine is testable without spawning processes
//! - the same session/what-if logic can back other front-ends

pub mod app;
pub mod classify;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod report;
pub mod session;
pub mod threshold;
