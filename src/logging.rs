//! Tracing setup. Logs go to stderr; stdout stays reserved for reports.

use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV: &str = "STARS_LOG";

/// Default filter for a `-v` count when `STARS_LOG` is unset.
pub fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    // A second call (e.g. from tests) finds a subscriber already set.
    let _ = fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
