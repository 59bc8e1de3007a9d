#![forbid(unsafe_code)]

pub mod cli;
pub mod error;
pub mod simulate;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "STUDY_LOG";

/// Stderr logging filtered by `STUDY_LOG`, `info` when unset or invalid.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
