// src/logging.rs

//! Subscriber setup. Output goes to stderr; stdout is reserved for JSON.
//!
//! `--log-level` wins over `WAYFINDER_LOG`. The variable takes full
//! `EnvFilter` directives, so `WAYFINDER_LOG=wayfinder::engine=debug` narrows
//! debug output to the engine. Anything unparsable falls back to `info`.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Environment variable read when no level is given on the command line.
pub const LOG_ENV: &str = "WAYFINDER_LOG";

pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(cli_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

/// The filter `init_logging` installs.
pub fn filter_for(cli_level: Option<LogLevel>) -> EnvFilter {
    match cli_level {
        Some(level) => EnvFilter::new(level.directive()),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
