//! `check` subcommand: validate the configuration and list advisories.

use crate::config::ConfigStore;
use crate::error::ErrorReport;
use crate::logging::{LogLevel, LogLevelFilter, LogRecord, Logger};
use crate::resolver::resolve;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the check subcommand
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,
}

/// Outcome of a check, printed as JSON.
#[derive(Debug, Serialize)]
pub struct CheckOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<LogRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

pub fn run_check(store: &ConfigStore, args: &CheckArgs) -> CheckOutcome {
    let logger = Logger::capturing()
        .with_level_filter(Arc::new(LogLevelFilter::new(LogLevel::Warning)))
        .with_name("check");
    let result = resolve(store, &logger);
    let warnings = logger.records();

    match result {
        Ok(_) => CheckOutcome {
            ok: !(args.strict && !warnings.is_empty()),
            warnings,
            error: None,
        },
        Err(e) => CheckOutcome {
            ok: false,
            warnings,
            error: Some(e.report()),
        },
    }
}
