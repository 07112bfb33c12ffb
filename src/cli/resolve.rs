//! `resolve` subcommand: print the resolved Celery configuration.

use crate::config::ConfigStore;
use crate::format::{OutputFormat, redact_config, render};
use crate::logging::Logger;
use crate::resolver::resolve;
use anyhow::{Result, anyhow};
use clap::Args;

/// Arguments for the resolve subcommand
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Output format: json or yaml
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Print URL passwords instead of masking them
    #[arg(long)]
    pub show_secrets: bool,
}

impl Default for ResolveArgs {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            show_secrets: false,
        }
    }
}

/// Resolve and render the configuration.
///
/// Resolution errors are returned as `Err`; the caller decides how to
/// report them.
pub fn run_resolve(store: &ConfigStore, args: &ResolveArgs) -> Result<String> {
    let format = OutputFormat::from_str(&args.format)
        .ok_or_else(|| anyhow!("unknown output format '{}'", args.format))?;

    let logger = Logger::new().with_name("resolve");
    let config = resolve(store, &logger)?;

    if args.show_secrets {
        render(&config, format)
    } else {
        render(&redact_config(&config), format)
    }
}
