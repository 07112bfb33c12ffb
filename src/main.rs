//! celery-broker-config
//!
//! Loads the tiered configuration and prints the Celery broker and
//! result-backend settings resolved from it.

use anyhow::Result;
use celery_broker_config::cli::check::run_check;
use celery_broker_config::cli::get::run_get;
use celery_broker_config::cli::resolve::{ResolveArgs, run_resolve};
use celery_broker_config::cli::{Cli, Command};
use celery_broker_config::config::ConfigStore;
use celery_broker_config::error::ResolveError;
use celery_broker_config::logging::init_subscriber;
use clap::Parser;
use std::process::ExitCode;
use tracing::debug;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_subscriber(&cli.log, cli.verbose)?;

    let loader = cli.load_config()?;
    for path in loader.loaded_files() {
        debug!(path = %path.display(), "Using config file");
    }
    let store = loader.into_store();

    match cli.command {
        Some(Command::Check(args)) => {
            let outcome = run_check(&store, &args);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(if outcome.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Some(Command::Get(args)) => {
            println!("{}", run_get(&store, &args)?);
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Resolve(args)) => print_resolved(&store, &args),
        None => print_resolved(&store, &ResolveArgs::default()),
    }
}

fn print_resolved(store: &ConfigStore, args: &ResolveArgs) -> Result<ExitCode> {
    match run_resolve(store, args) {
        Ok(rendered) => {
            println!("{}", rendered);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => match err.downcast::<ResolveError>() {
            Ok(resolve_err) => {
                eprintln!("{}", serde_json::to_string_pretty(&resolve_err.report())?);
                Ok(ExitCode::FAILURE)
            }
            Err(other) => Err(other),
        },
    }
}
