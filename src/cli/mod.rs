//! CLI command definitions for celery-broker-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod check;
pub mod get;
pub mod resolve;

use crate::config::{ConfigLoader, ConfigPaths, DEFAULT_ENV_PREFIX};
use anyhow::Result;
use clap::{Parser, Subcommand};
use check::CheckArgs;
use get::GetArgs;
use resolve::ResolveArgs;
use std::path::PathBuf;

/// Resolve Celery broker and result-backend settings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file (replaces project and user files)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Prefix for `{PREFIX}__{SECTION}__{KEY}` environment overrides
    #[arg(long, default_value = DEFAULT_ENV_PREFIX, global = true)]
    pub env_prefix: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved configuration (default if no subcommand given)
    Resolve(ResolveArgs),

    /// Resolve and report warnings or the error, without printing the record
    Check(CheckArgs),

    /// Print one raw value and the tier that supplied it
    Get(GetArgs),
}

impl Cli {
    /// Load the tiered configuration the flags describe.
    pub fn load_config(&self) -> Result<ConfigLoader> {
        let mut paths = ConfigPaths::discover();
        if let Some(ref file) = self.config {
            paths.explicit_file = Some(file.clone());
        }
        ConfigLoader::load_with(paths, &self.env_prefix, std::env::vars())
    }
}
