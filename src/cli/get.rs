//! `get` subcommand: look up a single raw value.

use crate::config::ConfigStore;
use anyhow::{Result, anyhow};
use clap::Args;

/// Arguments for the get subcommand
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Section name, e.g. `celery`
    pub section: String,

    /// Key name, e.g. `broker_url` (case-insensitive)
    pub key: String,
}

/// Render `section`/`key` as `value  (tier)`.
pub fn run_get(store: &ConfigStore, args: &GetArgs) -> Result<String> {
    let entry = store.entry(&args.section, &args.key).ok_or_else(|| {
        anyhow!(
            "section/key [{}/{}] not found in config",
            args.section.to_lowercase(),
            args.key.to_lowercase()
        )
    })?;

    let value = match entry.value {
        serde_json::Value::String(ref s) => s.clone(),
        ref other => other.to_string(),
    };
    Ok(format!("{}\t({})", value, entry.tier))
}
