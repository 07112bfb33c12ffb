//! Output formatting for the CLI.

use crate::types::BrokerConfig;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

/// Output format for resolved values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }
}

/// Render any serializable value in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    })
}

/// Mask the password of every URL in `url`.
///
/// Sentinel brokers list several URLs separated by `;`; each is masked.
/// `redis://:secret@host:6379/0` becomes `redis://:***@host:6379/0`.
pub fn redact_url(url: &str) -> String {
    url.split(';')
        .map(redact_single_url)
        .collect::<Vec<_>>()
        .join(";")
}

fn redact_single_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest_start = scheme_end + 3;
    let rest = &url[rest_start..];
    let authority = &rest[..rest.find('/').unwrap_or(rest.len())];

    let Some(at) = authority.rfind('@') else {
        return url.to_string();
    };
    let Some(colon) = authority[..at].find(':') else {
        return url.to_string();
    };
    format!(
        "{}{}:{}{}",
        &url[..rest_start],
        &authority[..colon],
        MASK,
        &rest[at..]
    )
}

/// Placeholder for masked secrets.
const MASK: &str = "***";

/// A copy of `config` with credentials masked: URL passwords and the
/// sentinel password in the transport options.
pub fn redact_config(config: &BrokerConfig) -> BrokerConfig {
    let mut broker_transport_options = config.broker_transport_options.clone();
    if let Some(Value::Object(kwargs)) = broker_transport_options.get_mut("sentinel_kwargs")
        && let Some(password) = kwargs.get_mut("password")
        && !password.is_null()
    {
        *password = Value::String(MASK.to_string());
    }

    BrokerConfig {
        broker_url: redact_url(&config.broker_url),
        result_backend: redact_url(&config.result_backend),
        broker_transport_options,
        ..config.clone()
    }
}
