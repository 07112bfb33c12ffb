//! Resolution errors and their machine-readable report form.

use crate::config::ConfigError;
use serde::Serialize;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or malformed option
    ConfigError,
    /// A value has the wrong shape
    ValidationError,
    /// SSL requested on a broker that cannot carry it
    UnsupportedScheme,
}

/// Why a [`BrokerConfig`](crate::types::BrokerConfig) could not be resolved.
///
/// Every variant is terminal: the Celery client must not start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("sentinel_kwargs should be written in the correct dictionary format.")]
    InvalidSentinelKwargs,

    #[error("{section}/{key} should be a JSON object")]
    NotAMapping { section: String, key: String },

    #[error(
        "The broker you configured does not support SSL_ACTIVE to be True. \
         Please use RabbitMQ or Redis if you would like to use SSL for broker."
    )]
    UnsupportedSslBroker { scheme: String },

    #[error(
        "SSL_ACTIVE is True, please ensure SSL_KEY, SSL_CERT and SSL_CACERT are set ({source})"
    )]
    SslOptionsMissing { source: ConfigError },

    #[error(
        "There was an unknown Celery SSL Error. Please ensure you want to use SSL \
         and/or have all necessary certs and key ({source})."
    )]
    Ssl { source: ConfigError },
}

impl ResolveError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ResolveError::Config(_)
            | ResolveError::SslOptionsMissing { .. }
            | ResolveError::Ssl { .. } => ErrorCode::ConfigError,
            ResolveError::InvalidSentinelKwargs | ResolveError::NotAMapping { .. } => {
                ErrorCode::ValidationError
            }
            ResolveError::UnsupportedSslBroker { .. } => ErrorCode::UnsupportedScheme,
        }
    }

    /// The `(section, key)` the error is about, when there is one.
    pub fn location(&self) -> Option<(&str, &str)> {
        match self {
            ResolveError::Config(e)
            | ResolveError::SslOptionsMissing { source: e }
            | ResolveError::Ssl { source: e } => e.location(),
            ResolveError::InvalidSentinelKwargs => {
                Some(("celery_broker_transport_options", "sentinel_kwargs"))
            }
            ResolveError::NotAMapping { section, key } => Some((section.as_str(), key.as_str())),
            ResolveError::UnsupportedSslBroker { .. } => Some(("celery", "broker_url")),
        }
    }

    pub fn report(&self) -> ErrorReport {
        let (section, key) = match self.location() {
            Some((section, key)) => (Some(section.to_string()), Some(key.to_string())),
            None => (None, None),
        };
        ErrorReport {
            code: self.code(),
            message: self.to_string(),
            section,
            key,
        }
    }
}

/// Structured error for CLI output.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
