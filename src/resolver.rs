//! Broker and result-backend resolution.
//!
//! [`resolve`] reads the `celery`, `celery_broker_transport_options`,
//! `operators` and `database` sections of a [`ConfigSource`] and assembles
//! the [`BrokerConfig`] a Celery client starts from. It runs once, performs
//! no I/O beyond the source reads and log calls, and either returns a
//! complete record or a terminal [`ResolveError`].

use crate::config::{ConfigError, ConfigSource};
use crate::error::{ResolveError, ResolveResult};
use crate::format::redact_url;
use crate::logging::Logger;
use crate::types::{
    BrokerConfig, BrokerSsl, CertRequirement, DEFAULT_VISIBILITY_TIMEOUT, SslKeyStyle,
};
use regex_lite::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;

const CELERY: &str = "celery";
const TRANSPORT_OPTIONS: &str = "celery_broker_transport_options";

/// Broker URL prefixes whose transports honour `visibility_timeout`.
const VISIBILITY_TIMEOUT_PREFIXES: [&str; 4] = ["redis://", "rediss://", "sqs://", "sentinel://"];

/// Brokers that take the `ssl_`-prefixed option names.
static REDIS_SSL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("rediss?://|sentinel://").expect("valid broker pattern"));

/// Result backends that are not a database.
static NON_DATABASE_BACKEND_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("rediss?://|amqp://|rpc://").expect("valid backend pattern"));

/// Resolve the Celery configuration from `source`.
///
/// Advisory messages (SSL disabled, non-database result backend) go to
/// `logger`; they never fail the resolution.
pub fn resolve<S>(source: &S, logger: &Logger) -> ResolveResult<BrokerConfig>
where
    S: ConfigSource + ?Sized,
{
    let broker_url = source.get_string(CELERY, "BROKER_URL")?;
    let broker_transport_options = broker_transport_options(source, &broker_url)?;
    let result_backend = result_backend(source, logger)?;

    let default_queue = source.get_string("operators", "DEFAULT_QUEUE")?;
    let database_engine_options = json_mapping(
        source,
        CELERY,
        "result_backend_sqlalchemy_engine_options",
    )?;

    let mut config = BrokerConfig {
        accept_content: vec!["json".to_string()],
        event_serializer: "json".to_string(),
        worker_prefetch_multiplier: source.get_int(CELERY, "worker_prefetch_multiplier")?,
        task_acks_late: true,
        task_default_queue: default_queue.clone(),
        task_default_exchange: default_queue,
        task_track_started: source.get_bool(CELERY, "task_track_started")?,
        broker_url,
        broker_transport_options,
        result_backend,
        database_engine_options,
        worker_concurrency: source.get_int(CELERY, "WORKER_CONCURRENCY")?,
        worker_enable_remote_control: source.get_bool(CELERY, "worker_enable_remote_control")?,
        broker_use_ssl: None,
    };

    if ssl_active(source, logger)? {
        config.broker_use_ssl = Some(broker_use_ssl(source, &config.broker_url)?);
    }

    if NON_DATABASE_BACKEND_PATTERN.is_match(&config.result_backend) {
        logger.warning(&format!(
            "You have configured a result_backend of {}, it is highly recommended \
             to use an alternative result_backend (i.e. a database).",
            redact_url(&config.result_backend)
        ));
    }

    debug!(
        broker_url = %redact_url(&config.broker_url),
        ssl = config.broker_use_ssl.is_some(),
        "Resolved Celery configuration"
    );
    Ok(config)
}

/// Whether the broker transport supports a visibility timeout.
pub fn broker_supports_visibility_timeout(broker_url: &str) -> bool {
    VISIBILITY_TIMEOUT_PREFIXES
        .iter()
        .any(|prefix| broker_url.starts_with(prefix))
}

/// The transport options section, with the visibility-timeout default and
/// `sentinel_kwargs` validated.
fn broker_transport_options<S>(source: &S, broker_url: &str) -> ResolveResult<Map<String, Value>>
where
    S: ConfigSource + ?Sized,
{
    let mut options = source.get_section(TRANSPORT_OPTIONS)?.unwrap_or_default();

    if !options.contains_key("visibility_timeout") && broker_supports_visibility_timeout(broker_url)
    {
        options.insert(
            "visibility_timeout".to_string(),
            Value::from(DEFAULT_VISIBILITY_TIMEOUT),
        );
    }

    if let Some(sentinel_kwargs) = options.get("sentinel_kwargs")
        && !sentinel_kwargs.is_object()
    {
        return Err(ResolveError::InvalidSentinelKwargs);
    }

    Ok(options)
}

fn result_backend<S>(source: &S, logger: &Logger) -> ResolveResult<String>
where
    S: ConfigSource + ?Sized,
{
    if source.has_option(CELERY, "RESULT_BACKEND")? {
        return Ok(source.get_mandatory(CELERY, "RESULT_BACKEND")?);
    }

    logger.debug(
        "Value for celery result_backend not found. Using sql_alchemy_conn with db+ prefix.",
    );
    let sql_alchemy_conn = source.get_string("database", "SQL_ALCHEMY_CONN")?;
    Ok(format!("db+{}", sql_alchemy_conn))
}

/// `SSL_ACTIVE`, treating a missing or unreadable option as disabled.
fn ssl_active<S>(source: &S, logger: &Logger) -> ResolveResult<bool>
where
    S: ConfigSource + ?Sized,
{
    match source.get_bool(CELERY, "SSL_ACTIVE") {
        Ok(active) => Ok(active),
        Err(e) if e.is_option_error() => {
            debug!(error = %e, "SSL_ACTIVE not usable");
            logger.warning("Celery Executor will run without SSL");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn broker_use_ssl<S>(source: &S, broker_url: &str) -> ResolveResult<BrokerSsl>
where
    S: ConfigSource + ?Sized,
{
    let style = if !broker_url.is_empty() && broker_url.contains("amqp://") {
        SslKeyStyle::Plain
    } else if !broker_url.is_empty() && REDIS_SSL_PATTERN.is_match(broker_url) {
        SslKeyStyle::Prefixed
    } else {
        return Err(ResolveError::UnsupportedSslBroker {
            scheme: scheme_of(broker_url).to_string(),
        });
    };

    // Blank paths are passed through; only an unset option is reported as missing.
    let read = |key: &str| {
        source.get_string(CELERY, key).map_err(|e| match e {
            ConfigError::Missing { .. } => ResolveError::SslOptionsMissing { source: e },
            _ => ResolveError::Ssl { source: e },
        })
    };

    Ok(BrokerSsl {
        style,
        keyfile: read("SSL_KEY")?,
        certfile: read("SSL_CERT")?,
        ca_certs: read("SSL_CACERT")?,
        cert_reqs: CertRequirement::Required,
    })
}

/// A JSON option that must hold an object; absent or blank means `{}`.
fn json_mapping<S>(source: &S, section: &str, key: &str) -> ResolveResult<Map<String, Value>>
where
    S: ConfigSource + ?Sized,
{
    match source.get_json(section, key, Value::Object(Map::new()))? {
        Value::Object(map) => Ok(map),
        _ => Err(ResolveError::NotAMapping {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn scheme_of(url: &str) -> &str {
    url.split_once("://").map(|(scheme, _)| scheme).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_timeout_prefixes() {
        assert!(broker_supports_visibility_timeout("redis://redis:6379/0"));
        assert!(broker_supports_visibility_timeout("rediss://redis:6380/0"));
        assert!(broker_supports_visibility_timeout("sqs://"));
        assert!(broker_supports_visibility_timeout("sentinel://s1:26379"));
        assert!(!broker_supports_visibility_timeout("amqp://guest@rabbit//"));
        assert!(!broker_supports_visibility_timeout("REDIS://redis:6379/0"));
        assert!(!broker_supports_visibility_timeout(""));
    }

    #[test]
    fn test_patterns_are_unanchored() {
        assert!(REDIS_SSL_PATTERN.is_match("rediss://cache:6380/0"));
        assert!(REDIS_SSL_PATTERN.is_match("redis://cache:6379/0"));
        assert!(REDIS_SSL_PATTERN.is_match("sentinel://s1:26379"));
        assert!(!REDIS_SSL_PATTERN.is_match("sqs://"));

        assert!(NON_DATABASE_BACKEND_PATTERN.is_match("rpc://"));
        assert!(NON_DATABASE_BACKEND_PATTERN.is_match("x-amqp://host"));
        assert!(!NON_DATABASE_BACKEND_PATTERN.is_match("db+postgresql://airflow@db/airflow"));
    }

    #[test]
    fn test_scheme_of() {
        assert_eq!(scheme_of("sqs://queue"), "sqs");
        assert_eq!(scheme_of("no-scheme"), "");
    }
}
