//! End-to-end tests: tiered loading feeding the resolver and CLI commands.

use celery_broker_config::cli::check::{CheckArgs, run_check};
use celery_broker_config::cli::get::{GetArgs, run_get};
use celery_broker_config::cli::resolve::{ResolveArgs, run_resolve};
use celery_broker_config::config::{
    CONFIG_FILE_NAME, ConfigLoader, ConfigPaths, ConfigStore, DEFAULT_ENV_PREFIX,
};
use celery_broker_config::error::ErrorCode;
use celery_broker_config::logging::Logger;
use celery_broker_config::resolve;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

/// Load a store from an optional project file and a set of env overrides.
fn load_store(temp: &TempDir, project_yaml: Option<&str>, env: &[(&str, &str)]) -> ConfigStore {
    let project_dir = temp.path().join("celery-config");
    if let Some(yaml) = project_yaml {
        fs::create_dir_all(&project_dir).unwrap();
        fs::write(project_dir.join(CONFIG_FILE_NAME), yaml).unwrap();
    }
    let paths = ConfigPaths::with_dirs(Some(project_dir), Some(temp.path().join("user")));
    let vars = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<Vec<_>>();
    ConfigLoader::load_with(paths, DEFAULT_ENV_PREFIX, vars)
        .expect("Failed to load config")
        .into_store()
}

#[test]
fn test_defaults_resolve_cleanly() {
    let temp = TempDir::new().unwrap();
    let store = load_store(&temp, None, &[]);
    let logger = Logger::capturing();

    let config = resolve(&store, &logger).unwrap();

    assert_eq!(config.broker_url, "redis://redis:6379/0");
    assert_eq!(config.result_backend, "db+sqlite:///airflow.db");
    assert_eq!(config.worker_concurrency, 16);
    assert_eq!(config.worker_prefetch_multiplier, 1);
    assert_eq!(config.task_default_queue, "default");
    assert_eq!(
        config.broker_transport_options.get("visibility_timeout"),
        Some(&json!(21600))
    );
    assert!(config.broker_use_ssl.is_none());
}

#[test]
fn test_yaml_sentinel_kwargs_mapping_accepted() {
    let temp = TempDir::new().unwrap();
    let yaml = r#"
celery:
  broker_url: "sentinel://s1:26379;sentinel://s2:26379"
celery_broker_transport_options:
  master_name: mymaster
  sentinel_kwargs:
    password: s3cret
"#;
    let store = load_store(&temp, Some(yaml), &[]);
    let config = resolve(&store, &Logger::new()).unwrap();

    assert_eq!(
        config.broker_transport_options.get("sentinel_kwargs"),
        Some(&json!({"password": "s3cret"}))
    );
    assert_eq!(
        config.broker_transport_options.get("master_name"),
        Some(&json!("mymaster"))
    );
}

#[test]
fn test_env_sentinel_kwargs_string_rejected() {
    let temp = TempDir::new().unwrap();
    let store = load_store(
        &temp,
        None,
        &[(
            "AIRFLOW__CELERY_BROKER_TRANSPORT_OPTIONS__SENTINEL_KWARGS",
            r#"{"password": "s3cret"}"#,
        )],
    );
    let err = resolve(&store, &Logger::new()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[test]
fn test_env_enables_ssl_for_amqp() {
    let temp = TempDir::new().unwrap();
    let store = load_store(
        &temp,
        Some("celery:\n  broker_url: amqp://guest@rabbit:5671//\n"),
        &[
            ("AIRFLOW__CELERY__SSL_ACTIVE", "True"),
            ("AIRFLOW__CELERY__SSL_KEY", "/certs/client.key"),
            ("AIRFLOW__CELERY__SSL_CERT", "/certs/client.pem"),
            ("AIRFLOW__CELERY__SSL_CACERT", "/certs/ca.pem"),
        ],
    );
    let config = resolve(&store, &Logger::new()).unwrap();

    assert_eq!(
        serde_json::to_value(config.broker_use_ssl.unwrap()).unwrap(),
        json!({
            "keyfile": "/certs/client.key",
            "certfile": "/certs/client.pem",
            "ca_certs": "/certs/ca.pem",
            "cert_reqs": "CERT_REQUIRED"
        })
    );
}

#[test]
fn test_ssl_with_default_blank_certs_uses_empty_paths() {
    let temp = TempDir::new().unwrap();
    let store = load_store(&temp, None, &[("AIRFLOW__CELERY__SSL_ACTIVE", "true")]);
    let config = resolve(&store, &Logger::new()).unwrap();

    assert_eq!(
        serde_json::to_value(config.broker_use_ssl.unwrap()).unwrap(),
        json!({
            "ssl_keyfile": "",
            "ssl_certfile": "",
            "ssl_ca_certs": "",
            "ssl_cert_reqs": "CERT_REQUIRED"
        })
    );
}

#[test]
fn test_run_resolve_masks_secrets_by_default() {
    let temp = TempDir::new().unwrap();
    let store = load_store(
        &temp,
        None,
        &[("AIRFLOW__CELERY__BROKER_URL", "redis://:hunter2@cache:6379/0")],
    );

    let masked = run_resolve(&store, &ResolveArgs::default()).unwrap();
    assert!(!masked.contains("hunter2"));
    let parsed: Value = serde_json::from_str(&masked).unwrap();
    assert_eq!(parsed["broker_url"], json!("redis://:***@cache:6379/0"));

    let args = ResolveArgs {
        format: "yaml".to_string(),
        show_secrets: true,
    };
    let shown = run_resolve(&store, &args).unwrap();
    assert!(shown.contains("redis://:hunter2@cache:6379/0"));
}

#[test]
fn test_run_resolve_masks_sentinel_password() {
    let temp = TempDir::new().unwrap();
    let yaml = r#"
celery:
  broker_url: "sentinel://s1:26379"
celery_broker_transport_options:
  sentinel_kwargs:
    password: s3cret
"#;
    let store = load_store(&temp, Some(yaml), &[]);

    let masked = run_resolve(&store, &ResolveArgs::default()).unwrap();
    assert!(!masked.contains("s3cret"));
    let parsed: Value = serde_json::from_str(&masked).unwrap();
    assert_eq!(
        parsed["broker_transport_options"]["sentinel_kwargs"]["password"],
        json!("***")
    );
}

#[test]
fn test_run_resolve_rejects_unknown_format() {
    let temp = TempDir::new().unwrap();
    let store = load_store(&temp, None, &[]);
    let args = ResolveArgs {
        format: "toml".to_string(),
        show_secrets: false,
    };
    assert!(run_resolve(&store, &args).is_err());
}

#[test]
fn test_run_check_reports_warnings_and_strictness() {
    let temp = TempDir::new().unwrap();
    let store = load_store(&temp, None, &[("AIRFLOW__CELERY__RESULT_BACKEND", "rpc://")]);

    let lenient = run_check(&store, &CheckArgs { strict: false });
    assert!(lenient.ok);
    assert_eq!(lenient.warnings.len(), 1);
    assert!(lenient.error.is_none());

    let strict = run_check(&store, &CheckArgs { strict: true });
    assert!(!strict.ok);
}

#[test]
fn test_run_check_reports_error() {
    let temp = TempDir::new().unwrap();
    let store = load_store(
        &temp,
        None,
        &[
            ("AIRFLOW__CELERY__BROKER_URL", "sqs://"),
            ("AIRFLOW__CELERY__SSL_ACTIVE", "1"),
        ],
    );

    let outcome = run_check(&store, &CheckArgs { strict: false });
    assert!(!outcome.ok);
    let report = serde_json::to_value(outcome.error.unwrap()).unwrap();
    assert_eq!(report["code"], json!("UNSUPPORTED_SCHEME"));
}

#[test]
fn test_run_get_shows_tier() {
    let temp = TempDir::new().unwrap();
    let store = load_store(
        &temp,
        Some("celery:\n  worker_concurrency: 8\n"),
        &[("AIRFLOW__OPERATORS__DEFAULT_QUEUE", "high")],
    );

    let get = |section: &str, key: &str| {
        run_get(
            &store,
            &GetArgs {
                section: section.to_string(),
                key: key.to_string(),
            },
        )
    };

    assert_eq!(get("celery", "WORKER_CONCURRENCY").unwrap(), "8\t(project)");
    assert_eq!(get("operators", "default_queue").unwrap(), "high\t(environment)");
    assert_eq!(
        get("celery", "broker_url").unwrap(),
        "redis://redis:6379/0\t(defaults)"
    );
    assert!(get("celery", "result_backend").is_err());
}
