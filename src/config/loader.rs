//! Configuration loader with tier-based merging.
//!
//! Builds a [`ConfigStore`] from embedded defaults, YAML files and
//! environment variables.

use super::store::ConfigStore;
use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Embedded defaults, applied before any file or environment tier.
const DEFAULTS_YAML: &str = include_str!("../../config/defaults.yaml");

/// Name of the YAML file looked up in the project and user directories.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default prefix for `{PREFIX}__{SECTION}__{KEY}` environment overrides.
pub const DEFAULT_ENV_PREFIX: &str = "AIRFLOW";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Embedded defaults (lowest priority)
    Defaults = 0,
    /// Project-level config (`$CWD/celery-config/config.yaml`) or an explicit file
    Project = 1,
    /// User-level config (`~/.celery-config/config.yaml`)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Locations of the file tiers.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Explicit config file; replaces the project and user tiers when set
    pub explicit_file: Option<PathBuf>,
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let explicit_file = std::env::var("CELERY_CONFIG_PATH").ok().map(PathBuf::from);

        // Project dir: CELERY_CONFIG_PROJECT_DIR or $CWD/celery-config
        let project_dir = std::env::var("CELERY_CONFIG_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("celery-config")));

        // User dir: CELERY_CONFIG_USER_DIR or ~/.celery-config
        let user_dir = std::env::var("CELERY_CONFIG_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".celery-config")));

        Self {
            explicit_file,
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            explicit_file: None,
            project_dir,
            user_dir,
        }
    }

    /// Create paths that read a single explicit file.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            explicit_file: Some(path.into()),
            project_dir: None,
            user_dir: None,
        }
    }

    /// The YAML files to read, lowest priority first, with their tier.
    fn file_tiers(&self) -> Vec<(PathBuf, ConfigTier)> {
        if let Some(ref path) = self.explicit_file {
            return vec![(path.clone(), ConfigTier::Project)];
        }

        let mut files = Vec::new();
        if let Some(ref dir) = self.project_dir {
            files.push((dir.join(CONFIG_FILE_NAME), ConfigTier::Project));
        }
        if let Some(ref dir) = self.user_dir {
            files.push((dir.join(CONFIG_FILE_NAME), ConfigTier::User));
        }
        files
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Paths for each tier
    pub paths: ConfigPaths,
    /// Merged configuration
    store: ConfigStore,
    /// Files that contributed to the store
    loaded_files: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Load from discovered paths and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load with explicit paths and the process environment.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        Self::load_with(paths, DEFAULT_ENV_PREFIX, std::env::vars())
    }

    /// Load with explicit paths, environment prefix and environment variables.
    pub fn load_with(
        paths: ConfigPaths,
        env_prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let mut store = ConfigStore::new();

        // Tier 1: Defaults (embedded)
        let defaults = parse_yaml(DEFAULTS_YAML).context("invalid embedded defaults")?;
        store
            .apply_document(defaults, ConfigTier::Defaults)
            .context("invalid embedded defaults")?;

        // Tiers 2-3: Project and user files
        let mut loaded_files = Vec::new();
        for (path, tier) in paths.file_tiers() {
            if !path.exists() {
                if paths.explicit_file.is_some() {
                    return Err(anyhow!("config file not found: {}", path.display()));
                }
                continue;
            }
            let document = read_yaml_file(&path)?;
            store
                .apply_document(document, tier)
                .with_context(|| format!("invalid config file {}", path.display()))?;
            debug!(path = %path.display(), tier = %tier, "Loaded config file");
            loaded_files.push(path);
        }

        // Tier 4: Environment variable overrides
        Self::apply_env_overrides(&mut store, env_prefix, vars);

        Ok(Self {
            paths,
            store,
            loaded_files,
        })
    }

    /// Apply `{PREFIX}__{SECTION}__{KEY}` variables to the store.
    fn apply_env_overrides(
        store: &mut ConfigStore,
        env_prefix: &str,
        vars: impl IntoIterator<Item = (String, String)>,
    ) {
        let prefix = format!("{}__", env_prefix);
        for (name, value) in vars {
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once("__") {
                Some((section, key)) if !section.is_empty() && !key.is_empty() => {
                    debug!(section = %section.to_lowercase(), key = %key.to_lowercase(), "Environment override");
                    store.set(section, key, Value::String(value), ConfigTier::Environment);
                }
                _ => debug!(variable = %name, "Ignoring malformed environment override"),
            }
        }
    }

    /// Get the merged configuration.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Consume the loader and return the merged configuration.
    pub fn into_store(self) -> ConfigStore {
        self.store
    }

    /// Files that were found and applied, lowest priority first.
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded_files
    }
}

fn read_yaml_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_yaml(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_yaml(content: &str) -> Result<Value> {
    Ok(serde_yaml::from_str::<Value>(content)?)
}
