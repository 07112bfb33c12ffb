//! Sectioned configuration: the source capability and a tiered store.
//!
//! Values are looked up by `(section, key)`, case-insensitively. The
//! [`ConfigLoader`] merges four tiers, lowest priority first:
//! 1. **Defaults** - Embedded at build time from `./config/defaults.yaml`
//! 2. **Project** - `$CWD/celery-config/config.yaml` (or an explicit file)
//! 3. **User** - `~/.celery-config/config.yaml`
//! 4. **Environment** - `AIRFLOW__{SECTION}__{KEY}` variables
//!
//! ## Environment Variables
//! - `CELERY_CONFIG_PATH` - Explicit config file (replaces project and user files)
//! - `CELERY_CONFIG_PROJECT_DIR` - Project config dir (default: `./celery-config`)
//! - `CELERY_CONFIG_USER_DIR` - User config dir (default: `~/.celery-config`)

mod loader;
mod merge;
mod source;
mod store;

pub use loader::{CONFIG_FILE_NAME, ConfigLoader, ConfigPaths, ConfigTier, DEFAULT_ENV_PREFIX};
pub use merge::deep_merge;
pub use source::{ConfigError, ConfigSource, coerce_scalar, parse_bool, parse_int};
pub use store::{ConfigStore, StoredValue};
