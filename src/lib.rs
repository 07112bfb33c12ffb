//! Celery broker configuration library
//!
//! Resolves the broker and result-backend settings a Celery client starts
//! from, reading them out of a tiered, sectioned configuration store.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod resolver;
pub mod types;

pub use config::{ConfigError, ConfigLoader, ConfigSource, ConfigStore};
pub use error::{ErrorCode, ResolveError};
pub use logging::Logger;
pub use resolver::resolve;
pub use types::BrokerConfig;
