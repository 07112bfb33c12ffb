//! Logging: subscriber setup and the injectable [`Logger`] sink.
//!
//! The resolver never calls `tracing` directly for user-facing advisories;
//! it goes through a [`Logger`], which forwards to `tracing` and can also
//! keep the records in memory so callers can report them.

use anyhow::Result;
use serde::Serialize;
use std::fs::OpenOptions;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU8, Ordering},
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Severity of a [`Logger`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic minimum-level filter shared between logger clones.
///
/// The level is stored as a u8: 0=Debug, 1=Info, 2=Warning, 3=Error
pub struct LogLevelFilter(AtomicU8);

impl LogLevelFilter {
    pub fn new(level: LogLevel) -> Self {
        Self(AtomicU8::new(level_to_u8(level)))
    }

    /// Check if a message at the given level should be logged.
    pub fn should_log(&self, level: LogLevel) -> bool {
        level_to_u8(level) >= self.0.load(Ordering::Relaxed)
    }
}

impl Default for LogLevelFilter {
    fn default() -> Self {
        Self::new(LogLevel::Debug)
    }
}

fn level_to_u8(level: LogLevel) -> u8 {
    match level {
        LogLevel::Debug => 0,
        LogLevel::Info => 1,
        LogLevel::Warning => 2,
        LogLevel::Error => 3,
    }
}

pub fn log_level_to_tracing(level: LogLevel) -> Level {
    match level {
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warning => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

/// A message kept by a capturing [`Logger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

/// Logger handed to the resolver.
///
/// Outputs to:
/// 1. tracing (stderr/stdout/file, per the installed subscriber) - always
/// 2. an in-memory buffer - if created with [`Logger::capturing`]
#[derive(Clone)]
pub struct Logger {
    level_filter: Arc<LogLevelFilter>,
    /// Logger name/category.
    name: Option<String>,
    captured: Option<Arc<Mutex<Vec<LogRecord>>>>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            level_filter: Arc::new(LogLevelFilter::default()),
            name: None,
            captured: None,
        }
    }

    /// A logger that also keeps every accepted record in memory.
    pub fn capturing() -> Self {
        Self {
            captured: Some(Arc::new(Mutex::new(Vec::new()))),
            ..Self::new()
        }
    }

    pub fn with_level_filter(mut self, filter: Arc<LogLevelFilter>) -> Self {
        self.level_filter = filter;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if !self.level_filter.should_log(level) {
            return;
        }

        let logger = self.name.as_deref().unwrap_or("celery");
        match log_level_to_tracing(level) {
            Level::ERROR => tracing::error!(logger = %logger, "{}", message),
            Level::WARN => tracing::warn!(logger = %logger, "{}", message),
            Level::INFO => tracing::info!(logger = %logger, "{}", message),
            _ => tracing::debug!(logger = %logger, "{}", message),
        }

        if let Some(ref captured) = self.captured
            && let Ok(mut records) = captured.lock()
        {
            records.push(LogRecord {
                level,
                message: message.to_string(),
            });
        }
    }

    pub fn debug(&self, msg: &str) {
        self.log(LogLevel::Debug, msg);
    }

    pub fn warning(&self, msg: &str) {
        self.log(LogLevel::Warning, msg);
    }

    /// Records captured so far (empty for a non-capturing logger).
    pub fn records(&self) -> Vec<LogRecord> {
        self.captured
            .as_ref()
            .and_then(|captured| captured.lock().ok().map(|records| records.clone()))
            .unwrap_or_default()
    }

    /// Captured records at or above `level`.
    pub fn records_at_least(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.level >= level)
            .collect()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the global tracing subscriber.
///
/// `target` is `0`/`off`, `1`/`stdout`, `2`/`stderr`, or a file path that is
/// appended to.
pub fn init_subscriber(target: &str, verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    match target {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter() {
        let filter = LogLevelFilter::new(LogLevel::Warning);

        assert!(!filter.should_log(LogLevel::Debug));
        assert!(!filter.should_log(LogLevel::Info));
        assert!(filter.should_log(LogLevel::Warning));
        assert!(filter.should_log(LogLevel::Error));
    }

    #[test]
    fn test_log_level_to_tracing() {
        assert_eq!(log_level_to_tracing(LogLevel::Debug), Level::DEBUG);
        assert_eq!(log_level_to_tracing(LogLevel::Info), Level::INFO);
        assert_eq!(log_level_to_tracing(LogLevel::Warning), Level::WARN);
        assert_eq!(log_level_to_tracing(LogLevel::Error), Level::ERROR);
    }

    #[test]
    fn test_capturing_logger_respects_filter() {
        let logger = Logger::capturing()
            .with_level_filter(Arc::new(LogLevelFilter::new(LogLevel::Info)))
            .with_name("test");

        logger.debug("dropped");
        logger.log(LogLevel::Info, "kept");
        logger.warning("also kept");

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "kept");
        assert_eq!(logger.records_at_least(LogLevel::Warning).len(), 1);
    }

    #[test]
    fn test_clones_share_capture_buffer() {
        let logger = Logger::capturing();
        let clone = logger.clone();
        clone.warning("from clone");
        assert_eq!(logger.records().len(), 1);
    }

    #[test]
    fn test_plain_logger_captures_nothing() {
        let logger = Logger::new();
        logger.log(LogLevel::Error, "only to tracing");
        assert!(logger.records().is_empty());
    }
}
