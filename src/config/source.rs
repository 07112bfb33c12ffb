//! The configuration-source capability and its typed accessors.
//!
//! Implementors only provide raw lookups; the typed accessors (`get_int`,
//! `get_bool`, `get_json`, ...) are shared default methods so that every
//! source converts values the same way.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Failure reading a value from a configuration source.
///
/// Section and key names are reported in lower case.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The key is absent (or null) in every tier.
    #[error("section/key [{section}/{key}] not found in config")]
    Missing { section: String, key: String },

    /// The key is present but cannot be converted to the requested type.
    #[error(
        "Failed to convert value to {expected}. Please check \"{key}\" key in \"{section}\" section. Current value: \"{value}\"."
    )]
    Malformed {
        section: String,
        key: String,
        expected: &'static str,
        value: String,
    },

    /// A mandatory key is present but blank.
    #[error("The value {section}/{key} should be set!")]
    Empty { section: String, key: String },

    /// The source itself could not be read.
    #[error("configuration source unavailable: {0}")]
    Unavailable(String),
}

impl ConfigError {
    pub fn missing(section: &str, key: &str) -> Self {
        Self::Missing {
            section: section.to_lowercase(),
            key: key.to_lowercase(),
        }
    }

    pub fn malformed(section: &str, key: &str, expected: &'static str, value: &Value) -> Self {
        Self::Malformed {
            section: section.to_lowercase(),
            key: key.to_lowercase(),
            expected,
            value: display_value(value),
        }
    }

    pub fn empty(section: &str, key: &str) -> Self {
        Self::Empty {
            section: section.to_lowercase(),
            key: key.to_lowercase(),
        }
    }

    /// Missing, malformed or empty option (everything except a source failure).
    pub fn is_option_error(&self) -> bool {
        !matches!(self, ConfigError::Unavailable(_))
    }

    /// The `(section, key)` this error refers to, if any.
    pub fn location(&self) -> Option<(&str, &str)> {
        match self {
            ConfigError::Missing { section, key }
            | ConfigError::Malformed { section, key, .. }
            | ConfigError::Empty { section, key } => Some((section.as_str(), key.as_str())),
            ConfigError::Unavailable(_) => None,
        }
    }
}

/// Sectioned key/value configuration.
///
/// Section and key names are case-insensitive; implementors are expected to
/// normalize both to lower case.
pub trait ConfigSource {
    /// Raw value for `section`/`key`, or `None` when absent.
    fn lookup(&self, section: &str, key: &str) -> Result<Option<Value>, ConfigError>;

    /// Raw contents of a whole section, or `None` when the section is absent.
    fn lookup_section(&self, name: &str) -> Result<Option<Map<String, Value>>, ConfigError>;

    fn has_option(&self, section: &str, key: &str) -> Result<bool, ConfigError> {
        Ok(self
            .lookup(section, key)?
            .is_some_and(|value| !value.is_null()))
    }

    fn get_string(&self, section: &str, key: &str) -> Result<String, ConfigError> {
        match self.lookup(section, key)? {
            None | Some(Value::Null) => Err(ConfigError::missing(section, key)),
            Some(Value::String(s)) => Ok(s),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(other) => Err(ConfigError::malformed(section, key, "string", &other)),
        }
    }

    /// Like [`get_string`](Self::get_string), but a blank value is an error.
    fn get_mandatory(&self, section: &str, key: &str) -> Result<String, ConfigError> {
        let value = self.get_string(section, key)?;
        if value.trim().is_empty() {
            return Err(ConfigError::empty(section, key));
        }
        Ok(value)
    }

    fn get_int(&self, section: &str, key: &str) -> Result<i64, ConfigError> {
        match self.lookup(section, key)? {
            None | Some(Value::Null) => Err(ConfigError::missing(section, key)),
            Some(value) => parse_int(&value)
                .ok_or_else(|| ConfigError::malformed(section, key, "int", &value)),
        }
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<bool, ConfigError> {
        match self.lookup(section, key)? {
            None | Some(Value::Null) => Err(ConfigError::missing(section, key)),
            Some(value) => parse_bool(&value)
                .ok_or_else(|| ConfigError::malformed(section, key, "bool", &value)),
        }
    }

    /// Read a JSON value; absent or blank values yield `fallback`.
    ///
    /// String values are parsed as JSON text. Structured values (from YAML
    /// tiers) are returned as they are.
    fn get_json(&self, section: &str, key: &str, fallback: Value) -> Result<Value, ConfigError> {
        match self.lookup(section, key)? {
            None | Some(Value::Null) => Ok(fallback),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(fallback),
            Some(Value::String(s)) => serde_json::from_str(&s)
                .map_err(|_| ConfigError::malformed(section, key, "json", &Value::String(s))),
            Some(value) => Ok(value),
        }
    }

    /// A whole section with string values coerced to numbers and booleans.
    fn get_section(&self, name: &str) -> Result<Option<Map<String, Value>>, ConfigError> {
        Ok(self.lookup_section(name)?.map(|section| {
            section
                .into_iter()
                .map(|(key, value)| (key, coerce_scalar(value)))
                .collect()
        }))
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for &T {
    fn lookup(&self, section: &str, key: &str) -> Result<Option<Value>, ConfigError> {
        (**self).lookup(section, key)
    }

    fn lookup_section(&self, name: &str) -> Result<Option<Map<String, Value>>, ConfigError> {
        (**self).lookup_section(name)
    }
}

/// Parse a boolean the way the config files spell them.
///
/// Accepts `t`/`true`/`1` and `f`/`false`/`0`, case-insensitive, with an
/// optional trailing `# comment`.
pub fn parse_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => {
            let text = s.split('#').next().unwrap_or_default().trim().to_lowercase();
            match text.as_str() {
                "t" | "true" | "1" => Some(true),
                "f" | "false" | "0" => Some(false),
                _ => None,
            }
        }
        _ => None,
    }
}

pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a string section value to an integer, float or boolean when it
/// reads as one, ignoring surrounding whitespace. Non-string values are
/// returned unchanged.
pub fn coerce_scalar(value: Value) -> Value {
    let Value::String(text) = value else {
        return value;
    };

    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    match trimmed.to_lowercase().as_str() {
        "t" | "true" => Value::Bool(true),
        "f" | "false" => Value::Bool(false),
        _ => Value::String(text),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
