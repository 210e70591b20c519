//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve database path, log level, log directory and storage quota.
//! - Keep resolution testable through an injectable variable lookup.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - Resolution never touches the file system.

use crate::logging::{default_log_level, LogLevel};
use crate::repo::kv_repo::DEFAULT_QUOTA_BYTES;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "KANBAN_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "KANBAN_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "KANBAN_LOG_DIR";
pub const ENV_STORAGE_QUOTA_BYTES: &str = "KANBAN_STORAGE_QUOTA_BYTES";

const DEFAULT_DB_FILE_NAME: &str = "kanban_local.sqlite3";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set to a value that cannot be used.
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                name,
                value,
                reason,
            } => write!(f, "invalid `{name}` value `{value}`: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved runtime configuration for the core and its callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite file holding the key-value store.
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    /// Absolute log directory. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// Per-value storage quota in bytes.
    pub storage_quota_bytes: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
            storage_quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}

impl CoreConfig {
    /// Resolves configuration from process environment variables.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for an unusable variable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for an unusable variable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(value) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(value);
        }

        if let Some(value) = read(ENV_LOG_LEVEL) {
            config.log_level = value
                .parse::<LogLevel>()
                .map_err(|err| ConfigError::InvalidValue {
                    name: ENV_LOG_LEVEL,
                    value: value.clone(),
                    reason: err.to_string(),
                })?;
        }

        if let Some(value) = read(ENV_LOG_DIR) {
            let path = PathBuf::from(&value);
            if !path.is_absolute() {
                return Err(ConfigError::InvalidValue {
                    name: ENV_LOG_DIR,
                    value,
                    reason: "must be an absolute path".to_string(),
                });
            }
            config.log_dir = Some(path);
        }

        if let Some(value) = read(ENV_STORAGE_QUOTA_BYTES) {
            config.storage_quota_bytes = match value.parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                Ok(_) => {
                    return Err(ConfigError::InvalidValue {
                        name: ENV_STORAGE_QUOTA_BYTES,
                        value,
                        reason: "must be greater than zero".to_string(),
                    })
                }
                Err(err) => {
                    return Err(ConfigError::InvalidValue {
                        name: ENV_STORAGE_QUOTA_BYTES,
                        value,
                        reason: err.to_string(),
                    })
                }
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_LOG_DIR, ENV_LOG_LEVEL, ENV_STORAGE_QUOTA_BYTES};
    use crate::logging::LogLevel;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn values_are_trimmed_and_normalized() {
        let config = CoreConfig::from_lookup(lookup(&[
            ("KANBAN_DB_PATH", " /tmp/boards.sqlite3 "),
            ("KANBAN_LOG_LEVEL", "WARNING"),
            ("KANBAN_STORAGE_QUOTA_BYTES", "1024"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/boards.sqlite3"));
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.storage_quota_bytes, 1024);
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[("KANBAN_LOG_DIR", "logs")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name, .. } if name == ENV_LOG_DIR));
    }

    #[test]
    fn zero_quota_is_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[("KANBAN_STORAGE_QUOTA_BYTES", "0")]))
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { name, .. } if name == ENV_STORAGE_QUOTA_BYTES)
        );
    }

    #[test]
    fn unknown_log_level_is_rejected_with_reason() {
        let err = CoreConfig::from_lookup(lookup(&[("KANBAN_LOG_LEVEL", "loud")])).unwrap_err();
        match err {
            ConfigError::InvalidValue {
                name,
                value,
                reason,
            } => {
                assert_eq!(name, ENV_LOG_LEVEL);
                assert_eq!(value, "loud");
                assert!(reason.contains("unsupported log level"));
            }
        }
    }
}
