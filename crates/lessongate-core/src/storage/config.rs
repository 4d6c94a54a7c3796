//! TOML-based application configuration.
//!
//! Stores:
//! - Tracker defaults (required minutes, tick interval)
//! - Storage file name
//! - Log filter
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Tracker defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Threshold used when a command does not pass one explicitly.
    #[serde(default = "default_required_minutes")]
    pub default_required_minutes: f64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file, relative to the data directory.
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_required_minutes() -> f64 {
    5.0
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_database_file() -> String {
    "lessongate.db".into()
}
fn default_log_filter() -> String {
    "warn".into()
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            default_required_minutes: default_required_minutes(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: default_database_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current
                    .get_mut(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                continue;
            }

            let obj = current
                .as_object_mut()
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
            let existing = obj
                .get(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(n) => {
                    if n.is_f64() {
                        let parsed = value.parse::<f64>().map_err(|e| invalid(e.to_string()))?;
                        serde_json::Number::from_f64(parsed)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot store '{value}' as number")))?
                    } else {
                        serde_json::Value::Number(
                            value
                                .parse::<u64>()
                                .map_err(|e| invalid(e.to_string()))?
                                .into(),
                        )
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    return Err(invalid("cannot assign a scalar to a section".into()));
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Reject values the tracker cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let minutes = self.tracking.default_required_minutes;
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "tracking.default_required_minutes".into(),
                message: format!("must be a positive number, got {minutes}"),
            });
        }
        if self.tracking.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tracking.tick_interval_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or fails validation. `self` is left unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.tracking.default_required_minutes, 5.0);
        assert_eq!(parsed.tracking.tick_interval_ms, 1000);
        assert_eq!(parsed.storage.database_file, "lessongate.db");
    }

    #[test]
    fn missing_sections_take_defaults() {
        let parsed: Config = toml::from_str("[logging]\nfilter = \"debug\"\n").unwrap();
        assert_eq!(parsed.logging.filter, "debug");
        assert_eq!(parsed.tracking.tick_interval_ms, 1000);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("tracking.tick_interval_ms").as_deref(), Some("1000"));
        assert_eq!(cfg.get("logging.filter").as_deref(), Some("warn"));
        assert!(cfg.get("tracking.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_float_and_integer_fields() {
        let mut cfg = Config::default();
        cfg.set("tracking.default_required_minutes", "2.5").unwrap();
        cfg.set("tracking.tick_interval_ms", "250").unwrap();
        assert_eq!(cfg.tracking.default_required_minutes, 2.5);
        assert_eq!(cfg.tracking.tick_interval_ms, 250);
    }

    #[test]
    fn set_updates_string_field() {
        let mut cfg = Config::default();
        cfg.set("storage.database_file", "other.db").unwrap();
        assert_eq!(cfg.storage.database_file, "other.db");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("tracking.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("nope.deeper", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_values_without_mutating() {
        let mut cfg = Config::default();
        assert!(cfg.set("tracking.tick_interval_ms", "soon").is_err());
        assert!(cfg.set("tracking.default_required_minutes", "0").is_err());
        assert!(cfg.set("tracking.default_required_minutes", "-3").is_err());
        assert!(cfg.set("tracking", "1").is_err());
        assert_eq!(cfg.tracking.default_required_minutes, 5.0);
        assert_eq!(cfg.tracking.tick_interval_ms, 1000);
    }

    #[test]
    fn load_from_writes_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.tracking.tick_interval_ms, 1000);

        let mut changed = cfg.clone();
        changed.set("logging.filter", "lessongate_core=debug").unwrap();
        changed.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.logging.filter, "lessongate_core=debug");
    }

    #[test]
    fn load_from_rejects_invalid_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tracking]\ndefault_required_minutes = -1.0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
