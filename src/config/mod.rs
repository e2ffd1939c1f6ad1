//! Layered configuration.
//!
//! [`Settings`] reads a config file through the `config` crate (format picked
//! from the extension, TOML or INI in practice) and lets environment
//! variables override it: `WIRESESSION_SERVER__ADDR` overrides `addr` in the
//! `[server]` section. Values are read per section and key with typed
//! accessors that accept the same loose spellings config files tend to use.
//! [`ServerConfig`] is the typed view the binary and services consume.

use std::{path::Path, time::Duration};

use config::{Config, Environment, File, FileFormat};
use thiserror::Error;

mod parse;
mod server;
#[cfg(test)]
mod tests;

pub use parse::{parse_bool, parse_byte_size, parse_duration, parse_list};
pub use server::{LogConfig, PoolConfig, ServerConfig};

/// Prefix of environment variables overriding file values.
pub const ENV_PREFIX: &str = "WIRESESSION";

/// Errors raised while loading or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or parsed.
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    /// A required key is absent.
    #[error("key `{key}` not found in [{section}]")]
    MissingKey { section: String, key: String },
    /// A value is present but cannot be interpreted.
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Raw configuration values addressed by section and key.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    inner: Config,
}

impl Settings {
    /// Load `path` layered with `WIRESESSION_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Source`] if the file is missing or malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, env_source())
    }

    pub(crate) fn load_with_env(
        path: impl AsRef<Path>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let name = path.to_str().ok_or_else(|| ConfigError::InvalidValue {
            key: "config file path".to_owned(),
            value: path.to_string_lossy().into_owned(),
            reason: "path is not valid UTF-8".to_owned(),
        })?;
        let inner = Config::builder()
            .add_source(File::with_name(name))
            .add_source(env)
            .build()?;
        Ok(Self { inner })
    }

    /// Parse TOML text without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Source`] if the text is not valid TOML.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let inner = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        Ok(Self { inner })
    }

    /// Returns `true` if `section.key` is set.
    #[must_use]
    pub fn contains(&self, section: &str, key: &str) -> bool {
        self.raw(section, key).ok().flatten().is_some()
    }

    /// Value of `section.key` as a string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if the key is absent.
    pub fn string(&self, section: &str, key: &str) -> Result<String, ConfigError> {
        self.raw(section, key)?
            .ok_or_else(|| ConfigError::MissingKey {
                section: section.to_owned(),
                key: key.to_owned(),
            })
    }

    /// Value of `section.key` as a signed integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] or [`ConfigError::InvalidValue`].
    pub fn int(&self, section: &str, key: &str) -> Result<i64, ConfigError> {
        self.parsed(section, key, |v| v.trim().parse().ok(), "not an integer")
    }

    /// Value of `section.key` as an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] or [`ConfigError::InvalidValue`].
    pub fn uint(&self, section: &str, key: &str) -> Result<u64, ConfigError> {
        self.parsed(
            section,
            key,
            |v| v.trim().parse().ok(),
            "not an unsigned integer",
        )
    }

    /// Value of `section.key` as a float.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] or [`ConfigError::InvalidValue`].
    pub fn float(&self, section: &str, key: &str) -> Result<f64, ConfigError> {
        self.parsed(section, key, |v| v.trim().parse().ok(), "not a number")
    }

    /// Value of `section.key` as a flag; see [`parse_bool`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if the key is absent.
    pub fn bool(&self, section: &str, key: &str) -> Result<bool, ConfigError> {
        self.string(section, key).map(|v| parse_bool(&v))
    }

    /// Value of `section.key` as a duration; see [`parse_duration`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] or [`ConfigError::InvalidValue`].
    pub fn duration(&self, section: &str, key: &str) -> Result<Duration, ConfigError> {
        self.parsed(section, key, parse_duration, "not a duration")
    }

    /// Value of `section.key` as a byte count; see [`parse_byte_size`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] or [`ConfigError::InvalidValue`].
    pub fn byte_size(&self, section: &str, key: &str) -> Result<u64, ConfigError> {
        self.parsed(section, key, parse_byte_size, "not a byte size")
    }

    /// Value of `section.key` as a comma-delimited list.
    ///
    /// Arrays written natively in the file are accepted as well.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if the key is absent.
    pub fn list(&self, section: &str, key: &str) -> Result<Vec<String>, ConfigError> {
        if let Ok(items) = self.inner.get_array(&path(section, key)) {
            return items
                .into_iter()
                .map(|item| item.into_string().map_err(ConfigError::from))
                .collect();
        }
        self.string(section, key).map(|v| parse_list(&v))
    }

    /// Like [`Settings::string`] but `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Source`] if the value is not a scalar.
    pub fn opt_string(&self, section: &str, key: &str) -> Result<Option<String>, ConfigError> {
        self.raw(section, key)
    }

    fn raw(&self, section: &str, key: &str) -> Result<Option<String>, ConfigError> {
        match self.inner.get_string(&path(section, key)) {
            Ok(v) => Ok(Some(v)),
            Err(config::ConfigError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn parsed<T>(
        &self,
        section: &str,
        key: &str,
        parse: impl FnOnce(&str) -> Option<T>,
        reason: &str,
    ) -> Result<T, ConfigError> {
        let value = self.string(section, key)?;
        parse(&value).ok_or_else(|| ConfigError::InvalidValue {
            key: path(section, key),
            value,
            reason: reason.to_owned(),
        })
    }
}

fn path(section: &str, key: &str) -> String { format!("{section}.{key}") }

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
