//! Typed server configuration with defaults.

use std::time::Duration;

use super::{ConfigError, Settings};
use crate::{
    frame::{Endianness, LengthFormat},
    server::{ConnectorConfig, DEFAULT_MAX_FRAME_LENGTH},
    session::DEFAULT_QUEUE_SIZE,
};

/// Log destination and verbosity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    /// Directory log files live under.
    pub root: String,
    /// Base name of the log file.
    pub name: String,
    /// Maximum level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            root: "../".to_owned(),
            name: "app".to_owned(),
            level: "debug".to_owned(),
        }
    }
}

/// Sizes of the shared buffer pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Buffers allocated up front.
    pub init_size: usize,
    /// Most idle buffers kept for reuse.
    pub max_size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            init_size: 64,
            max_size: 1024,
        }
    }
}

/// Everything a server process reads from its config file.
///
/// Missing keys fall back to [`ServerConfig::default`]; malformed values are
/// errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// TCP listen address (`server.addr`).
    pub addr: String,
    /// Deployment mode, `dev` or `pro` (`server.mode`).
    pub mode: String,
    /// Prometheus exporter address (`metrics.addr`).
    pub metrics_addr: Option<String>,
    /// Logging (`[log]`).
    pub log: LogConfig,
    /// Outbound queue length per session (`session.queue_size`).
    pub queue_size: usize,
    /// Per-frame read deadline (`session.read_timeout`).
    pub read_timeout: Option<Duration>,
    /// Length prefix width in bytes (`frame.prefix_width`).
    pub prefix_width: usize,
    /// Use a big-endian prefix (`frame.big_endian`).
    pub big_endian: bool,
    /// Inbound frame cap (`frame.max_length`, a byte size).
    pub max_frame_length: Option<usize>,
    /// Buffer pool sizes (`[pool]`).
    pub pool: PoolConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:7000".to_owned(),
            mode: "dev".to_owned(),
            metrics_addr: None,
            log: LogConfig::default(),
            queue_size: DEFAULT_QUEUE_SIZE,
            read_timeout: None,
            prefix_width: 2,
            big_endian: false,
            max_frame_length: Some(DEFAULT_MAX_FRAME_LENGTH),
            pool: PoolConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build the typed view from raw settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for malformed values.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let string = |section, key, default: String| -> Result<String, ConfigError> {
            Ok(settings.opt_string(section, key)?.unwrap_or(default))
        };

        let queue_size = match optional(settings, "session", "queue_size", Settings::int)? {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(DEFAULT_QUEUE_SIZE),
            _ => DEFAULT_QUEUE_SIZE,
        };
        let prefix_width = match optional(settings, "frame", "prefix_width", Settings::uint)? {
            Some(width) => usize::try_from(width)
                .ok()
                .filter(|w| (1..=8).contains(w))
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "frame.prefix_width".to_owned(),
                    value: width.to_string(),
                    reason: "prefix width must be 1 to 8 bytes".to_owned(),
                })?,
            None => defaults.prefix_width,
        };

        Ok(Self {
            addr: string("server", "addr", defaults.addr)?,
            mode: string("server", "mode", defaults.mode)?,
            metrics_addr: settings.opt_string("metrics", "addr")?,
            log: LogConfig {
                root: string("log", "root", defaults.log.root)?,
                name: string("log", "name", defaults.log.name)?,
                level: string("log", "level", defaults.log.level)?,
            },
            queue_size,
            read_timeout: optional(settings, "session", "read_timeout", Settings::duration)?,
            prefix_width,
            big_endian: optional(settings, "frame", "big_endian", Settings::bool)?
                .unwrap_or(defaults.big_endian),
            max_frame_length: optional(settings, "frame", "max_length", Settings::byte_size)?
                .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
                .or(defaults.max_frame_length),
            pool: PoolConfig {
                init_size: optional(settings, "pool", "init_size", Settings::uint)?
                    .map_or(defaults.pool.init_size, saturating_usize),
                max_size: optional(settings, "pool", "max_size", Settings::uint)?
                    .map_or(defaults.pool.max_size, saturating_usize),
            },
        })
    }

    /// Length prefix format described by the `[frame]` section.
    #[must_use]
    pub fn length_format(&self) -> LengthFormat {
        let endianness = if self.big_endian {
            Endianness::Big
        } else {
            Endianness::Little
        };
        LengthFormat::new(self.prefix_width.clamp(1, 8), endianness)
    }

    /// Per-connection settings for a [`TcpConnector`](crate::server::TcpConnector).
    #[must_use]
    pub fn connector_config(&self) -> ConnectorConfig {
        ConnectorConfig {
            format: self.length_format(),
            queue_size: self.queue_size,
            read_timeout: self.read_timeout,
            max_frame_length: self.max_frame_length,
            ..ConnectorConfig::default()
        }
    }
}

fn optional<T>(
    settings: &Settings,
    section: &str,
    key: &str,
    get: fn(&Settings, &str, &str) -> Result<T, ConfigError>,
) -> Result<Option<T>, ConfigError> {
    if settings.contains(section, key) {
        get(settings, section, key).map(Some)
    } else {
        Ok(None)
    }
}

fn saturating_usize(n: u64) -> usize { usize::try_from(n).unwrap_or(usize::MAX) }
