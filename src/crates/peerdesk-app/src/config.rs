//! TOML configuration persistence.
//!
//! The config file lives at the platform config dir:
//! - Linux:   `$XDG_CONFIG_HOME/peerdesk/config.toml` (or `~/.config/...`)
//! - Windows: `%APPDATA%\peerdesk\config.toml`
//!
//! A missing file means defaults; fields absent from an existing file take
//! their defaults via serde, so old config files keep working as fields
//! are added.  The CLI `--port` flag overrides the file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub app: AppSection,
}

/// Network settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSection {
    /// TCP port to listen on and dial peers at.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// General behaviour settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSection {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    peerdesk_core::DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Resolves the full path of the config file.
///
/// # Errors
///
/// [`ConfigError::NoPlatformConfigDir`] if the platform base directory
/// cannot be determined from the environment.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the configuration, with `AppConfig::default()` standing in for a
/// missing file.
///
/// # Errors
///
/// [`ConfigError::Io`] for file-system errors other than "not found", and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("peerdesk"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("peerdesk"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
