//! Configuration loading for the filebin metadata store.
//!
//! Configuration is layered, with later sources overriding earlier ones:
//! 1. Built-in defaults ([`Config::default`]),
//! 2. A TOML file: the one passed explicitly, otherwise
//!    [`default_config_file`] if it exists,
//! 3. Environment variables prefixed with `FILEBIN_`, using `__` to descend
//!    into nested tables (e.g. `FILEBIN_DATABASE__MAX_CONNECTIONS=8`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

const ENV_PREFIX: &str = "FILEBIN_";
const CONFIG_FILENAME: &str = "config.toml";
/// Special database path that keeps the whole store in memory.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
}

/// Connection settings for the relational store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. Unset (or [`IN_MEMORY`]) keeps the
    /// whole store in memory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
            busy_timeout_ms: 1500,
        }
    }
}

/// Where the database lives, once defaults have been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Memory,
    File(PathBuf),
}

impl DatabaseConfig {
    pub fn location(&self) -> Result<Location> {
        match &self.path {
            None => Ok(Location::Memory),
            Some(path) if path.as_os_str() == IN_MEMORY => Ok(Location::Memory),
            Some(path) => Ok(Location::File(path.clone())),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Default location of the configuration file inside the platform-specific
/// config directory (e.g. `~/.config/filebin/config.toml` on Linux).
///
/// `None` when no home directory can be determined.
pub fn default_config_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "filebin").map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

impl Config {
    /// Build the layered figment without extracting it.
    ///
    /// Exposed so callers (and tests) can merge additional providers on top.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        // A missing default file is skipped by figment.
        if let Some(file) = file.map(Path::to_path_buf).or_else(default_config_file) {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from defaults, an optional TOML file and the
    /// environment.
    ///
    /// Unlike figment's own file provider, an explicitly requested file that
    /// does not exist is an error rather than silently ignored.
    #[instrument(level = "debug")]
    pub fn load(file: Option<&Path>) -> Result<Self> {
        if let Some(file) = file
            && !file.is_file()
        {
            exn::bail!(ErrorKind::FileNotFound(file.to_path_buf()));
        }
        Self::from_figment(Self::figment(file))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            exn::bail!(ErrorKind::Invalid("database.max_connections"));
        }
        if self.database.path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            exn::bail!(ErrorKind::Invalid("database.path"));
        }
        Ok(())
    }
}
