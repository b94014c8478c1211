//! Configuration loading and management.
//!
//! Resolution order for the config file:
//! 1. Explicit path (`--config` / `TASKLIST_CONFIG_PATH`)
//! 2. `./tasklist/config.yaml`
//! 3. `<user config dir>/tasklist/config.yaml`
//! 4. Built-in defaults
//!
//! Environment variables are applied on top of whichever file was used:
//! - `TASKLIST_DB_PATH` - Database path
//! - `TASKLIST_HOST` - Address the HTTP server binds to
//! - `TASKLIST_PORT` - Port the HTTP server binds to

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TASKLIST_CONFIG_PATH";

/// Project-local config file, relative to the working directory.
pub const PROJECT_CONFIG_FILE: &str = "tasklist/config.yaml";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the HTTP server binds to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tasklist/tasks.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Locate the config file to use, if any.
    ///
    /// An explicit path is returned even if it does not exist so that the
    /// subsequent load reports it.
    pub fn discover(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        let project = PathBuf::from(PROJECT_CONFIG_FILE);
        if project.is_file() {
            return Some(project);
        }

        dirs::config_dir()
            .map(|dir| dir.join("tasklist").join("config.yaml"))
            .filter(|path| path.is_file())
    }

    /// Load from the discovered file (or defaults) and apply environment overrides.
    ///
    /// Returns the config and the path of the file it was read from.
    pub fn load_with_overrides(
        explicit: Option<&Path>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let path = Self::discover(explicit);
        let mut config = match &path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok((config, path))
    }

    /// Apply `TASKLIST_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = lookup("TASKLIST_DB_PATH") {
            self.server.db_path = PathBuf::from(db_path);
        }

        if let Some(host) = lookup("TASKLIST_HOST") {
            self.server.host = host;
        }

        if let Some(port) = lookup("TASKLIST_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "TASKLIST_PORT",
                value: port,
            })?;
        }

        Ok(())
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> std::io::Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
