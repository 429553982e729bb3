//! Configuration loading.
//!
//! The configuration file is TOML with three sections:
//! - `[pgpass]`: whether and where to maintain the PostgreSQL password file
//! - `[password_loader]`: how passwords are obtained when not set explicitly
//! - `[connections.<name>]`: one `ConnectionProfile` per named connection
//!
//! # Security
//! Explicit passwords in the file are wrapped in `Password` as soon as they
//! are deserialized and never appear in `Debug` output.

mod connection;

pub use connection::{ConnectionProfile, ProfileField};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{DbHooksError, Result};

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "DBHOOKS_CONFIG";

/// Environment variable libpq reads for the password file location.
pub const PGPASSFILE_ENV_VAR: &str = "PGPASSFILE";

const CONFIG_DIR: &str = "dbhooks";
const CONFIG_FILE: &str = "dbhooks.toml";
const PGPASS_FILE: &str = ".pgpass";

/// Top-level dbhooks configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// PostgreSQL password file settings
    #[serde(default)]
    pub pgpass: PgPassConfig,
    /// Password loader selection
    #[serde(default)]
    pub password_loader: PasswordLoaderConfig,
    /// Named connection profiles
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionProfile>,
}

/// Settings for the `.pgpass` credential cache.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PgPassConfig {
    /// Write PostgreSQL passwords to the password file instead of `PGPASSWORD`
    #[serde(default = "default_enable")]
    pub enable: bool,
    /// Password file location; defaults to `$PGPASSFILE` or `~/.pgpass`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_enable() -> bool {
    true
}

impl Default for PgPassConfig {
    fn default() -> Self {
        Self {
            enable: default_enable(),
            path: None,
        }
    }
}

/// How passwords are obtained for connections without an explicit one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PasswordLoaderConfig {
    /// Ask on the terminal without echo
    #[default]
    Prompt,
    /// Run a command and read the password from its first line of output.
    /// `{connection}` in the template is replaced by the connection name.
    Command { command: String },
}

impl Config {
    /// Returns the default configuration file path.
    ///
    /// `$DBHOOKS_CONFIG` wins; otherwise `<config dir>/dbhooks/dbhooks.toml`.
    ///
    /// # Errors
    /// Returns error if no configuration directory can be determined
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
            .ok_or_else(|| {
                DbHooksError::configuration("Could not determine the configuration directory")
            })
    }

    /// Loads and parses a configuration file.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read and `ConfigParse` if it is not
    /// valid configuration
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DbHooksError::io(
                format!("Failed to read configuration file {}", path.display()),
                e,
            )
        })?;

        let config = Self::parse(&content, path)?;
        tracing::debug!(
            "Loaded {} connection(s) from {}",
            config.connections.len(),
            path.display()
        );
        Ok(config)
    }

    /// Parses configuration text; `path` is only used in error messages.
    ///
    /// # Errors
    /// Returns `ConfigParse` if the text is not valid configuration
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| DbHooksError::ConfigParse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
    }

    /// Looks up a connection profile by name.
    ///
    /// # Errors
    /// Returns `UnknownConnection` if no profile has that name
    pub fn connection(&self, name: &str) -> Result<&ConnectionProfile> {
        self.connections
            .get(name)
            .ok_or_else(|| DbHooksError::unknown_connection(name))
    }

    /// Resolves the password file location.
    ///
    /// Order: `pgpass.path`, then `$PGPASSFILE`, then `~/.pgpass`.
    ///
    /// # Errors
    /// Returns error if none is set and the home directory is unknown
    pub fn pgpass_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.pgpass.path {
            return Ok(path.clone());
        }

        if let Some(path) = std::env::var_os(PGPASSFILE_ENV_VAR).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        dirs::home_dir()
            .map(|home| home.join(PGPASS_FILE))
            .ok_or_else(|| {
                DbHooksError::configuration("Could not determine the home directory for .pgpass")
            })
    }
}
