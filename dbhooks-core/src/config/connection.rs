//! Connection profile configuration.
//!
//! This module provides the `ConnectionProfile` struct describing how to
//! reach one database instance, and `ProfileField`, the fixed list of profile
//! fields that command templates and environment mappings may reference.

use serde::Deserialize;

use crate::models::Protocol;
use crate::security::Password;

/// A named, declarative description of one database connection.
///
/// # Security
/// `Display` omits username and password, and `Password` masks itself in
/// `Debug`, so profiles can be logged.
///
/// # Example
/// ```rust
/// use dbhooks_core::config::ConnectionProfile;
///
/// let profile = ConnectionProfile::new("postgres")
///     .with_host("db1")
///     .with_port(5432)
///     .with_username("alice")
///     .with_database("sales");
///
/// assert_eq!(profile.to_string(), "postgres://db1:5432/sales");
/// assert!(profile.requires_password());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionProfile {
    /// Protocol name; parsed when a command is synthesized
    pub protocol: String,
    /// Database host
    #[serde(default)]
    pub host: Option<String>,
    /// Database port
    #[serde(default)]
    pub port: Option<u16>,
    /// Login user
    #[serde(default)]
    pub username: Option<String>,
    /// Database name, or file path for SQLite
    #[serde(default)]
    pub database: Option<String>,
    /// Explicit password; the password loader is skipped when set
    #[serde(default)]
    pub password: Option<Password>,
    /// Command template overriding the protocol default
    #[serde(default)]
    pub command: Option<String>,
    /// Whether the connection expects a credential; defaults by protocol
    #[serde(default)]
    pub has_password: Option<bool>,
}

impl std::fmt::Display for ConnectionProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://", self.protocol)?;
        if let Some(host) = &self.host {
            write!(f, "{}", host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        if let Some(database) = &self.database {
            write!(f, "/{}", database)?;
        }
        // Intentionally omit username and never include credentials
        Ok(())
    }
}

impl ConnectionProfile {
    /// Creates a profile for the given protocol with every other field empty.
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            host: None,
            port: None,
            username: None,
            database: None,
            password: None,
            command: None,
            has_password: None,
        }
    }

    /// Builder method to set host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Builder method to set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder method to set username.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Builder method to set database.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Builder method to set an explicit password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Password::new(password));
        self
    }

    /// Builder method to override the command template.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Builder method to state whether a credential is expected.
    pub fn with_has_password(mut self, has_password: bool) -> Self {
        self.has_password = Some(has_password);
        self
    }

    /// Whether this connection expects a credential.
    ///
    /// An explicit `has_password` wins; otherwise the protocol default
    /// applies, and unknown protocols are assumed to need one.
    pub fn requires_password(&self) -> bool {
        self.has_password.unwrap_or_else(|| {
            self.protocol
                .parse::<Protocol>()
                .map_or(true, Protocol::requires_password_by_default)
        })
    }

    /// Looks up a non-secret field value. `password` always yields `None`.
    pub fn field(&self, field: ProfileField) -> Option<String> {
        match field {
            ProfileField::Protocol => Some(self.protocol.clone()),
            ProfileField::Host => self.host.clone(),
            ProfileField::Port => self.port.map(|p| p.to_string()),
            ProfileField::Username => self.username.clone(),
            ProfileField::Database => self.database.clone(),
            ProfileField::Command => self.command.clone(),
            ProfileField::Password => None,
        }
    }
}

/// Profile fields addressable from command templates and env mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Protocol,
    Host,
    Port,
    Username,
    Database,
    Command,
    Password,
}

impl ProfileField {
    /// Fields substituted into templates from the profile itself. The
    /// password is resolved separately and added by the synthesizer.
    pub const SUBSTITUTABLE: [Self; 6] = [
        Self::Protocol,
        Self::Host,
        Self::Port,
        Self::Username,
        Self::Database,
        Self::Command,
    ];

    /// Placeholder name used in templates.
    pub fn name(self) -> &'static str {
        match self {
            Self::Protocol => "protocol",
            Self::Host => "host",
            Self::Port => "port",
            Self::Username => "username",
            Self::Database => "database",
            Self::Command => "command",
            Self::Password => "password",
        }
    }
}
