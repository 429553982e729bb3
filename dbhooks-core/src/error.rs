//! Error types with credential sanitization.
//!
//! No variant in this module carries a password. Connection names, protocol
//! names, placeholder names and executable names are safe to display; resolved
//! credentials and rendered command lines are not, so they never end up here.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dbhooks operations.
///
/// # Security
/// Error messages never include passwords or the rendered command line,
/// which for some protocols embeds the password as an argument.
#[derive(Debug, Error)]
pub enum DbHooksError {
    /// No client descriptor is registered for the protocol
    #[error("Unsupported protocol: '{protocol}'")]
    UnsupportedProtocol { protocol: String },

    /// The requested connection is not present in the configuration
    #[error("Unknown connection: '{name}'")]
    UnknownConnection { name: String },

    /// The command template could not be rendered into an argument vector
    #[error("Failed to render command template: {reason}")]
    TemplateRender { reason: String },

    /// The client executable is not on the search path
    #[error("Client not found on PATH: '{command}'")]
    ClientNotFound { command: String },

    /// The password loader failed to produce a credential
    #[error("Failed to load password for '{connection}': {message}")]
    PasswordLoader { connection: String, message: String },

    /// Configuration or validation error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration file {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    /// Replacing the process image failed
    #[error("Failed to execute '{command}'")]
    Exec {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Output could not be serialized
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results with DbHooksError
pub type Result<T> = std::result::Result<T, DbHooksError>;

impl DbHooksError {
    /// Creates an unsupported protocol error
    pub fn unsupported_protocol(protocol: impl Into<String>) -> Self {
        Self::UnsupportedProtocol {
            protocol: protocol.into(),
        }
    }

    /// Creates an unknown connection error
    pub fn unknown_connection(name: impl Into<String>) -> Self {
        Self::UnknownConnection { name: name.into() }
    }

    /// Creates a template rendering error
    pub fn template(reason: impl Into<String>) -> Self {
        Self::TemplateRender {
            reason: reason.into(),
        }
    }

    /// Creates a client-not-found error naming the missing executable
    pub fn client_not_found(command: impl Into<String>) -> Self {
        Self::ClientNotFound {
            command: command.into(),
        }
    }

    /// Creates a password loader error
    ///
    /// # Arguments
    /// * `connection` - Name of the connection the password was requested for
    /// * `message` - Loader-specific failure description (must not contain the secret)
    pub fn password_loader(connection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PasswordLoader {
            connection: connection.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates an I/O error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
