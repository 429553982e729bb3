//! Password loader backed by an external command.
//!
//! The command template is rendered like a client template with a single
//! `{connection}` placeholder, e.g. `pass show db/{connection}`. The first
//! line of its standard output is the password.

use std::process::{Command, Stdio};

use tracing::debug;
use zeroize::Zeroizing;

use super::PasswordLoader;
use crate::error::{DbHooksError, Result};
use crate::security::Password;
use crate::template;

/// Runs a secret-manager command to obtain passwords.
#[derive(Debug, Clone)]
pub struct CommandLoader {
    template: String,
}

impl CommandLoader {
    /// Creates a loader for the given command template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl PasswordLoader for CommandLoader {
    fn get_password(&self, connection_name: &str) -> Result<Password> {
        let argv = template::render_argv(&self.template, &[("connection", Some(connection_name))])?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| DbHooksError::template("command is empty"))?;

        debug!("Running password command '{}' for {}", program, connection_name);

        // stdin and stderr stay attached so tools like gpg can ask for a passphrase
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| {
                DbHooksError::password_loader(
                    connection_name,
                    format!("Failed to run '{}': {}", program, e),
                )
            })?;

        let stdout = Zeroizing::new(output.stdout);

        if !output.status.success() {
            return Err(DbHooksError::password_loader(
                connection_name,
                format!("'{}' exited with {}", program, output.status),
            ));
        }

        let text = std::str::from_utf8(&stdout).map_err(|_| {
            DbHooksError::password_loader(connection_name, "Password command output is not UTF-8")
        })?;

        let line = text.lines().next().unwrap_or_default();
        if line.is_empty() {
            return Err(DbHooksError::password_loader(
                connection_name,
                format!("'{}' produced no password", program),
            ));
        }

        Ok(Password::new(line))
    }
}
