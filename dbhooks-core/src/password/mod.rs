//! Password loading.
//!
//! Connections that need a credential but do not carry an explicit password
//! get one from a [`PasswordLoader`]:
//!
//! - [`PromptLoader`]: asks on the terminal without echo
//! - [`CommandLoader`]: runs a secret-manager command such as `pass show`
//!
//! [`PasswordMemoizer`] wraps a loader for one command synthesis so the user
//! is asked at most once even when several steps need the password.

mod command;
mod memoizer;
mod prompt;

pub use command::CommandLoader;
pub use memoizer::PasswordMemoizer;
pub use prompt::PromptLoader;

use crate::config::{Config, PasswordLoaderConfig};
use crate::error::Result;
use crate::security::Password;

/// A source of passwords for named connections.
///
/// Implementations may block on user input or on an external process.
/// Errors are returned unchanged to the caller; nothing here retries.
pub trait PasswordLoader {
    /// Obtains the password for `connection_name`.
    ///
    /// # Errors
    /// Returns `PasswordLoader` if no password could be obtained
    fn get_password(&self, connection_name: &str) -> Result<Password>;
}

/// Builds the loader selected by the `[password_loader]` section.
pub fn loader_from_config(config: &Config) -> Box<dyn PasswordLoader> {
    match &config.password_loader {
        PasswordLoaderConfig::Prompt => Box::new(PromptLoader::new()),
        PasswordLoaderConfig::Command { command } => Box::new(CommandLoader::new(command.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[cfg(unix)]
    #[test]
    fn test_loader_from_config_command() {
        let config = Config::parse(
            r#"
            [password_loader]
            kind = "command"
            command = "printf 'pw-%s\n' {connection}"
            "#,
            Path::new("dbhooks.toml"),
        )
        .unwrap();

        let loader = loader_from_config(&config);
        assert_eq!(loader.get_password("sales").unwrap().expose(), "pw-sales");
    }
}
