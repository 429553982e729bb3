//! Terminal password prompt.

use tracing::debug;

use super::PasswordLoader;
use crate::error::{DbHooksError, Result};
use crate::security::Password;

/// Reads the password from the controlling terminal without echo.
#[derive(Debug, Default)]
pub struct PromptLoader;

impl PromptLoader {
    /// Create a new terminal prompt loader.
    pub fn new() -> Self {
        Self
    }
}

impl PasswordLoader for PromptLoader {
    fn get_password(&self, connection_name: &str) -> Result<Password> {
        let password = rpassword::prompt_password(format!("Password for {}: ", connection_name))
            .map(Password::new)
            .map_err(|e| {
                DbHooksError::password_loader(
                    connection_name,
                    format!("Failed to read password: {}", e),
                )
            })?;

        if password.is_empty() {
            return Err(DbHooksError::password_loader(
                connection_name,
                "Password cannot be empty",
            ));
        }

        debug!("Password for {} entered at prompt", connection_name);
        Ok(password)
    }
}
