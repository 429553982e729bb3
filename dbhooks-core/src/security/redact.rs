//! Masking of secrets in command lines and environment listings.
//!
//! Rendered argv may carry a password (MySQL passes it as an argument), so
//! anything printed or logged goes through these helpers first.

use super::credentials::Password;

const MASK: &str = "****";

/// Environment variables whose values are always masked.
pub const SECRET_ENV_KEYS: &[&str] = &["PGPASSWORD", "MYSQL_PWD"];

/// Returns a copy of `argv` in which every occurrence of the secret is masked.
///
/// # Example
/// ```rust
/// use dbhooks_core::security::{Password, redact_argv};
///
/// let argv = vec!["mysql".to_string(), "--password".to_string(), "s3cret".to_string()];
/// let masked = redact_argv(&argv, Some(&Password::new("s3cret")));
/// assert_eq!(masked, vec!["mysql", "--password", "****"]);
/// ```
pub fn redact_argv(argv: &[String], secret: Option<&Password>) -> Vec<String> {
    argv.iter()
        .map(|token| redact_value(token, secret))
        .collect()
}

/// Masks an environment value when its key is a known secret or the value
/// contains the password.
pub fn redact_env_value(key: &str, value: &str, secret: Option<&Password>) -> String {
    if SECRET_ENV_KEYS.contains(&key) {
        MASK.to_string()
    } else {
        redact_value(value, secret)
    }
}

fn redact_value(value: &str, secret: Option<&Password>) -> String {
    match secret {
        Some(secret) if !secret.is_empty() && value.contains(secret.expose()) => {
            value.replace(secret.expose(), MASK)
        }
        _ => value.to_string(),
    }
}
