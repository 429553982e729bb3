//! The output of command synthesis.

use std::collections::BTreeMap;

use zeroize::Zeroize;

use crate::security::{Password, redact_argv, redact_env_value};

/// A ready-to-execute client invocation.
///
/// `argv[0]` is the program name as written in the template; it is resolved
/// against `PATH` only when the command is executed. `env` holds variables to
/// set on top of the inherited environment.
///
/// # Security
/// `Debug` masks the resolved password wherever it appears, and argv and env
/// values are zeroized on drop.
pub struct ResolvedCommand {
    pub argv: Vec<String>,
    pub env: BTreeMap<String, String>,
    secret: Option<Password>,
}

impl ResolvedCommand {
    /// Creates a command with no known secret.
    pub fn new(argv: Vec<String>, env: BTreeMap<String, String>) -> Self {
        Self {
            argv,
            env,
            secret: None,
        }
    }

    /// Records the password used while building this command so that
    /// redacted views can mask it.
    pub fn with_secret(mut self, secret: Option<Password>) -> Self {
        self.secret = secret;
        self
    }

    /// Program name, `argv[0]`.
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    /// Argv with the password masked.
    pub fn redacted_argv(&self) -> Vec<String> {
        redact_argv(&self.argv, self.secret.as_ref())
    }

    /// Environment with secret values masked.
    pub fn redacted_env(&self) -> BTreeMap<String, String> {
        self.env
            .iter()
            .map(|(k, v)| (k.clone(), redact_env_value(k, v, self.secret.as_ref())))
            .collect()
    }

    /// Whether the plaintext password appears anywhere in argv or env.
    pub fn exposes_secret(&self) -> bool {
        match &self.secret {
            Some(secret) if !secret.is_empty() => self
                .argv
                .iter()
                .chain(self.env.values())
                .any(|v| v.contains(secret.expose())),
            _ => false,
        }
    }
}

impl std::fmt::Debug for ResolvedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCommand")
            .field("argv", &self.redacted_argv())
            .field("env", &self.redacted_env())
            .finish()
    }
}

impl Drop for ResolvedCommand {
    fn drop(&mut self) {
        self.argv.iter_mut().for_each(Zeroize::zeroize);
        self.env.values_mut().for_each(Zeroize::zeroize);
    }
}
