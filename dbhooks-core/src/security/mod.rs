//! Security utilities for credential protection.
//!
//! This module provides:
//! - `Password`: secret container with automatic memory zeroing
//! - Redaction helpers for argv and environment listings
//!
//! # Security Guarantees
//! - Passwords are stored in `Zeroizing` containers
//! - Passwords never appear in `Debug` or `Display` output
//! - Anything shown to the user or logged is masked first

mod credentials;
mod redact;

pub use credentials::Password;
pub use redact::{SECRET_ENV_KEYS, redact_argv, redact_env_value};
