//! Core library for dbhooks.
//!
//! dbhooks turns named connection profiles into invocations of the native
//! database clients (`psql`, `mysql`, `sqlite3`) and hands the process over
//! to them. It never talks to a database itself.
//!
//! # Security Guarantees
//! - Passwords never appear in logs, error messages or `Debug` output
//! - PostgreSQL passwords go to a 0600 `.pgpass` file (or `PGPASSWORD` when
//!   that is disabled), never to the argument list
//! - Secrets are held in zeroizing containers
//!
//! # Example
//! ```rust,no_run
//! use dbhooks_core::{Client, Config, exec, password::loader_from_config};
//!
//! let config = Config::load(&Config::default_path()?)?;
//! let loader = loader_from_config(&config);
//! let command = Client::new(&config, "sales", loader.as_ref())?.synthesize()?;
//! exec::exec(&command)?;
//! # Ok::<(), dbhooks_core::DbHooksError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod models;
pub mod password;
pub mod pgpass;
pub mod security;
pub mod template;

// Re-export commonly used types
pub use client::{Client, ClientDescriptor, ResolvedCommand};
pub use config::{Config, ConnectionProfile, PasswordLoaderConfig, PgPassConfig, ProfileField};
pub use error::{DbHooksError, Result};
pub use logging::init_logging;
pub use models::Protocol;
pub use password::{PasswordLoader, PasswordMemoizer};
pub use pgpass::{PgPass, PgPassEntry, PgPassLine};
pub use security::Password;
