//! Per-protocol client templates and environment mappings.

use crate::config::ProfileField;
use crate::models::Protocol;

/// Environment variable libpq reads a password from.
pub const PGPASSWORD: &str = "PGPASSWORD";

/// Static description of how to invoke one protocol's native client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientDescriptor {
    /// Default command template
    pub template: &'static str,
    /// `(environment variable, profile field)` pairs, applied in order
    pub env: &'static [(&'static str, ProfileField)],
}

/// `psql`; the password travels through `.pgpass` or `PGPASSWORD`.
pub const POSTGRESQL: ClientDescriptor = ClientDescriptor {
    template: "psql -U '{username}' -h '{host}' -p '{port}' -d '{database}'",
    env: &[],
};

/// `mysql`; the password is passed as a plain argument.
pub const MYSQL: ClientDescriptor = ClientDescriptor {
    template: "mysql --user '{username}' --host '{host}' --port '{port}' --password '{password}' '{database}'",
    env: &[],
};

/// `sqlite3`; the database field is a file path.
pub const SQLITE: ClientDescriptor = ClientDescriptor {
    template: "sqlite3 '{database}'",
    env: &[],
};

impl ClientDescriptor {
    /// Descriptor registered for a protocol.
    pub fn for_protocol(protocol: Protocol) -> &'static Self {
        match protocol {
            Protocol::PostgreSql => &POSTGRESQL,
            Protocol::MySql => &MYSQL,
            Protocol::Sqlite => &SQLITE,
        }
    }
}
