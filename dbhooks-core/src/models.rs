//! Protocol identifiers shared by configuration and command synthesis.

use std::str::FromStr;

use crate::error::DbHooksError;

/// Database protocol families with a native command-line client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    PostgreSql,
    MySql,
    Sqlite,
}

impl Protocol {
    /// All supported protocols, in display order.
    pub const ALL: [Self; 3] = [Self::PostgreSql, Self::MySql, Self::Sqlite];

    /// Names accepted in the `protocol` field of a connection profile.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::PostgreSql => &["postgres", "postgresql", "pg"],
            Self::MySql => &["mysql"],
            Self::Sqlite => &["sqlite", "sqlite3"],
        }
    }

    /// Whether connections of this protocol expect a credential when the
    /// profile does not say otherwise.
    pub fn requires_password_by_default(self) -> bool {
        !matches!(self, Self::Sqlite)
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PostgreSql => write!(f, "PostgreSQL"),
            Self::MySql => write!(f, "MySQL"),
            Self::Sqlite => write!(f, "SQLite"),
        }
    }
}

impl FromStr for Protocol {
    type Err = DbHooksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|protocol| protocol.aliases().contains(&name.as_str()))
            .ok_or_else(|| DbHooksError::unsupported_protocol(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_aliases() {
        for name in ["postgres", "postgresql", "pg", "PostgreSQL", " pg "] {
            assert_eq!(name.parse::<Protocol>().unwrap(), Protocol::PostgreSql);
        }
    }

    #[test]
    fn test_other_protocols() {
        assert_eq!("mysql".parse::<Protocol>().unwrap(), Protocol::MySql);
        assert_eq!("sqlite".parse::<Protocol>().unwrap(), Protocol::Sqlite);
        assert_eq!("sqlite3".parse::<Protocol>().unwrap(), Protocol::Sqlite);
    }

    #[test]
    fn test_unknown_protocol() {
        let err = "oracle".parse::<Protocol>().unwrap_err();
        assert!(matches!(
            err,
            DbHooksError::UnsupportedProtocol { ref protocol } if protocol == "oracle"
        ));
    }

    #[test]
    fn test_password_defaults() {
        assert!(Protocol::PostgreSql.requires_password_by_default());
        assert!(Protocol::MySql.requires_password_by_default());
        assert!(!Protocol::Sqlite.requires_password_by_default());
    }
}
