//! Single `.pgpass` entries and their line format.
//!
//! Each entry line is `host:port:database:username:password`. A backslash
//! escapes the next character, so `\:` and `\\` stand for a literal colon and
//! backslash. A field of exactly `*` matches anything in the first four
//! positions.

use crate::config::ConnectionProfile;
use crate::error::{DbHooksError, Result};
use crate::password::PasswordMemoizer;
use crate::security::Password;

/// Field value that matches anything.
pub const WILDCARD: &str = "*";

/// One `host:port:database:username:password` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgPassEntry {
    pub host: String,
    pub port: String,
    pub database: String,
    pub username: String,
    /// `None` until the password has been loaded for a fresh entry
    pub password: Option<Password>,
}

impl PgPassEntry {
    /// Creates an entry without a password.
    pub fn new(
        host: impl Into<String>,
        port: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
            database: database.into(),
            username: username.into(),
            password: None,
        }
    }

    /// Builds the entry coordinates for a connection profile. Fields the
    /// profile leaves unset become wildcards.
    pub fn for_profile(profile: &ConnectionProfile) -> Self {
        let or_wildcard = |value: Option<String>| value.unwrap_or_else(|| WILDCARD.to_string());
        Self::new(
            or_wildcard(profile.host.clone()),
            or_wildcard(profile.port.map(|p| p.to_string())),
            or_wildcard(profile.database.clone()),
            or_wildcard(profile.username.clone()),
        )
    }

    /// Whether this entry applies to `other`'s coordinates, treating
    /// wildcards in this entry as matching anything.
    pub fn matches(&self, other: &Self) -> bool {
        fn field_matches(pattern: &str, value: &str) -> bool {
            pattern == WILDCARD || pattern == value
        }

        field_matches(&self.host, &other.host)
            && field_matches(&self.port, &other.port)
            && field_matches(&self.database, &other.database)
            && field_matches(&self.username, &other.username)
    }

    /// Whether some connection could match both entries, treating wildcards
    /// on either side as matching anything.
    ///
    /// This is the eviction test: `db1:5432:sales:alice` and
    /// `db1:*:sales:alice` overlap even though neither `matches` the other
    /// in the libpq sense when the key carries the wildcard.
    pub fn overlaps(&self, other: &Self) -> bool {
        fn field_overlaps(a: &str, b: &str) -> bool {
            a == WILDCARD || b == WILDCARD || a == b
        }

        field_overlaps(&self.host, &other.host)
            && field_overlaps(&self.port, &other.port)
            && field_overlaps(&self.database, &other.database)
            && field_overlaps(&self.username, &other.username)
    }

    /// Whether both entries have identical coordinates, wildcards included.
    pub fn same_coordinates(&self, other: &Self) -> bool {
        self.host == other.host
            && self.port == other.port
            && self.database == other.database
            && self.username == other.username
    }

    /// Resolves and stores the password through the synthesis memoizer.
    ///
    /// # Errors
    /// Propagates password loader errors
    pub fn load_password(&mut self, passwords: &mut PasswordMemoizer<'_>) -> Result<()> {
        if let Some(password) = passwords.get()? {
            self.password = Some(password.clone());
        }
        Ok(())
    }

    /// Parses an entry line. Returns `None` unless the line has exactly five
    /// fields.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = split_fields(line).into_iter();
        let entry = Self {
            host: fields.next()?,
            port: fields.next()?,
            database: fields.next()?,
            username: fields.next()?,
            password: fields.next().map(Password::new),
        };
        if fields.next().is_some() || entry.password.is_none() {
            return None;
        }
        Some(entry)
    }

    /// Renders the entry as a line, without a trailing newline.
    ///
    /// # Errors
    /// Returns `Configuration` if a field contains a line break, which the
    /// file format cannot represent
    pub fn to_line(&self) -> Result<String> {
        let password = self.password.as_ref().map_or("", Password::expose);
        let fields = [
            self.host.as_str(),
            self.port.as_str(),
            self.database.as_str(),
            self.username.as_str(),
            password,
        ];

        if fields.iter().any(|f| f.contains(['\n', '\r'])) {
            return Err(DbHooksError::configuration(format!(
                "Cannot write .pgpass entry for {}:{}:{}:{}: fields must not contain line breaks",
                self.host, self.port, self.database, self.username
            )));
        }

        Ok(fields
            .iter()
            .map(|f| escape_field(f))
            .collect::<Vec<_>>()
            .join(":"))
    }
}

fn split_fields(line: &str) -> Vec<String> {
    let mut fields = vec![String::new()];
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().unwrap_or('\\');
                if let Some(field) = fields.last_mut() {
                    field.push(escaped);
                }
            }
            ':' => fields.push(String::new()),
            c => {
                if let Some(field) = fields.last_mut() {
                    field.push(c);
                }
            }
        }
    }

    fields
}

/// Escapes backslashes and colons in a field value.
pub fn escape_field(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ':') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
