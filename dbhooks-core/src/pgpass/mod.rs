//! PostgreSQL password file (`.pgpass`) management.
//!
//! `psql` reads passwords from this file, so dbhooks writes the current
//! connection's password there instead of putting it on the command line.
//!
//! The file is loaded whole, edited in memory, and written back whole.
//! Comments, blank lines and lines that are not valid entries are kept
//! verbatim in their original position. Nothing is sorted.
//!
//! # Security
//! - The file is written with mode 0600, which libpq requires
//! - File contents are held in zeroizing buffers while being read or written
//!
//! Writes replace the file atomically by renaming a temporary sibling over
//! it. There is no locking: two dbhooks processes updating the same file at
//! the same time may lose one of the updates.

mod entry;

pub use entry::{PgPassEntry, WILDCARD, escape_field};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::config::Config;
use crate::error::{DbHooksError, Result};

/// One line of the password file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PgPassLine {
    /// A parsed `host:port:database:username:password` entry
    Entry(PgPassEntry),
    /// Comment, blank or malformed line, written back unchanged
    Passthrough(String),
}

/// In-memory copy of a password file.
#[derive(Debug, Clone)]
pub struct PgPass {
    path: PathBuf,
    lines: Vec<PgPassLine>,
}

impl PgPass {
    /// Creates an empty password file bound to `path`. Nothing is written
    /// until [`PgPass::write`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines: Vec::new(),
        }
    }

    /// Loads the password file configured for `config`.
    ///
    /// # Errors
    /// Returns error if the path cannot be determined or the file cannot be read
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::load(config.pgpass_path()?)
    }

    /// Loads a password file. A missing file yields an empty one.
    ///
    /// # Errors
    /// Returns `Io` if the file exists but cannot be read
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let content = match fs::read_to_string(&path) {
            Ok(content) => Zeroizing::new(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet", path.display());
                return Ok(Self::new(path));
            }
            Err(e) => {
                return Err(DbHooksError::io(
                    format!("Failed to read {}", path.display()),
                    e,
                ));
            }
        };

        let pgpass = Self {
            lines: parse_lines(&content),
            path,
        };
        debug!(
            "Loaded {} entries from {}",
            pgpass.entries().count(),
            pgpass.path.display()
        );
        Ok(pgpass)
    }

    /// Location the file is read from and written to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All lines in file order.
    pub fn lines(&self) -> &[PgPassLine] {
        &self.lines
    }

    /// Parsed entries in file order.
    pub fn entries(&self) -> impl Iterator<Item = &PgPassEntry> {
        self.lines.iter().filter_map(PgPassLine::entry)
    }

    /// The first entry libpq would use for the given coordinates.
    pub fn find(&self, key: &PgPassEntry) -> Option<&PgPassEntry> {
        self.entries().find(|entry| entry.matches(key))
    }

    /// Removes every entry for which `predicate` holds and returns how many
    /// were removed. Passthrough lines are never removed.
    pub fn evict<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&PgPassEntry) -> bool,
    {
        let before = self.lines.len();
        self.lines.retain(|line| match line {
            PgPassLine::Entry(entry) => !predicate(entry),
            PgPassLine::Passthrough(_) => true,
        });
        before.saturating_sub(self.lines.len())
    }

    /// Removes every entry that overlaps the given coordinates, so a fresh
    /// entry for them becomes the only match. Wildcards in either the stored
    /// entry or `key` match anything.
    pub fn evict_matching(&mut self, key: &PgPassEntry) -> usize {
        let evicted = self.evict(|entry| entry.overlaps(key));
        if evicted > 0 {
            debug!(
                "Evicted {} .pgpass entries for {}:{}:{}:{}",
                evicted, key.host, key.port, key.database, key.username
            );
        }
        evicted
    }

    /// Returns the entry for a named connection, appending an empty one at
    /// the end of the file if none has exactly its coordinates.
    ///
    /// The password is not resolved here; see [`PgPassEntry::load_password`].
    ///
    /// # Errors
    /// Returns `UnknownConnection` if `connection_name` is not configured
    pub fn get_entry(&mut self, connection_name: &str, config: &Config) -> Result<&mut PgPassEntry> {
        let key = PgPassEntry::for_profile(config.connection(connection_name)?);
        self.entry_for(key)
    }

    /// Returns the entry with exactly `key`'s coordinates, appending `key`
    /// if there is none.
    ///
    /// # Errors
    /// Returns `Configuration` if the located line is not an entry
    pub fn entry_for(&mut self, key: PgPassEntry) -> Result<&mut PgPassEntry> {
        let existing = self.lines.iter().position(|line| {
            line.entry().is_some_and(|entry| entry.same_coordinates(&key))
        });

        let index = existing.unwrap_or_else(|| {
            self.lines.push(PgPassLine::Entry(key));
            self.lines.len().saturating_sub(1)
        });

        self.lines
            .get_mut(index)
            .and_then(PgPassLine::entry_mut)
            .ok_or_else(|| {
                DbHooksError::configuration(format!(
                    "Line {} of {} is not a password entry",
                    index.saturating_add(1),
                    self.path.display()
                ))
            })
    }

    /// Renders the file contents.
    ///
    /// # Errors
    /// Returns `Configuration` if an entry cannot be represented
    pub fn render(&self) -> Result<Zeroizing<String>> {
        let mut out = Zeroizing::new(String::new());
        for line in &self.lines {
            match line {
                PgPassLine::Entry(entry) => out.push_str(&Zeroizing::new(entry.to_line()?)),
                PgPassLine::Passthrough(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        Ok(out)
    }

    /// Writes the file, creating parent directories as needed.
    ///
    /// The contents go to a temporary file in the same directory, readable
    /// only by the owner, which then replaces the password file in a single
    /// rename. A failed write leaves the previous file untouched.
    ///
    /// # Errors
    /// Returns `Io` if the directory or file cannot be written
    pub fn write(&self) -> Result<()> {
        let content = self.render()?;

        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| {
                    DbHooksError::io(format!("Failed to create {}", parent.display()), e)
                })?;
                parent
            }
            None => Path::new("."),
        };

        let write_error =
            |e: std::io::Error| DbHooksError::io(format!("Failed to write {}", self.path.display()), e);

        let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(write_error)?;
        restrict_permissions(temp.path())?;
        temp.write_all(content.as_bytes())
            .and_then(|()| temp.as_file().sync_all())
            .map_err(write_error)?;
        temp.persist(&self.path).map_err(|e| write_error(e.error))?;

        info!("Updated {}", self.path.display());
        Ok(())
    }
}

impl PgPassLine {
    /// The parsed entry, if this line is one.
    pub fn entry(&self) -> Option<&PgPassEntry> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Passthrough(_) => None,
        }
    }

    /// Mutable access to the parsed entry, if this line is one.
    pub fn entry_mut(&mut self) -> Option<&mut PgPassEntry> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Passthrough(_) => None,
        }
    }
}

fn parse_lines(content: &str) -> Vec<PgPassLine> {
    content
        .lines()
        .map(|raw| {
            let trimmed = raw.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return PgPassLine::Passthrough(raw.to_string());
            }
            PgPassEntry::parse(raw).map_or_else(
                || {
                    debug!("Keeping malformed .pgpass line as-is");
                    PgPassLine::Passthrough(raw.to_string())
                },
                PgPassLine::Entry,
            )
        })
        .collect()
}

/// Restricts a file to its owner.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
        DbHooksError::io(
            format!("Failed to set permissions on {}", path.display()),
            e,
        )
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
