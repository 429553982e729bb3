//! Per-synthesis password cache.

use super::PasswordLoader;
use crate::config::ConnectionProfile;
use crate::error::Result;
use crate::security::Password;

/// Resolves a connection's password at most once.
///
/// Resolution order: the profile's explicit password, then the loader if the
/// profile requires a credential, otherwise no password. A memoizer lives for
/// one command synthesis and is shared by rendering and side effects.
pub struct PasswordMemoizer<'a> {
    connection_name: &'a str,
    profile: &'a ConnectionProfile,
    loader: &'a dyn PasswordLoader,
    password: Option<Password>,
}

impl<'a> PasswordMemoizer<'a> {
    /// Creates an empty memoizer for one connection.
    pub fn new(
        connection_name: &'a str,
        profile: &'a ConnectionProfile,
        loader: &'a dyn PasswordLoader,
    ) -> Self {
        Self {
            connection_name,
            profile,
            loader,
            password: None,
        }
    }

    /// Returns the password, invoking the loader on first use only.
    ///
    /// # Errors
    /// Propagates loader errors unchanged; a failed load is not cached
    pub fn get(&mut self) -> Result<Option<&Password>> {
        if self.password.is_none() {
            self.password = self.resolve()?;
        }
        Ok(self.password.as_ref())
    }

    /// Returns the password only if it has already been resolved.
    pub fn cached(&self) -> Option<&Password> {
        self.password.as_ref()
    }

    /// Name of the connection this memoizer resolves for.
    pub fn connection_name(&self) -> &str {
        self.connection_name
    }

    fn resolve(&self) -> Result<Option<Password>> {
        if let Some(password) = &self.profile.password {
            return Ok(Some(password.clone()));
        }
        if !self.profile.requires_password() {
            return Ok(None);
        }
        self.loader.get_password(self.connection_name).map(Some)
    }
}

impl std::fmt::Debug for PasswordMemoizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordMemoizer")
            .field("connection_name", &self.connection_name)
            .field("resolved", &self.password.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbHooksError;
    use std::cell::Cell;

    struct CountingLoader {
        calls: Cell<usize>,
        fail: bool,
    }

    impl CountingLoader {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                fail: false,
            }
        }
    }

    impl PasswordLoader for CountingLoader {
        fn get_password(&self, connection_name: &str) -> Result<Password> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(DbHooksError::password_loader(connection_name, "cancelled"));
            }
            Ok(Password::new(format!("loaded-{}", connection_name)))
        }
    }

    #[test]
    fn test_loader_called_once() {
        let loader = CountingLoader::new();
        let profile = ConnectionProfile::new("postgres");
        let mut memo = PasswordMemoizer::new("sales", &profile, &loader);

        assert!(memo.cached().is_none());
        assert_eq!(memo.get().unwrap().unwrap().expose(), "loaded-sales");
        assert_eq!(memo.get().unwrap().unwrap().expose(), "loaded-sales");
        assert_eq!(memo.cached().unwrap().expose(), "loaded-sales");
        assert_eq!(loader.calls.get(), 1);
    }

    #[test]
    fn test_explicit_password_skips_loader() {
        let loader = CountingLoader::new();
        let profile = ConnectionProfile::new("postgres").with_password("explicit");
        let mut memo = PasswordMemoizer::new("sales", &profile, &loader);

        assert_eq!(memo.get().unwrap().unwrap().expose(), "explicit");
        assert_eq!(loader.calls.get(), 0);
    }

    #[test]
    fn test_no_password_required() {
        let loader = CountingLoader::new();
        let profile = ConnectionProfile::new("sqlite");
        let mut memo = PasswordMemoizer::new("local", &profile, &loader);

        assert!(memo.get().unwrap().is_none());
        assert_eq!(loader.calls.get(), 0);
    }

    #[test]
    fn test_loader_error_propagates() {
        let loader = CountingLoader {
            calls: Cell::new(0),
            fail: true,
        };
        let profile = ConnectionProfile::new("mysql");
        let mut memo = PasswordMemoizer::new("shop", &profile, &loader);

        assert!(matches!(
            memo.get(),
            Err(DbHooksError::PasswordLoader { .. })
        ));
        assert!(memo.cached().is_none());
    }

    #[test]
    fn test_debug_hides_password() {
        let loader = CountingLoader::new();
        let profile = ConnectionProfile::new("postgres").with_password("hidden-value");
        let mut memo = PasswordMemoizer::new("sales", &profile, &loader);
        memo.get().unwrap();

        assert!(!format!("{:?}", memo).contains("hidden-value"));
    }
}
