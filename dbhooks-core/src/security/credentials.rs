//! Secure password container with automatic memory zeroing.
//!
//! # Security
//! - Passwords are stored in `Zeroizing<String>` containers
//! - Memory is cleared when the last copy goes out of scope
//! - `Debug` and `Display` never print the secret

use zeroize::Zeroizing;

/// A database password that zeros its memory on drop.
///
/// # Example
///
/// ```rust
/// use dbhooks_core::security::Password;
///
/// let password = Password::new("hunter2");
/// assert_eq!(password.expose(), "hunter2");
/// assert_eq!(format!("{:?}", password), "Password(****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Wraps a password in a zeroizing container.
    pub fn new(password: impl Into<String>) -> Self {
        Self(Zeroizing::new(password.into()))
    }

    /// Returns the plaintext password.
    ///
    /// Callers must not log or otherwise persist the returned value, except
    /// into the credential channel it is meant for.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Checks whether the password is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(****)")
    }
}

impl std::fmt::Display for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("****")
    }
}

impl<'de> serde::Deserialize<'de> for Password {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_expose() {
        let password = Password::new("testpass");
        assert_eq!(password.expose(), "testpass");
        assert!(!password.is_empty());
    }

    #[test]
    fn test_password_not_in_debug_or_display() {
        let password = Password::new("super_secret_password_123");
        assert!(!format!("{:?}", password).contains("super_secret"));
        assert!(!format!("{}", password).contains("super_secret"));
    }

    #[test]
    fn test_password_clone() {
        let p1 = Password::new("pass");
        let p2 = p1.clone();
        assert_eq!(p1, p2);
    }

    #[test]
    fn test_empty_password() {
        assert!(Password::new(String::new()).is_empty());
    }
}
