//! Generated credentials
//!
//! [`Secret`] wraps a password so it cannot end up in logs by accident:
//! `Debug` and `Display` print `[REDACTED]`, memory is zeroed on drop and the
//! value is only reachable through [`Secret::expose`].

use std::fmt;

use rand::Rng;
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Placeholder printed instead of a secret value
pub const REDACTED: &str = "[REDACTED]";

/// Shortest secret `generate` will produce
pub const MIN_SECRET_LEN: usize = 16;

/// Length used when the configuration does not override it
pub const DEFAULT_SECRET_LEN: usize = 20;

/// A password that redacts itself in all output
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Secret {
    inner: String,
}

impl Secret {
    pub fn new(inner: impl Into<String>) -> Self {
        Self {
            inner: inner.into(),
        }
    }

    /// Explicitly access the secret value
    pub fn expose(&self) -> &str {
        &self.inner
    }
}

impl Clone for Secret {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&REDACTED).finish()
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Secret {}

/// Generate an alphanumeric secret from the operating system CSPRNG
///
/// The alphabet is `[A-Za-z0-9]`, so the value never needs shell or SQL
/// escaping. Lengths below [`MIN_SECRET_LEN`] are raised to it.
pub fn generate(length: usize) -> Secret {
    let length = length.max(MIN_SECRET_LEN);
    let inner: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();
    Secret { inner }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_length() {
        assert_eq!(generate(DEFAULT_SECRET_LEN).expose().len(), DEFAULT_SECRET_LEN);
        assert_eq!(generate(32).expose().len(), 32);
    }

    #[test]
    fn test_generate_enforces_minimum() {
        assert_eq!(generate(4).expose().len(), MIN_SECRET_LEN);
    }

    #[test]
    fn test_generate_alphabet() {
        let secret = generate(256);
        assert!(secret.expose().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_independent_values() {
        let first = generate(DEFAULT_SECRET_LEN);
        let second = generate(DEFAULT_SECRET_LEN);
        assert_ne!(first, second);
    }

    #[test]
    fn test_debug_and_display_redacted() {
        let secret = Secret::new("hunter2hunter2hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(\"[REDACTED]\")");
        assert_eq!(format!("{secret}"), REDACTED);
        assert_eq!(secret.expose(), "hunter2hunter2hunter2");
    }
}
