//! Common types used throughout resilink.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

/// Validated email address used as the identity's unique handle.
///
/// Only non-emptiness is enforced; address syntax is the backend's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Create a new Email.
    ///
    /// # Errors
    /// - Returns `InvalidInput` if the address is empty or whitespace
    pub fn new(email: impl Into<String>) -> crate::Result<Self> {
        let email = email.into();
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identity id assigned by the identity backend.
///
/// resilink never generates these; it only carries what the backend returned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityId(String);

impl IdentityId {
    /// Create a new IdentityId.
    ///
    /// # Errors
    /// - Returns error if id is empty
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(crate::Error::InvalidInput(
                "IdentityId cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a storage container (bucket).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerName(String);

impl ContainerName {
    /// Create a new ContainerName.
    ///
    /// # Errors
    /// - Returns `InvalidInput` if the name is empty or whitespace
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidInput(
                "ContainerName cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<str> for ContainerName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ContainerName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Password that zeroizes on drop and never prints.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Password(String);

impl Password {
    /// Create a new Password.
    ///
    /// # Errors
    /// - Returns `InvalidInput` if the password is empty
    pub fn new(password: impl Into<String>) -> crate::Result<Self> {
        let password = password.into();
        if password.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }
        Ok(Self(password))
    }

    /// Expose the secret for a backend call.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Password([REDACTED])")
    }
}
