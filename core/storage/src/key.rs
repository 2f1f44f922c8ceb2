//! Storage key generation.
//!
//! Keys are `<unix millis>_<original name>`. Two uploads of the same name in
//! the same millisecond produce the same key; the store then rejects the
//! second one. That collision is not detected here.

use chrono::Utc;

use resilink_common::{Error, Result};

/// Generated key with its timestamp prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    pub timestamp_millis: i64,
    pub original_name: String,
}

impl StorageKey {
    /// Generate a key for `original_name` at the current time.
    ///
    /// # Errors
    /// - `InvalidInput` if the name is empty or contains a path separator
    pub fn generate(original_name: &str) -> Result<Self> {
        Self::at(original_name, Utc::now().timestamp_millis())
    }

    /// Build a key for an explicit timestamp.
    pub fn at(original_name: &str, timestamp_millis: i64) -> Result<Self> {
        if original_name.is_empty() {
            return Err(Error::InvalidInput("File name cannot be empty".to_string()));
        }
        if original_name.contains('/') || original_name.contains('\\') {
            return Err(Error::InvalidInput(
                "File name cannot contain separators".to_string(),
            ));
        }
        Ok(Self {
            timestamp_millis,
            original_name: original_name.to_string(),
        })
    }

    /// Rendered key.
    pub fn as_key(&self) -> String {
        storage_key(&self.original_name, self.timestamp_millis)
    }
}

/// Render `<timestamp_millis>_<original_name>`.
pub fn storage_key(original_name: &str, timestamp_millis: i64) -> String {
    format!("{}_{}", timestamp_millis, original_name)
}

/// Split a generated key back into timestamp and original name.
pub fn parse_storage_key(key: &str) -> Option<(i64, &str)> {
    let (prefix, name) = key.split_once('_')?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((prefix.parse().ok()?, name))
}
