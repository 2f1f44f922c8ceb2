//! Backend endpoint configuration shared by the HTTP collaborators.

use url::Url;

use crate::{Error, Result};

/// Location and credentials of the remote identity/storage backend.
///
/// Not serializable: the key only leaves the process as a request header.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL, without trailing slash.
    url: String,
    /// Public API key sent with every request.
    api_key: String,
}

impl BackendConfig {
    /// Create a new backend configuration.
    ///
    /// # Errors
    /// - Returns `Config` if either value is empty or the URL does not parse
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let api_key = api_key.into();
        if url.trim().is_empty() || api_key.trim().is_empty() {
            return Err(Error::Config(
                "backend is not configured: set the backend URL and API key".to_string(),
            ));
        }
        Url::parse(url.trim())
            .map_err(|e| Error::Config(format!("Invalid backend URL '{}': {}", url, e)))?;

        Ok(Self {
            url: url.trim().trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    /// Base URL without trailing slash.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Join a path (starting with '/') onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.url, path)
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
