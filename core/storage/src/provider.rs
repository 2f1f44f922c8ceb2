//! Object store trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use resilink_common::Result;

/// One row of a listing response.
///
/// Stores disagree on which field names an object; any of the three may be
/// absent. Use [`ListedObject::display_name`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedObject {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl ListedObject {
    /// Object with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Name derived from `name`, then `id`, then `path`; empty if none is set.
    pub fn display_name(&self) -> &str {
        [&self.name, &self.id, &self.path]
            .into_iter()
            .find_map(|field| field.as_deref().filter(|value| !value.is_empty()))
            .unwrap_or("")
    }
}

/// Paging bounds for a listing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: usize,
    pub offset: usize,
}

/// Remote object store organized in named containers.
///
/// Implementations must handle their own authentication.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Get the store name (e.g., "memory", "http").
    fn name(&self) -> &str;

    /// List objects under `path` in `container`.
    ///
    /// `path` is `""` for the container root.
    ///
    /// # Errors
    /// - Container does not exist or is not accessible
    /// - Network errors
    async fn list(&self, container: &str, path: &str, options: ListOptions) -> Result<Vec<ListedObject>>;

    /// Store `data` under `key` in `container`.
    ///
    /// # Errors
    /// - Key already exists
    /// - Container does not exist
    /// - Network errors
    async fn put_object(&self, container: &str, key: &str, data: Vec<u8>) -> Result<()>;

    /// Public locator (URL) for `key` in `container`. Does not check existence.
    fn public_locator(&self, container: &str, key: &str) -> String;
}
