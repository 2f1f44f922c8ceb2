//! Ordered candidate discovery over an object store.
//!
//! Containers are the outer axis and paths the inner one: every path of a
//! container is tried before the next container. The first probe that lists
//! without error is adopted, even when it lists nothing.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use resilink_common::{ContainerName, Error, Result};

use crate::key::StorageKey;
use crate::provider::{ListOptions, ObjectStore};

/// Page size of every discovery probe.
pub const LIST_PAGE_SIZE: usize = 100;

/// A listed object with its public locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    pub public_locator: String,
}

/// The (container, path) pair adopted by a discovery run, with its listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredLocation {
    pub container: ContainerName,
    pub sub_path: String,
    pub entries: Vec<ResourceEntry>,
}

impl DiscoveredLocation {
    /// Look up an entry by name.
    pub fn entry(&self, name: &str) -> Option<&ResourceEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Human-readable status line.
    pub fn summary(&self) -> String {
        let path = if self.sub_path.is_empty() {
            "/"
        } else {
            self.sub_path.as_str()
        };
        if self.entries.is_empty() {
            format!("No files found in bucket \"{}\" (path: {})", self.container, path)
        } else {
            format!(
                "Loaded {} file(s) from \"{}\" (path: {})",
                self.entries.len(),
                self.container,
                path
            )
        }
    }
}

/// Container and path used to scope uploads.
///
/// Advisory only: the next discovery recomputes it from scratch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub container: ContainerName,
    pub sub_path: String,
}

/// Discovers a usable container and operates on it.
pub struct ResourceLocator {
    store: Arc<dyn ObjectStore>,
    containers: Vec<ContainerName>,
    paths: Vec<Option<String>>,
    selected: RwLock<Option<Selection>>,
}

impl ResourceLocator {
    /// Create a locator over ordered candidates.
    ///
    /// A `None` path means "omitted" and is listed as the container root.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        containers: impl IntoIterator<Item = ContainerName>,
        paths: Vec<Option<String>>,
    ) -> Self {
        Self {
            store,
            containers: containers.into_iter().collect(),
            paths,
            selected: RwLock::new(None),
        }
    }

    /// Path variants tried by default: omitted, empty, and `/`.
    pub fn default_paths() -> Vec<Option<String>> {
        vec![None, Some(String::new()), Some("/".to_string())]
    }

    /// Configured container candidates, in priority order.
    pub fn containers(&self) -> &[ContainerName] {
        &self.containers
    }

    /// Current selection.
    ///
    /// Before any successful discovery this is the first container candidate
    /// at its root. `None` if no candidates are configured.
    pub async fn selected(&self) -> Option<Selection> {
        if let Some(selection) = self.selected.read().await.clone() {
            return Some(selection);
        }
        self.containers.first().map(|container| Selection {
            container: container.clone(),
            sub_path: String::new(),
        })
    }

    /// Probe `containers` x `paths` in order and adopt the first pair that lists.
    ///
    /// # Postconditions
    /// - On success the selection is updated to the returned pair
    /// - No probe is issued after the adopted one
    ///
    /// # Errors
    /// - `NoLocationFound` carrying the last probe's message if every probe failed
    pub async fn discover(
        &self,
        containers: &[ContainerName],
        paths: &[Option<String>],
    ) -> Result<DiscoveredLocation> {
        let options = ListOptions {
            limit: LIST_PAGE_SIZE,
            offset: 0,
        };
        let mut last_error: Option<String> = None;

        for container in containers {
            for path in paths {
                let sub_path = path.as_deref().unwrap_or("");
                debug!(store = self.store.name(), container = %container, path = sub_path, "probing candidate");

                let objects = match self.store.list(container.as_str(), sub_path, options).await {
                    Ok(objects) => objects,
                    Err(err) => {
                        debug!(container = %container, path = sub_path, "probe failed: {}", err);
                        last_error = Some(err.detail());
                        continue;
                    }
                };

                // An empty listing is authoritative: the container exists, so stop here.
                let entries = if objects.is_empty() {
                    Vec::new()
                } else {
                    objects
                        .iter()
                        .map(|object| {
                            let name = object.display_name().to_string();
                            let public_locator = self
                                .store
                                .public_locator(container.as_str(), &object_key(sub_path, &name));
                            ResourceEntry {
                                name,
                                public_locator,
                            }
                        })
                        .collect()
                };

                let location = DiscoveredLocation {
                    container: container.clone(),
                    sub_path: sub_path.to_string(),
                    entries,
                };
                *self.selected.write().await = Some(Selection {
                    container: location.container.clone(),
                    sub_path: location.sub_path.clone(),
                });
                info!("{}", location.summary());
                return Ok(location);
            }
        }

        warn!(
            "Failed to list files for candidates {:?}: {}",
            containers,
            last_error.as_deref().unwrap_or("no candidates were probed")
        );
        Err(Error::NoLocationFound { last_error })
    }

    /// Re-run discovery over the configured candidates.
    pub async fn refresh(&self) -> Result<DiscoveredLocation> {
        self.discover(&self.containers, &self.paths).await
    }

    /// Upload `data` into the selected container under a timestamped key.
    ///
    /// The listing of the same container and path is refreshed afterwards; a
    /// failed refresh is logged and does not fail the upload.
    ///
    /// # Errors
    /// - `InvalidInput` for an unusable file name or no configured container
    /// - `UploadFailed` with the store's message verbatim
    pub async fn upload(&self, original_name: &str, data: Vec<u8>) -> Result<ResourceEntry> {
        let selection = self.selected().await.ok_or_else(|| {
            Error::InvalidInput("No container candidates configured".to_string())
        })?;
        let name = StorageKey::generate(original_name)?.as_key();
        let key = object_key(&selection.sub_path, &name);

        self.store
            .put_object(selection.container.as_str(), &key, data)
            .await
            .map_err(|err| Error::UploadFailed(err.detail()))?;
        info!("Upload successful: {} into \"{}\"", key, selection.container);

        match self
            .discover(
                std::slice::from_ref(&selection.container),
                &[Some(selection.sub_path.clone())],
            )
            .await
        {
            Ok(location) => debug!("{}", location.summary()),
            Err(err) => warn!("Listing refresh after upload failed: {}", err),
        }

        Ok(ResourceEntry {
            public_locator: self.store.public_locator(selection.container.as_str(), &key),
            name,
        })
    }

    /// Resolve the public locator of `name` in the selected container.
    pub async fn locate(&self, name: &str) -> Result<ResourceEntry> {
        let selection = self.selected().await.ok_or_else(|| {
            Error::InvalidInput("No container candidates configured".to_string())
        })?;
        Ok(ResourceEntry {
            name: name.to_string(),
            public_locator: self
                .store
                .public_locator(selection.container.as_str(), &object_key(&selection.sub_path, name)),
        })
    }
}

/// Object key of `name` under `sub_path`; root paths add no prefix.
fn object_key(sub_path: &str, name: &str) -> String {
    let prefix = sub_path.trim_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}
