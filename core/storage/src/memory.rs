//! In-memory object store for testing.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

use resilink_common::{Error, Result};

use crate::provider::{ListOptions, ListedObject, ObjectStore};

/// In-memory object store.
///
/// Useful for testing and development. Records every listing probe and can
/// be told to fail specific (container, path) pairs.
pub struct MemoryObjectStore {
    containers: RwLock<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
    failures: RwLock<HashMap<(String, String), String>>,
    probes: RwLock<Vec<(String, String)>>,
}

impl MemoryObjectStore {
    /// Create a store with no containers.
    pub fn new() -> Self {
        Self {
            containers: RwLock::new(BTreeMap::new()),
            failures: RwLock::new(HashMap::new()),
            probes: RwLock::new(Vec::new()),
        }
    }

    /// Create an empty container. No-op if it exists.
    pub async fn create_container(&self, container: &str) {
        self.containers
            .write()
            .await
            .entry(container.to_string())
            .or_default();
    }

    /// Fail listings of `path` in `container` with `message`.
    pub async fn fail_listing(&self, container: &str, path: &str, message: impl Into<String>) {
        self.failures
            .write()
            .await
            .insert((container.to_string(), path.to_string()), message.into());
    }

    /// Every (container, path) listed so far, in call order.
    pub async fn probes(&self) -> Vec<(String, String)> {
        self.probes.read().await.clone()
    }

    /// Stored bytes for `key`.
    pub async fn object(&self, container: &str, key: &str) -> Option<Vec<u8>> {
        self.containers
            .read()
            .await
            .get(container)
            .and_then(|objects| objects.get(key))
            .cloned()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list(&self, container: &str, path: &str, options: ListOptions) -> Result<Vec<ListedObject>> {
        self.probes
            .write()
            .await
            .push((container.to_string(), path.to_string()));

        if let Some(message) = self
            .failures
            .read()
            .await
            .get(&(container.to_string(), path.to_string()))
        {
            return Err(Error::Backend(message.clone()));
        }

        let containers = self.containers.read().await;
        let objects = containers
            .get(container)
            .ok_or_else(|| Error::Backend("Bucket not found".to_string()))?;

        let prefix = path.trim_matches('/');
        let mut folders = BTreeSet::new();
        let mut results = Vec::new();

        for key in objects.keys() {
            let relative = if prefix.is_empty() {
                Some(key.as_str())
            } else {
                key.strip_prefix(prefix).and_then(|rest| rest.strip_prefix('/'))
            };
            let Some(relative) = relative else {
                continue;
            };

            // Deeper keys show up once as a folder row without an id
            match relative.split_once('/') {
                Some((folder, _)) => {
                    if folders.insert(folder.to_string()) {
                        results.push(ListedObject::named(folder));
                    }
                }
                None => results.push(ListedObject {
                    name: Some(relative.to_string()),
                    id: Some(key.clone()),
                    path: None,
                }),
            }
        }

        Ok(results
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .collect())
    }

    async fn put_object(&self, container: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let mut containers = self.containers.write().await;
        let objects = containers
            .get_mut(container)
            .ok_or_else(|| Error::Backend("Bucket not found".to_string()))?;

        if objects.contains_key(key) {
            return Err(Error::Backend("The resource already exists".to_string()));
        }
        objects.insert(key.to_string(), data);
        Ok(())
    }

    fn public_locator(&self, container: &str, key: &str) -> String {
        format!("memory://{}/{}", container, key)
    }
}
