//! Profile store over the hosted REST API.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use resilink_common::{BackendConfig, Error, IdentityId, Result};

use super::{authorize, build_client, read_json};
use crate::profile::{Profile, ProfileStore, ProfileUpsert};

const PROFILES_PATH: &str = "/rest/v1/profiles";

/// Profile store writing to the `profiles` relation through the REST API.
///
/// Upserts merge on `id`; columns absent from the payload keep their values.
pub struct HttpProfileStore {
    http: Client,
    config: BackendConfig,
}

impl HttpProfileStore {
    /// Create a new store client.
    pub fn new(config: BackendConfig) -> Result<Self> {
        Ok(Self {
            http: build_client()?,
            config,
        })
    }
}

#[async_trait]
impl ProfileStore for HttpProfileStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn upsert_profile(&self, profile: &ProfileUpsert) -> Result<()> {
        let url = self.config.endpoint(PROFILES_PATH);
        debug!("Upserting profile {} via {}", profile.id, url);

        let response = authorize(self.http.post(&url), &self.config)
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[profile])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to upsert profile: {}", e)))?;

        read_json(response).await.map(|_| ())
    }

    async fn get_profile(&self, id: &IdentityId) -> Result<Option<Profile>> {
        let url = self.config.endpoint(PROFILES_PATH);
        let filter = format!("eq.{}", id);

        let response = authorize(self.http.get(&url), &self.config)
            .query(&[
                ("id", filter.as_str()),
                ("select", "id,email,full_name,created_at"),
            ])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to fetch profile: {}", e)))?;

        let rows: Vec<Profile> = serde_json::from_value(read_json(response).await?)?;
        Ok(rows.into_iter().next())
    }
}
