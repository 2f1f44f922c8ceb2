//! Object store over the hosted storage HTTP API.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{header, Client};
use serde_json::json;
use tracing::debug;

use resilink_common::http::{authorize, build_client, read_body};
use resilink_common::{BackendConfig, Error, Result};

use crate::provider::{ListOptions, ListedObject, ObjectStore};

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Encode a key, keeping `/` between segments.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Object store using `/storage/v1/object/...` endpoints.
pub struct HttpObjectStore {
    http: Client,
    config: BackendConfig,
}

impl HttpObjectStore {
    /// Create a new store client.
    pub fn new(config: BackendConfig) -> Result<Self> {
        Ok(Self {
            http: build_client()?,
            config,
        })
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn list(&self, container: &str, path: &str, options: ListOptions) -> Result<Vec<ListedObject>> {
        let url = self.config.endpoint(&format!(
            "/storage/v1/object/list/{}",
            encode_key(container)
        ));
        debug!("POST {} prefix={:?}", url, path);

        let response = authorize(self.http.post(&url), &self.config)
            .json(&json!({
                "prefix": path,
                "limit": options.limit,
                "offset": options.offset,
                "sortBy": { "column": "name", "order": "asc" },
            }))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to list container: {}", e)))?;

        let body = read_body(response).await?;
        serde_json::from_str::<Vec<ListedObject>>(&body)
            .map_err(|e| Error::Serialization(format!("Invalid listing response: {}", e)))
    }

    async fn put_object(&self, container: &str, key: &str, data: Vec<u8>) -> Result<()> {
        let url = self.config.endpoint(&format!(
            "/storage/v1/object/{}/{}",
            encode_key(container),
            encode_key(key)
        ));
        debug!("POST {} ({} bytes)", url, data.len());

        let response = authorize(self.http.post(&url), &self.config)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Failed to upload object: {}", e)))?;

        read_body(response).await.map(|_| ())
    }

    fn public_locator(&self, container: &str, key: &str) -> String {
        self.config.endpoint(&format!(
            "/storage/v1/object/public/{}/{}",
            encode_key(container),
            encode_key(key)
        ))
    }
}
