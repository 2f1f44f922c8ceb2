//! Identity backend over the hosted auth HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use resilink_common::{BackendConfig, Email, Error, Password, Result};

use super::{authorize, build_client, read_json};
use crate::backend::{AuthResponse, IdentityBackend};

/// Identity backend using `POST /auth/v1/signup` and
/// `POST /auth/v1/token?grant_type=password`.
pub struct HttpIdentityBackend {
    http: Client,
    config: BackendConfig,
}

impl HttpIdentityBackend {
    /// Create a new backend client.
    pub fn new(config: BackendConfig) -> Result<Self> {
        Ok(Self {
            http: build_client()?,
            config,
        })
    }

    async fn post_credentials(&self, path: &str, email: &Email, password: &Password) -> Result<Value> {
        let url = self.config.endpoint(path);
        debug!("POST {}", url);

        let response = authorize(self.http.post(&url), &self.config)
            .json(&json!({
                "email": email.as_str(),
                "password": password.expose(),
            }))
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request to {} failed: {}", path, e)))?;

        read_json(response).await
    }
}

/// A sign-up that issued no session is waiting on confirmation.
fn issued_session(body: &Value) -> bool {
    body.get("access_token").is_some() || body.pointer("/session/access_token").is_some()
}

#[async_trait]
impl IdentityBackend for HttpIdentityBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn create_identity(&self, email: &Email, password: &Password) -> Result<AuthResponse> {
        let body = self
            .post_credentials("/auth/v1/signup", email, password)
            .await?;

        if issued_session(&body) {
            Ok(AuthResponse::new(body))
        } else {
            Ok(AuthResponse::pending_confirmation(body))
        }
    }

    async fn verify_identity(&self, email: &Email, password: &Password) -> Result<AuthResponse> {
        let body = self
            .post_credentials("/auth/v1/token?grant_type=password", email, password)
            .await?;
        Ok(AuthResponse::new(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_session_shapes() {
        assert!(issued_session(&json!({ "access_token": "t", "user": {} })));
        assert!(issued_session(&json!({ "session": { "access_token": "t" } })));
        assert!(!issued_session(&json!({ "id": "u", "confirmation_sent_at": "now" })));
        assert!(!issued_session(&json!({ "user": { "id": "u" }, "session": null })));
    }
}
