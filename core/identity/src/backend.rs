//! Identity backend trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use resilink_common::{Email, IdentityId, Password, Result};

use crate::extract::extract_identity_id;

/// An authenticated principal known to the identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Backend-assigned id.
    pub id: IdentityId,
    /// Unique email address.
    pub email: Email,
    /// Optional display name supplied at reconciliation time.
    pub display_name: Option<String>,
}

/// Raw response from a create or verify call.
///
/// The body shape differs between backends and calls; use
/// [`AuthResponse::identity_id`] rather than reading it directly.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    body: Value,
    requires_confirmation: bool,
}

impl AuthResponse {
    /// Response for an identity that is immediately usable.
    pub fn new(body: Value) -> Self {
        Self {
            body,
            requires_confirmation: false,
        }
    }

    /// Response for an identity that must be confirmed before use.
    pub fn pending_confirmation(body: Value) -> Self {
        Self {
            body,
            requires_confirmation: true,
        }
    }

    /// Raw response body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Whether the backend withheld a usable identity pending confirmation.
    pub fn requires_confirmation(&self) -> bool {
        self.requires_confirmation
    }

    /// Identity id, if the response carries one.
    pub fn identity_id(&self) -> Option<IdentityId> {
        extract_identity_id(&self.body)
    }
}

/// Remote identity service.
///
/// Implementations report failures as `Err` carrying the backend's own
/// message; callers classify the text.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Get the backend name (e.g., "memory", "http").
    fn name(&self) -> &str;

    /// Register a new identity.
    ///
    /// # Postconditions
    /// - On success the identity exists, possibly awaiting confirmation
    ///
    /// # Errors
    /// - Identity already exists (backend wording varies)
    /// - Network errors
    async fn create_identity(&self, email: &Email, password: &Password) -> Result<AuthResponse>;

    /// Verify credentials for an existing identity.
    ///
    /// # Errors
    /// - Invalid credentials or unconfirmed identity
    /// - Network errors
    async fn verify_identity(&self, email: &Email, password: &Password) -> Result<AuthResponse>;
}
