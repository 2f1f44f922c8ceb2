//! Profile store trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use resilink_common::{Email, IdentityId, Result};

/// Application-owned record mirroring an identity.
///
/// `id` always equals the id of the identity it was reconciled for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Identity id (1:1).
    pub id: IdentityId,
    /// Email at last reconciliation.
    pub email: String,
    /// Display name, if ever supplied.
    pub full_name: Option<String>,
    /// When the row was first written.
    pub created_at: DateTime<Utc>,
}

/// Fields written by an upsert.
///
/// `full_name: None` leaves an existing value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpsert {
    pub id: IdentityId,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Application profile store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Get the store name (e.g., "memory", "sqlite", "http").
    fn name(&self) -> &str;

    /// Insert or update the profile keyed by `profile.id`.
    ///
    /// # Postconditions
    /// - A row with `profile.id` exists with the supplied fields
    /// - Fields not supplied keep their previous values
    ///
    /// # Errors
    /// - Backing relation missing (wording varies by store)
    /// - Constraint violations
    async fn upsert_profile(&self, profile: &ProfileUpsert) -> Result<()>;

    /// Get a profile by identity id.
    async fn get_profile(&self, id: &IdentityId) -> Result<Option<Profile>>;
}
