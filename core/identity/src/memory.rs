//! In-memory identity backend and profile store for testing.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use resilink_common::{Email, Error, IdentityId, Password, Result};

use crate::backend::{AuthResponse, IdentityBackend};
use crate::profile::{Profile, ProfileStore, ProfileUpsert};

#[derive(Debug, Clone)]
struct Account {
    id: String,
    password: String,
    confirmed: bool,
}

/// In-memory identity backend.
///
/// Mimics the wording of a hosted auth service so that the default
/// classification table applies. Counts calls for assertions.
pub struct MemoryIdentityBackend {
    accounts: RwLock<HashMap<String, Account>>,
    require_confirmation: AtomicBool,
    omit_ids: AtomicBool,
    create_failure: RwLock<Option<String>>,
    create_calls: AtomicUsize,
    verify_calls: AtomicUsize,
}

impl MemoryIdentityBackend {
    /// Create an empty backend that confirms identities immediately.
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            require_confirmation: AtomicBool::new(false),
            omit_ids: AtomicBool::new(false),
            create_failure: RwLock::new(None),
            create_calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    /// Require email confirmation for identities created from now on.
    pub fn require_confirmation(&self, required: bool) {
        self.require_confirmation.store(required, Ordering::SeqCst);
    }

    /// Leave the user id out of successful responses.
    pub fn omit_ids(&self, omit: bool) {
        self.omit_ids.store(omit, Ordering::SeqCst);
    }

    /// Fail every create call with `message`.
    pub async fn fail_creates_with(&self, message: impl Into<String>) {
        *self.create_failure.write().await = Some(message.into());
    }

    /// Mark an identity as confirmed. Returns false if unknown.
    pub async fn confirm(&self, email: &str) -> bool {
        match self.accounts.write().await.get_mut(email) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Number of create calls received.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of verify calls received.
    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

impl Default for MemoryIdentityBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityBackend for MemoryIdentityBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_identity(&self, email: &Email, password: &Password) -> Result<AuthResponse> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.create_failure.read().await.clone() {
            return Err(Error::Backend(message));
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email.as_str()) {
            return Err(Error::Backend("User already registered".to_string()));
        }

        let confirmed = !self.require_confirmation.load(Ordering::SeqCst);
        let id = Uuid::new_v4().to_string();
        accounts.insert(
            email.as_str().to_string(),
            Account {
                id: id.clone(),
                password: password.expose().to_string(),
                confirmed,
            },
        );

        if !confirmed {
            return Ok(AuthResponse::pending_confirmation(json!({
                "user": null,
                "session": null,
            })));
        }
        if self.omit_ids.load(Ordering::SeqCst) {
            return Ok(AuthResponse::new(json!({ "user": null })));
        }

        let user = json!({ "id": id, "email": email.as_str() });
        Ok(AuthResponse::new(json!({
            "user": user,
            "session": { "access_token": Uuid::new_v4().to_string(), "user": user },
        })))
    }

    async fn verify_identity(&self, email: &Email, password: &Password) -> Result<AuthResponse> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);

        let accounts = self.accounts.read().await;
        let account = accounts
            .get(email.as_str())
            .filter(|account| account.password == password.expose())
            .ok_or_else(|| Error::Backend("Invalid login credentials".to_string()))?;

        if !account.confirmed {
            return Err(Error::Backend("Email not confirmed".to_string()));
        }
        if self.omit_ids.load(Ordering::SeqCst) {
            return Ok(AuthResponse::new(json!({
                "access_token": Uuid::new_v4().to_string(),
                "token_type": "bearer",
            })));
        }

        Ok(AuthResponse::new(json!({
            "access_token": Uuid::new_v4().to_string(),
            "token_type": "bearer",
            "user": { "id": account.id, "email": email.as_str() },
        })))
    }
}

/// In-memory profile store.
///
/// Enforces the same constraints as the SQL relation: primary key on `id`
/// and a unique `email`.
pub struct MemoryProfileStore {
    rows: RwLock<HashMap<IdentityId, Profile>>,
    schema_ready: AtomicBool,
    upsert_failure: RwLock<Option<String>>,
    upsert_calls: AtomicUsize,
}

impl MemoryProfileStore {
    /// Create an initialized, empty store.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            schema_ready: AtomicBool::new(true),
            upsert_failure: RwLock::new(None),
            upsert_calls: AtomicUsize::new(0),
        }
    }

    /// Create a store whose relation has not been created yet.
    pub fn without_schema() -> Self {
        let store = Self::new();
        store.schema_ready.store(false, Ordering::SeqCst);
        store
    }

    /// Create the relation. Idempotent.
    pub fn ensure_schema(&self) {
        self.schema_ready.store(true, Ordering::SeqCst);
    }

    /// Fail every upsert with `message`.
    pub async fn fail_upserts_with(&self, message: impl Into<String>) {
        *self.upsert_failure.write().await = Some(message.into());
    }

    /// Get a row directly.
    pub async fn get(&self, id: &IdentityId) -> Option<Profile> {
        self.rows.read().await.get(id).cloned()
    }

    /// Number of rows.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Number of upsert calls received.
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

impl Default for MemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert_profile(&self, profile: &ProfileUpsert) -> Result<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.upsert_failure.read().await.clone() {
            return Err(Error::Backend(message));
        }
        if !self.schema_ready.load(Ordering::SeqCst) {
            return Err(Error::Backend(
                r#"relation "public.profiles" does not exist"#.to_string(),
            ));
        }

        let mut rows = self.rows.write().await;
        let email_taken = rows
            .values()
            .any(|row| row.email == profile.email.as_str() && row.id != profile.id);
        if email_taken {
            return Err(Error::Backend(
                r#"duplicate key value violates unique constraint "profiles_email_key""#
                    .to_string(),
            ));
        }

        match rows.get_mut(&profile.id) {
            Some(row) => {
                row.email = profile.email.as_str().to_string();
                if profile.full_name.is_some() {
                    row.full_name = profile.full_name.clone();
                }
            }
            None => {
                rows.insert(
                    profile.id.clone(),
                    Profile {
                        id: profile.id.clone(),
                        email: profile.email.as_str().to_string(),
                        full_name: profile.full_name.clone(),
                        created_at: Utc::now(),
                    },
                );
            }
        }

        Ok(())
    }

    async fn get_profile(&self, id: &IdentityId) -> Result<Option<Profile>> {
        Ok(self.get(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(id: &str, email: &str, full_name: Option<&str>) -> ProfileUpsert {
        ProfileUpsert {
            id: IdentityId::new(id).unwrap(),
            email: Email::new(email).unwrap(),
            full_name: full_name.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_duplicate_create_wording() {
        let backend = MemoryIdentityBackend::new();
        let email = Email::new("a@b.c").unwrap();
        let password = Password::new("pw").unwrap();

        backend.create_identity(&email, &password).await.unwrap();
        let err = backend.create_identity(&email, &password).await.unwrap_err();
        assert_eq!(err.detail(), "User already registered");
    }

    #[tokio::test]
    async fn test_verify_wrong_password() {
        let backend = MemoryIdentityBackend::new();
        let email = Email::new("a@b.c").unwrap();
        backend
            .create_identity(&email, &Password::new("right").unwrap())
            .await
            .unwrap();

        let err = backend
            .verify_identity(&email, &Password::new("wrong").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.detail(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_unconfirmed_until_confirmed() {
        let backend = MemoryIdentityBackend::new();
        backend.require_confirmation(true);
        let email = Email::new("a@b.c").unwrap();
        let password = Password::new("pw").unwrap();

        let response = backend.create_identity(&email, &password).await.unwrap();
        assert!(response.requires_confirmation());
        assert!(backend.verify_identity(&email, &password).await.is_err());

        assert!(backend.confirm("a@b.c").await);
        let response = backend.verify_identity(&email, &password).await.unwrap();
        assert!(response.identity_id().is_some());
    }

    #[tokio::test]
    async fn test_upsert_preserves_unsupplied_name() {
        let store = MemoryProfileStore::new();
        store.upsert_profile(&upsert("u1", "a@b.c", Some("Alice"))).await.unwrap();
        let first = store.get(&IdentityId::new("u1").unwrap()).await.unwrap();

        store.upsert_profile(&upsert("u1", "a@b.c", None)).await.unwrap();
        let second = store.get(&IdentityId::new("u1").unwrap()).await.unwrap();

        assert_eq!(second.full_name.as_deref(), Some("Alice"));
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unique_email() {
        let store = MemoryProfileStore::new();
        store.upsert_profile(&upsert("u1", "a@b.c", None)).await.unwrap();
        let err = store.upsert_profile(&upsert("u2", "a@b.c", None)).await.unwrap_err();
        assert!(err.detail().contains("unique constraint"));
    }

    #[tokio::test]
    async fn test_missing_schema_message() {
        let store = MemoryProfileStore::without_schema();
        let err = store.upsert_profile(&upsert("u1", "a@b.c", None)).await.unwrap_err();
        assert!(err.detail().contains("does not exist"));

        store.ensure_schema();
        assert!(store.upsert_profile(&upsert("u1", "a@b.c", None)).await.is_ok());
    }
}
