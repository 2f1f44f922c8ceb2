//! Unified sign-up / sign-in.
//!
//! `reconcile` guarantees that on success the identity exists and has a
//! profile row, whichever intent the caller started with. A registration for
//! an email that already exists falls back to authentication exactly once.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use resilink_common::{Email, ErrorClassifier, ErrorKind, ErrorPattern, IdentityId, Password};

use crate::backend::{Identity, IdentityBackend};
use crate::profile::{ProfileStore, ProfileUpsert};

/// What the caller is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Create the identity.
    Register,
    /// Sign in with an existing identity.
    Authenticate,
}

/// Outcome of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationResult {
    /// Identity verified and profile present.
    Authenticated(Identity),
    /// Identity created but not usable until confirmed. No profile written.
    PendingConfirmation,
    /// Classified failure with the underlying message.
    Failed(ErrorKind, String),
}

impl ReconciliationResult {
    /// The authenticated identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            ReconciliationResult::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    /// The failure kind, if any.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            ReconciliationResult::Failed(kind, _) => Some(*kind),
            _ => None,
        }
    }

    fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        ReconciliationResult::Failed(kind, message.into())
    }
}

impl fmt::Display for ReconciliationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationResult::Authenticated(identity) => write!(
                f,
                "Signed in as {}. Profile created/updated.",
                identity.email
            ),
            ReconciliationResult::PendingConfirmation => f.write_str(
                "Sign-up initiated. Check your email to confirm your account. \
                 Profile will be created after confirmation.",
            ),
            ReconciliationResult::Failed(kind, message) if message.is_empty() => {
                f.write_str(kind.user_message())
            }
            ReconciliationResult::Failed(kind, message) => {
                write!(f, "{}: {}", kind.user_message(), message)
            }
        }
    }
}

/// Ensures an identity exists and has a profile.
pub struct IdentityReconciler {
    backend: Arc<dyn IdentityBackend>,
    profiles: Arc<dyn ProfileStore>,
    classifier: ErrorClassifier,
}

impl IdentityReconciler {
    /// Create a reconciler with the default classification table.
    pub fn new(backend: Arc<dyn IdentityBackend>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            backend,
            profiles,
            classifier: ErrorClassifier::default(),
        }
    }

    /// Replace the classification table.
    pub fn with_classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Reconcile an identity.
    ///
    /// # Preconditions
    /// - `email` and `password` are non-empty, otherwise `InvalidInput` is
    ///   returned without any remote call
    ///
    /// # Postconditions
    /// - `Authenticated` implies a profile row keyed by the identity id
    /// - At most two identity calls and one profile write are issued
    pub async fn reconcile(
        &self,
        intent: Intent,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> ReconciliationResult {
        let (email, password) = match (Email::new(email), Password::new(password)) {
            (Ok(email), Ok(password)) => (email, password),
            (Err(err), _) | (_, Err(err)) => {
                return ReconciliationResult::failed(ErrorKind::InvalidInput, err.detail());
            }
        };
        let display_name = display_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        match intent {
            Intent::Register => self.register(email, password, display_name).await,
            Intent::Authenticate => self.authenticate(email, password, display_name).await,
        }
    }

    async fn register(
        &self,
        email: Email,
        password: Password,
        display_name: Option<String>,
    ) -> ReconciliationResult {
        match self.backend.create_identity(&email, &password).await {
            Ok(response) => {
                debug!(backend = self.backend.name(), body = %response.body(), "create identity response");
                if response.requires_confirmation() {
                    info!("Identity {} awaits confirmation", email);
                    return ReconciliationResult::PendingConfirmation;
                }
                match response.identity_id() {
                    Some(id) => self.ensure_profile(id, email, display_name).await,
                    None => {
                        info!("Identity {} created without a usable id", email);
                        ReconciliationResult::PendingConfirmation
                    }
                }
            }
            Err(err) => {
                let message = err.detail();
                if self
                    .classifier
                    .matches(ErrorPattern::DuplicateIdentity, &message)
                {
                    warn!("Identity {} already exists, signing in instead", email);
                    self.authenticate(email, password, display_name).await
                } else {
                    warn!("Create identity failed for {}: {}", email, message);
                    ReconciliationResult::failed(ErrorKind::Unauthenticated, message)
                }
            }
        }
    }

    async fn authenticate(
        &self,
        email: Email,
        password: Password,
        display_name: Option<String>,
    ) -> ReconciliationResult {
        let response = match self.backend.verify_identity(&email, &password).await {
            Ok(response) => response,
            Err(err) => {
                warn!("Verify identity failed for {}: {}", email, err.detail());
                return ReconciliationResult::failed(ErrorKind::Unauthenticated, err.detail());
            }
        };
        debug!(backend = self.backend.name(), body = %response.body(), "verify identity response");

        match response.identity_id() {
            Some(id) => self.ensure_profile(id, email, display_name).await,
            None => ReconciliationResult::failed(ErrorKind::Unauthenticated, "no identity returned"),
        }
    }

    async fn ensure_profile(
        &self,
        id: IdentityId,
        email: Email,
        display_name: Option<String>,
    ) -> ReconciliationResult {
        let upsert = ProfileUpsert {
            id: id.clone(),
            email: email.clone(),
            full_name: display_name.clone(),
        };

        if let Err(err) = self.profiles.upsert_profile(&upsert).await {
            let message = err.detail();
            return match self.classifier.kind_for(&message, ErrorKind::ProfileWriteFailed) {
                ErrorKind::SchemaNotReady => {
                    warn!(store = self.profiles.name(), "Profile store not initialized: {}", message);
                    ReconciliationResult::failed(
                        ErrorKind::SchemaNotReady,
                        "profile store not initialized",
                    )
                }
                kind => {
                    warn!(store = self.profiles.name(), "Profile upsert failed: {}", message);
                    ReconciliationResult::failed(kind, message)
                }
            };
        }

        info!("Identity {} reconciled", id);
        ReconciliationResult::Authenticated(Identity {
            id,
            email,
            display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryIdentityBackend, MemoryProfileStore};

    fn reconciler() -> (
        IdentityReconciler,
        Arc<MemoryIdentityBackend>,
        Arc<MemoryProfileStore>,
    ) {
        let backend = Arc::new(MemoryIdentityBackend::new());
        let profiles = Arc::new(MemoryProfileStore::new());
        let reconciler = IdentityReconciler::new(backend.clone(), profiles.clone());
        (reconciler, backend, profiles)
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_call() {
        let (reconciler, backend, profiles) = reconciler();

        let result = reconciler.reconcile(Intent::Register, "", "pw", None).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidInput));

        let result = reconciler
            .reconcile(Intent::Authenticate, "a@b.c", "", None)
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidInput));

        assert_eq!(backend.create_calls(), 0);
        assert_eq!(backend.verify_calls(), 0);
        assert_eq!(profiles.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn test_register_writes_profile() {
        let (reconciler, backend, profiles) = reconciler();

        let result = reconciler
            .reconcile(Intent::Register, "alice@example.com", "pw", Some("Alice"))
            .await;
        let identity = result.identity().unwrap().clone();

        assert_eq!(backend.create_calls(), 1);
        assert_eq!(backend.verify_calls(), 0);
        let profile = profiles.get(&identity.id).await.unwrap();
        assert_eq!(profile.id, identity.id);
        assert_eq!(profile.full_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_blank_display_name_dropped() {
        let (reconciler, _, profiles) = reconciler();

        let result = reconciler
            .reconcile(Intent::Register, "a@b.c", "pw", Some("   "))
            .await;
        let identity = result.identity().unwrap();
        assert!(identity.display_name.is_none());
        assert!(profiles.get(&identity.id).await.unwrap().full_name.is_none());
    }

    #[tokio::test]
    async fn test_unclassified_create_failure() {
        let (reconciler, backend, profiles) = reconciler();
        backend.fail_creates_with("Password should be at least 6 characters").await;

        let result = reconciler.reconcile(Intent::Register, "a@b.c", "pw", None).await;
        assert_eq!(
            result,
            ReconciliationResult::Failed(
                ErrorKind::Unauthenticated,
                "Password should be at least 6 characters".into()
            )
        );
        assert_eq!(backend.verify_calls(), 0);
        assert_eq!(profiles.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn test_pending_confirmation_skips_profile() {
        let (reconciler, backend, profiles) = reconciler();
        backend.require_confirmation(true);

        let result = reconciler.reconcile(Intent::Register, "a@b.c", "pw", None).await;
        assert_eq!(result, ReconciliationResult::PendingConfirmation);
        assert_eq!(profiles.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn test_generic_profile_failure() {
        let (reconciler, _, profiles) = reconciler();
        profiles.fail_upserts_with("permission denied for table profiles").await;

        let result = reconciler.reconcile(Intent::Register, "a@b.c", "pw", None).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::ProfileWriteFailed));
    }

    #[test]
    fn test_display_messages() {
        assert!(ReconciliationResult::PendingConfirmation
            .to_string()
            .starts_with("Sign-up initiated"));
        let failed = ReconciliationResult::Failed(ErrorKind::Unauthenticated, "Invalid login credentials".into());
        assert!(failed.to_string().ends_with("Invalid login credentials"));
    }
}
