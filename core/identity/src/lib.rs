//! Identity reconciliation for resilink.
//!
//! This module provides:
//! - The `IdentityBackend` and `ProfileStore` collaborator traits
//! - `IdentityReconciler`, which unifies sign-up and sign-in into one
//!   idempotent "ensure this identity exists and has a profile" operation
//! - In-memory, SQLite and HTTP implementations of the collaborators
//!
//! # Design Principles
//! - Collaborators are injected, never global
//! - Backend failures are classified at the call site and returned as a
//!   typed `ReconciliationResult`, never propagated as raw errors

pub mod backend;
pub mod extract;
pub mod http;
pub mod memory;
pub mod profile;
pub mod reconciler;
pub mod sqlite;

pub use backend::{AuthResponse, Identity, IdentityBackend};
pub use extract::extract_identity_id;
pub use http::{HttpIdentityBackend, HttpProfileStore};
pub use memory::{MemoryIdentityBackend, MemoryProfileStore};
pub use profile::{Profile, ProfileStore, ProfileUpsert};
pub use reconciler::{IdentityReconciler, Intent, ReconciliationResult};
pub use sqlite::SqliteProfileStore;
