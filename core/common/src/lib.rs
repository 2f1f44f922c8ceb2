//! Common utilities and types shared across resilink crates.
//!
//! This module provides the error taxonomy, the message classifier used to
//! turn backend wording into control flow, and validated input types.

pub mod classify;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use classify::{ErrorClassifier, ErrorPattern, PatternRule};
pub use config::BackendConfig;
pub use error::{Error, ErrorKind, Result};
pub use types::{ContainerName, Email, IdentityId, Password};
