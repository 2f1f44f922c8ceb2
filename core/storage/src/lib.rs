//! Storage discovery for resilink.
//!
//! This module provides an `ObjectStore` abstraction over a remote bucket
//! service and a `ResourceLocator` that finds the first usable
//! (container, path) pair among ordered candidates, then uploads, lists and
//! resolves public locators against it.
//!
//! # Design Principles
//! - Candidates are probed strictly in order; the first answer wins
//! - A successful empty listing is authoritative and stops the search
//! - Store failures are recorded per probe and never escape discovery raw

pub mod http;
pub mod key;
pub mod locator;
pub mod memory;
pub mod provider;

pub use http::HttpObjectStore;
pub use key::{parse_storage_key, storage_key, StorageKey};
pub use locator::{DiscoveredLocation, ResourceEntry, ResourceLocator, Selection, LIST_PAGE_SIZE};
pub use memory::MemoryObjectStore;
pub use provider::{ListOptions, ListedObject, ObjectStore};
