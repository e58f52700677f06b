//! Payload storage for anyShare.
//!
//! Uploaded files are kept outside the catalog, one payload per
//! [`ShareId`](anyshare_types::ShareId). Text shares never touch this crate;
//! their content lives inline in the catalog record.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`FsObjectStore`] -- one file per payload under a fixed root directory
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Payloads are written whole or not at all: a reader never observes a
//!    partially written payload under a live key.
//! 2. Deleting an absent payload is not an error, so eviction retries
//!    converge.
//! 3. The store never interprets payload contents.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use traits::ObjectStore;
