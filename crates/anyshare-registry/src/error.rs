//! Error types for registry operations.

use std::io;
use std::path::PathBuf;

use anyshare_store::StoreError;
use anyshare_types::ShareId;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Missing text, malformed TTL, or a payload over the size ceiling.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No live record has this id.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The record exists but is past its TTL.
    #[error("object expired: {0}")]
    Expired(ShareId),

    /// Payload read, write, or delete failed.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// Writing the snapshot file failed.
    #[error("failed to write snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The snapshot file exists but could not be read or parsed.
    #[error("failed to load snapshot {}: {reason}", path.display())]
    Startup { path: PathBuf, reason: String },

    /// An insert targeted an id that is already live.
    #[error("duplicate share id: {0}")]
    DuplicateId(ShareId),

    /// A thread panicked while holding the index lock.
    #[error("registry lock poisoned")]
    LockPoisoned,
}

/// Convenience alias for registry results.
pub type RegistryResult<T> = Result<T, RegistryError>;
