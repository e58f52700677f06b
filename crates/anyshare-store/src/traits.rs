use anyshare_types::ShareId;

use crate::error::StoreResult;

/// Durable byte storage for uploaded payloads, keyed by share id.
///
/// All implementations must satisfy these invariants:
/// - `put` is all-or-nothing: after a failed `put` no payload is visible
///   under the id, after a successful one the full payload is.
/// - `delete` of an absent id succeeds and returns `false`.
/// - The store never interprets payload contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `id`, replacing any previous payload.
    fn put(&self, id: &ShareId, bytes: &[u8]) -> StoreResult<()>;

    /// Read the full payload stored under `id`.
    ///
    /// Returns [`StoreError::NotFound`](crate::StoreError::NotFound) if no
    /// payload exists.
    fn get(&self, id: &ShareId) -> StoreResult<Vec<u8>>;

    /// Delete the payload under `id`. Returns `true` if it existed.
    fn delete(&self, id: &ShareId) -> StoreResult<bool>;

    /// All ids that currently have a payload, sorted.
    fn keys(&self) -> StoreResult<Vec<ShareId>>;

    /// Check whether a payload exists under `id`.
    ///
    /// Default implementation scans [`keys`](Self::keys). Backends may
    /// override with a direct lookup.
    fn exists(&self, id: &ShareId) -> StoreResult<bool> {
        Ok(self.keys()?.contains(id))
    }
}
