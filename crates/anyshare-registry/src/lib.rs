//! Ephemeral object registry for anyShare.
//!
//! The registry is the authoritative catalog of what is stored and when it
//! expires. It allocates short random ids, records uploads and text shares,
//! serves reads while enforcing expiry, evicts expired items together with
//! their payloads, and saves/restores the catalog through a snapshot file.
//!
//! # Key Types
//!
//! - [`Registry`] -- Create/fetch/sweep/snapshot over a locked index
//! - [`ObjectIndex`] -- The id → record catalog plus in-flight reservations
//! - [`IdAllocator`] -- Four-character ids from an unambiguous alphabet
//! - [`Snapshot`] -- Load/save of the catalog as pretty-printed JSON
//! - [`SweepReport`] -- What a sweep evicted and what it had to keep
//!
//! # Lifecycle
//!
//! 1. [`Registry::open`] loads the snapshot (absent file = empty), deletes
//!    payloads no record references, and runs one sweep.
//! 2. Every successful create schedules a background sweep.
//! 3. Reads check expiry themselves, so a late sweep never serves stale data.
//! 4. [`Registry::save_snapshot`] is called once at graceful shutdown.

pub mod allocator;
pub mod config;
pub mod error;
pub mod index;
pub mod registry;
pub mod snapshot;
pub mod sweep;

pub use allocator::{IdAllocator, ID_ALPHABET, ID_LEN};
pub use config::{RegistryConfig, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_TTL_SECS};
pub use error::{RegistryError, RegistryResult};
pub use index::ObjectIndex;
pub use registry::{Fetched, ReconcileReport, Registry};
pub use snapshot::Snapshot;
pub use sweep::{sweep, SweepReport};
