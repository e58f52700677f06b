//! The registry: one object owning the index, its lock, and its
//! collaborators.
//!
//! All index mutations (allocation plus insert, removal, and the sweep)
//! happen under a single `RwLock` write guard; lookups take the read guard.
//! Payload I/O for uploads runs outside the lock: the id is *reserved*
//! under the lock, the payload is written, and the record is inserted under
//! the lock again. A failed write releases the reservation, so the index
//! never references a payload that was not stored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyshare_store::ObjectStore;
use anyshare_types::{Clock, ObjectRecord, ShareId};
use tracing::{debug, info, warn};

use crate::allocator::IdAllocator;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::index::ObjectIndex;
use crate::snapshot::Snapshot;
use crate::sweep::{sweep, SweepReport};

/// Content returned by [`Registry::fetch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fetched {
    /// An inline text share.
    Text(String),
    /// An uploaded file and the name it was uploaded under.
    File { display_name: String, bytes: Vec<u8> },
}

/// Outcome of the startup consistency pass between index and store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Payloads deleted because no record referenced them.
    pub orphans_removed: Vec<ShareId>,
    /// File records whose payload is missing. They stay in the index and
    /// fail reads with a storage error until they expire.
    pub missing_payloads: Vec<ShareId>,
}

struct Inner {
    index: RwLock<ObjectIndex>,
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    allocator: IdAllocator,
    snapshot: Snapshot,
    config: RegistryConfig,
    sweep_pending: AtomicBool,
}

/// Ephemeral object registry.
///
/// Cheap to clone; clones share the same index.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Load the snapshot, reconcile it against the store, and purge
    /// anything already expired.
    pub fn open(
        config: RegistryConfig,
        store: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
    ) -> RegistryResult<Self> {
        Self::open_with_allocator(config, store, clock, IdAllocator::new())
    }

    /// Like [`open`](Self::open) with a caller-supplied allocator.
    pub fn open_with_allocator(
        config: RegistryConfig,
        store: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
        allocator: IdAllocator,
    ) -> RegistryResult<Self> {
        let snapshot = Snapshot::new(&config.snapshot_path);
        let index = snapshot.load()?;

        let registry = Self {
            inner: Arc::new(Inner {
                index: RwLock::new(index),
                store,
                clock,
                allocator,
                snapshot,
                config,
                sweep_pending: AtomicBool::new(false),
            }),
        };

        let reconciled = registry.reconcile()?;
        if !reconciled.orphans_removed.is_empty() || !reconciled.missing_payloads.is_empty() {
            warn!(
                orphans_removed = reconciled.orphans_removed.len(),
                missing_payloads = reconciled.missing_payloads.len(),
                "index and payload store disagreed at startup"
            );
        }
        registry.sweep()?;
        Ok(registry)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Number of live records.
    pub fn len(&self) -> RegistryResult<usize> {
        Ok(self.read_index()?.len())
    }

    /// Returns `true` if there are no live records.
    pub fn is_empty(&self) -> RegistryResult<bool> {
        Ok(self.read_index()?.is_empty())
    }

    /// Store an uploaded file and return its new id.
    ///
    /// `ttl` of `None` applies the configured default.
    pub fn create_from_upload(
        &self,
        bytes: &[u8],
        display_name: &str,
        ttl: Option<i64>,
    ) -> RegistryResult<ShareId> {
        self.check_size(bytes.len())?;
        let ttl = ttl.unwrap_or(self.inner.config.default_ttl_secs);

        let id = {
            let mut index = self.write_index()?;
            let id = self.inner.allocator.allocate(|c| index.is_taken(c));
            index.reserve(id.clone());
            id
        };

        if let Err(e) = self.inner.store.put(&id, bytes) {
            self.write_index()?.release(&id);
            return Err(e.into());
        }

        let record = ObjectRecord::file(
            id.clone(),
            display_name,
            bytes.len() as u64,
            self.now(),
            ttl,
        );
        let inserted = self.write_index().and_then(|mut index| index.insert(record));
        if let Err(e) = inserted {
            // Keep index and store in step: no payload without a record.
            if let Err(cleanup) = self.inner.store.delete(&id) {
                warn!(id = %id, error = %cleanup, "failed to remove payload of aborted upload");
            }
            return Err(e);
        }

        info!(id = %id, name = display_name, size = bytes.len(), ttl, "file stored");
        self.schedule_sweep();
        Ok(id)
    }

    /// Store a text share inline and return its new id.
    pub fn create_from_text(&self, text: &str, ttl: Option<i64>) -> RegistryResult<ShareId> {
        if text.is_empty() {
            return Err(RegistryError::InvalidInput("text must not be empty".into()));
        }
        self.check_size(text.len())?;
        let ttl = ttl.unwrap_or(self.inner.config.default_ttl_secs);

        let id = {
            let mut index = self.write_index()?;
            let id = self.inner.allocator.allocate(|c| index.is_taken(c));
            index.insert(ObjectRecord::text(id.clone(), text, self.now(), ttl))?;
            id
        };

        info!(id = %id, size = text.len(), ttl, "text stored");
        self.schedule_sweep();
        Ok(id)
    }

    /// Retrieve the content stored under `id`.
    ///
    /// An expired record triggers a synchronous sweep and is reported as
    /// [`RegistryError::Expired`]; its content is never returned. A file
    /// record whose payload is gone yields [`RegistryError::Storage`].
    pub fn fetch(&self, id: &ShareId) -> RegistryResult<Fetched> {
        let record = self.live_record(id)?;
        match record.inline_text {
            Some(text) => Ok(Fetched::Text(text)),
            None => {
                let bytes = self.inner.store.get(id)?;
                Ok(Fetched::File {
                    display_name: record.display_name,
                    bytes,
                })
            }
        }
    }

    /// The record stored under `id`, without its payload.
    ///
    /// Same not-found and expiry semantics as [`fetch`](Self::fetch).
    pub fn stat(&self, id: &ShareId) -> RegistryResult<ObjectRecord> {
        self.live_record(id)
    }

    /// A copy of every live record, in id order.
    pub fn records(&self) -> RegistryResult<Vec<ObjectRecord>> {
        Ok(self.read_index()?.iter().cloned().collect())
    }

    /// Evict every expired record now.
    pub fn sweep(&self) -> RegistryResult<SweepReport> {
        self.inner.sweep()
    }

    /// Write the index to the snapshot file.
    ///
    /// Takes the write lock first, so in-flight creates settle before the
    /// index is serialized.
    pub fn save_snapshot(&self) -> RegistryResult<()> {
        let index = self.write_index()?;
        self.inner.snapshot.save(&index)
    }

    /// Delete payloads no record refers to and report records whose payload
    /// is missing.
    ///
    /// Payloads of uploads made after the last snapshot survive a crash while
    /// their records do not; this pass removes them.
    pub fn reconcile(&self) -> RegistryResult<ReconcileReport> {
        let index = self.write_index()?;
        let mut report = ReconcileReport::default();

        for key in self.inner.store.keys()? {
            // A reserved id belongs to an upload whose payload is written
            // but whose record is not inserted yet.
            let referenced = index.is_reserved(&key)
                || index.get(&key).is_some_and(|r| !r.is_inline());
            if referenced {
                continue;
            }
            match self.inner.store.delete(&key) {
                Ok(_) => {
                    debug!(id = %key, "removed orphan payload");
                    report.orphans_removed.push(key);
                }
                Err(e) => warn!(id = %key, error = %e, "failed to remove orphan payload"),
            }
        }

        for record in index.iter().filter(|r| !r.is_inline()) {
            if !self.inner.store.exists(&record.id)? {
                report.missing_payloads.push(record.id.clone());
            }
        }
        Ok(report)
    }

    /// Queue a sweep without waiting for it.
    ///
    /// Inside a Tokio runtime the sweep runs on the blocking pool; at most one
    /// such sweep is pending at a time and further triggers fold into it.
    /// Outside a runtime the sweep runs inline.
    fn schedule_sweep(&self) {
        if self.inner.sweep_pending.swap(true, Ordering::AcqRel) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let inner = Arc::clone(&self.inner);
                handle.spawn_blocking(move || {
                    inner.sweep_pending.store(false, Ordering::Release);
                    if let Err(e) = inner.sweep() {
                        warn!(error = %e, "background sweep failed");
                    }
                });
            }
            Err(_) => {
                self.inner.sweep_pending.store(false, Ordering::Release);
                if let Err(e) = self.inner.sweep() {
                    warn!(error = %e, "sweep after create failed");
                }
            }
        }
    }

    fn live_record(&self, id: &ShareId) -> RegistryResult<ObjectRecord> {
        let record = self
            .read_index()?
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if record.is_expired_at(self.now()) {
            self.sweep()?;
            return Err(RegistryError::Expired(record.id));
        }
        Ok(record)
    }

    fn check_size(&self, len: usize) -> RegistryResult<()> {
        let max = self.inner.config.max_payload_bytes;
        if len as u64 > max {
            return Err(RegistryError::InvalidInput(format!(
                "payload of {len} bytes exceeds the {max} byte limit"
            )));
        }
        Ok(())
    }

    fn now(&self) -> i64 {
        self.inner.clock.now_epoch_secs()
    }

    fn read_index(&self) -> RegistryResult<RwLockReadGuard<'_, ObjectIndex>> {
        self.inner.index.read().map_err(|_| RegistryError::LockPoisoned)
    }

    fn write_index(&self) -> RegistryResult<RwLockWriteGuard<'_, ObjectIndex>> {
        self.inner.index.write().map_err(|_| RegistryError::LockPoisoned)
    }
}

impl Inner {
    fn sweep(&self) -> RegistryResult<SweepReport> {
        let mut index = self.index.write().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(sweep(&mut index, self.store.as_ref(), self.clock.now_epoch_secs()))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("snapshot", &self.inner.snapshot.path())
            .field(
                "records",
                &self.inner.index.try_read().map(|index| index.len()).ok(),
            )
            .finish()
    }
}
