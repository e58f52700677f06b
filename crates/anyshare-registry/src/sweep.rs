//! Expiration sweep.
//!
//! A sweep walks every record and evicts the expired ones. For file records
//! the payload is deleted first and the index entry is removed only once the
//! delete succeeds; on failure the record stays in the index so a later
//! sweep retries, instead of leaving an untracked file behind. Inline text
//! records have no payload and are removed directly.
//!
//! [`sweep`] operates on an index the caller has already locked, so
//! concurrent sweeps through the registry serialize on that lock.

use anyshare_store::ObjectStore;
use anyshare_types::ShareId;
use tracing::{debug, info, warn};

use crate::index::ObjectIndex;

/// Outcome of one sweep pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Expired records removed from the index.
    pub evicted: Vec<ShareId>,
    /// Expired records kept because their payload could not be deleted.
    pub retained: Vec<ShareId>,
}

impl SweepReport {
    /// Returns `true` if the pass found nothing expired.
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty() && self.retained.is_empty()
    }
}

/// Evict every record expired at `now` from `index` and `store`.
pub fn sweep(index: &mut ObjectIndex, store: &dyn ObjectStore, now: i64) -> SweepReport {
    let expired: Vec<ShareId> = index
        .iter()
        .filter(|r| r.is_expired_at(now))
        .map(|r| r.id.clone())
        .collect();

    let mut report = SweepReport::default();
    for id in expired {
        let inline = index.get(&id).is_some_and(|r| r.is_inline());
        if !inline {
            match store.delete(&id) {
                Ok(existed) => {
                    if !existed {
                        debug!(id = %id, "expired record had no payload");
                    }
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "failed to delete expired payload; will retry");
                    report.retained.push(id);
                    continue;
                }
            }
        }
        index.remove(&id);
        debug!(id = %id, "evicted expired record");
        report.evicted.push(id);
    }

    if !report.is_empty() {
        info!(
            evicted = report.evicted.len(),
            retained = report.retained.len(),
            "sweep complete"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyshare_store::InMemoryObjectStore;
    use anyshare_types::ObjectRecord;
    use proptest::prelude::*;

    fn id(s: &str) -> ShareId {
        ShareId::new(s).unwrap()
    }

    fn populated(store: &InMemoryObjectStore) -> ObjectIndex {
        let mut index = ObjectIndex::new();
        // Expired at now=100.
        index.insert(ObjectRecord::text(id("txt0"), "old", 10, 5)).unwrap();
        index.insert(ObjectRecord::file(id("fil0"), "a.bin", 1, 10, 5)).unwrap();
        store.put(&id("fil0"), b"a").unwrap();
        // Live at now=100.
        index.insert(ObjectRecord::text(id("txt1"), "new", 90, 60)).unwrap();
        index.insert(ObjectRecord::file(id("fil1"), "b.bin", 1, 90, 60)).unwrap();
        store.put(&id("fil1"), b"b").unwrap();
        // Never expires.
        index.insert(ObjectRecord::text(id("perm"), "forever", 0, -1)).unwrap();
        index
    }

    #[test]
    fn evicts_only_expired_records() {
        let store = InMemoryObjectStore::new();
        let mut index = populated(&store);

        let report = sweep(&mut index, &store, 100);

        assert_eq!(report.evicted, vec![id("fil0"), id("txt0")]);
        assert!(report.retained.is_empty());
        assert_eq!(index.len(), 3);
        assert!(!store.exists(&id("fil0")).unwrap());
        assert!(store.exists(&id("fil1")).unwrap());
    }

    #[test]
    fn second_sweep_is_a_no_op() {
        let store = InMemoryObjectStore::new();
        let mut index = populated(&store);

        sweep(&mut index, &store, 100);
        let after_first = index.clone();
        let report = sweep(&mut index, &store, 100);

        assert!(report.is_empty());
        assert_eq!(index, after_first);
    }

    #[test]
    fn failed_delete_retains_record() {
        let store = InMemoryObjectStore::new();
        let mut index = populated(&store);
        store.set_read_only(true);

        let report = sweep(&mut index, &store, 100);

        // Inline text needs no delete and still goes.
        assert_eq!(report.evicted, vec![id("txt0")]);
        assert_eq!(report.retained, vec![id("fil0")]);
        assert!(index.contains(&id("fil0")));
        assert!(store.exists(&id("fil0")).unwrap());

        store.set_read_only(false);
        let retry = sweep(&mut index, &store, 100);
        assert_eq!(retry.evicted, vec![id("fil0")]);
        assert!(!index.contains(&id("fil0")));
    }

    #[test]
    fn missing_payload_still_evicts() {
        let store = InMemoryObjectStore::new();
        let mut index = ObjectIndex::new();
        index.insert(ObjectRecord::file(id("gone"), "x", 1, 0, 1)).unwrap();

        let report = sweep(&mut index, &store, 10);
        assert_eq!(report.evicted, vec![id("gone")]);
        assert!(index.is_empty());
    }

    #[test]
    fn permanent_records_survive_any_time() {
        let store = InMemoryObjectStore::new();
        let mut index = populated(&store);
        sweep(&mut index, &store, i64::MAX);
        assert_eq!(index.len(), 1);
        assert!(index.contains(&id("perm")));
    }

    proptest! {
        #[test]
        fn sweep_keeps_exactly_the_live_records(
            records in prop::collection::vec((0i64..1_000, -5i64..500, any::<bool>()), 0..40),
            now in 0i64..1_500,
        ) {
            let store = InMemoryObjectStore::new();
            let mut index = ObjectIndex::new();
            for (n, (created, ttl, inline)) in records.iter().enumerate() {
                let rid = id(&format!("r{n}"));
                let record = if *inline {
                    ObjectRecord::text(rid, "t", *created, *ttl)
                } else {
                    store.put(&rid, b"p").unwrap();
                    ObjectRecord::file(rid, "f", 1, *created, *ttl)
                };
                index.insert(record).unwrap();
            }

            let report = sweep(&mut index, &store, now);

            prop_assert!(report.retained.is_empty());
            prop_assert!(index.iter().all(|r| !r.is_expired_at(now)));
            prop_assert_eq!(index.len() + report.evicted.len(), records.len());
            for evicted in &report.evicted {
                prop_assert!(!store.exists(evicted).unwrap());
            }
        }
    }
}
