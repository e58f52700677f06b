//! The in-memory catalog of stored items.
//!
//! [`ObjectIndex`] maps each [`ShareId`] to its [`ObjectRecord`] in a
//! `BTreeMap`, which also fixes the key order of saved snapshots. Besides
//! live records it tracks *reservations*: ids handed out to an upload whose
//! payload write is still in flight. Reserved ids are invisible to lookups
//! and snapshots but count as taken for allocation.
//!
//! The index itself is not synchronized; the [`Registry`](crate::Registry)
//! owns it behind a single lock.

use std::collections::{BTreeMap, BTreeSet};

use anyshare_types::{ObjectRecord, ShareId};

use crate::error::{RegistryError, RegistryResult};

/// Catalog of live records plus in-flight reservations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectIndex {
    records: BTreeMap<ShareId, ObjectRecord>,
    reserved: BTreeSet<ShareId>,
}

impl ObjectIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from already-validated records.
    pub fn from_records(records: BTreeMap<ShareId, ObjectRecord>) -> Self {
        Self {
            records,
            reserved: BTreeSet::new(),
        }
    }

    /// Number of live records (reservations excluded).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record.
    pub fn get(&self, id: &ShareId) -> Option<&ObjectRecord> {
        self.records.get(id)
    }

    /// Returns `true` if a record exists under `id`.
    pub fn contains(&self, id: &ShareId) -> bool {
        self.records.contains_key(id)
    }

    /// Returns `true` if `id` is live or reserved.
    pub fn is_taken(&self, id: &ShareId) -> bool {
        self.records.contains_key(id) || self.reserved.contains(id)
    }

    /// Returns `true` if `id` is held by an upload that has not inserted
    /// its record yet.
    pub fn is_reserved(&self, id: &ShareId) -> bool {
        self.reserved.contains(id)
    }

    /// Add a record, consuming a reservation for its id if there is one.
    ///
    /// Fails with [`RegistryError::DuplicateId`] if a record with the same
    /// id is already live; the existing record is left untouched.
    pub fn insert(&mut self, record: ObjectRecord) -> RegistryResult<()> {
        if self.records.contains_key(&record.id) {
            return Err(RegistryError::DuplicateId(record.id));
        }
        self.reserved.remove(&record.id);
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Remove and return a record.
    pub fn remove(&mut self, id: &ShareId) -> Option<ObjectRecord> {
        self.records.remove(id)
    }

    /// Mark `id` as taken without creating a record.
    ///
    /// Returns `false` if the id is already live or reserved.
    pub fn reserve(&mut self, id: ShareId) -> bool {
        if self.records.contains_key(&id) {
            return false;
        }
        self.reserved.insert(id)
    }

    /// Drop a reservation, e.g. after a failed payload write.
    pub fn release(&mut self, id: &ShareId) -> bool {
        self.reserved.remove(id)
    }

    /// Number of outstanding reservations.
    pub fn reserved_len(&self) -> usize {
        self.reserved.len()
    }

    /// Iterate over live records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.records.values()
    }

    /// The live records keyed by id.
    pub fn records(&self) -> &BTreeMap<ShareId, ObjectRecord> {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ShareId {
        ShareId::new(s).unwrap()
    }

    fn text(s: &str) -> ObjectRecord {
        ObjectRecord::text(id(s), "body", 100, 60)
    }

    #[test]
    fn insert_get_remove() {
        let mut index = ObjectIndex::new();
        index.insert(text("abcd")).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&id("abcd")).unwrap().inline_text.as_deref(), Some("body"));

        let removed = index.remove(&id("abcd")).unwrap();
        assert_eq!(removed.id, id("abcd"));
        assert!(index.is_empty());
        assert!(index.remove(&id("abcd")).is_none());
    }

    #[test]
    fn insert_duplicate_is_rejected_without_overwrite() {
        let mut index = ObjectIndex::new();
        index.insert(text("abcd")).unwrap();

        let mut other = text("abcd");
        other.inline_text = Some("replacement".into());
        assert!(matches!(
            index.insert(other),
            Err(RegistryError::DuplicateId(dup)) if dup == id("abcd")
        ));
        assert_eq!(index.get(&id("abcd")).unwrap().inline_text.as_deref(), Some("body"));
    }

    #[test]
    fn reservation_counts_as_taken_but_is_invisible() {
        let mut index = ObjectIndex::new();
        assert!(index.reserve(id("abcd")));
        assert!(index.is_taken(&id("abcd")));
        assert!(index.get(&id("abcd")).is_none());
        assert!(index.is_empty());
        assert!(!index.reserve(id("abcd")));
    }

    #[test]
    fn reserved_is_distinct_from_live() {
        let mut index = ObjectIndex::new();
        index.reserve(id("abcd"));
        index.insert(text("efgh")).unwrap();
        assert!(index.is_reserved(&id("abcd")));
        assert!(!index.is_reserved(&id("efgh")));

        index.insert(text("abcd")).unwrap();
        assert!(!index.is_reserved(&id("abcd")));
    }

    #[test]
    fn insert_consumes_reservation() {
        let mut index = ObjectIndex::new();
        index.reserve(id("abcd"));
        index.insert(text("abcd")).unwrap();
        assert_eq!(index.reserved_len(), 0);
        assert!(index.contains(&id("abcd")));
    }

    #[test]
    fn release_frees_id() {
        let mut index = ObjectIndex::new();
        index.reserve(id("abcd"));
        assert!(index.release(&id("abcd")));
        assert!(!index.is_taken(&id("abcd")));
        assert!(!index.release(&id("abcd")));
    }

    #[test]
    fn cannot_reserve_live_id() {
        let mut index = ObjectIndex::new();
        index.insert(text("abcd")).unwrap();
        assert!(!index.reserve(id("abcd")));
    }

    #[test]
    fn iter_is_id_ordered() {
        let mut index = ObjectIndex::new();
        for s in ["mmmm", "aaaa", "zzzz"] {
            index.insert(text(s)).unwrap();
        }
        let ids: Vec<_> = index.iter().map(|r| r.id.as_str().to_owned()).collect();
        assert_eq!(ids, ["aaaa", "mmmm", "zzzz"]);
    }
}
