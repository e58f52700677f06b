use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use anyshare_types::ShareId;

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Payloads are held behind a `RwLock`
/// and cloned on read. The store can be switched to read-only, in which
/// case `put` and `delete` fail with [`StoreError::ReadOnly`]; reads keep
/// working.
pub struct InMemoryObjectStore {
    payloads: RwLock<HashMap<ShareId, Vec<u8>>>,
    read_only: AtomicBool,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            payloads: RwLock::new(HashMap::new()),
            read_only: AtomicBool::new(false),
        }
    }

    /// Number of payloads currently stored.
    pub fn len(&self) -> usize {
        self.payloads.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.payloads.read().expect("lock poisoned").is_empty()
    }

    /// Reject all mutations while `read_only` is set.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.read_only.load(Ordering::SeqCst) {
            Err(StoreError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, id: &ShareId, bytes: &[u8]) -> StoreResult<()> {
        self.check_writable()?;
        let mut map = self.payloads.write().expect("lock poisoned");
        map.insert(id.clone(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, id: &ShareId) -> StoreResult<Vec<u8>> {
        let map = self.payloads.read().expect("lock poisoned");
        map.get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn delete(&self, id: &ShareId) -> StoreResult<bool> {
        self.check_writable()?;
        let mut map = self.payloads.write().expect("lock poisoned");
        Ok(map.remove(id).is_some())
    }

    fn keys(&self) -> StoreResult<Vec<ShareId>> {
        let map = self.payloads.read().expect("lock poisoned");
        let mut ids: Vec<ShareId> = map.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, id: &ShareId) -> StoreResult<bool> {
        let map = self.payloads.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("payload_count", &self.len())
            .field("read_only", &self.read_only.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ShareId {
        ShareId::new(s).unwrap()
    }

    #[test]
    fn put_and_get() {
        let store = InMemoryObjectStore::new();
        store.put(&id("abcd"), b"hello world").unwrap();
        assert_eq!(store.get(&id("abcd")).unwrap(), b"hello world");
    }

    #[test]
    fn get_missing_is_not_found() {
        let store = InMemoryObjectStore::new();
        assert!(matches!(
            store.get(&id("nope")),
            Err(StoreError::NotFound(missing)) if missing == id("nope")
        ));
    }

    #[test]
    fn put_replaces_existing() {
        let store = InMemoryObjectStore::new();
        store.put(&id("abcd"), b"one").unwrap();
        store.put(&id("abcd"), b"two").unwrap();
        assert_eq!(store.get(&id("abcd")).unwrap(), b"two");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn delete_present_then_absent() {
        let store = InMemoryObjectStore::new();
        store.put(&id("abcd"), b"x").unwrap();
        assert!(store.delete(&id("abcd")).unwrap());
        assert!(!store.exists(&id("abcd")).unwrap());
        assert!(!store.delete(&id("abcd")).unwrap());
    }

    #[test]
    fn keys_are_sorted() {
        let store = InMemoryObjectStore::new();
        for k in ["zz", "aa", "mm"] {
            store.put(&id(k), b"x").unwrap();
        }
        assert_eq!(store.keys().unwrap(), vec![id("aa"), id("mm"), id("zz")]);
    }

    #[test]
    fn read_only_rejects_mutation_but_allows_reads() {
        let store = InMemoryObjectStore::new();
        store.put(&id("abcd"), b"x").unwrap();
        store.set_read_only(true);
        assert!(matches!(store.put(&id("efgh"), b"y"), Err(StoreError::ReadOnly)));
        assert!(matches!(store.delete(&id("abcd")), Err(StoreError::ReadOnly)));
        assert_eq!(store.get(&id("abcd")).unwrap(), b"x");

        store.set_read_only(false);
        assert!(store.delete(&id("abcd")).unwrap());
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryObjectStore::new());
        store.put(&id("shared"), b"shared data").unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    assert_eq!(store.get(&id("shared")).unwrap(), b"shared data");
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryObjectStore::new();
        store.put(&id("x"), b"x").unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryObjectStore"));
        assert!(debug.contains("payload_count"));
    }
}
