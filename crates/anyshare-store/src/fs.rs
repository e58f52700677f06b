//! Filesystem-backed payload storage.
//!
//! Each payload is one file named after its share id directly under the
//! storage root. Writes land in a temp file inside the root and are renamed
//! into place, so a crash mid-write leaves at most a stray temp file (whose
//! name is never a valid id) rather than a torn payload.
//!
//! [`keys`](ObjectStore::keys) reports every regular file whose name parses
//! as a [`ShareId`], so the root must not be shared with other files.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyshare_types::ShareId;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::ObjectStore;

/// Object store rooted at a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &ShareId) -> PathBuf {
        // ShareId admits only [a-z0-9], so the join cannot leave the root.
        self.root.join(id.as_str())
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, id: &ShareId, bytes: &[u8]) -> StoreResult<()> {
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(id)).map_err(|e| e.error)?;
        debug!(id = %id, len = bytes.len(), "payload written");
        Ok(())
    }

    fn get(&self, id: &ShareId) -> StoreResult<Vec<u8>> {
        match fs::read(self.path_for(id)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, id: &ShareId) -> StoreResult<bool> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => {
                debug!(id = %id, "payload deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StoreResult<Vec<ShareId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!(path = ?entry.path(), "skipping non-UTF-8 file in storage root");
                continue;
            };
            if let Ok(id) = ShareId::new(name) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, id: &ShareId) -> StoreResult<bool> {
        Ok(self.path_for(id).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ShareId {
        ShareId::new(s).unwrap()
    }

    #[test]
    fn open_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("tmp");
        let store = FsObjectStore::open(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();

        store.put(&id("abcd"), b"payload").unwrap();
        assert!(dir.path().join("abcd").is_file());
        assert_eq!(store.get(&id("abcd")).unwrap(), b"payload");

        assert!(store.delete(&id("abcd")).unwrap());
        assert!(!store.exists(&id("abcd")).unwrap());
        assert!(!store.delete(&id("abcd")).unwrap());
    }

    #[test]
    fn get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        assert!(matches!(store.get(&id("gone")), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn empty_payload_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        store.put(&id("zero"), b"").unwrap();
        assert!(store.get(&id("zero")).unwrap().is_empty());
    }

    #[test]
    fn keys_skip_foreign_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        store.put(&id("bbbb"), b"1").unwrap();
        store.put(&id("aaaa"), b"2").unwrap();
        fs::write(dir.path().join(".tmpXYZ"), b"partial").unwrap();
        fs::write(dir.path().join("README.md"), b"not a payload").unwrap();
        fs::create_dir(dir.path().join("cccc")).unwrap();

        assert_eq!(store.keys().unwrap(), vec![id("aaaa"), id("bbbb")]);
    }

    #[test]
    fn put_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::open(dir.path()).unwrap();
        store.put(&id("abcd"), b"x").unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("abcd")]);
    }
}
