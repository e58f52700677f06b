//! Index persistence.
//!
//! The whole index is saved as one pretty-printed JSON object mapping each
//! id to its record. It is read once at startup and written once at
//! graceful shutdown; there is no log in between, so records created after
//! the last save are lost on a crash.
//!
//! Saves go through a temp file in the snapshot's directory that is renamed
//! over the previous snapshot, so an interrupted save leaves the old
//! snapshot intact.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyshare_types::{ObjectRecord, ShareId};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{RegistryError, RegistryResult};
use crate::index::ObjectIndex;

/// Handle to the snapshot file.
#[derive(Clone, Debug)]
pub struct Snapshot {
    path: PathBuf,
}

impl Snapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the index from disk.
    ///
    /// A missing file yields an empty index. Any other read failure, a parse
    /// failure, or an entry whose key disagrees with its record's id is a
    /// [`RegistryError::Startup`].
    pub fn load(&self) -> RegistryResult<ObjectIndex> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no snapshot found; starting empty");
                return Ok(ObjectIndex::new());
            }
            Err(e) => return Err(self.startup_error(e.to_string())),
        };

        let records: BTreeMap<ShareId, ObjectRecord> =
            serde_json::from_slice(&bytes).map_err(|e| self.startup_error(e.to_string()))?;

        if let Some((key, record)) = records.iter().find(|(key, record)| **key != record.id) {
            return Err(self.startup_error(format!(
                "entry {key} holds a record for {}",
                record.id
            )));
        }

        info!(path = %self.path.display(), records = records.len(), "snapshot loaded");
        Ok(ObjectIndex::from_records(records))
    }

    /// Write every live record of `index`, replacing any prior snapshot.
    pub fn save(&self, index: &ObjectIndex) -> RegistryResult<()> {
        self.write(index).map_err(|source| RegistryError::Snapshot {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), records = index.len(), "snapshot saved");
        Ok(())
    }

    fn write(&self, index: &ObjectIndex) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, index.records())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        debug!(path = %self.path.display(), "snapshot renamed into place");
        Ok(())
    }

    fn startup_error(&self, reason: String) -> RegistryError {
        RegistryError::Startup {
            path: self.path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ShareId {
        ShareId::new(s).unwrap()
    }

    fn sample_index() -> ObjectIndex {
        let mut index = ObjectIndex::new();
        index.insert(ObjectRecord::text(id("t3xt"), "hello", 1_000, 60)).unwrap();
        index.insert(ObjectRecord::file(id("f11e"), "report.pdf", 2048, 1_000, -1)).unwrap();
        index
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snap = Snapshot::new(dir.path().join("absent.json"));
        assert!(snap.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let snap = Snapshot::new(dir.path().join("map.json"));
        let index = sample_index();

        snap.save(&index).unwrap();
        let loaded = snap.load().unwrap();

        assert_eq!(loaded.records(), index.records());
    }

    #[test]
    fn save_is_pretty_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let snap = Snapshot::new(dir.path().join("map.json"));
        snap.save(&sample_index()).unwrap();

        let text = fs::read_to_string(snap.path()).unwrap();
        assert!(text.lines().count() > 5);
        let f = text.find("\"f11e\"").unwrap();
        let t = text.find("\"t3xt\"").unwrap();
        assert!(f < t);
    }

    #[test]
    fn reservations_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let snap = Snapshot::new(dir.path().join("map.json"));
        let mut index = sample_index();
        index.reserve(id("pend"));

        snap.save(&index).unwrap();
        let loaded = snap.load().unwrap();
        assert!(!loaded.is_taken(&id("pend")));
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn save_overwrites_and_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let snap = Snapshot::new(dir.path().join("state").join("map.json"));
        snap.save(&sample_index()).unwrap();
        snap.save(&ObjectIndex::new()).unwrap();
        assert!(snap.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            Snapshot::new(&path).load(),
            Err(RegistryError::Startup { .. })
        ));
    }

    #[test]
    fn invalid_id_is_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        fs::write(
            &path,
            br#"{"../x":{"id":"../x","filename":"","size":1,"created_at":0,"expired_time":1}}"#,
        )
        .unwrap();
        assert!(matches!(
            Snapshot::new(&path).load(),
            Err(RegistryError::Startup { .. })
        ));
    }

    #[test]
    fn key_mismatch_is_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        fs::write(
            &path,
            br#"{"aaaa":{"id":"bbbb","filename":"","size":1,"created_at":0,"expired_time":1,"text":"x"}}"#,
        )
        .unwrap();
        let err = Snapshot::new(&path).load().unwrap_err();
        assert!(err.to_string().contains("aaaa"));
    }

    #[test]
    fn loads_legacy_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tmp_file_map.json");
        let legacy = "{\n\t\"k2m4\": {\n\t\t\"id\": \"k2m4\",\n\t\t\"filename\": \"notes.txt\",\n\t\t\"size\": 12,\n\t\t\"created_at\": 1700000000,\n\t\t\"expired_time\": 7200,\n\t\t\"text\": \"\"\n\t}\n}";
        fs::write(&path, legacy).unwrap();

        let index = Snapshot::new(&path).load().unwrap();
        let record = index.get(&id("k2m4")).unwrap();
        assert_eq!(record.display_name, "notes.txt");
        assert_eq!(record.ttl_seconds, 7200);
        assert!(!record.is_inline());
    }
}
