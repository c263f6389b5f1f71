//! Directory-backed file store

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::FileStore;
use crate::models::SolutionId;
use crate::util::write_atomically;
use crate::{Error, Result};

/// One file per solution id inside a root directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: SolutionId) -> PathBuf {
        self.root.join(key.storage_key())
    }
}

impl FileStore for LocalFileStore {
    fn put(&self, key: SolutionId, bytes: &[u8]) -> Result<()> {
        write_atomically(&self.path_for(key), bytes)
            .map_err(|error| Error::Storage(format!("write solution {key}: {error}")))
    }

    fn get(&self, key: SolutionId) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(Error::Storage(format!("read solution {key}: {error}"))),
        }
    }

    fn delete(&self, key: SolutionId) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(Error::Storage(format!("delete solution {key}: {error}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn put_get_delete() {
        let tmp = tempdir().unwrap();
        let store = LocalFileStore::open(tmp.path().join("solutions")).unwrap();
        let key = SolutionId::new(3);

        assert_eq!(store.get(key).unwrap(), None);

        store.put(key, b"print(1)").unwrap();
        assert_eq!(store.get(key).unwrap().as_deref(), Some(&b"print(1)"[..]));
        assert!(store.root().join("3").is_file());

        store.put(key, b"print(2)").unwrap();
        assert_eq!(store.get(key).unwrap().as_deref(), Some(&b"print(2)"[..]));

        store.delete(key).unwrap();
        assert_eq!(store.get(key).unwrap(), None);
    }

    #[test]
    fn deleting_missing_key_succeeds() {
        let tmp = tempdir().unwrap();
        let store = LocalFileStore::open(tmp.path()).unwrap();
        store.delete(SolutionId::new(404)).unwrap();
    }

    #[test]
    fn keys_do_not_share_files() {
        let tmp = tempdir().unwrap();
        let store = LocalFileStore::open(tmp.path()).unwrap();

        store.put(SolutionId::new(1), b"one").unwrap();
        store.put(SolutionId::new(2), b"two").unwrap();
        store.delete(SolutionId::new(1)).unwrap();

        assert_eq!(store.get(SolutionId::new(1)).unwrap(), None);
        assert_eq!(store.get(SolutionId::new(2)).unwrap(), Some(b"two".to_vec()));
    }
}
