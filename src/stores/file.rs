//! Directory-backed backend: one `<key>.json` file per key.
//!
//! A value is written to a uniquely named temporary file in the same
//! directory, flushed to disk, and then renamed over the target, so a reader
//! sees either the old value or the new one, never a torn or empty write,
//! even after a crash.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::KeyValueStore;
use crate::StorageError;

const EXTENSION: &str = "json";

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).await?;

        let tmp = self
            .dir
            .join(format!(".{key}.{}.tmp", uuid::Uuid::new_v4().simple()));
        if let Err(e) = write_synced(&tmp, value.as_bytes()).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        sync_dir(&self.dir).await?;
        debug!(path = %path.display(), "wrote value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Persists the rename itself. Directories can't be opened for syncing on
/// every platform, so this is unix only.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_dir_reads_as_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("not-yet"));
        assert_eq!(store.get("users").await.unwrap(), None);
        // Removing from a directory that doesn't exist is still fine
        store.remove("users").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_creates_dir_and_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let store = FileStore::new(&dir);

        store.set("users", "[]".to_string()).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.join("users.json")).unwrap(),
            "[]"
        );
        assert_eq!(store.get("users").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_overwrite_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());

        store.set("current_session", "{\"a\":1}".to_string()).await.unwrap();
        store.set("current_session", "{\"a\":2}".to_string()).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["current_session.json"]);
        assert_eq!(
            store.get("current_session").await.unwrap().as_deref(),
            Some("{\"a\":2}")
        );
    }

    #[tokio::test]
    async fn test_large_value_written_in_full() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());
        let value = format!("[{}]", vec!["\"x\""; 100_000].join(","));

        store.set("users", value.clone()).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("users.json")).unwrap(),
            value
        );
    }

    #[tokio::test]
    async fn test_failed_rename_cleans_up_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        // A non-empty directory in the way makes the rename fail
        std::fs::create_dir_all(tmp.path().join("users.json").join("x")).unwrap();
        let store = FileStore::new(tmp.path());

        assert!(matches!(
            store.set("users", "[]".to_string()).await,
            Err(StorageError::Io(_))
        ));
        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["users.json"]);
    }

    #[tokio::test]
    async fn test_remove_many() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());
        store.set("users", "[]".to_string()).await.unwrap();
        store.set("current_session", "{}".to_string()).await.unwrap();

        store
            .remove_many(&["users", "current_session"])
            .await
            .unwrap();
        assert_eq!(store.get("users").await.unwrap(), None);
        assert_eq!(store.get("current_session").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path());
        for key in ["", "../users", "a/b", ".hidden", "@app_users"] {
            assert!(
                matches!(store.get(key).await, Err(StorageError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unreadable_value_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory where the file should be cannot be read as a string
        std::fs::create_dir(tmp.path().join("users.json")).unwrap();
        let store = FileStore::new(tmp.path());
        assert!(matches!(store.get("users").await, Err(StorageError::Io(_))));
    }
}
