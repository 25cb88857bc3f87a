//! Key/value persistence behind the token store.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "pet_travel_access_token";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "pet_travel_refresh_token";
/// Storage key of the serialized user.
pub const USER_KEY: &str = "pet_travel_user";

/// Errors raised by a [`SessionStorage`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Synchronous string key/value store used to persist the session.
///
/// Reads happen once at start-up; writes happen on login, refresh and logout.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
///
/// Values are written to a temporary sibling and renamed into place, so a
/// crash never leaves a truncated token behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens (and creates if needed) the storage directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp, value)?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
        storage.set(ACCESS_TOKEN_KEY, "a1").unwrap();
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("a1"));
        storage.remove(ACCESS_TOKEN_KEY).unwrap();
        storage.remove(ACCESS_TOKEN_KEY).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("default")).unwrap();

        storage.set(REFRESH_TOKEN_KEY, "r1").unwrap();
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r1"));
        storage.set(REFRESH_TOKEN_KEY, "r2").unwrap();
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r2"));

        storage.remove(REFRESH_TOKEN_KEY).unwrap();
        assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap(), None);
        // Idempotent.
        storage.remove(REFRESH_TOKEN_KEY).unwrap();
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert!(matches!(
            storage.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(storage.get(""), Err(StorageError::InvalidKey(_))));
    }
}
