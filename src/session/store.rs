//! Durable key-value storage for session state.
//!
//! One file per key under the client data directory. The store is the
//! source of truth for the credential: the guard re-reads it on every
//! request rather than caching, so a teardown between requests is
//! respected immediately.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

use crate::error::StoreError;

/// Raw bearer credential.
pub const TOKEN_KEY: &str = "token";
/// JSON-serialized identity record.
pub const USER_KEY: &str = "user";
/// Display preference, survives logout.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store rooted at `<data_dir>/session/`. The directory is created
    /// lazily on first write.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join("session"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }

    /// Read a value, or `None` if the key has never been written or was
    /// removed.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Read {
                key: key.to_string(),
                source: e,
            }),
        }
    }

    pub fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| StoreError::Write {
            key: key.to_string(),
            source: e,
        })?;

        // Session files hold credentials, so create them owner-only.
        let mut opts = OpenOptions::new();
        opts.create(true).write(true).truncate(true);
        #[cfg(unix)]
        opts.mode(0o600);

        let write = |path: &Path| -> std::io::Result<()> {
            let mut file = opts.open(path)?;
            file.write_all(value.as_bytes())
        };
        write(&path).map_err(|e| StoreError::Write {
            key: key.to_string(),
            source: e,
        })
    }

    /// Remove a key. Removing an absent key is a no-op, which makes
    /// session teardown idempotent.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Remove {
                key: key.to_string(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store() -> (TempDir, SessionStore) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn put_get_roundtrip() {
        let (_dir, store) = store();
        store.put(TOKEN_KEY, "abc123").unwrap();
        assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn absent_key_reads_as_none() {
        let (_dir, store) = store();
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn remove_is_idempotent() {
        let (_dir, store) = store();
        store.put(USER_KEY, "{}").unwrap();
        store.remove(USER_KEY).unwrap();
        store.remove(USER_KEY).unwrap();
        assert_eq!(store.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn rejects_path_like_keys() {
        let (_dir, store) = store();
        assert!(matches!(
            store.put("../escape", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(store.get("UPPER"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(store.get(""), Err(StoreError::InvalidKey(_))));
    }

    #[cfg(unix)]
    #[test]
    fn session_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = store();
        store.put(TOKEN_KEY, "secret").unwrap();
        let meta = std::fs::metadata(store.dir().join(TOKEN_KEY)).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }
}
