//! Durable session state: access token, refresh token, and last-known user profile.
//!
//! All three values are always written and removed together, so a reader never observes a
//! token without a user or the other way around.

use crate::api::users::User;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub const ACCESS_TOKEN_KEY: &str = "lakshya_access_token";
pub const REFRESH_TOKEN_KEY: &str = "lakshya_refresh_token";
pub const USER_KEY: &str = "lakshya_user";

const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("session encoding: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session store lock poisoned")]
    Poisoned,
}

/// String key-value backend. Each call is applied as a single unit.
pub trait KeyValueStore: Send + Sync {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError>;
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;
    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}

/// Process-lifetime backend, eg for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(keys.iter().map(|k| entries.get(*k).cloned()).collect())
    }

    fn set_many(&self, new_entries: &[(&str, String)]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        for (k, v) in new_entries {
            entries.insert(k.to_string(), v.clone());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        for k in keys {
            entries.remove(*k);
        }
        Ok(())
    }
}

/// Backend persisted as a single JSON object on disk.
///
/// Writes go to a sibling temp file which is then renamed over the real one. A missing file
/// is an empty store; so is a corrupt one (with a warning), since the next login rewrites it.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            _ => {
                warn!(
                    "ignoring unreadable session file: {}",
                    self.path.display()
                );
                Ok(Map::new())
            }
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        fs::rename(&tmp, &self.path)?;
        debug!("wrote session file: {}", self.path.display());
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let map = self.read_map()?;
        Ok(keys
            .iter()
            .map(|k| map.get(*k).and_then(|v| v.as_str()).map(|s| s.to_string()))
            .collect())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut map = self.read_map()?;
        for (k, v) in entries {
            map.insert(k.to_string(), Value::String(v.clone()));
        }
        self.write_map(&map)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut map = self.read_map()?;
        let before = map.len();
        for k in keys {
            map.remove(*k);
        }
        if map.len() == before && !self.path.exists() {
            return Ok(());
        }
        self.write_map(&map)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Handle on the persisted session. Clones share the same backend.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        SessionStore { backend }
    }

    /// Session persisted to a JSON file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        SessionStore::new(Arc::new(FileStore::new(path)))
    }

    /// In-memory session, gone when the process exits.
    pub fn open_ephemeral() -> Self {
        SessionStore::new(Arc::new(MemoryStore::new()))
    }

    pub fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
        user: &User,
    ) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(user)?;
        self.backend.set_many(&[
            (ACCESS_TOKEN_KEY, access_token.to_string()),
            (REFRESH_TOKEN_KEY, refresh_token.to_string()),
            (USER_KEY, user_json),
        ])
    }

    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    /// Last-known user profile. Corrupt stored JSON reads as absent.
    pub fn user(&self) -> Option<User> {
        let raw = self.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("stored user profile is unreadable, treating as absent: {}", e);
                None
            }
        }
    }

    /// Consistent snapshot of all three fields, or `None` if any is missing.
    pub fn session(&self) -> Option<Session> {
        let values = match self.backend.get_many(&SESSION_KEYS) {
            Ok(v) => v,
            Err(e) => {
                warn!("could not read session: {}", e);
                return None;
            }
        };
        let mut values = values.into_iter();
        let access_token = values.next().flatten()?;
        let refresh_token = values.next().flatten()?;
        let user = serde_json::from_str(&values.next().flatten()?).ok()?;
        Some(Session {
            access_token,
            refresh_token,
            user,
        })
    }

    /// True iff an access token is stored. Does not check signature or expiry.
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn clear_session(&self) -> Result<(), StorageError> {
        self.backend.remove_many(&SESSION_KEYS)
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.backend.get_many(&[key]) {
            Ok(mut values) => values.pop().flatten(),
            Err(e) => {
                warn!("could not read {} from session store: {}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_user() -> User {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "email": "a@x.com",
            "name": "Asha",
            "role": "student",
            "created_at": "2024-01-01T00:00:00",
            "updated_at": "2024-01-01T00:00:00",
        }))
        .unwrap()
    }

    #[test]
    fn test_set_and_get_session() {
        let store = SessionStore::open_ephemeral();
        assert!(!store.is_authenticated());
        store.set_session("AT1", "RT1", &example_user()).unwrap();
        assert!(store.is_authenticated());
        assert_eq!(store.access_token().as_deref(), Some("AT1"));
        assert_eq!(store.refresh_token().as_deref(), Some("RT1"));
        assert_eq!(store.user(), Some(example_user()));
        let session = store.session().unwrap();
        assert_eq!(session.access_token, "AT1");
        assert_eq!(session.user.email, "a@x.com");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = SessionStore::open_ephemeral();
        store.set_session("AT1", "RT1", &example_user()).unwrap();
        store.clear_session().unwrap();
        store.clear_session().unwrap();
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
        assert_eq!(store.user(), None);
        assert_eq!(store.session(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_corrupt_user_is_absent() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set_many(&[
                (ACCESS_TOKEN_KEY, "AT1".to_string()),
                (USER_KEY, "{not json".to_string()),
            ])
            .unwrap();
        let store = SessionStore::new(backend);
        assert_eq!(store.user(), None);
        assert_eq!(store.session(), None);
        // token is still readable on its own
        assert_eq!(store.access_token().as_deref(), Some("AT1"));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = SessionStore::open(&path);
        store.set_session("AT1", "RT1", &example_user()).unwrap();
        assert!(path.exists());

        // a fresh handle on the same file sees the same session
        let reopened = SessionStore::open(&path);
        assert_eq!(reopened.access_token().as_deref(), Some("AT1"));
        assert_eq!(reopened.user(), Some(example_user()));

        reopened.clear_session().unwrap();
        reopened.clear_session().unwrap();
        assert_eq!(store.session(), None);
    }

    #[test]
    fn test_file_store_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::open(&path);
        assert!(!store.is_authenticated());
        store.clear_session().unwrap();
        assert!(!path.exists());

        fs::write(&path, "this is not json").unwrap();
        assert!(!store.is_authenticated());
        store.set_session("AT2", "RT2", &example_user()).unwrap();
        assert_eq!(store.access_token().as_deref(), Some("AT2"));
    }
}
