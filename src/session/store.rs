// Persistence for the operator session

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info, warn};

use crate::errors::ConsoleError;

use super::{Session, SessionPatch};

const SESSION_FILE_NAME: &str = "session.json";

/// Durable storage for the operator [`Session`].
///
/// Every call is synchronous and durable once it returns. `save` merges the
/// supplied fields into the stored session; `clear` removes the whole session
/// so that a following `load` always returns an empty one.
pub trait SessionStore: Send + Sync {
    /// Load the persisted session, empty when nothing was stored
    fn load(&self) -> Result<Session, ConsoleError>;

    /// Merge a partial update into the persisted session
    fn save(&self, patch: SessionPatch) -> Result<(), ConsoleError>;

    /// Remove every persisted session field
    fn clear(&self) -> Result<(), ConsoleError>;
}

/// Session persisted as a small JSON document on disk.
pub struct FileSessionStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(storage_dir: PathBuf) -> Result<Self, ConsoleError> {
        if !storage_dir.exists() {
            fs::create_dir_all(&storage_dir)
                .map_err(|e| ConsoleError::SessionIOError { source: e })?;
        }

        Ok(Self {
            path: storage_dir.join(SESSION_FILE_NAME),
            lock: Mutex::new(()),
        })
    }

    /// Create the store in the default application data directory
    pub fn new_default() -> Result<Self, ConsoleError> {
        Self::new(Self::default_storage_path()?)
    }

    pub fn default_storage_path() -> Result<PathBuf, ConsoleError> {
        let app_data_dir = dirs::data_dir().ok_or(ConsoleError::NoConfigDir)?;
        Ok(app_data_dir.join("dockwatch"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Session, ConsoleError> {
        if !self.path.exists() {
            return Ok(Session::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| ConsoleError::SessionIOError { source: e })?;

        match serde_json::from_str::<Session>(&content) {
            Ok(session) => Ok(session.normalized()),
            Err(e) => {
                // a corrupt session only costs the operator a new login
                warn!("Ignoring unreadable session file {:?}: {}", self.path, e);
                Ok(Session::default())
            }
        }
    }

    fn write(&self, session: &Session) -> Result<(), ConsoleError> {
        let content = serde_json::to_string_pretty(session)
            .map_err(|e| ConsoleError::SessionSerializeError { source: e })?;

        // write next to the target and rename over it so readers never see a
        // half written file
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).map_err(|e| ConsoleError::SessionIOError { source: e })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| ConsoleError::SessionIOError { source: e })
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Session, ConsoleError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        self.read()
    }

    fn save(&self, patch: SessionPatch) -> Result<(), ConsoleError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut session = self.read()?;
        session.apply(patch);
        debug!("Persisting session to {:?}", self.path);
        self.write(&session.normalized())
    }

    fn clear(&self) -> Result<(), ConsoleError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| ConsoleError::SessionIOError { source: e })?;
        }
        info!("Session cleared");
        Ok(())
    }
}

/// In-memory session store, used by tests and by `--ephemeral` runs.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(session.normalized()),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Session, ConsoleError> {
        Ok(self.session.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, patch: SessionPatch) -> Result<(), ConsoleError> {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        session.apply(patch);
        *session = std::mem::take(&mut *session).normalized();
        Ok(())
    }

    fn clear(&self) -> Result<(), ConsoleError> {
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = Session::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_store() -> (TempDir, FileSessionStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_load_without_file_is_empty() {
        let (_dir, store) = file_store();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_merges_and_survives_reopen() {
        let (dir, store) = file_store();
        store.save(SessionPatch::login("op-7", "tok")).unwrap();
        store.save(SessionPatch::truck("1234")).unwrap();

        let reopened = FileSessionStore::new(dir.path().to_path_buf()).unwrap();
        let session = reopened.load().unwrap();
        assert_eq!(session.user.as_deref(), Some("op-7"));
        assert_eq!(session.token.as_deref(), Some("tok"));
        assert_eq!(session.truck_number.as_deref(), Some("1234"));
    }

    #[test]
    fn test_clear_then_load_is_empty() {
        let (_dir, store) = file_store();
        store.save(SessionPatch::login("op-7", "tok")).unwrap();
        store.save(SessionPatch::truck("1234")).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_clear_on_empty_store_succeeds() {
        let (_dir, store) = file_store();
        assert!(store.clear().is_ok());
    }

    #[test]
    fn test_corrupt_file_loads_as_empty() {
        let (_dir, store) = file_store();
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_file_keys_match_legacy_names() {
        let (_dir, store) = file_store();
        store.save(SessionPatch::login("op-7", "tok")).unwrap();
        store.save(SessionPatch::truck("0042")).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["user"], "op-7");
        assert_eq!(raw["token"], "tok");
        assert_eq!(raw["truckNumber"], "0042");
    }

    #[test]
    fn test_memory_store_truck_requires_user() {
        let store = MemorySessionStore::new();
        store.save(SessionPatch::truck("1234")).unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
