//! # Token Persistence
//!
//! The console persists exactly one value across restarts: the bearer token,
//! under a fixed key. Absence of the value means "no session".
//!
//! - [`MemoryTokenStore`] keeps the value in process memory. Clones share
//!   the same slot, which lets tests simulate a restart by building a second
//!   session store over a clone.
//! - [`FileTokenStore`] keeps it in `<state_dir>/<key>`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StoreError;

/// Default storage key of the persisted token.
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Persistent slot holding the current bearer token.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token, if any.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Persist `token`, replacing any previous value.
    fn save(&self, token: &str) -> Result<(), StoreError>;

    /// Remove the persisted token. Removing an absent token succeeds.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory token slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token`, as if persisted by a previous run.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        *self.slot.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock() = None;
        Ok(())
    }
}

/// Token slot backed by a single file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store the token as `<state_dir>/<key>`.
    ///
    /// The key must be a plain file name: no separators, no traversal.
    pub fn new(state_dir: impl AsRef<Path>, key: &str) -> Result<Self, StoreError> {
        validate_key(key)?;
        Ok(Self {
            path: state_dir.as_ref().join(key),
        })
    }

    /// File holding the token.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        }
        // The token file is only ever replaced whole, via rename.
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staging = self.path.with_file_name(format!(".{file_name}.tmp"));
        write_private(&staging, token).map_err(|e| self.io_error(e))?;
        std::fs::rename(&staging, &self.path).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Write `contents` to a fresh file readable only by its owner.
#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    // A stale staging file would keep its old mode through truncation.
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let invalid = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0');
    if invalid {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_lifecycle() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn memory_store_clones_share_slot() {
        let a = MemoryTokenStore::new();
        let b = a.clone();
        a.save("t").unwrap();
        assert_eq!(b.load().unwrap().as_deref(), Some("t"));
    }

    #[test]
    fn file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("state"), DEFAULT_TOKEN_KEY).unwrap();
        assert_eq!(store.load().unwrap(), None);

        store.save("header.payload.sig").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("header.payload.sig"));
        assert!(store.path().ends_with("state/token"));

        store.save("second.token.x").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("second.token.x"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn file_store_token_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path(), DEFAULT_TOKEN_KEY).unwrap();
        let staging = dir.path().join(".token.tmp");
        std::fs::write(&staging, "stale").unwrap();
        std::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o644)).unwrap();

        store.save("header.payload.sig").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!staging.exists());
    }

    #[test]
    fn file_store_blank_file_is_no_token() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("token"), "  \n").unwrap();
        let store = FileTokenStore::new(dir.path(), "token").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_rejects_bad_keys() {
        for key in ["", ".", "..", "a/b", "..\\x", "nul\0"] {
            assert!(
                matches!(FileTokenStore::new("/tmp", key), Err(StoreError::InvalidKey(_))),
                "{key:?}"
            );
        }
    }
}
