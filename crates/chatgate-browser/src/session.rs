//! Persisted browser session blob.
//!
//! The store is a pass-through persistence boundary: it moves an opaque
//! string blob to and from one named file and never interprets it. The
//! blob's schema belongs to the channel (see `channel::SessionState`).

use std::io;
use std::path::{Path, PathBuf};

/// Reads and writes the single persisted session blob.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a session blob has been persisted.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the blob. Absent file is not an error.
    pub fn load(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write the blob. Callers on the generation path ignore the result:
    /// re-persisting the session is an optimization, not a requirement for
    /// the current call.
    pub fn save(&self, blob: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("browser-session.json"));
        assert!(!store.exists());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_read_after_write_reflects_last_write() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("browser-session.json"));

        store.save("{\"cookies\":[1]}").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("{\"cookies\":[1]}"));

        // A second invocation sees the write performed by the first.
        store.save("{\"cookies\":[2]}").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("{\"cookies\":[2]}"));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested/dir/session.json"));
        store.save("blob").unwrap();
        assert!(store.exists());
    }

    #[test]
    fn test_save_failure_is_reportable_not_fatal() {
        // Point the store at a path whose parent is a file, so the write
        // must fail; the caller is expected to log and move on.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let store = SessionStore::new(blocker.join("session.json"));
        assert!(store.save("blob").is_err());
    }
}
