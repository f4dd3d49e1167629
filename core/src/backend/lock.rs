//! Advisory lock files for local stores
//!
//! A sentinel marker file colocated with the store signals that a session
//! has it open. The lock is purely advisory: it is never enforced against a
//! second process, and a marker found on open is surfaced to the caller,
//! whose only mitigation is a human override. A marker left behind by a
//! crashed session stays in place until overridden.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{BackendError, BackendResult};

/// Suffix appended to the store path to form the marker path
pub const LOCK_SUFFIX: &str = ".lock";

/// An advisory sentinel lock beside a store file
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    held: bool,
}

impl LockFile {
    /// Build the lock for the store at `store_path` (marker not yet taken)
    pub fn for_store<P: AsRef<Path>>(store_path: P) -> Self {
        let mut name = store_path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.push_str(LOCK_SUFFIX);
        Self {
            path: store_path.as_ref().with_file_name(name),
            held: false,
        }
    }

    /// The marker file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a marker file is currently present on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Whether this session holds the marker
    pub fn held(&self) -> bool {
        self.held
    }

    /// Create the marker file.
    ///
    /// Fails with [`BackendError::LockHeld`] when a marker is already
    /// present and was not written by this session. Creation is atomic
    /// (`create_new`), so two processes racing for the marker cannot both
    /// acquire it.
    pub fn acquire(&mut self) -> BackendResult<()> {
        if self.held {
            return Ok(());
        }
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(BackendError::LockHeld {
                    path: self.path.display().to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        };
        writeln!(file, "{}", std::process::id())?;
        debug!(lock = %self.path.display(), "advisory lock acquired");
        self.held = true;
        Ok(())
    }

    /// Take the marker even when one is already present (the human
    /// override path)
    pub fn acquire_forced(&mut self) -> BackendResult<()> {
        if self.path.exists() && !self.held {
            warn!(lock = %self.path.display(), "overriding existing advisory lock");
        }
        fs::write(&self.path, format!("{}\n", std::process::id()))?;
        self.held = true;
        Ok(())
    }

    /// Remove the marker file if this session holds it
    pub fn release(&mut self) -> BackendResult<()> {
        if !self.held {
            return Ok(());
        }
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        debug!(lock = %self.path.display(), "advisory lock released");
        self.held = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("store.ktree")
    }

    #[test]
    fn test_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let mut lock = LockFile::for_store(store_path(&dir));
        assert!(!lock.exists());

        lock.acquire().unwrap();
        assert!(lock.exists());
        assert!(lock.held());

        lock.release().unwrap();
        assert!(!lock.exists());
        assert!(!lock.held());
    }

    #[test]
    fn test_marker_path_is_colocated() {
        let dir = TempDir::new().unwrap();
        let lock = LockFile::for_store(store_path(&dir));
        assert_eq!(
            lock.path().file_name().unwrap().to_string_lossy(),
            "store.ktree.lock"
        );
        assert_eq!(lock.path().parent(), store_path(&dir).parent());
    }

    #[test]
    fn test_existing_marker_blocks_acquire() {
        let dir = TempDir::new().unwrap();
        let mut first = LockFile::for_store(store_path(&dir));
        first.acquire().unwrap();

        let mut second = LockFile::for_store(store_path(&dir));
        let err = second.acquire().unwrap_err();
        assert!(matches!(err, BackendError::LockHeld { .. }));
    }

    #[test]
    fn test_foreign_marker_blocks_acquire() {
        let dir = TempDir::new().unwrap();
        let mut lock = LockFile::for_store(store_path(&dir));

        // A marker created by something other than this code still maps to
        // the lock-held error, via the atomic create.
        fs::write(lock.path(), "12345\n").unwrap();
        let err = lock.acquire().unwrap_err();
        assert!(matches!(err, BackendError::LockHeld { .. }));
        assert!(!lock.held());
    }

    #[test]
    fn test_forced_acquire_overrides() {
        let dir = TempDir::new().unwrap();
        let mut first = LockFile::for_store(store_path(&dir));
        first.acquire().unwrap();

        let mut second = LockFile::for_store(store_path(&dir));
        second.acquire_forced().unwrap();
        assert!(second.held());
    }

    #[test]
    fn test_release_without_hold_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut lock = LockFile::for_store(store_path(&dir));
        lock.release().unwrap();
        assert!(!lock.exists());
    }
}
