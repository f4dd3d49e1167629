//! Pre-write backup snapshots for local stores
//!
//! Before a store file is rewritten, a snapshot of the current content is
//! taken beside it. A confirmed-successful write removes the snapshot; a
//! failed write restores it and leaves it in place as a recovery artifact.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::BackendResult;

/// Suffix appended to the store path to form the snapshot path
pub const BACKUP_SUFFIX: &str = ".bak";

/// A just-taken pre-write snapshot of a store file
#[derive(Debug)]
pub struct BackupGuard {
    original: PathBuf,
    snapshot: Option<PathBuf>,
}

impl BackupGuard {
    /// Snapshot `path` if it exists. A store being written for the first
    /// time has nothing to snapshot.
    pub fn take<P: AsRef<Path>>(path: P) -> BackendResult<Self> {
        let original = path.as_ref().to_path_buf();
        if !original.exists() {
            return Ok(Self {
                original,
                snapshot: None,
            });
        }

        let mut name = original
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.push_str(BACKUP_SUFFIX);
        let snapshot = original.with_file_name(name);

        fs::copy(&original, &snapshot)?;
        debug!(snapshot = %snapshot.display(), "pre-write backup taken");
        Ok(Self {
            original,
            snapshot: Some(snapshot),
        })
    }

    /// The snapshot location, when one was taken
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    /// Copy the snapshot back over the store file after a failed write.
    ///
    /// The snapshot stays on disk afterwards as a recovery artifact.
    pub fn restore(&self) -> BackendResult<()> {
        if let Some(snapshot) = &self.snapshot {
            fs::copy(snapshot, &self.original)?;
            warn!(
                store = %self.original.display(),
                snapshot = %snapshot.display(),
                "write failed, store restored from pre-write backup"
            );
        }
        Ok(())
    }

    /// Remove the snapshot after a confirmed-successful write
    pub fn commit(self) -> BackendResult<()> {
        if let Some(snapshot) = &self.snapshot {
            if snapshot.exists() {
                fs::remove_file(snapshot)?;
            }
        }
        Ok(())
    }
}

/// Write `content` to `path` under backup protection: snapshot first,
/// restore on failure, drop the snapshot only after success.
pub fn write_with_backup(path: &Path, content: &[u8]) -> BackendResult<()> {
    write_guarded(path, content, |p, c| fs::write(p, c))
}

fn write_guarded<F>(path: &Path, content: &[u8], write: F) -> BackendResult<()>
where
    F: FnOnce(&Path, &[u8]) -> std::io::Result<()>,
{
    let guard = BackupGuard::take(path)?;
    match write(path, content) {
        Ok(()) => guard.commit(),
        Err(err) => {
            if let Err(restore_err) = guard.restore() {
                warn!(error = %restore_err, "backup restore after failed write also failed");
            }
            Err(err.into())
        }
    }
}
