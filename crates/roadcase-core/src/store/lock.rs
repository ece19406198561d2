//! Advisory write lock for check-then-act sequences against the fleet store.
//!
//! Every mutator re-checks the non-overlap invariant immediately before
//! writing; the guard serializes that re-check with the write so two callers
//! cannot both pass the check and both insert.

use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

/// Advisory lock errors for the fleet store lock file.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another writer held the lock past the timeout.
    #[error("write lock timed out after {waited:?} at {}", .path.display())]
    Timeout { path: PathBuf, waited: Duration },

    /// I/O error while opening or locking the lock file.
    #[error("write lock I/O error: {0}")]
    Io(#[from] io::Error),
}

/// RAII guard for the store-wide exclusive write lock.
///
/// Released on drop; [`Self::release`] exists for explicit early release.
#[derive(Debug)]
pub struct StoreWriteLock {
    file: File,
    path: PathBuf,
}

impl StoreWriteLock {
    /// Acquire an exclusive advisory lock on `path`, retrying until
    /// `timeout` elapses.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let parent = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "lock path has no parent")
        })?;
        fs::create_dir_all(parent)?;

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            if file.try_lock_exclusive().is_ok() {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Explicitly release the lock. Release also happens automatically on
    /// drop.
    pub fn release(self) {
        let _ = self.file.unlock();
    }

    /// Return the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreWriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
