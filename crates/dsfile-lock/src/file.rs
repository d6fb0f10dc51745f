use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{LockError, LockResult};
use crate::identity::LockIdentity;
use crate::traits::Locker;

/// Lock held as an exclusive advisory lock on a file.
///
/// The file is created if absent and left in place on release. Advisory
/// locks are tied to the open file handle, so two `FileLocker`s on the same
/// path exclude each other even inside one process.
#[derive(Debug)]
pub struct FileLocker {
    path: PathBuf,
    file: Option<File>,
    fatal_on_bad_path: bool,
}

impl FileLocker {
    /// Create an unheld locker for `path`.
    ///
    /// If `path` cannot be opened as a lock file when acquiring (for example
    /// it names a directory), [`acquire`](Locker::acquire) panics with
    /// `open lock file <path> error: <cause>`. Callers that would rather get
    /// an error should use [`new_checked`](Self::new_checked).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            fatal_on_bad_path: true,
        }
    }

    /// Like [`new`](Self::new), but an unusable path is reported as
    /// [`LockError::InvalidLockPath`] instead of a panic.
    pub fn new_checked(path: impl Into<PathBuf>) -> LockResult<Self> {
        let path = path.into();
        if path.is_dir() {
            return Err(LockError::InvalidLockPath {
                source: io::Error::other("path is a directory"),
                path,
            });
        }
        Ok(Self {
            path,
            file: None,
            fatal_on_bad_path: false,
        })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> LockResult<File> {
        match OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
        {
            Ok(file) => Ok(file),
            Err(e) if self.fatal_on_bad_path => {
                panic!("open lock file {} error: {}", self.path.display(), e)
            }
            Err(e) => Err(LockError::InvalidLockPath {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl Locker for FileLocker {
    fn acquire(&mut self) -> LockResult<()> {
        if self.file.is_some() {
            return Ok(());
        }
        let file = self.open()?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %self.path.display(), "file lock acquired");
                self.file = Some(file);
                Ok(())
            }
            Err(e) if is_contended(&e) => Err(LockError::Held {
                path: self.path.clone(),
            }),
            Err(e) => Err(LockError::Io(e)),
        }
    }

    fn release(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.unlock() {
                // Closing the handle below drops the lock regardless.
                warn!(path = %self.path.display(), error = %e, "file unlock failed");
            }
            debug!(path = %self.path.display(), "file lock released");
        }
    }

    fn is_held(&self) -> bool {
        self.file.is_some()
    }

    fn identity(&self) -> LockIdentity {
        LockIdentity::File(self.path.clone())
    }
}

impl Drop for FileLocker {
    fn drop(&mut self) {
        self.release();
    }
}
