use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Errors from lock acquisition.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Another socket already listens on the port.
    #[error("port {port} is already bound")]
    PortInUse {
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Another open handle holds the exclusive lock on the file.
    #[error("lock file {} is held by another owner", path.display())]
    Held { path: PathBuf },

    /// The lock-file path cannot be opened as a regular file.
    #[error("invalid lock file path {}: {source}", path.display())]
    InvalidLockPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Acquisition did not resolve within the allowed time.
    #[error("lock acquisition timed out after {0:?}")]
    Timeout(Duration),

    /// Any other I/O failure while taking the lock.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias for lock operations.
pub type LockResult<T> = Result<T, LockError>;
