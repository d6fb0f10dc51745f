use std::io;
use std::path::PathBuf;

use dsfile_codec::CodecError;
use dsfile_lock::{LockError, LockIdentity};

/// Fieldless discriminant of [`StoreError`], for matching without caring
/// about the underlying cause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    LockFailed,
    DecodeFailed,
    TempFileOpenFailed,
    TempFileWriteFailed,
    EncodeFailed,
    RenameFailed,
    Io,
    Closed,
}

/// Errors from persisted file operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An argument the type system cannot vet was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The lock identity is held elsewhere, or acquisition timed out.
    #[error("lock fail on {identity}: {source}")]
    LockFailed {
        identity: LockIdentity,
        #[source]
        source: LockError,
    },

    /// The existing durable file could not be decoded.
    #[error("decode error in {}: {source}", path.display())]
    DecodeFailed {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The temporary file for a save could not be created.
    #[error("open temp file {}: {source}", path.display())]
    TempFileOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Flushing or syncing the temporary file failed.
    #[error("write temp file {}: {source}", path.display())]
    TempFileWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The target could not be encoded.
    #[error("encode error for {}: {source}", path.display())]
    EncodeFailed {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The finished temporary file could not replace the durable file.
    #[error("rename temp file {} to {}: {source}", from.display(), to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure on the durable path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The handle was closed; no further saves are accepted.
    #[error("persisted file is closed")]
    Closed,
}

impl StoreError {
    /// The kind of failure, without its payload.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::LockFailed { .. } => ErrorKind::LockFailed,
            Self::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            Self::TempFileOpenFailed { .. } => ErrorKind::TempFileOpenFailed,
            Self::TempFileWriteFailed { .. } => ErrorKind::TempFileWriteFailed,
            Self::EncodeFailed { .. } => ErrorKind::EncodeFailed,
            Self::RenameFailed { .. } => ErrorKind::RenameFailed,
            Self::Io { .. } => ErrorKind::Io,
            Self::Closed => ErrorKind::Closed,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(StoreError::Closed.kind(), ErrorKind::Closed);
        assert_eq!(
            StoreError::InvalidArgument("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
        let err = StoreError::RenameFailed {
            from: "a.1.tmp".into(),
            to: "a".into(),
            source: io::Error::other("boom"),
        };
        assert_eq!(err.kind(), ErrorKind::RenameFailed);
    }

    #[test]
    fn messages_name_the_cause() {
        let err = StoreError::LockFailed {
            identity: LockIdentity::Port(31000),
            source: LockError::Timeout(std::time::Duration::from_secs(1)),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("lock fail on port:31000"), "{msg}");
        assert!(msg.contains("timed out"), "{msg}");
    }
}
