//! Bounded lock acquisition.
//!
//! [`Locker::acquire`] never blocks by contract, but a misbehaving
//! implementation (or a stuck filesystem under a lock file) could. The
//! attempt therefore runs on its own thread and the caller waits at most
//! the configured timeout.

use std::io;
use std::panic;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use dsfile_lock::{LockError, Locker};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Acquire `locker`, waiting no longer than `timeout`.
///
/// Returns the now-held locker. If the attempt outlives the timeout and
/// later succeeds, the late lock is released on the acquiring thread. A
/// panic inside `acquire` is resumed on the calling thread.
pub(crate) fn acquire_with_timeout<L: Locker>(locker: L, timeout: Duration) -> StoreResult<L> {
    let identity = locker.identity();
    let (tx, rx) = mpsc::channel::<(L, Result<(), LockError>)>();

    let handle = thread::Builder::new()
        .name("dsfile-lock".into())
        .spawn(move || {
            let mut locker = locker;
            let result = locker.acquire();
            if let Err(mpsc::SendError((mut late, result))) = tx.send((locker, result)) {
                if result.is_ok() {
                    warn!(identity = %late.identity(), "lock acquired after timeout; releasing");
                    late.release();
                }
            }
        })
        .map_err(|e| StoreError::LockFailed {
            identity: identity.clone(),
            source: LockError::Io(e),
        })?;

    match rx.recv_timeout(timeout) {
        Ok((locker, Ok(()))) => {
            debug!(%identity, "lock held");
            Ok(locker)
        }
        Ok((_, Err(source))) => Err(StoreError::LockFailed { identity, source }),
        Err(RecvTimeoutError::Timeout) => {
            warn!(%identity, ?timeout, "lock acquisition timed out");
            Err(StoreError::LockFailed {
                identity,
                source: LockError::Timeout(timeout),
            })
        }
        Err(RecvTimeoutError::Disconnected) => match handle.join() {
            Err(payload) => panic::resume_unwind(payload),
            Ok(()) => Err(StoreError::LockFailed {
                identity,
                source: LockError::Io(io::Error::other("lock thread exited without a result")),
            }),
        },
    }
}
