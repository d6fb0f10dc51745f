//! Cross-process mutual exclusion for dsfile.
//!
//! A [`Locker`] owns one lock identity -- a TCP port on the loopback
//! interface or a lock-file path -- and can take and give back exclusive
//! ownership of it. Ownership is arbitrated by the operating system, so the
//! lock holds across processes, not just threads.
//!
//! # Strategies
//!
//! - [`PortLocker`] -- binding a listening socket is an atomic test-and-set
//!   that never touches the filesystem.
//! - [`FileLocker`] -- an exclusive advisory lock (`flock` / `LockFileEx`)
//!   on a file that is created if absent.
//!
//! [`LockIdentity`] is the serializable name of either one.
//!
//! # Design Rules
//!
//! 1. `acquire` never blocks and never retries; contention is an error.
//! 2. `release` is idempotent.
//! 3. A held lock never expires on its own; dropping the locker releases it.
//! 4. An unusable lock-file path is fatal for [`FileLocker::new`] (it panics)
//!    and a plain error for [`FileLocker::new_checked`].

pub mod error;
pub mod file;
pub mod identity;
pub mod port;
pub mod traits;

pub use error::{LockError, LockResult};
pub use file::FileLocker;
pub use identity::{InvalidIdentity, LockIdentity};
pub use port::PortLocker;
pub use traits::Locker;
