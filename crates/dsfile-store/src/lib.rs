//! Lock-guarded, crash-safe single-file persistence.
//!
//! [`PersistedFile`] keeps a caller-owned object durably mirrored to one
//! file. Opening it takes a cross-process lock ([`dsfile_lock`]) and loads
//! the previous snapshot if there is one; each save re-encodes the whole
//! object with a [`dsfile_codec::Codec`] and atomically replaces the file.
//!
//! ```
//! use dsfile_codec::Json;
//! use dsfile_lock::PortLocker;
//! use dsfile_store::{shared, PersistedFile};
//!
//! let dir = tempfile::tempdir()?;
//! let path = dir.path().join("counts.json");
//!
//! let counts = shared(vec![1u32, 2, 3]);
//! let file = PersistedFile::open(counts.clone(), &path, Json::new(), PortLocker::new(0))?;
//! counts.write().unwrap().push(4);
//! file.save()?;
//! file.close();
//!
//! let restored = shared(Vec::<u32>::new());
//! let _file = PersistedFile::open(restored.clone(), &path, Json::new(), PortLocker::new(0))?;
//! assert_eq!(*restored.read().unwrap(), vec![1, 2, 3, 4]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Lifecycle
//!
//! `open` (lock, then load) → any number of `save` calls → `close`.
//! Only opening can fail terminally, and a failed open holds no lock.
//!
//! # Design Rules
//!
//! 1. The durable path only ever names a complete snapshot: saves go to
//!    `<path>.<random>.tmp` in the same directory and are renamed over it.
//! 2. Saves on one handle never run concurrently; they complete in the
//!    order they were queued.
//! 3. No retries. Every failure is returned to the caller.
//! 4. The in-memory target is authoritative; the file is the last
//!    successful snapshot.

mod acquire;
pub mod config;
pub mod error;
pub mod file;
mod worker;

pub use config::StoreConfig;
pub use error::{ErrorKind, StoreError, StoreResult};
pub use file::{shared, PersistedFile, Shared};
