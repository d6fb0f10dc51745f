use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use dsfile_codec::Codec;
use dsfile_lock::{LockIdentity, Locker};
use rand::rngs::StdRng;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::TempPath;
use tracing::{debug, info};

use crate::acquire::acquire_with_timeout;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::worker::SaveWorker;

/// The caller-owned object a [`PersistedFile`] mirrors to disk.
///
/// The caller mutates it through the lock; saves read it under a shared
/// guard and loads replace it wholesale.
pub type Shared<T> = Arc<RwLock<T>>;

/// Wrap `value` for use as a persisted target.
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

/// An in-memory object durably mirrored to a single file.
///
/// Opening takes the lock, then loads the durable file into the target if
/// it exists. Every [`save`](Self::save) serializes the whole target to a
/// sibling temp file and renames it over the durable path, so the path only
/// ever names a complete snapshot. Saves from any number of threads run one
/// at a time on a dedicated worker.
///
/// [`close`](Self::close) stops the worker and releases the lock; dropping
/// the handle closes it too.
pub struct PersistedFile<T, C, L>
where
    L: Locker,
{
    target: Shared<T>,
    path: PathBuf,
    codec: Arc<C>,
    config: StoreConfig,
    identity: LockIdentity,
    locker: Mutex<Option<L>>,
    worker: SaveWorker,
    saves: AtomicU64,
    closed: AtomicBool,
}

impl<T, C, L> PersistedFile<T, C, L>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    C: Codec,
    L: Locker,
{
    /// Open with the default [`StoreConfig`].
    ///
    /// Only a shared handle is accepted as the target; a plain value would
    /// not see the caller's later mutations:
    ///
    /// ```compile_fail
    /// use dsfile_codec::Json;
    /// use dsfile_lock::PortLocker;
    /// use dsfile_store::PersistedFile;
    ///
    /// let value = vec![1, 2, 3];
    /// let _ = PersistedFile::open(value, "state.json", Json::new(), PortLocker::new(0));
    /// ```
    pub fn open(
        target: Shared<T>,
        path: impl Into<PathBuf>,
        codec: C,
        locker: L,
    ) -> StoreResult<Self> {
        Self::open_with_config(target, path, codec, locker, StoreConfig::default())
    }

    /// Take the lock, load any existing snapshot into `target`, and start
    /// the save worker.
    ///
    /// On error no lock is left held and no file has been modified. A
    /// decode failure leaves `target` untouched.
    pub fn open_with_config(
        target: Shared<T>,
        path: impl Into<PathBuf>,
        codec: C,
        locker: L,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        let path = path.into();
        validate_path(&path)?;

        let identity = locker.identity();
        let mut locker = acquire_with_timeout(locker, config.lock_timeout)?;

        let loaded = match load(&target, &path, &codec) {
            Ok(loaded) => loaded,
            Err(e) => {
                locker.release();
                return Err(e);
            }
        };

        let worker = match SaveWorker::spawn() {
            Ok(worker) => worker,
            Err(source) => {
                locker.release();
                return Err(StoreError::Io { path, source });
            }
        };

        info!(
            path = %path.display(),
            codec = codec.name(),
            lock = %identity,
            loaded,
            "persisted file opened"
        );

        Ok(Self {
            target,
            path,
            codec: Arc::new(codec),
            config,
            identity,
            locker: Mutex::new(Some(locker)),
            worker,
            saves: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Write a snapshot of the target and wait for it to land.
    ///
    /// Concurrent callers are queued; each save encodes the target as it is
    /// when that save's turn comes. On error the previous snapshot is left
    /// in place and no temp file remains.
    pub fn save(&self) -> StoreResult<()> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let target = Arc::clone(&self.target);
        let codec = Arc::clone(&self.codec);
        let path = self.path.clone();
        let sync = self.config.sync_on_save;

        let bytes = self
            .worker
            .run(move |rng| write_snapshot(&target, &path, codec.as_ref(), sync, rng))??;

        self.saves.fetch_add(1, Ordering::Relaxed);
        debug!(path = %self.path.display(), bytes, "snapshot saved");
        Ok(())
    }
}

impl<T, C, L: Locker> PersistedFile<T, C, L> {
    /// Stop the save worker and release the lock.
    ///
    /// Saves already queued complete first. Later calls are no-ops, and
    /// later saves fail with [`StoreError::Closed`].
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.worker.shutdown();
        if let Some(mut locker) = self
            .locker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            locker.release();
        }
        info!(
            path = %self.path.display(),
            saves = self.save_count(),
            "persisted file closed"
        );
    }

    /// The durable file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Another handle to the target.
    pub fn target(&self) -> Shared<T> {
        Arc::clone(&self.target)
    }

    /// The codec in effect.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// The lock identity held while open.
    pub fn lock_identity(&self) -> &LockIdentity {
        &self.identity
    }

    /// Number of saves that completed successfully.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl<T, C, L: Locker> Drop for PersistedFile<T, C, L> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T, C, L: Locker> std::fmt::Debug for PersistedFile<T, C, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedFile")
            .field("path", &self.path)
            .field("lock", &self.identity)
            .field("saves", &self.save_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn validate_path(path: &Path) -> StoreResult<()> {
    if path.as_os_str().is_empty() {
        return Err(StoreError::InvalidArgument("path is empty".into()));
    }
    if path.file_name().is_none() {
        return Err(StoreError::InvalidArgument(format!(
            "path {} does not name a file",
            path.display()
        )));
    }
    Ok(())
}

/// Decode the durable file into `target`. Returns `false` if there is none.
fn load<T, C>(target: &Shared<T>, path: &Path, codec: &C) -> StoreResult<bool>
where
    T: DeserializeOwned,
    C: Codec,
{
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no durable file; starting fresh");
            return Ok(false);
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let value: T = codec
        .decode(BufReader::new(file))
        .map_err(|source| StoreError::DecodeFailed {
            path: path.to_path_buf(),
            source,
        })?;
    *target.write().unwrap_or_else(PoisonError::into_inner) = value;
    debug!(path = %path.display(), codec = codec.name(), "durable file loaded");
    Ok(true)
}

/// `<path>.<random>.tmp`, in the same directory as `path`.
fn temp_path_for(path: &Path, rng: &mut StdRng) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}.tmp", rng.gen_range(0..i64::MAX)));
    PathBuf::from(name)
}

/// Encode `target` to a fresh temp file and rename it over `path`.
/// Returns the snapshot size in bytes.
fn write_snapshot<T, C>(
    target: &RwLock<T>,
    path: &Path,
    codec: &C,
    sync: bool,
    rng: &mut StdRng,
) -> StoreResult<u64>
where
    T: Serialize,
    C: Codec,
{
    let tmp = temp_path_for(path, rng);
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp)
        .map_err(|source| StoreError::TempFileOpenFailed {
            path: tmp.clone(),
            source,
        })?;
    // Removes the temp file on every exit except a successful persist.
    let tmp_guard = TempPath::try_from_path(&tmp).map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        StoreError::TempFileOpenFailed {
            path: tmp.clone(),
            source,
        }
    })?;

    let mut writer = BufWriter::new(file);
    {
        let value = target.read().unwrap_or_else(PoisonError::into_inner);
        codec
            .encode(&mut writer, &*value)
            .map_err(|source| StoreError::EncodeFailed {
                path: path.to_path_buf(),
                source,
            })?;
    }

    let write_failed = |source| StoreError::TempFileWriteFailed {
        path: tmp.clone(),
        source,
    };
    let file = writer
        .into_inner()
        .map_err(|e| write_failed(e.into_error()))?;
    if sync {
        file.sync_all().map_err(write_failed)?;
    }
    let bytes = file.metadata().map_err(write_failed)?.len();
    drop(file);

    tmp_guard
        .persist(path)
        .map_err(|e| StoreError::RenameFailed {
            from: tmp.clone(),
            to: path.to_path_buf(),
            source: e.error,
        })?;
    Ok(bytes)
}
