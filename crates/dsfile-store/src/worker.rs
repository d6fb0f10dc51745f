//! The single save worker behind each persisted file.

use std::io;
use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

type Job = Box<dyn FnOnce(&mut StdRng) + Send>;

/// A dedicated thread that runs queued jobs one at a time, in FIFO order.
///
/// The worker owns the random source used for temp-file suffixes; jobs
/// borrow it. Once [`shutdown`](Self::shutdown) has been called, `run`
/// returns [`StoreError::Closed`] instead of queueing.
pub(crate) struct SaveWorker {
    sender: Mutex<Option<Sender<Job>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SaveWorker {
    pub(crate) fn spawn() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let handle = thread::Builder::new()
            .name("dsfile-save".into())
            .spawn(move || {
                let mut rng = StdRng::from_entropy();
                for job in rx {
                    job(&mut rng);
                }
                debug!("save worker drained");
            })?;
        Ok(Self {
            sender: Mutex::new(Some(tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Queue `job` and block until it has run, returning its output.
    pub(crate) fn run<R, F>(&self, job: F) -> StoreResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut StdRng) -> R + Send + 'static,
    {
        let (done_tx, done_rx) = mpsc::sync_channel(1);
        let job: Job = Box::new(move |rng: &mut StdRng| {
            let _ = done_tx.send(job(rng));
        });

        {
            let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
            let sender = sender.as_ref().ok_or(StoreError::Closed)?;
            sender.send(job).map_err(|_| StoreError::Closed)?;
        }

        // A job that panicked drops its reply channel; the worker is gone.
        done_rx.recv().map_err(|_| StoreError::Closed)
    }

    /// Stop accepting jobs, let queued ones finish, and join the thread.
    pub(crate) fn shutdown(&self) {
        drop(
            self.sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("save worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn run_returns_job_output() {
        let worker = SaveWorker::spawn().unwrap();
        let n = worker.run(|rng| rng.gen_range(0..10u32)).unwrap();
        assert!(n < 10);
        assert_eq!(worker.run(|_| "done").unwrap(), "done");
        worker.shutdown();
    }

    #[test]
    fn jobs_never_overlap() {
        let worker = Arc::new(SaveWorker::spawn().unwrap());
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let worker = Arc::clone(&worker);
                let active = Arc::clone(&active);
                let max_seen = Arc::clone(&max_seen);
                thread::spawn(move || {
                    for _ in 0..5 {
                        let active = Arc::clone(&active);
                        let max_seen = Arc::clone(&max_seen);
                        worker
                            .run(move |_| {
                                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                                max_seen.fetch_max(now, Ordering::SeqCst);
                                thread::sleep(Duration::from_millis(1));
                                active.fetch_sub(1, Ordering::SeqCst);
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        worker.shutdown();
    }

    #[test]
    fn run_after_shutdown_is_closed() {
        let worker = SaveWorker::spawn().unwrap();
        worker.shutdown();
        worker.shutdown();
        let err = worker.run(|_| ()).unwrap_err();
        assert!(matches!(err, StoreError::Closed));
    }
}
