//! Threaded flush worker.
//!
//! Snapshots are numbered in submission order. The worker drains everything
//! queued since its last write and persists only the newest snapshot, so a
//! burst of mutations costs one file rewrite and the file always converges to
//! the latest in-memory state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::MovieSink;
use crate::error::{CatalogError, Result};
use crate::movie::Movie;

/// Statistics from the flush worker.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlushStats {
    pub snapshots_written: usize,
    /// Snapshots superseded by a newer one before they were written.
    pub snapshots_coalesced: usize,
    pub failures: usize,
}

enum FlushMessage {
    Snapshot { seq: u64, movies: Vec<Movie> },
    Stop,
}

#[derive(Default)]
struct FlushState {
    /// Highest sequence number the worker has attempted to write.
    processed: u64,
    /// Error from the last attempted write, cleared by a later success.
    last_error: Option<String>,
    stopped: bool,
}

type Shared = Arc<(Mutex<FlushState>, Condvar)>;

/// Submission side of the flush worker. Cheap to clone.
#[derive(Clone)]
pub struct FlushQueue {
    tx: Sender<FlushMessage>,
    next_seq: Arc<AtomicU64>,
    shared: Shared,
}

impl FlushQueue {
    /// Queue a snapshot and return its sequence number. Does not wait for the write.
    ///
    /// Concurrent submitters must be serialized by the caller, otherwise an
    /// older snapshot could be queued behind a newer sequence number.
    pub fn submit(&self, movies: Vec<Movie>) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        if self.tx.send(FlushMessage::Snapshot { seq, movies }).is_err() {
            warn!(seq, "flush worker is gone, snapshot dropped");
        }
        seq
    }

    /// Sequence number of the newest submitted snapshot (0 if none).
    pub fn last_submitted(&self) -> u64 {
        self.next_seq.load(Ordering::SeqCst)
    }

    /// Block until snapshot `seq` (or a newer one) has been written.
    pub fn wait_for(&self, seq: u64) -> Result<()> {
        let (lock, cvar) = &*self.shared;
        let mut state = lock
            .lock()
            .map_err(|_| CatalogError::LockPoisoned("flush wait"))?;
        while state.processed < seq && !state.stopped {
            state = cvar
                .wait(state)
                .map_err(|_| CatalogError::LockPoisoned("flush wait"))?;
        }

        if state.processed < seq {
            return Err(CatalogError::Flush(
                "flush worker stopped before the snapshot was written".into(),
            ));
        }
        match &state.last_error {
            Some(message) => Err(CatalogError::Flush(message.clone())),
            None => Ok(()),
        }
    }

    /// Block until everything submitted so far has been written.
    pub fn sync(&self) -> Result<()> {
        self.wait_for(self.last_submitted())
    }
}

/// A background thread that writes queued snapshots through a [`MovieSink`].
///
/// ## Example
///
/// ```ignore
/// let worker = FlushWorkerThread::spawn(CsvFile::new("movies.csv"));
/// let queue = worker.queue();
/// let seq = queue.submit(movies);
/// queue.wait_for(seq)?;
/// let stats = worker.stop();
/// ```
pub struct FlushWorkerThread {
    queue: FlushQueue,
    handle: Option<JoinHandle<FlushStats>>,
}

impl FlushWorkerThread {
    /// Spawn a new flush worker thread writing through `sink`.
    pub fn spawn<S: MovieSink>(sink: S) -> Self {
        let (tx, rx) = channel();
        let shared: Shared = Arc::new((Mutex::new(FlushState::default()), Condvar::new()));
        let queue = FlushQueue {
            tx,
            next_seq: Arc::new(AtomicU64::new(0)),
            shared: shared.clone(),
        };

        let handle = thread::spawn(move || run(sink, rx, shared));

        Self {
            queue,
            handle: Some(handle),
        }
    }

    /// A handle for submitting snapshots and waiting on them.
    pub fn queue(&self) -> FlushQueue {
        self.queue.clone()
    }

    /// Write anything still queued, stop the thread and return its statistics.
    pub fn stop(mut self) -> FlushStats {
        let _ = self.queue.tx.send(FlushMessage::Stop);
        if let Some(handle) = self.handle.take() {
            handle.join().unwrap_or_default()
        } else {
            FlushStats::default()
        }
    }
}

impl Drop for FlushWorkerThread {
    fn drop(&mut self) {
        let _ = self.queue.tx.send(FlushMessage::Stop);
    }
}

fn run<S: MovieSink>(sink: S, rx: Receiver<FlushMessage>, shared: Shared) -> FlushStats {
    let mut stats = FlushStats::default();

    loop {
        let (mut seq, mut movies) = match rx.recv() {
            Ok(FlushMessage::Snapshot { seq, movies }) => (seq, movies),
            Ok(FlushMessage::Stop) | Err(_) => break,
        };

        let mut stop = false;
        loop {
            match rx.try_recv() {
                Ok(FlushMessage::Snapshot {
                    seq: newer,
                    movies: newer_movies,
                }) => {
                    stats.snapshots_coalesced += 1;
                    seq = newer;
                    movies = newer_movies;
                }
                Ok(FlushMessage::Stop) | Err(TryRecvError::Disconnected) => {
                    stop = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        let outcome = sink.save(&movies);
        match &outcome {
            Ok(()) => {
                stats.snapshots_written += 1;
                debug!(seq, movies = movies.len(), "snapshot flushed");
            }
            Err(err) => {
                stats.failures += 1;
                warn!(seq, error = %err, "snapshot flush failed");
            }
        }

        let (lock, cvar) = &*shared;
        if let Ok(mut state) = lock.lock() {
            state.processed = seq;
            state.last_error = outcome.err().map(|err| err.to_string());
        }
        cvar.notify_all();

        if stop {
            break;
        }
    }

    let (lock, cvar) = &*shared;
    if let Ok(mut state) = lock.lock() {
        state.stopped = true;
    }
    cvar.notify_all();

    stats
}
