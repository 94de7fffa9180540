//! Persistence - Snapshots of the movie collection on disk.
//!
//! The store never writes files itself. Every mutation hands a full snapshot
//! of the collection to a [`FlushQueue`]; a single [`FlushWorkerThread`]
//! drains the queue, keeps only the newest snapshot, and writes it through a
//! [`MovieSink`].
//!
//! ## Example
//!
//! ```ignore
//! use movie_catalog::{CsvFile, FlushWorkerThread, MovieStore};
//!
//! let file = CsvFile::new("data/movies_db.csv");
//! let report = file.load()?;
//! let worker = FlushWorkerThread::spawn(file);
//! let store = MovieStore::from_movies(report.movies).with_flush_queue(worker.queue());
//!
//! // ... mutate the store ...
//!
//! store.sync()?;          // wait until the latest snapshot is on disk
//! let stats = worker.stop();
//! ```

mod csv_file;
mod in_memory;
mod worker;

use crate::error::Result;
use crate::movie::Movie;

/// Destination for full snapshots of the collection.
pub trait MovieSink: Send + 'static {
    /// Replace the persisted collection with `movies`, in order.
    fn save(&self, movies: &[Movie]) -> Result<()>;
}

pub use csv_file::{CsvFile, LoadReport, CSV_HEADER};
pub use in_memory::InMemorySink;
pub use worker::{FlushQueue, FlushStats, FlushWorkerThread};
