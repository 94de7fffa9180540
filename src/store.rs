//! MovieStore - the in-memory movie collection and its CRUD operations.
//!
//! The collection is ordered by insertion; listings page through it in that
//! order. Ids come from a counter that only moves forward, so an id is never
//! handed out twice even after the movie holding it is deleted.
//!
//! Every successful mutation queues a full snapshot on the store's
//! [`FlushQueue`] (if it has one) before releasing the write lock, and returns
//! without waiting for the write. Call [`MovieStore::sync`] to wait for it.

use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::movie::{Movie, MovieInput, MoviePatch};
use crate::page::Page;
use crate::persistence::{CsvFile, FlushQueue, FlushWorkerThread};

struct Catalog {
    movies: Vec<Movie>,
    next_id: u64,
}

/// Handle to the movie collection. Clones share the same collection.
#[derive(Clone)]
pub struct MovieStore {
    catalog: Arc<RwLock<Catalog>>,
    flush: Option<FlushQueue>,
}

impl Default for MovieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MovieStore {
    /// An empty store that is not persisted anywhere.
    pub fn new() -> Self {
        Self::from_movies(Vec::new())
    }

    /// A store seeded with `movies`, keeping their ids. New ids continue
    /// after the highest one present.
    pub fn from_movies(movies: Vec<Movie>) -> Self {
        let next_id = movies.iter().map(|movie| movie.id).max().unwrap_or(0) + 1;
        Self {
            catalog: Arc::new(RwLock::new(Catalog { movies, next_id })),
            flush: None,
        }
    }

    /// Queue a snapshot on `queue` after every mutation.
    pub fn with_flush_queue(mut self, queue: FlushQueue) -> Self {
        self.flush = Some(queue);
        self
    }

    /// Load the CSV file at `path` and start a worker that rewrites it after
    /// every mutation. The store is fully loaded when this returns.
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, FlushWorkerThread)> {
        let file = CsvFile::new(path);
        let report = file.load()?;
        info!(
            path = %file.path().display(),
            movies = report.movies.len(),
            "movie store ready"
        );
        let worker = FlushWorkerThread::spawn(file);
        let store = Self::from_movies(report.movies).with_flush_queue(worker.queue());
        Ok((store, worker))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Catalog>> {
        self.catalog
            .read()
            .map_err(|_| CatalogError::LockPoisoned("read"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Catalog>> {
        self.catalog
            .write()
            .map_err(|_| CatalogError::LockPoisoned("write"))
    }

    fn flush(&self, catalog: &Catalog) {
        if let Some(queue) = &self.flush {
            let seq = queue.submit(catalog.movies.clone());
            debug!(seq, movies = catalog.movies.len(), "snapshot queued");
        }
    }

    /// The movies on `page`, in collection order. Empty past the end.
    pub fn list(&self, page: Page) -> Result<Vec<Movie>> {
        let catalog = self.read()?;
        let range = page.range(catalog.movies.len());
        Ok(catalog.movies[range].to_vec())
    }

    pub fn get(&self, id: u64) -> Result<Option<Movie>> {
        let catalog = self.read()?;
        Ok(catalog.movies.iter().find(|movie| movie.id == id).cloned())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.movies.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Append a new movie with the next id.
    pub fn create(&self, input: MovieInput) -> Result<Movie> {
        let mut catalog = self.write()?;
        let movie = Movie::new(catalog.next_id, input);
        catalog.next_id += 1;
        catalog.movies.push(movie.clone());
        self.flush(&catalog);
        Ok(movie)
    }

    /// Merge the fields present in `patch` onto movie `id`.
    pub fn update(&self, id: u64, patch: MoviePatch) -> Result<Movie> {
        let mut catalog = self.write()?;
        let movie = catalog
            .movies
            .iter_mut()
            .find(|movie| movie.id == id)
            .ok_or(CatalogError::NotFound(id))?;
        movie.apply(patch);
        let updated = movie.clone();
        self.flush(&catalog);
        Ok(updated)
    }

    /// Remove movie `id`, keeping the order of the rest.
    pub fn delete(&self, id: u64) -> Result<()> {
        let mut catalog = self.write()?;
        let index = catalog
            .movies
            .iter()
            .position(|movie| movie.id == id)
            .ok_or(CatalogError::NotFound(id))?;
        catalog.movies.remove(index);
        self.flush(&catalog);
        Ok(())
    }

    /// Wait until every mutation made so far is on disk. A store without a
    /// flush queue is always in sync.
    pub fn sync(&self) -> Result<()> {
        match &self.flush {
            Some(queue) => queue.sync(),
            None => Ok(()),
        }
    }
}
