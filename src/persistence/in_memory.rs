//! InMemorySink - records snapshots instead of writing files. For tests and development.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::MovieSink;
use crate::error::{CatalogError, Result};
use crate::movie::Movie;

/// Clone-friendly via Arc: clones observe the same recorded snapshots.
#[derive(Clone, Default)]
pub struct InMemorySink {
    snapshots: Arc<Mutex<Vec<Vec<Movie>>>>,
    failing: Arc<AtomicBool>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every snapshot saved so far, oldest first.
    pub fn snapshots(&self) -> Vec<Vec<Movie>> {
        self.snapshots
            .lock()
            .map(|snapshots| snapshots.clone())
            .unwrap_or_default()
    }

    /// The most recently saved snapshot.
    pub fn latest(&self) -> Option<Vec<Movie>> {
        self.snapshots().pop()
    }
}

impl MovieSink for InMemorySink {
    fn save(&self, movies: &[Movie]) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::Flush("sink is failing".into()));
        }
        self.snapshots
            .lock()
            .map_err(|_| CatalogError::LockPoisoned("sink save"))?
            .push(movies.to_vec());
        Ok(())
    }
}
