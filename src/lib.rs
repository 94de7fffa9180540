//! movie_catalog: an in-memory movie store persisted to a flat CSV file,
//! served over a small REST surface.
//!
//! ## Quick Start
//!
//! ```ignore
//! use movie_catalog::{MovieInput, MoviePatch, MovieStore, Page};
//!
//! let (store, worker) = MovieStore::open("data/movies_db.csv")?;
//! let dune = store.create(MovieInput::new("Dune", "Sci-Fi", 2021, "u"))?;
//! store.update(dune.id, MoviePatch::year(2022))?;
//! let first_page = store.list(Page::default())?;
//! store.sync()?;
//! worker.stop();
//! ```

pub mod config;
mod error;
pub mod logging;
mod movie;
mod page;
pub mod persistence;
mod store;

// HTTP transport (requires "http" feature)
#[cfg(feature = "http")]
pub mod http;

pub use config::ServerConfig;
pub use error::{CatalogError, Result};
pub use movie::{Movie, MovieInput, MoviePatch, YEAR_RANGE};
pub use page::{Page, PAGE_SIZE};
pub use persistence::{
    CsvFile, FlushQueue, FlushStats, FlushWorkerThread, InMemorySink, LoadReport, MovieSink,
    CSV_HEADER,
};
pub use store::MovieStore;
