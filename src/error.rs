//! Error types for the movie store, its persistence and the HTTP surface.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// No movie with this id is in the collection.
    #[error("Movie not found")]
    NotFound(u64),

    /// A request body or field failed validation.
    #[error("invalid movie: {0}")]
    Invalid(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),

    /// The most recent snapshot could not be written.
    #[error("flush failed: {0}")]
    Flush(String),
}

impl CatalogError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::NotFound(_) => 404,
            CatalogError::Invalid(_) => 400,
            CatalogError::Io(_) => 500,
            CatalogError::Csv(_) => 500,
            CatalogError::LockPoisoned(_) => 500,
            CatalogError::Flush(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
