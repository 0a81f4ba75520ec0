use thiserror::Error;

use crate::catalog::CatalogItem;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Fold low-level io/json failures into the storage category.
    pub fn into_storage(self) -> Self {
        match self {
            Error::Io(e) => Error::StorageUnavailable(e.to_string()),
            Error::Json(e) => Error::StorageUnavailable(e.to_string()),
            other => other,
        }
    }
}

/// A resolution that could not complete normally but still has an item to serve.
#[derive(Debug, Error)]
#[error("degraded to fallback dish: {source}")]
pub struct Degraded {
    pub fallback: CatalogItem,
    #[source]
    pub source: Error,
}

pub type Resolution = Result<CatalogItem, Degraded>;
