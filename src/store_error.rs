//! Error kinds reported by the product store.

use std::fmt::{Display, Formatter};

use serde_json::Error as SerdeError;

/// Result alias used by every store operation.
pub type StoreResult<T> = Result<T, StoreError>;

/// Local, recoverable failures of a store operation.
///
/// None of these are fatal: the store stays usable after any of them and the
/// in-memory collection always matches the last successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `create` was called with a barcode that is already stored.
    DuplicateBarcode(String),
    /// A mutation or delete referenced a barcode that is not stored.
    NotFound(String),
    /// Empty barcode, or a price/stock that is not a valid non-negative number.
    InvalidField(String),
    /// The durable slot could not be written (or opened).
    PersistenceFailure(String),
}

impl StoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidField(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        StoreError::PersistenceFailure(msg.into())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateBarcode(barcode) => write!(f, "Duplicate barcode: {}", barcode),
            StoreError::NotFound(barcode) => write!(f, "No product with barcode: {}", barcode),
            StoreError::InvalidField(msg) => write!(f, "Invalid field: {}", msg),
            StoreError::PersistenceFailure(msg) => write!(f, "Persistence failure: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<lmdb::Error> for StoreError {
    fn from(err: lmdb::Error) -> Self {
        match err {
            lmdb::Error::MapFull => {
                StoreError::PersistenceFailure("storage map is full".to_string())
            }
            other => StoreError::PersistenceFailure(format!("LMDB error: {}", other)),
        }
    }
}

impl From<SerdeError> for StoreError {
    fn from(err: SerdeError) -> Self {
        StoreError::PersistenceFailure(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::PersistenceFailure(format!("IO error: {}", err))
    }
}
