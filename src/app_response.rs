use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

use crate::store_error::StoreError;

/// JSON envelope returned by every FFI function.
#[derive(Debug, Serialize, Deserialize)]
pub enum AppResponse {
    DuplicateBarcode(String),
    NotFound(String),
    InvalidField(String),
    PersistenceFailure(String),
    DatabaseError(String),
    SerializationError(String),
    BadRequest(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DuplicateBarcode(msg) => write!(f, "Duplicate barcode: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::InvalidField(msg) => write!(f, "Invalid field: {}", msg),
            AppResponse::PersistenceFailure(msg) => write!(f, "Persistence failure: {}", msg),
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl From<StoreError> for AppResponse {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateBarcode(barcode) => AppResponse::DuplicateBarcode(barcode),
            StoreError::NotFound(barcode) => {
                AppResponse::NotFound(format!("No product found with barcode: {}", barcode))
            }
            StoreError::InvalidField(msg) => AppResponse::InvalidField(msg),
            StoreError::PersistenceFailure(msg) => AppResponse::PersistenceFailure(msg),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    /// Serializes `value` into an `Ok` payload.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(json) => AppResponse::Ok(json),
            Err(e) => AppResponse::from(e),
        }
    }
}
