//! Local persistence layer.
//!
//! `backend` holds the raw key-value stores (in-memory and on-disk),
//! `store` the typed record operations on top of them, and `migrations`
//! the schema envelope plus the upgrade pass run when a store is opened.

pub mod backend;
pub mod migrations;
pub mod store;

pub use backend::*;
pub use store::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupted data under key '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Quota exceeded writing '{key}': {needed} bytes needed, limit is {limit}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Unsupported schema version {found} under key '{key}' (this build reads up to {supported})")]
    UnsupportedVersion {
        key: String,
        found: u32,
        supported: u32,
    },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal lock error")]
    LockPoisoned,
}
