//! Snapshot fetch boundary towards the document store.
//!
//! # Responsibility
//! - Define the injected `SnapshotFetcher` capability consumed by services.
//! - Provide a SQLite-backed document store implementing it.
//!
//! # Invariants
//! - A fetch returns one complete collection or an error, never a partial list.
//! - Fetch errors are transport-scoped; shape problems are left to `normalize`.

use crate::db::DbError;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod store;

pub use store::{ImportReport, SqliteDocumentStore};

pub type FetchResult<T> = Result<T, FetchError>;

/// Document-store access errors.
#[derive(Debug)]
pub enum FetchError {
    /// Remote or transport failure reported by a fetcher implementation.
    Transport(String),
    Db(DbError),
    /// Collection name is blank or contains unsupported characters.
    InvalidCollection(String),
    /// Written document is not a JSON object.
    InvalidDocument(String),
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "snapshot transport failed: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidCollection(value) => write!(f, "collection name is invalid: `{value}`"),
            Self::InvalidDocument(message) => write!(f, "invalid document: {message}"),
        }
    }
}

impl Error for FetchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for FetchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for FetchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Capability returning one raw collection snapshot.
pub trait SnapshotFetcher {
    fn fetch_collection(&self, collection: &str) -> FetchResult<Vec<Value>>;
}

impl<T: SnapshotFetcher + ?Sized> SnapshotFetcher for &T {
    fn fetch_collection(&self, collection: &str) -> FetchResult<Vec<Value>> {
        (**self).fetch_collection(collection)
    }
}

impl<T: SnapshotFetcher + ?Sized> SnapshotFetcher for Arc<T> {
    fn fetch_collection(&self, collection: &str) -> FetchResult<Vec<Value>> {
        (**self).fetch_collection(collection)
    }
}

/// Validates and trims a collection name.
///
/// Accepted characters: ASCII lowercase, digits, `_` and `-`.
pub fn normalize_collection_name(value: &str) -> FetchResult<&str> {
    let trimmed = value.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(trimmed)
    } else {
        Err(FetchError::InvalidCollection(value.to_string()))
    }
}
