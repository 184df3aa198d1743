//! Record store abstraction: a key/value blob store addressed by logical
//! path with optimistic concurrency via revision tokens.
//!
//! Implementations must attribute every write with a human-readable change
//! description for audit purposes. The store offers no transactions;
//! multi-record commits order their writes and stay idempotent on retry.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

pub mod http;
pub mod memory;

pub use http::HttpStore;
pub use memory::MemoryStore;

/// A stored document plus the revision token to pass back on the next
/// write.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub body: serde_json::Value,
    pub revision: String,
}

#[async_trait]
pub trait RecordStore: Send + Sync + fmt::Debug {
    /// Read the document at a path, or None when absent.
    async fn read(&self, path: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// Write a document, returning the new revision token. Passing the
    /// expected revision enables optimistic concurrency; a mismatch is
    /// `StoreError::Conflict`.
    async fn write(
        &self,
        path: &str,
        body: serde_json::Value,
        change_description: &str,
        expected_revision: Option<&str>,
    ) -> Result<String, StoreError>;

    /// Delete the document at a path. Deleting an absent path is not an
    /// error.
    async fn delete(&self, path: &str, change_description: &str) -> Result<(), StoreError>;
}

/// Error type for record store operations. Reported to the caller without
/// mutating any in-memory engine state, so a retry is always safe.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., auth failure, 5xx server error)
    HttpError { status: u16, message: String },
    /// The document changed since the revision the caller read.
    Conflict { path: String },
    /// Parsing error (invalid JSON or malformed response)
    ParseError(String),
    /// Other error
    Other(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            StoreError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            StoreError::Conflict { path } => write!(f, "Revision conflict at {}", path),
            StoreError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            StoreError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Read and deserialize a document.
pub async fn read_typed<T: DeserializeOwned>(
    store: &dyn RecordStore,
    path: &str,
) -> Result<Option<(T, String)>, StoreError> {
    match store.read(path).await? {
        None => Ok(None),
        Some(doc) => {
            let value = serde_json::from_value(doc.body)
                .map_err(|e| StoreError::ParseError(format!("{path}: {e}")))?;
            Ok(Some((value, doc.revision)))
        }
    }
}

/// Serialize and write a document.
pub async fn write_typed<T: Serialize>(
    store: &dyn RecordStore,
    path: &str,
    value: &T,
    change_description: &str,
    expected_revision: Option<&str>,
) -> Result<String, StoreError> {
    let body = serde_json::to_value(value)
        .map_err(|e| StoreError::ParseError(format!("{path}: {e}")))?;
    store
        .write(path, body, change_description, expected_revision)
        .await
}

/// Logical paths for the league's records.
pub mod paths {
    use crate::domain::{MatchId, TeamId};

    pub fn team(id: &TeamId) -> String {
        format!("teams/{id}")
    }

    pub fn fixture(id: &MatchId) -> String {
        format!("fixtures/{id}")
    }

    pub fn live(id: &MatchId) -> String {
        format!("live/{id}")
    }

    pub fn prematch(id: &MatchId) -> String {
        format!("prematch/{id}")
    }

    pub fn report(id: &MatchId) -> String {
        format!("reports/{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NetworkError("connection timeout".to_string());
        assert_eq!(err.to_string(), "Network error: connection timeout");

        let err = StoreError::Conflict {
            path: "teams/t1".to_string(),
        };
        assert_eq!(err.to_string(), "Revision conflict at teams/t1");

        let err = StoreError::HttpError {
            status: 401,
            message: "bad token".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 401: bad token");
    }

    #[test]
    fn test_paths() {
        use crate::domain::{MatchId, TeamId};
        assert_eq!(paths::team(&TeamId::new("t1".to_string())), "teams/t1");
        assert_eq!(paths::live(&MatchId::new("m1".to_string())), "live/m1");
        assert_eq!(paths::report(&MatchId::new("m1".to_string())), "reports/m1");
    }
}
