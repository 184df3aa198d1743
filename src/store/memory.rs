//! In-memory record store for tests: same contract as the real store,
//! including revision tokens and injectable write failures.

use super::{RecordStore, StoreError, StoredDocument};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

fn revision_of(body: &serde_json::Value) -> String {
    let canonical = body.to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

/// A change-log line: path and the change description it was written with.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeLogEntry {
    pub path: String,
    pub description: String,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, StoredDocument>>,
    changes: Mutex<Vec<ChangeLogEntry>>,
    failing_paths: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document, builder style.
    pub fn with_document<T: serde::Serialize>(self, path: &str, value: &T) -> Self {
        let body = serde_json::to_value(value).expect("seed document serializes");
        let revision = revision_of(&body);
        self.docs
            .lock()
            .unwrap()
            .insert(path.to_string(), StoredDocument { body, revision });
        self
    }

    /// Make every write to a path fail until cleared, for partial-commit
    /// retry tests.
    pub fn fail_writes_to(&self, path: &str) {
        self.failing_paths.lock().unwrap().insert(path.to_string());
    }

    pub fn clear_write_failures(&self) {
        self.failing_paths.lock().unwrap().clear();
    }

    /// Change descriptions recorded so far, oldest first.
    pub fn change_log(&self) -> Vec<ChangeLogEntry> {
        self.changes.lock().unwrap().clone()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.docs.lock().unwrap().contains_key(path)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<Option<StoredDocument>, StoreError> {
        Ok(self.docs.lock().unwrap().get(path).cloned())
    }

    async fn write(
        &self,
        path: &str,
        body: serde_json::Value,
        change_description: &str,
        expected_revision: Option<&str>,
    ) -> Result<String, StoreError> {
        if self.failing_paths.lock().unwrap().contains(path) {
            return Err(StoreError::NetworkError(format!(
                "injected failure writing {path}"
            )));
        }
        let mut docs = self.docs.lock().unwrap();
        if let Some(expected) = expected_revision {
            let current = docs.get(path).map(|d| d.revision.as_str());
            if current != Some(expected) {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                });
            }
        }
        let revision = revision_of(&body);
        docs.insert(
            path.to_string(),
            StoredDocument {
                body,
                revision: revision.clone(),
            },
        );
        self.changes.lock().unwrap().push(ChangeLogEntry {
            path: path.to_string(),
            description: change_description.to_string(),
        });
        Ok(revision)
    }

    async fn delete(&self, path: &str, change_description: &str) -> Result<(), StoreError> {
        self.docs.lock().unwrap().remove(path);
        self.changes.lock().unwrap().push(ChangeLogEntry {
            path: path.to_string(),
            description: change_description.to_string(),
        });
        Ok(())
    }
}
