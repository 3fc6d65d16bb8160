//! In-memory document store implementation using `DashMap`.
//!
//! This is the default backend - data is lost on process restart.

use super::{DocumentStore, Kind};
use crate::Result;
use dashmap::DashMap;
use serde_json::Value;

/// In-memory document store using a lock-free concurrent hashmap.
///
/// Thread-safe and optimized for high-concurrency read/write workloads.
/// Uses `DashMap` internally for O(1) average-case id lookups; field lookups
/// scan the kind.
pub struct MemoryDocumentStore {
    documents: DashMap<(Kind, String), Value>,
}

impl MemoryDocumentStore {
    /// Create a new in-memory document store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Create with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            documents: DashMap::with_capacity(capacity),
        }
    }

    /// Get the number of documents in the store, across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Clear all documents.
    pub fn clear(&self) {
        self.documents.clear();
    }

    fn scan(&self, kind: Kind, mut keep: impl FnMut(&Value) -> bool) -> Vec<Value> {
        let mut matches: Vec<Value> = self
            .documents
            .iter()
            .filter(|entry| entry.key().0 == kind && keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        // DashMap iteration order is arbitrary; sort by id for stable output
        matches.sort_by(|a, b| {
            let a = a.get("id").and_then(Value::as_str).unwrap_or_default();
            let b = b.get("id").and_then(Value::as_str).unwrap_or_default();
            a.cmp(b)
        });

        matches
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, kind: Kind, id: &str, document: Value) -> Result<()> {
        self.documents.insert((kind, id.to_string()), document);
        Ok(())
    }

    async fn fetch(&self, kind: Kind, id: &str) -> Result<Option<Value>> {
        Ok(self
            .documents
            .get(&(kind, id.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn remove(&self, kind: Kind, id: &str) -> Result<()> {
        self.documents.remove(&(kind, id.to_string()));
        Ok(())
    }

    async fn find_by_field(&self, kind: Kind, field: &str, value: &Value) -> Result<Option<Value>> {
        Ok(self
            .scan(kind, |doc| doc.get(field) == Some(value))
            .into_iter()
            .next())
    }

    async fn list_by_field(&self, kind: Kind, field: &str, value: &Value) -> Result<Vec<Value>> {
        Ok(self.scan(kind, |doc| doc.get(field) == Some(value)))
    }

    async fn list(&self, kind: Kind) -> Result<Vec<Value>> {
        Ok(self.scan(kind, |_| true))
    }

    // The loop runs in a single poll (no await inside), so a cancelled caller
    // observes either none or all of the batch.
    async fn put_many(&self, kind: Kind, documents: Vec<(String, Value)>) -> Result<()> {
        for (id, document) in documents {
            self.documents.insert((kind, id), document);
        }
        Ok(())
    }
}
