//! Document store contract and the typed entity facade built on top of it.
//!
//! The abstract contract is a key/value-by-id store with unique-field lookup
//! and parent-scoped listing. Every other component goes through
//! [`EntityStore`]; nothing else touches a [`DocumentStore`] directly.
//!
//! # Example
//!
//! ```rust
//! use mltrack_db::store::{DocumentStore, MemoryDocumentStore, Kind};
//! use serde_json::json;
//!
//! # async fn example() -> mltrack_db::Result<()> {
//! let store = MemoryDocumentStore::new();
//!
//! store.put(Kind::Project, "p-1", json!({"id": "p-1", "title": "churn"})).await?;
//! let doc = store.fetch(Kind::Project, "p-1").await?;
//! assert!(doc.is_some());
//!
//! store.remove(Kind::Project, "p-1").await?;
//! assert!(store.fetch(Kind::Project, "p-1").await?.is_none());
//! # Ok(())
//! # }
//! ```

mod facade;
mod memory;

pub use facade::EntityStore;
pub use memory::MemoryDocumentStore;

use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;

/// Entity kinds known to the store.
///
/// A kind plus an id uniquely addresses one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Root of the tracking tree.
    Project,
    /// Grouping of iterations under a project.
    Experiment,
    /// A single tracked training run.
    Iteration,
    /// Shared dataset, referenced by iterations.
    Dataset,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => write!(f, "Project"),
            Self::Experiment => write!(f, "Experiment"),
            Self::Iteration => write!(f, "Iteration"),
            Self::Dataset => write!(f, "Dataset"),
        }
    }
}

/// Binds a record type to its store kind.
///
/// Implemented by the entity records in [`crate::entity`]; the facade uses it
/// to address and (de)serialize documents without per-type plumbing.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    /// Store kind this entity is filed under.
    const KIND: Kind;

    /// Stable identifier of this entity.
    fn id(&self) -> &str;
}

/// Abstract document store consumed by the facade.
///
/// Documents are JSON values keyed by kind and id. Writes must be visible to
/// subsequent reads issued by the same logical request (read-your-writes).
/// Listing order is unspecified.
pub trait DocumentStore: Send + Sync {
    /// Insert or overwrite a document.
    fn put(&self, kind: Kind, id: &str, document: Value)
        -> impl Future<Output = Result<()>> + Send;

    /// Get a document by id.
    ///
    /// Returns `None` if the document doesn't exist.
    fn fetch(&self, kind: Kind, id: &str) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// Remove a document.
    ///
    /// No-op if the document doesn't exist.
    fn remove(&self, kind: Kind, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Find the first document of `kind` whose top-level `field` equals `value`.
    fn find_by_field(
        &self,
        kind: Kind,
        field: &str,
        value: &Value,
    ) -> impl Future<Output = Result<Option<Value>>> + Send;

    /// List every document of `kind` whose top-level `field` equals `value`.
    fn list_by_field(
        &self,
        kind: Kind,
        field: &str,
        value: &Value,
    ) -> impl Future<Output = Result<Vec<Value>>> + Send;

    /// List every document of `kind`.
    fn list(&self, kind: Kind) -> impl Future<Output = Result<Vec<Value>>> + Send;

    /// Write a batch of documents.
    ///
    /// Backends should apply the whole batch as one step so a cancelled
    /// caller never observes a partially applied batch.
    fn put_many(
        &self,
        kind: Kind,
        documents: Vec<(String, Value)>,
    ) -> impl Future<Output = Result<()>> + Send {
        async move {
            for (id, document) in documents {
                self.put(kind, &id, document).await?;
            }
            Ok(())
        }
    }
}
