//! Typed entity facade over the abstract document store.

use super::{DocumentStore, Entity};
use crate::{Error, Result};
use serde_json::Value;

/// The one component that talks to the document store.
///
/// Serializes entity records into JSON documents on the way in and
/// deserializes them on the way out, turning missing documents into
/// [`Error::NotFound`] / [`Error::NameNotFound`] where the caller asked for
/// a specific entity.
pub struct EntityStore<S> {
    store: S,
}

impl<S: DocumentStore> EntityStore<S> {
    /// Wrap a document store backend.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying backend.
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.store
    }

    /// Write a newly created entity.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub async fn create<T: Entity>(&self, entity: &T) -> Result<()> {
        self.store
            .put(T::KIND, entity.id(), serde_json::to_value(entity)?)
            .await
    }

    /// Get an entity by id, or `None` if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read or deserialization fails.
    pub async fn try_get<T: Entity>(&self, id: &str) -> Result<Option<T>> {
        match self.store.fetch(T::KIND, id).await? {
            Some(document) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }

    /// Get an entity by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such entity exists.
    pub async fn get<T: Entity>(&self, id: &str) -> Result<T> {
        self.try_get(id).await?.ok_or_else(|| Error::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
    }

    /// Get an entity by a globally unique field value, or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read or deserialization fails.
    pub async fn try_get_by_unique_field<T: Entity>(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<T>> {
        match self
            .store
            .find_by_field(T::KIND, field, &Value::from(value))
            .await?
        {
            Some(document) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }

    /// Get an entity by a globally unique field value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameNotFound`] if no entity carries that value.
    pub async fn get_by_unique_field<T: Entity>(&self, field: &str, value: &str) -> Result<T> {
        self.try_get_by_unique_field(field, value)
            .await?
            .ok_or_else(|| Error::NameNotFound {
                kind: T::KIND,
                name: value.to_string(),
            })
    }

    /// Write back a modified entity.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub async fn update<T: Entity>(&self, entity: &T) -> Result<()> {
        self.store
            .put(T::KIND, entity.id(), serde_json::to_value(entity)?)
            .await
    }

    /// Write back a batch of modified entities as one step.
    ///
    /// Used by the rename cascade so that either every staged entity is
    /// written or none is.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub async fn update_many<T: Entity>(&self, entities: &[T]) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let mut documents = Vec::with_capacity(entities.len());
        for entity in entities {
            documents.push((entity.id().to_string(), serde_json::to_value(entity)?));
        }
        self.store.put_many(T::KIND, documents).await
    }

    /// Delete an entity by id. No-op if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub async fn delete<T: Entity>(&self, id: &str) -> Result<()> {
        self.store.remove(T::KIND, id).await
    }

    /// List entities whose `parent_field` references `parent_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read or deserialization fails.
    pub async fn list_children<T: Entity>(
        &self,
        parent_field: &str,
        parent_id: &str,
    ) -> Result<Vec<T>> {
        let documents = self
            .store
            .list_by_field(T::KIND, parent_field, &Value::from(parent_id))
            .await?;
        documents
            .into_iter()
            .map(|document| serde_json::from_value(document).map_err(Error::from))
            .collect()
    }

    /// List every entity of one kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read or deserialization fails.
    pub async fn list_all<T: Entity>(&self) -> Result<Vec<T>> {
        let documents = self.store.list(T::KIND).await?;
        documents
            .into_iter()
            .map(|document| serde_json::from_value(document).map_err(Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Project;
    use crate::store::MemoryDocumentStore;

    fn facade() -> EntityStore<MemoryDocumentStore> {
        EntityStore::new(MemoryDocumentStore::new())
    }

    fn project(id: &str, title: &str) -> Project {
        Project::new(id, title, "")
    }

    #[tokio::test]
    async fn test_create_get_roundtrip() {
        let store = facade();
        let created = project("p-1", "alpha");

        store.create(&created).await.unwrap();
        let fetched: Project = store.get("p-1").await.unwrap();
        assert_eq!(fetched.title(), "alpha");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = facade();
        let err = store.get::<Project>("missing").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.to_string(), "Project missing not found");
    }

    #[tokio::test]
    async fn test_get_by_unique_field() {
        let store = facade();
        store.create(&project("p-1", "alpha")).await.unwrap();

        let by_title: Project = store.get_by_unique_field("title", "alpha").await.unwrap();
        assert_eq!(by_title.id(), "p-1");

        let err = store
            .get_by_unique_field::<Project>("title", "beta")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NameNotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_is_read_your_writes() {
        let store = facade();
        let mut record = project("p-1", "alpha");
        store.create(&record).await.unwrap();

        record.rename("renamed");
        store.update(&record).await.unwrap();

        let fetched: Project = store.get("p-1").await.unwrap();
        assert_eq!(fetched.title(), "renamed");
    }

    #[tokio::test]
    async fn test_delete_then_try_get() {
        let store = facade();
        store.create(&project("p-1", "alpha")).await.unwrap();

        store.delete::<Project>("p-1").await.unwrap();
        assert!(store.try_get::<Project>("p-1").await.unwrap().is_none());
    }
}
