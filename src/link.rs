//! Link manager - the Dataset ↔ Iteration backlink set
//!
//! Keeps `Dataset.linked_iterations` consistent with the dataset snapshots
//! carried by iterations: an entry exists for an iteration exactly while
//! that iteration references the dataset. Never deletes the dataset itself
//! and never touches its name or version.

use crate::entity::{Dataset, DatasetReference, DatasetSnapshot, Iteration};
use crate::store::{DocumentStore, EntityStore};
use crate::Result;
use tracing::debug;

/// Maintains the reverse index on datasets.
///
/// Callers hold the dataset's lock key while invoking these methods; the
/// manager itself only reads and writes through the entity store.
pub struct LinkManager<'a, S> {
    store: &'a EntityStore<S>,
}

impl<'a, S: DocumentStore> LinkManager<'a, S> {
    /// Create a manager over the given store facade.
    #[must_use]
    pub fn new(store: &'a EntityStore<S>) -> Self {
        Self { store }
    }

    /// Link a new iteration to the referenced dataset.
    ///
    /// Looks the dataset up by id, records `iteration_id → iteration_name`
    /// in its reverse index, and returns the frozen `{id, name, version}`
    /// snapshot for embedding in the iteration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if the referenced dataset does
    /// not exist; nothing is written in that case.
    pub async fn attach(
        &self,
        reference: &DatasetReference,
        iteration_id: &str,
        iteration_name: &str,
    ) -> Result<DatasetSnapshot> {
        let mut dataset: Dataset = self.store.get(&reference.id).await?;
        let snapshot = dataset.snapshot();

        dataset.link_iteration(iteration_id, iteration_name);
        self.store.update(&dataset).await?;

        debug!(
            dataset_id = %snapshot.id,
            iteration_id,
            "linked iteration to dataset"
        );
        Ok(snapshot)
    }

    /// Remove a deleted iteration from its dataset's reverse index.
    ///
    /// No-op when the iteration carries no snapshot or the dataset has
    /// since been deleted.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store read or write fails.
    pub async fn detach(&self, iteration: &Iteration) -> Result<()> {
        let Some(snapshot) = iteration.dataset() else {
            return Ok(());
        };
        let Some(mut dataset) = self.store.try_get::<Dataset>(&snapshot.id).await? else {
            return Ok(());
        };

        if dataset.unlink_iteration(iteration.id()) {
            self.store.update(&dataset).await?;
            debug!(
                dataset_id = %snapshot.id,
                iteration_id = iteration.id(),
                "unlinked iteration from dataset"
            );
        }
        Ok(())
    }

    /// Refresh the cached iteration name after a rename.
    ///
    /// No-op when the iteration carries no snapshot or the dataset has
    /// since been deleted.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store read or write fails.
    pub async fn refresh_name(&self, iteration: &Iteration) -> Result<()> {
        let Some(snapshot) = iteration.dataset() else {
            return Ok(());
        };
        let Some(mut dataset) = self.store.try_get::<Dataset>(&snapshot.id).await? else {
            return Ok(());
        };

        dataset.link_iteration(iteration.id(), iteration.iteration_name());
        self.store.update(&dataset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{DatasetDraft, Iteration};
    use crate::store::MemoryDocumentStore;
    use crate::Error;

    fn facade() -> EntityStore<MemoryDocumentStore> {
        EntityStore::new(MemoryDocumentStore::new())
    }

    async fn seed_dataset(store: &EntityStore<MemoryDocumentStore>, id: &str) -> Dataset {
        let dataset = Dataset::new(
            id,
            DatasetDraft {
                dataset_name: "DS1".to_string(),
                description: String::new(),
                tags: String::new(),
                archived: false,
                version: None,
                path_to_dataset: String::new(),
            },
        );
        store.create(&dataset).await.unwrap();
        dataset
    }

    #[tokio::test]
    async fn test_attach_snapshots_and_links() {
        let store = facade();
        seed_dataset(&store, "d-1").await;
        let links = LinkManager::new(&store);

        let snapshot = links
            .attach(
                &DatasetReference {
                    id: "d-1".to_string(),
                },
                "i-1",
                "Test iteration",
            )
            .await
            .unwrap();

        assert_eq!(snapshot.name, "DS1");
        assert_eq!(snapshot.version, "0.0.0");

        let dataset: Dataset = store.get("d-1").await.unwrap();
        assert_eq!(
            dataset.linked_iterations().get("i-1").map(String::as_str),
            Some("Test iteration")
        );
    }

    #[tokio::test]
    async fn test_attach_missing_dataset() {
        let store = facade();
        let links = LinkManager::new(&store);

        let err = links
            .attach(
                &DatasetReference {
                    id: "missing".to_string(),
                },
                "i-1",
                "it",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_detach_removes_only_own_entry() {
        let store = facade();
        let dataset = seed_dataset(&store, "d-1").await;
        let links = LinkManager::new(&store);

        let reference = DatasetReference {
            id: "d-1".to_string(),
        };
        let snapshot = links.attach(&reference, "i-1", "one").await.unwrap();
        links.attach(&reference, "i-2", "two").await.unwrap();

        let iteration = Iteration::builder("i-1", "e-1", "one")
            .dataset(snapshot)
            .build();
        links.detach(&iteration).await.unwrap();

        let dataset: Dataset = store.get(dataset.id()).await.unwrap();
        assert!(!dataset.linked_iterations().contains_key("i-1"));
        assert!(dataset.linked_iterations().contains_key("i-2"));
    }

    #[tokio::test]
    async fn test_detach_after_dataset_gone_is_noop() {
        let store = facade();
        let dataset = seed_dataset(&store, "d-1").await;
        let links = LinkManager::new(&store);

        let iteration = Iteration::builder("i-1", "e-1", "one")
            .dataset(dataset.snapshot())
            .build();
        store.delete::<Dataset>("d-1").await.unwrap();

        links.detach(&iteration).await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_name_updates_entry() {
        let store = facade();
        seed_dataset(&store, "d-1").await;
        let links = LinkManager::new(&store);

        let reference = DatasetReference {
            id: "d-1".to_string(),
        };
        let snapshot = links.attach(&reference, "i-1", "old name").await.unwrap();

        let mut iteration = Iteration::builder("i-1", "e-1", "old name")
            .dataset(snapshot)
            .build();
        iteration.set_iteration_name("Changed iteration name");
        links.refresh_name(&iteration).await.unwrap();

        let dataset: Dataset = store.get("d-1").await.unwrap();
        assert_eq!(
            dataset.linked_iterations().get("i-1").map(String::as_str),
            Some("Changed iteration name")
        );
    }
}
