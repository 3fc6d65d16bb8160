//! Per-key mutual exclusion for entity scopes
//!
//! Mutating operations serialize on string keys: one per entity subtree
//! (project id for anything inside that tree, dataset id for backlink
//! writes) and one per global uniqueness domain. Acquisition follows a
//! fixed hierarchy - uniqueness domains and project subtrees first, dataset
//! keys last - and [`LockRegistry::lock_many`] sorts within a level, so two
//! operations over overlapping scopes cannot deadlock.

use crate::store::Kind;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock key for the global project-title uniqueness domain.
pub const UNIQUE_PROJECT_TITLE: &str = "unique/project-title";

/// Lock key for the global dataset-name uniqueness domain.
pub const UNIQUE_DATASET_NAME: &str = "unique/dataset-name";

/// Lock key scoping all mutations inside one project's subtree.
#[must_use]
pub fn subtree_key(project_id: &str) -> String {
    entity_key(Kind::Project, project_id)
}

/// Lock key for one entity id.
#[must_use]
pub fn entity_key(kind: Kind, id: &str) -> String {
    format!("{kind}/{id}")
}

/// Registry of per-key async mutexes.
///
/// Keys are created on first use and kept for the registry's lifetime; the
/// key space is bounded by the number of live entities.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the mutex for one key, waiting if another task holds it.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let cell = self.locks.entry(key.to_string()).or_default().clone();
        cell.lock_owned().await
    }

    /// Acquire several keys of the same hierarchy level.
    ///
    /// Keys are deduplicated and acquired in sorted order; every caller
    /// passing overlapping sets therefore acquires them in the same order.
    pub async fn lock_many(&self, mut keys: Vec<String>) -> Vec<OwnedMutexGuard<()>> {
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            guards.push(self.lock(key).await);
        }
        guards
    }
}
