//! Consistency propagator - rename cascades over cached ancestor names
//!
//! `Iteration.project_title` and `Iteration.experiment_name` are
//! materialized caches refreshed synchronously on every rename, not live
//! references resolved on read. The propagator stages every descendant
//! update first (reads only), then applies them through one batch write, so
//! a rename is observable either not at all or in full.

use crate::entity::{Experiment, Iteration};
use crate::store::{DocumentStore, EntityStore};
use crate::Result;
use tracing::debug;

/// Cascades ancestor renames into descendant iterations.
///
/// Callers hold the project subtree's lock key while invoking these
/// methods, which keeps concurrent iteration writes from racing the staged
/// batch.
pub struct Propagator<'a, S> {
    store: &'a EntityStore<S>,
}

impl<'a, S: DocumentStore> Propagator<'a, S> {
    /// Create a propagator over the given store facade.
    #[must_use]
    pub fn new(store: &'a EntityStore<S>) -> Self {
        Self { store }
    }

    /// Refresh `project_title` on every iteration under every experiment of
    /// the project. Returns the number of iterations touched.
    ///
    /// # Errors
    ///
    /// Fails without writing anything if staging reads fail; a batch-write
    /// failure leaves no partial cascade visible.
    pub async fn project_renamed(&self, project_id: &str, new_title: &str) -> Result<usize> {
        let experiments: Vec<Experiment> =
            self.store.list_children("project_id", project_id).await?;

        let mut staged = Vec::new();
        for experiment in &experiments {
            let mut iterations: Vec<Iteration> = self
                .store
                .list_children("experiment_id", experiment.id())
                .await?;
            for iteration in &mut iterations {
                iteration.set_project_title(new_title);
            }
            staged.append(&mut iterations);
        }

        self.store.update_many(&staged).await?;
        debug!(
            project_id,
            iterations = staged.len(),
            "cascaded project title"
        );
        Ok(staged.len())
    }

    /// Refresh `experiment_name` on every iteration under the experiment.
    /// Returns the number of iterations touched.
    ///
    /// # Errors
    ///
    /// Fails without writing anything if staging reads fail; a batch-write
    /// failure leaves no partial cascade visible.
    pub async fn experiment_renamed(&self, experiment_id: &str, new_name: &str) -> Result<usize> {
        let mut staged: Vec<Iteration> = self
            .store
            .list_children("experiment_id", experiment_id)
            .await?;
        for iteration in &mut staged {
            iteration.set_experiment_name(new_name);
        }

        self.store.update_many(&staged).await?;
        debug!(
            experiment_id,
            iterations = staged.len(),
            "cascaded experiment name"
        );
        Ok(staged.len())
    }
}
