//! Tracker - the producer-side surface of the engine
//!
//! One method per external operation. Each method serializes on the entity
//! scope it mutates (project subtree, dataset id, uniqueness domain),
//! validates before the first write, and drives the link manager and the
//! rename cascade so the denormalized state stays consistent.

use crate::cascade::Propagator;
use crate::entity::{
    Dataset, DatasetDraft, DatasetPatch, Experiment, ExperimentDraft, ExperimentPatch, ImageChart,
    Iteration, IterationDraft, IterationPatch, Project, ProjectDraft, ProjectPatch,
};
use crate::image;
use crate::link::LinkManager;
use crate::store::{DocumentStore, EntityStore, Kind, MemoryDocumentStore};
use crate::sync::{entity_key, subtree_key, LockRegistry, UNIQUE_DATASET_NAME, UNIQUE_PROJECT_TITLE};
use crate::validate::validate_interactive_charts;
use crate::{Error, Result};
use tracing::{info, warn};
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Experiment metadata tracker over an abstract document store.
///
/// # Example
///
/// ```rust
/// use mltrack_db::entity::{ExperimentDraft, ProjectDraft};
/// use mltrack_db::Tracker;
///
/// # async fn example() -> mltrack_db::Result<()> {
/// let tracker = Tracker::new();
///
/// let project = tracker
///     .create_project(ProjectDraft {
///         title: "churn model".to_string(),
///         description: "weekly retrain".to_string(),
///     })
///     .await?;
///
/// let experiment = tracker
///     .create_experiment(
///         project.id(),
///         ExperimentDraft {
///             name: "baseline".to_string(),
///             description: String::new(),
///         },
///     )
///     .await?;
/// assert_eq!(experiment.project_id(), project.id());
/// # Ok(())
/// # }
/// ```
pub struct Tracker<S = MemoryDocumentStore> {
    store: EntityStore<S>,
    locks: LockRegistry,
}

impl Tracker<MemoryDocumentStore> {
    /// Create a tracker over a fresh in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(MemoryDocumentStore::new())
    }

    /// Create a tracker builder.
    #[must_use]
    pub fn builder() -> TrackerBuilder {
        TrackerBuilder::default()
    }
}

impl Default for Tracker<MemoryDocumentStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: DocumentStore> Tracker<S> {
    /// Create a tracker over a custom store backend.
    #[must_use]
    pub fn with_store(backend: S) -> Self {
        Self {
            store: EntityStore::new(backend),
            locks: LockRegistry::new(),
        }
    }

    /// Access the entity store facade (read paths for transports).
    #[must_use]
    pub const fn store(&self) -> &EntityStore<S> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    /// Create a project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] if the title is taken.
    pub async fn create_project(&self, draft: ProjectDraft) -> Result<Project> {
        let _unique = self.locks.lock(UNIQUE_PROJECT_TITLE).await;

        if self
            .store
            .try_get_by_unique_field::<Project>("title", &draft.title)
            .await?
            .is_some()
        {
            return Err(Error::DuplicateName {
                kind: Kind::Project,
                name: draft.title,
            });
        }

        let project = Project::new(new_id(), draft.title, draft.description);
        self.store.create(&project).await?;
        info!(project_id = project.id(), title = project.title(), "created project");
        Ok(project)
    }

    /// Get a project by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such project exists.
    pub async fn project(&self, id: &str) -> Result<Project> {
        self.store.get(id).await
    }

    /// Get a project by its unique title.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameNotFound`] if no project carries the title.
    pub async fn project_by_title(&self, title: &str) -> Result<Project> {
        self.store.get_by_unique_field("title", title).await
    }

    /// List all projects.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.store.list_all().await
    }

    /// Apply a patch to a project.
    ///
    /// A title change refreshes `project_title` on every descendant
    /// iteration before the call returns; if that cascade fails the
    /// previous title is restored and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id and
    /// [`Error::DuplicateName`] if the new title is taken.
    pub async fn update_project(&self, id: &str, patch: ProjectPatch) -> Result<Project> {
        let _guards = self
            .locks
            .lock_many(vec![UNIQUE_PROJECT_TITLE.to_string(), subtree_key(id)])
            .await;

        let mut project: Project = self.store.get(id).await?;
        let previous = project.clone();

        let mut renamed = false;
        if let Some(title) = patch.title {
            if title != project.title() {
                if self
                    .store
                    .try_get_by_unique_field::<Project>("title", &title)
                    .await?
                    .is_some()
                {
                    return Err(Error::DuplicateName {
                        kind: Kind::Project,
                        name: title,
                    });
                }
                project.rename(title);
                renamed = true;
            }
        }
        if let Some(description) = patch.description {
            project.set_description(description);
        }

        self.store.update(&project).await?;

        if renamed {
            if let Err(err) = Propagator::new(&self.store)
                .project_renamed(id, project.title())
                .await
            {
                warn!(project_id = id, error = %err, "title cascade failed, restoring previous title");
                if let Err(rollback) = self.store.update(&previous).await {
                    warn!(project_id = id, error = %rollback, "rollback write failed");
                }
                return Err(err);
            }
            info!(project_id = id, title = project.title(), "renamed project");
        }
        Ok(project)
    }

    /// Delete a project, cascading to its experiments and their iterations
    /// and unlinking any referenced datasets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub async fn delete_project(&self, id: &str) -> Result<()> {
        let _subtree = self.locks.lock(&subtree_key(id)).await;

        let project: Project = self.store.get(id).await?;
        let experiments: Vec<Experiment> = self.store.list_children("project_id", id).await?;
        for experiment in &experiments {
            self.delete_iterations_under(experiment.id()).await?;
            self.store.delete::<Experiment>(experiment.id()).await?;
        }
        self.store.delete::<Project>(id).await?;
        info!(
            project_id = id,
            title = project.title(),
            experiments = experiments.len(),
            "deleted project"
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Experiments
    // ------------------------------------------------------------------

    /// Create an experiment under a project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown project and
    /// [`Error::DuplicateName`] if the name is taken within it.
    pub async fn create_experiment(
        &self,
        project_id: &str,
        draft: ExperimentDraft,
    ) -> Result<Experiment> {
        let _subtree = self.locks.lock(&subtree_key(project_id)).await;

        self.store.get::<Project>(project_id).await?;
        let siblings: Vec<Experiment> = self.store.list_children("project_id", project_id).await?;
        if siblings.iter().any(|e| e.name() == draft.name) {
            return Err(Error::DuplicateName {
                kind: Kind::Experiment,
                name: draft.name,
            });
        }

        let experiment = Experiment::new(new_id(), project_id, draft.name, draft.description);
        self.store.create(&experiment).await?;
        info!(
            experiment_id = experiment.id(),
            project_id,
            name = experiment.name(),
            "created experiment"
        );
        Ok(experiment)
    }

    /// Get an experiment by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such experiment exists.
    pub async fn experiment(&self, id: &str) -> Result<Experiment> {
        self.store.get(id).await
    }

    /// Get an experiment by name within a project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameNotFound`] if the project has no experiment
    /// with that name.
    pub async fn experiment_by_name(&self, project_id: &str, name: &str) -> Result<Experiment> {
        let experiments: Vec<Experiment> =
            self.store.list_children("project_id", project_id).await?;
        experiments
            .into_iter()
            .find(|e| e.name() == name)
            .ok_or_else(|| Error::NameNotFound {
                kind: Kind::Experiment,
                name: name.to_string(),
            })
    }

    /// List the experiments of a project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown project.
    pub async fn list_experiments(&self, project_id: &str) -> Result<Vec<Experiment>> {
        self.store.get::<Project>(project_id).await?;
        self.store.list_children("project_id", project_id).await
    }

    /// Apply a patch to an experiment.
    ///
    /// A name change refreshes `experiment_name` on every child iteration
    /// before the call returns; if that cascade fails the previous name is
    /// restored and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id and
    /// [`Error::DuplicateName`] if the new name is taken within the
    /// project.
    pub async fn update_experiment(&self, id: &str, patch: ExperimentPatch) -> Result<Experiment> {
        let probe: Experiment = self.store.get(id).await?;
        let project_id = probe.project_id().to_string();
        let _subtree = self.locks.lock(&subtree_key(&project_id)).await;

        let mut experiment: Experiment = self.store.get(id).await?;
        let previous = experiment.clone();

        let mut renamed = false;
        if let Some(name) = patch.name {
            if name != experiment.name() {
                let siblings: Vec<Experiment> =
                    self.store.list_children("project_id", &project_id).await?;
                if siblings.iter().any(|e| e.id() != id && e.name() == name) {
                    return Err(Error::DuplicateName {
                        kind: Kind::Experiment,
                        name,
                    });
                }
                experiment.rename(name);
                renamed = true;
            }
        }
        if let Some(description) = patch.description {
            experiment.set_description(description);
        }

        self.store.update(&experiment).await?;

        if renamed {
            if let Err(err) = Propagator::new(&self.store)
                .experiment_renamed(id, experiment.name())
                .await
            {
                warn!(experiment_id = id, error = %err, "name cascade failed, restoring previous name");
                if let Err(rollback) = self.store.update(&previous).await {
                    warn!(experiment_id = id, error = %rollback, "rollback write failed");
                }
                return Err(err);
            }
            info!(experiment_id = id, name = experiment.name(), "renamed experiment");
        }
        Ok(experiment)
    }

    /// Delete an experiment, cascading to its iterations and unlinking any
    /// referenced datasets.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub async fn delete_experiment(&self, id: &str) -> Result<()> {
        let probe: Experiment = self.store.get(id).await?;
        let _subtree = self.locks.lock(&subtree_key(probe.project_id())).await;

        self.store.get::<Experiment>(id).await?;
        let removed = self.delete_iterations_under(id).await?;
        self.store.delete::<Experiment>(id).await?;
        info!(experiment_id = id, iterations = removed, "deleted experiment");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Iterations
    // ------------------------------------------------------------------

    /// Create an iteration under an experiment.
    ///
    /// Chart validation and image reads run before the first write, so a
    /// rejected draft leaves no partial state. With a dataset reference,
    /// the dataset is snapshotted into the iteration and the backlink entry
    /// is recorded.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad charts, [`Error::NotFound`] for
    /// an unknown experiment or dataset, and
    /// [`Error::ImageSourceMissing`] for a missing image path.
    pub async fn create_iteration(
        &self,
        experiment_id: &str,
        draft: IterationDraft,
    ) -> Result<Iteration> {
        validate_interactive_charts(&draft.interactive_charts)?;

        let IterationDraft {
            iteration_name,
            metrics,
            parameters,
            model_name,
            path_to_model,
            dataset,
            interactive_charts,
            image_charts: image_drafts,
        } = draft;

        let probe: Experiment = self.store.get(experiment_id).await?;
        let _subtree = self.locks.lock(&subtree_key(probe.project_id())).await;

        let experiment: Experiment = self.store.get(experiment_id).await?;
        let project: Project = self.store.get(experiment.project_id()).await?;

        let mut image_charts = Vec::with_capacity(image_drafts.len());
        for chart in &image_drafts {
            let bytes = image::read_source(&chart.image_path).await?;
            image_charts.push(ImageChart {
                name: chart.name.clone(),
                encoded_image: image::to_persisted_form(&bytes),
            });
        }

        let id = new_id();
        let mut builder = Iteration::builder(id.as_str(), experiment_id, iteration_name.as_str())
            .cached_names(project.title(), experiment.name())
            .metrics(metrics)
            .parameters(parameters)
            .model_name(model_name)
            .interactive_charts(interactive_charts)
            .image_charts(image_charts);
        if let Some(path) = path_to_model {
            builder = builder.path_to_model(path);
        }

        let iteration = if let Some(reference) = dataset {
            let _dataset = self
                .locks
                .lock(&entity_key(Kind::Dataset, &reference.id))
                .await;
            let snapshot = LinkManager::new(&self.store)
                .attach(&reference, &id, &iteration_name)
                .await?;
            builder.dataset(snapshot).build()
        } else {
            builder.build()
        };

        self.store.create(&iteration).await?;
        info!(iteration_id = %id, experiment_id, "created iteration");
        Ok(iteration)
    }

    /// Get an iteration by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such iteration exists.
    pub async fn iteration(&self, id: &str) -> Result<Iteration> {
        self.store.get(id).await
    }

    /// List the iterations of an experiment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown experiment.
    pub async fn list_iterations(&self, experiment_id: &str) -> Result<Vec<Iteration>> {
        self.store.get::<Experiment>(experiment_id).await?;
        self.store.list_children("experiment_id", experiment_id).await
    }

    /// List the iterations of an experiment carrying a given name.
    ///
    /// Iteration names are not unique, so this returns every match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown experiment.
    pub async fn iterations_by_name(
        &self,
        experiment_id: &str,
        name: &str,
    ) -> Result<Vec<Iteration>> {
        Ok(self
            .list_iterations(experiment_id)
            .await?
            .into_iter()
            .filter(|i| i.iteration_name() == name)
            .collect())
    }

    /// Apply a patch to an iteration.
    ///
    /// A rename also refreshes the cached name inside the linked dataset's
    /// reverse index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub async fn update_iteration(&self, id: &str, patch: IterationPatch) -> Result<Iteration> {
        let probe: Iteration = self.store.get(id).await?;
        let parent: Experiment = self.store.get(probe.experiment_id()).await?;
        let _subtree = self.locks.lock(&subtree_key(parent.project_id())).await;

        let mut iteration: Iteration = self.store.get(id).await?;

        let mut renamed = false;
        if let Some(name) = patch.iteration_name {
            if name != iteration.iteration_name() {
                iteration.set_iteration_name(name);
                renamed = true;
            }
        }
        if let Some(metrics) = patch.metrics {
            iteration.set_metrics(metrics);
        }
        if let Some(parameters) = patch.parameters {
            iteration.set_parameters(parameters);
        }
        if let Some(model_name) = patch.model_name {
            iteration.set_model_name(model_name);
        }
        if let Some(path) = patch.path_to_model {
            iteration.set_path_to_model(path);
        }

        if renamed {
            if let Some(snapshot) = iteration.dataset() {
                let _dataset = self
                    .locks
                    .lock(&entity_key(Kind::Dataset, &snapshot.id))
                    .await;
                LinkManager::new(&self.store).refresh_name(&iteration).await?;
            }
        }

        self.store.update(&iteration).await?;
        info!(iteration_id = id, "updated iteration");
        Ok(iteration)
    }

    /// Delete an iteration, removing its backlink entry from the linked
    /// dataset if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub async fn delete_iteration(&self, id: &str) -> Result<()> {
        let probe: Iteration = self.store.get(id).await?;
        let parent: Experiment = self.store.get(probe.experiment_id()).await?;
        let _subtree = self.locks.lock(&subtree_key(parent.project_id())).await;

        let iteration: Iteration = self.store.get(id).await?;
        if let Some(snapshot) = iteration.dataset() {
            let _dataset = self
                .locks
                .lock(&entity_key(Kind::Dataset, &snapshot.id))
                .await;
            LinkManager::new(&self.store).detach(&iteration).await?;
        }
        self.store.delete::<Iteration>(id).await?;
        info!(iteration_id = id, "deleted iteration");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Datasets
    // ------------------------------------------------------------------

    /// Create a dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] if the dataset name is taken.
    pub async fn create_dataset(&self, draft: DatasetDraft) -> Result<Dataset> {
        let _unique = self.locks.lock(UNIQUE_DATASET_NAME).await;

        if self
            .store
            .try_get_by_unique_field::<Dataset>("dataset_name", &draft.dataset_name)
            .await?
            .is_some()
        {
            return Err(Error::DuplicateName {
                kind: Kind::Dataset,
                name: draft.dataset_name,
            });
        }

        let dataset = Dataset::new(new_id(), draft);
        self.store.create(&dataset).await?;
        info!(dataset_id = dataset.id(), name = dataset.dataset_name(), "created dataset");
        Ok(dataset)
    }

    /// Get a dataset by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such dataset exists.
    pub async fn dataset(&self, id: &str) -> Result<Dataset> {
        self.store.get(id).await
    }

    /// Get a dataset by its unique name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NameNotFound`] if no dataset carries the name.
    pub async fn dataset_by_name(&self, name: &str) -> Result<Dataset> {
        self.store.get_by_unique_field("dataset_name", name).await
    }

    /// List all datasets.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn list_datasets(&self) -> Result<Vec<Dataset>> {
        self.store.list_all().await
    }

    /// Apply a patch to a dataset.
    ///
    /// A rename or re-version leaves snapshots embedded in existing
    /// iterations untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id and
    /// [`Error::DuplicateName`] if the new name is taken.
    pub async fn update_dataset(&self, id: &str, patch: DatasetPatch) -> Result<Dataset> {
        let _guards = self
            .locks
            .lock_many(vec![
                UNIQUE_DATASET_NAME.to_string(),
                entity_key(Kind::Dataset, id),
            ])
            .await;

        let mut dataset: Dataset = self.store.get(id).await?;

        if let Some(name) = patch.dataset_name {
            if name != dataset.dataset_name() {
                if self
                    .store
                    .try_get_by_unique_field::<Dataset>("dataset_name", &name)
                    .await?
                    .is_some()
                {
                    return Err(Error::DuplicateName {
                        kind: Kind::Dataset,
                        name,
                    });
                }
                dataset.rename(name);
            }
        }
        if let Some(description) = patch.description {
            dataset.set_description(description);
        }
        if let Some(tags) = patch.tags {
            dataset.set_tags(tags);
        }
        if let Some(archived) = patch.archived {
            dataset.set_archived(archived);
        }
        if let Some(version) = patch.version {
            dataset.set_version(version);
        }
        if let Some(path) = patch.path_to_dataset {
            dataset.set_path_to_dataset(path);
        }

        self.store.update(&dataset).await?;
        info!(dataset_id = id, "updated dataset");
        Ok(dataset)
    }

    /// Delete a dataset.
    ///
    /// Refused while iterations still link to it; delete those iterations
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id and
    /// [`Error::DatasetInUse`] while the backlink set is non-empty.
    pub async fn delete_dataset(&self, id: &str) -> Result<()> {
        let _dataset = self.locks.lock(&entity_key(Kind::Dataset, id)).await;

        let dataset: Dataset = self.store.get(id).await?;
        let linked = dataset.linked_iterations().len();
        if linked > 0 {
            return Err(Error::DatasetInUse {
                id: id.to_string(),
                linked,
            });
        }
        self.store.delete::<Dataset>(id).await?;
        info!(dataset_id = id, "deleted dataset");
        Ok(())
    }

    // Unlinks every iteration of one experiment from its dataset, then
    // deletes the iterations. Caller holds the subtree lock.
    async fn delete_iterations_under(&self, experiment_id: &str) -> Result<usize> {
        let iterations: Vec<Iteration> = self
            .store
            .list_children("experiment_id", experiment_id)
            .await?;
        let links = LinkManager::new(&self.store);
        for iteration in &iterations {
            if let Some(snapshot) = iteration.dataset() {
                let _dataset = self
                    .locks
                    .lock(&entity_key(Kind::Dataset, &snapshot.id))
                    .await;
                links.detach(iteration).await?;
            }
            self.store.delete::<Iteration>(iteration.id()).await?;
        }
        Ok(iterations.len())
    }
}

/// Builder for a [`Tracker`] over the in-memory backend.
#[derive(Debug, Default)]
pub struct TrackerBuilder {
    capacity: Option<usize>,
}

impl TrackerBuilder {
    /// Pre-allocate document capacity in the in-memory backend.
    #[must_use]
    pub const fn capacity(mut self, documents: usize) -> Self {
        self.capacity = Some(documents);
        self
    }

    /// Build the tracker.
    #[must_use]
    pub fn build(self) -> Tracker<MemoryDocumentStore> {
        let backend = match self.capacity {
            Some(capacity) => MemoryDocumentStore::with_capacity(capacity),
            None => MemoryDocumentStore::new(),
        };
        Tracker::with_store(backend)
    }
}
