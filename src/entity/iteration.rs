//! Iteration Record - a single tracked training run

use super::chart::{ImageChart, ImageChartDraft, InteractiveChart};
use super::dataset::DatasetSnapshot;
use crate::store::{Entity, Kind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Iteration represents one training run under an experiment.
///
/// Exclusively owned by its experiment. Carries two denormalized caches,
/// `project_title` and `experiment_name`, which the engine keeps equal to
/// the current ancestor names via the rename cascade, and an optional
/// dataset snapshot frozen at creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Iteration {
    id: String,
    experiment_id: String,
    iteration_name: String,
    metrics: HashMap<String, f64>,
    parameters: HashMap<String, Value>,
    model_name: String,
    path_to_model: Option<String>,
    dataset: Option<DatasetSnapshot>,
    interactive_charts: Vec<InteractiveChart>,
    image_charts: Vec<ImageChart>,
    project_title: String,
    experiment_name: String,
    created_at: DateTime<Utc>,
}

impl Iteration {
    /// Create a builder for constructing an iteration record.
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        experiment_id: impl Into<String>,
        iteration_name: impl Into<String>,
    ) -> IterationBuilder {
        IterationBuilder::new(id, experiment_id, iteration_name)
    }

    /// Get the iteration ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the parent experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the iteration name.
    #[must_use]
    pub fn iteration_name(&self) -> &str {
        &self.iteration_name
    }

    /// Get the logged metrics (`name → value`).
    #[must_use]
    pub const fn metrics(&self) -> &HashMap<String, f64> {
        &self.metrics
    }

    /// Get the logged parameters (`name → value`).
    #[must_use]
    pub const fn parameters(&self) -> &HashMap<String, Value> {
        &self.parameters
    }

    /// Get the model name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Get the stored model path, if any.
    #[must_use]
    pub fn path_to_model(&self) -> Option<&str> {
        self.path_to_model.as_deref()
    }

    /// Get the dataset snapshot frozen at creation time, if any.
    #[must_use]
    pub const fn dataset(&self) -> Option<&DatasetSnapshot> {
        self.dataset.as_ref()
    }

    /// Get the interactive charts, in input order.
    #[must_use]
    pub fn interactive_charts(&self) -> &[InteractiveChart] {
        &self.interactive_charts
    }

    /// Get the image charts, in input order.
    #[must_use]
    pub fn image_charts(&self) -> &[ImageChart] {
        &self.image_charts
    }

    /// Cached title of the ancestor project.
    #[must_use]
    pub fn project_title(&self) -> &str {
        &self.project_title
    }

    /// Cached name of the parent experiment.
    #[must_use]
    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Rename the iteration.
    ///
    /// The cached name inside the linked dataset's reverse index is
    /// refreshed by the link manager, not here.
    pub fn set_iteration_name(&mut self, name: impl Into<String>) {
        self.iteration_name = name.into();
    }

    /// Replace the metrics map.
    pub fn set_metrics(&mut self, metrics: HashMap<String, f64>) {
        self.metrics = metrics;
    }

    /// Replace the parameters map.
    pub fn set_parameters(&mut self, parameters: HashMap<String, Value>) {
        self.parameters = parameters;
    }

    /// Replace the model name.
    pub fn set_model_name(&mut self, model_name: impl Into<String>) {
        self.model_name = model_name.into();
    }

    /// Replace the stored model path.
    pub fn set_path_to_model(&mut self, path: impl Into<String>) {
        self.path_to_model = Some(path.into());
    }

    /// Refresh the cached project title (rename cascade only).
    pub fn set_project_title(&mut self, title: impl Into<String>) {
        self.project_title = title.into();
    }

    /// Refresh the cached experiment name (rename cascade only).
    pub fn set_experiment_name(&mut self, name: impl Into<String>) {
        self.experiment_name = name.into();
    }
}

impl Entity for Iteration {
    const KIND: Kind = Kind::Iteration;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Builder for `Iteration`.
#[derive(Debug)]
pub struct IterationBuilder {
    id: String,
    experiment_id: String,
    iteration_name: String,
    metrics: HashMap<String, f64>,
    parameters: HashMap<String, Value>,
    model_name: String,
    path_to_model: Option<String>,
    dataset: Option<DatasetSnapshot>,
    interactive_charts: Vec<InteractiveChart>,
    image_charts: Vec<ImageChart>,
    project_title: String,
    experiment_name: String,
}

impl IterationBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        experiment_id: impl Into<String>,
        iteration_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            experiment_id: experiment_id.into(),
            iteration_name: iteration_name.into(),
            metrics: HashMap::new(),
            parameters: HashMap::new(),
            model_name: String::new(),
            path_to_model: None,
            dataset: None,
            interactive_charts: Vec::new(),
            image_charts: Vec::new(),
            project_title: String::new(),
            experiment_name: String::new(),
        }
    }

    /// Set the metrics map.
    #[must_use]
    pub fn metrics(mut self, metrics: HashMap<String, f64>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Set the parameters map.
    #[must_use]
    pub fn parameters(mut self, parameters: HashMap<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the model name.
    #[must_use]
    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Set the stored model path.
    #[must_use]
    pub fn path_to_model(mut self, path: impl Into<String>) -> Self {
        self.path_to_model = Some(path.into());
        self
    }

    /// Embed a dataset snapshot.
    #[must_use]
    pub fn dataset(mut self, snapshot: DatasetSnapshot) -> Self {
        self.dataset = Some(snapshot);
        self
    }

    /// Set the interactive charts.
    #[must_use]
    pub fn interactive_charts(mut self, charts: Vec<InteractiveChart>) -> Self {
        self.interactive_charts = charts;
        self
    }

    /// Set the image charts.
    #[must_use]
    pub fn image_charts(mut self, charts: Vec<ImageChart>) -> Self {
        self.image_charts = charts;
        self
    }

    /// Seed the cached ancestor names.
    #[must_use]
    pub fn cached_names(
        mut self,
        project_title: impl Into<String>,
        experiment_name: impl Into<String>,
    ) -> Self {
        self.project_title = project_title.into();
        self.experiment_name = experiment_name.into();
        self
    }

    /// Build the `Iteration` with the current timestamp.
    #[must_use]
    pub fn build(self) -> Iteration {
        Iteration {
            id: self.id,
            experiment_id: self.experiment_id,
            iteration_name: self.iteration_name,
            metrics: self.metrics,
            parameters: self.parameters,
            model_name: self.model_name,
            path_to_model: self.path_to_model,
            dataset: self.dataset,
            interactive_charts: self.interactive_charts,
            image_charts: self.image_charts,
            project_title: self.project_title,
            experiment_name: self.experiment_name,
            created_at: Utc::now(),
        }
    }
}

/// Reference to a dataset inside an iteration draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReference {
    /// Id of the dataset to link and snapshot.
    pub id: String,
}

/// Input for creating an iteration under an experiment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IterationDraft {
    /// Iteration name (not unique; lookups by name return every match).
    pub iteration_name: String,
    /// Logged metrics.
    #[serde(default)]
    pub metrics: HashMap<String, f64>,
    /// Logged parameters.
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
    /// Model name.
    #[serde(default)]
    pub model_name: String,
    /// Stored model path.
    #[serde(default)]
    pub path_to_model: Option<String>,
    /// Dataset to link; snapshotted at creation time.
    #[serde(default)]
    pub dataset: Option<DatasetReference>,
    /// Interactive charts, validated before any write.
    #[serde(default)]
    pub interactive_charts: Vec<InteractiveChart>,
    /// Image charts; source paths are read and encoded before any write.
    #[serde(default)]
    pub image_charts: Vec<ImageChartDraft>,
}

/// Partial update for an iteration. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IterationPatch {
    /// New iteration name; also refreshed inside the linked dataset's
    /// reverse index.
    pub iteration_name: Option<String>,
    /// Replacement metrics map.
    pub metrics: Option<HashMap<String, f64>>,
    /// Replacement parameters map.
    pub parameters: Option<HashMap<String, Value>>,
    /// New model name.
    pub model_name: Option<String>,
    /// New stored model path.
    pub path_to_model: Option<String>,
}
