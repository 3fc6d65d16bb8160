//! Experiment Record - grouping of iterations under a project

use crate::store::{Entity, Kind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Experiment groups the iterations of one modelling approach.
///
/// The name is unique within the parent project, not globally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Experiment {
    id: String,
    project_id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Experiment {
    /// Create a new experiment record with the current timestamp.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            project_id: project_id.into(),
            name: name.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the parent project ID.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the experiment description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the last-modified timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Rename the experiment.
    ///
    /// Cached `experiment_name` fields on child iterations are refreshed by
    /// the rename cascade, not here.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Replace the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.updated_at = Utc::now();
    }
}

impl Entity for Experiment {
    const KIND: Kind = Kind::Experiment;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for creating an experiment under a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentDraft {
    /// Name, unique within the parent project.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Partial update for an experiment. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentPatch {
    /// New name; must stay unique within the parent project.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}
