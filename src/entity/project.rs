//! Project Record - root entity of the tracking tree

use crate::store::{Entity, Kind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project represents one tracked ML effort.
///
/// This is the root entity of the tracking tree. Each project owns
/// experiments by reference (`Experiment::project_id`). The title is unique
/// across all projects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    id: String,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project record with the current timestamp.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Get the project ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the project title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Get the project description.
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

    /// Rename the project.
    ///
    /// Cached `project_title` fields on descendant iterations are refreshed
    /// by the rename cascade, not here.
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.updated_at = Utc::now();
    }

    /// Replace the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.updated_at = Utc::now();
    }
}

impl Entity for Project {
    const KIND: Kind = Kind::Project;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Input for creating a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDraft {
    /// Globally unique title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// Partial update for a project. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectPatch {
    /// New title; must stay globally unique.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_new() {
        let project = Project::new("p-1", "Test project", "Test project description");
        assert_eq!(project.id(), "p-1");
        assert_eq!(project.title(), "Test project");
        assert_eq!(project.created_at(), project.updated_at());
    }

    #[test]
    fn test_project_rename_touches_updated_at() {
        let mut project = Project::new("p-1", "old", "");
        project.rename("new");
        assert_eq!(project.title(), "new");
        assert!(project.updated_at() >= project.created_at());
    }
}
