//! Dataset Record - shared dataset referenced by iterations

use crate::store::{Entity, Kind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version a dataset starts at when the draft leaves it unset.
pub const INITIAL_DATASET_VERSION: &str = "0.0.0";

/// Dataset represents a shared, versioned data source.
///
/// Its lifetime is independent of any iteration; many iterations may
/// reference one dataset. `linked_iterations` is the reverse index over
/// those references (`iteration id → iteration name`), maintained by the
/// link manager so that deletion cleanup stays O(1) per dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dataset {
    id: String,
    dataset_name: String,
    description: String,
    tags: String,
    archived: bool,
    version: String,
    path_to_dataset: String,
    linked_iterations: HashMap<String, String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Dataset {
    /// Create a new dataset record from a draft.
    ///
    /// A draft without a version starts at [`INITIAL_DATASET_VERSION`].
    #[must_use]
    pub fn new(id: impl Into<String>, draft: DatasetDraft) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            dataset_name: draft.dataset_name,
            description: draft.description,
            tags: draft.tags,
            archived: draft.archived,
            version: draft
                .version
                .unwrap_or_else(|| INITIAL_DATASET_VERSION.to_string()),
            path_to_dataset: draft.path_to_dataset,
            linked_iterations: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Get the dataset ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the globally unique dataset name.
    #[must_use]
    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    /// Get the dataset description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get the comma-separated tags.
    #[must_use]
    pub fn tags(&self) -> &str {
        &self.tags
    }

    /// Whether the dataset is archived.
    #[must_use]
    pub const fn archived(&self) -> bool {
        self.archived
    }

    /// Get the dataset version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get the path or URL the dataset lives at.
    #[must_use]
    pub fn path_to_dataset(&self) -> &str {
        &self.path_to_dataset
    }

    /// Reverse index of referencing iterations (`id → name`).
    #[must_use]
    pub const fn linked_iterations(&self) -> &HashMap<String, String> {
        &self.linked_iterations
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

    /// Immutable `{id, name, version}` copy for embedding in an iteration.
    #[must_use]
    pub fn snapshot(&self) -> DatasetSnapshot {
        DatasetSnapshot {
            id: self.id.clone(),
            name: self.dataset_name.clone(),
            version: self.version.clone(),
        }
    }

    /// Rename the dataset.
    ///
    /// Snapshots already embedded in iterations keep the old name.
    pub fn rename(&mut self, dataset_name: impl Into<String>) {
        self.dataset_name = dataset_name.into();
        self.updated_at = Utc::now();
    }

    /// Replace the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.updated_at = Utc::now();
    }

    /// Replace the tags.
    pub fn set_tags(&mut self, tags: impl Into<String>) {
        self.tags = tags.into();
        self.updated_at = Utc::now();
    }

    /// Set the archived flag.
    pub fn set_archived(&mut self, archived: bool) {
        self.archived = archived;
        self.updated_at = Utc::now();
    }

    /// Replace the version string.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
        self.updated_at = Utc::now();
    }

    /// Replace the dataset path.
    pub fn set_path_to_dataset(&mut self, path: impl Into<String>) {
        self.path_to_dataset = path.into();
        self.updated_at = Utc::now();
    }

    /// Record a referencing iteration in the reverse index.
    pub fn link_iteration(&mut self, iteration_id: impl Into<String>, name: impl Into<String>) {
        self.linked_iterations
            .insert(iteration_id.into(), name.into());
    }

    /// Drop a referencing iteration from the reverse index.
    ///
    /// Returns whether an entry was present.
    pub fn unlink_iteration(&mut self, iteration_id: &str) -> bool {
        self.linked_iterations.remove(iteration_id).is_some()
    }
}

impl Entity for Dataset {
    const KIND: Kind = Kind::Dataset;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Immutable snapshot of a dataset taken when an iteration is created.
///
/// Not kept in sync afterward: renaming or re-versioning the dataset leaves
/// existing snapshots untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    /// Dataset id at snapshot time.
    pub id: String,
    /// Dataset name at snapshot time.
    pub name: String,
    /// Dataset version at snapshot time.
    pub version: String,
}

/// Input for creating a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetDraft {
    /// Globally unique dataset name.
    pub dataset_name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Comma-separated tags.
    #[serde(default)]
    pub tags: String,
    /// Archived flag.
    #[serde(default)]
    pub archived: bool,
    /// Version string; defaults to [`INITIAL_DATASET_VERSION`].
    #[serde(default)]
    pub version: Option<String>,
    /// Path or URL the dataset lives at.
    #[serde(default)]
    pub path_to_dataset: String,
}

/// Partial update for a dataset. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetPatch {
    /// New name; must stay globally unique. Existing snapshots keep the old
    /// name.
    pub dataset_name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New tags.
    pub tags: Option<String>,
    /// New archived flag.
    pub archived: Option<bool>,
    /// New version string. Existing snapshots keep the old version.
    pub version: Option<String>,
    /// New dataset path.
    pub path_to_dataset: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> DatasetDraft {
        DatasetDraft {
            dataset_name: name.to_string(),
            description: String::new(),
            tags: String::new(),
            archived: false,
            version: None,
            path_to_dataset: String::new(),
        }
    }

    #[test]
    fn test_dataset_version_defaults() {
        let dataset = Dataset::new("d-1", draft("DS1"));
        assert_eq!(dataset.version(), INITIAL_DATASET_VERSION);
        assert!(dataset.linked_iterations().is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut dataset = Dataset::new("d-1", draft("DS1"));
        let snapshot = dataset.snapshot();

        dataset.rename("DS1 renamed");
        dataset.set_version("1.0.0");

        assert_eq!(snapshot.name, "DS1");
        assert_eq!(snapshot.version, INITIAL_DATASET_VERSION);
    }

    #[test]
    fn test_link_unlink() {
        let mut dataset = Dataset::new("d-1", draft("DS1"));

        dataset.link_iteration("i-1", "Test iteration");
        assert_eq!(
            dataset.linked_iterations().get("i-1").map(String::as_str),
            Some("Test iteration")
        );

        assert!(dataset.unlink_iteration("i-1"));
        assert!(!dataset.unlink_iteration("i-1"));
        assert!(dataset.linked_iterations().is_empty());
    }
}
