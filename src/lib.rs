//! # mltrack-db: ML Experiment Metadata Engine
//!
//! An embedded consistency engine for experiment tracking metadata:
//! Project → Experiment → Iteration trees, with iterations optionally
//! referencing shared Datasets and carrying numeric/image chart artifacts.
//!
//! The hard part is not storage - documents live behind an abstract
//! key/value-by-id contract - but keeping the denormalized state honest:
//!
//! - renaming a project or experiment refreshes the cached ancestor names
//!   on every descendant iteration as one unit (never a partial cascade);
//! - datasets hold a reverse index of referencing iterations, maintained on
//!   iteration create/rename/delete;
//! - chart payloads are validated structurally before anything is written;
//! - image charts are persisted as a reversible byte-to-text encoding.
//!
//! ## Example
//!
//! ```rust
//! use mltrack_db::entity::{ExperimentDraft, IterationDraft, ProjectDraft, ProjectPatch};
//! use mltrack_db::Tracker;
//!
//! # async fn example() -> mltrack_db::Result<()> {
//! let tracker = Tracker::new();
//!
//! let project = tracker
//!     .create_project(ProjectDraft {
//!         title: "Test project".to_string(),
//!         description: String::new(),
//!     })
//!     .await?;
//! let experiment = tracker
//!     .create_experiment(
//!         project.id(),
//!         ExperimentDraft {
//!             name: "Test experiment".to_string(),
//!             description: String::new(),
//!         },
//!     )
//!     .await?;
//! let iteration = tracker
//!     .create_iteration(
//!         experiment.id(),
//!         IterationDraft {
//!             iteration_name: "Test iteration".to_string(),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//!
//! // Renames cascade into the cached fields of descendants
//! tracker
//!     .update_project(
//!         project.id(),
//!         ProjectPatch {
//!             title: Some("Test project updated".to_string()),
//!             description: None,
//!         },
//!     )
//!     .await?;
//! let iteration = tracker.iteration(iteration.id()).await?;
//! assert_eq!(iteration.project_title(), "Test project updated");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cascade;
pub mod entity;
pub mod error;
pub mod image;
pub mod link;
pub mod store;
pub mod sync;
pub mod tracker;
pub mod validate;

pub use error::{Error, Result};
pub use tracker::{Tracker, TrackerBuilder};
