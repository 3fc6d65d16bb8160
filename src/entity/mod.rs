//! Entity records for the tracking tree
//!
//! ## Schema Overview
//!
//! ```text
//! Project (1) ──< Experiment (N) ──< Iteration (N)
//!                                        │
//!                                        ├── dataset snapshot ──> Dataset (1)
//!                                        ├──< InteractiveChart (N)
//!                                        └──< ImageChart (N)
//! ```
//!
//! A `Dataset` keeps a reverse map of the iterations that reference it
//! (`linked_iterations`); each `Iteration` caches its ancestor project title
//! and parent experiment name. Both denormalizations are maintained by the
//! engine, never by callers.

mod chart;
mod dataset;
mod experiment;
mod iteration;
mod project;

pub use chart::{ChartType, ChartValue, ImageChart, ImageChartDraft, InteractiveChart};
pub use dataset::{Dataset, DatasetDraft, DatasetPatch, DatasetSnapshot, INITIAL_DATASET_VERSION};
pub use experiment::{Experiment, ExperimentDraft, ExperimentPatch};
pub use iteration::{
    DatasetReference, Iteration, IterationBuilder, IterationDraft, IterationPatch,
};
pub use project::{Project, ProjectDraft, ProjectPatch};
