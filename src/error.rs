//! Error types for mltrack-db
//!
//! Validation and lookup failures carry the stable messages the transport
//! layer surfaces verbatim; everything else wraps the underlying cause.

use crate::store::Kind;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// mltrack-db error types
#[derive(Error, Debug)]
pub enum Error {
    /// Two interactive charts in one iteration share a chart name
    #[error("Chart names in iteration must be unique")]
    DuplicateChartNames,

    /// An interactive chart has mismatched x/y series lengths
    #[error("Number of x_data and y_data must be the same for the selected chart type")]
    ChartDataLengthMismatch,

    /// The source path of an image chart does not exist
    #[error("Image path does not exist.")]
    ImageSourceMissing,

    /// No document with this id
    #[error("{kind} {id} not found")]
    NotFound {
        /// Entity kind looked up
        kind: Kind,
        /// Id that missed
        id: String,
    },

    /// No document with this unique name/title
    #[error("{kind} named {name:?} not found")]
    NameNotFound {
        /// Entity kind looked up
        kind: Kind,
        /// Name that missed
        name: String,
    },

    /// Unique-field conflict on create or rename
    #[error("{kind} named {name:?} already exists")]
    DuplicateName {
        /// Entity kind being written
        kind: Kind,
        /// Conflicting name
        name: String,
    },

    /// Dataset delete refused while iterations still link to it
    #[error("Dataset {id} is linked by {linked} iteration(s) and cannot be deleted")]
    DatasetInUse {
        /// Dataset id
        id: String,
        /// Number of linked iterations
        linked: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted image payload is not valid base64
    #[error("Invalid encoded image: {0}")]
    InvalidEncodedImage(#[from] base64::DecodeError),

    /// Backend storage error
    #[error("Storage error: {0}")]
    Store(String),
}

impl Error {
    /// True for failures a transport layer would map to 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::NameNotFound { .. } | Self::ImageSourceMissing
        )
    }

    /// True for failures a transport layer would map to 409.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateName { .. } | Self::DatasetInUse { .. })
    }
}
