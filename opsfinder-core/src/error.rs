//! Error types for opsfinder-core.

use thiserror::Error;

/// Result type alias for opsfinder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for opsfinder operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A required cut parameter was not provided.
    #[error("required parameter `{0}` not provided")]
    MissingParameter(&'static str),

    /// A cut parameter has an unusable value.
    #[error("invalid value for `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A candidate reached a stage with the wrong number of hits.
    #[error("{stage}: expected {expected} hits, found {found}")]
    InvalidMultiplicity {
        stage: &'static str,
        expected: usize,
        found: usize,
    },

    /// Hits of a window are not sorted by time.
    #[error("hit {index} is earlier than its predecessor")]
    UnorderedHits { index: usize },

    /// Geometry does not allow the requested computation.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
}
