//! Error types for hidden-line projection.

use thiserror::Error;
use vdraft_topo::TopoError;

/// Errors raised while setting up or collecting a projection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HlrError {
    /// The viewing direction is parallel to the up vector.
    #[error("view direction is parallel to the up vector")]
    DegenerateFrame,

    /// A frame vector has zero length.
    #[error("{0} vector has zero length")]
    ZeroDirection(&'static str),

    /// A point lies on the plane through the perspective eye.
    #[error("point at depth {depth} lies on the eye plane")]
    OnEyePlane {
        /// View-space depth of the point.
        depth: f64,
    },

    /// The hidden-line kernel failed.
    #[error("hidden-line kernel failed: {0}")]
    Kernel(String),

    /// An edge could not be repaired.
    #[error(transparent)]
    Topo(#[from] TopoError),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, HlrError>;
