//! Error types for drawing export.

use thiserror::Error;
use vdraft_nurbs::NurbsError;
use vdraft_topo::TopoError;

/// Errors that can occur while building or writing a drawing.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The unit cannot be used by this output format.
    #[error("unit `{unit}` is not supported by {format}")]
    UnsupportedUnit {
        /// Unit name.
        unit: String,
        /// Output format name.
        format: &'static str,
    },

    /// The unit name is not recognized.
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),

    /// A layer with this name already exists.
    #[error("duplicate layer name `{0}`")]
    DuplicateLayer(String),

    /// No layer with this name has been declared.
    #[error("undefined layer `{0}`")]
    UndefinedLayer(String),

    /// The line type is neither in the catalog nor registered.
    #[error("unknown line type `{0}`")]
    UnknownLineType(String),

    /// A line type with this name already exists.
    #[error("duplicate line type `{0}`")]
    DuplicateLineType(String),

    /// A spline decomposed into a Bezier span SVG cannot express.
    #[error("unexpected Bezier span with {poles} poles")]
    UnsupportedBezier {
        /// Number of poles in the span.
        poles: usize,
    },

    /// The drawing has no extent yet.
    #[error("drawing is empty; add a shape before computing the viewport")]
    EmptyDrawing,

    /// Settings failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// An edge could not be adapted or converted.
    #[error("geometry error: {0}")]
    Geometry(#[from] TopoError),

    /// A spline operation failed.
    #[error("spline error: {0}")]
    Nurbs(#[from] NurbsError),

    /// Writing the output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A settings file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
