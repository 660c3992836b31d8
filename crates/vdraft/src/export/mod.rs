//! Drawing documents for the supported 2D formats.
//!
//! - [`dxf`] - CAD interchange drawings with layers, line types and native
//!   arcs, ellipses and splines
//! - [`svg`] - vector graphics with one stroked group per layer

pub mod dxf;
pub mod svg;

pub use dxf::{DxfEntity, ExportDxf};
pub use svg::{ExportSvg, PathSegment, SvgElement, ViewBox};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::warn;
use vdraft_hlr::Drawing;
use vdraft_math::BoundingBox3;
use vdraft_topo::Shape;

use crate::error::{ExportError, Result};

/// Outcome of adding one shape to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AddShapeReport {
    /// Edges converted.
    pub edges: usize,
    /// Points that had to be flattened onto the drawing plane.
    pub non_planar_points: usize,
}

impl AddShapeReport {
    pub(crate) fn log(&self, layer: &str) {
        if self.non_planar_points > 0 {
            warn!(
                non_planar_points = self.non_planar_points,
                layer, "exporting non-planar shape to 2D format"
            );
        }
    }
}

/// Running union of the extents of every shape added to a document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extents {
    bounds: Option<BoundingBox3>,
}

impl Extents {
    /// Fold the extent of `shape` in. Shapes without edges change nothing.
    pub fn include(&mut self, shape: &Shape) {
        if let Some(b) = shape.bounding_box() {
            self.bounds = Some(match &self.bounds {
                Some(current) => current.union(&b),
                None => b,
            });
        }
    }

    /// Accumulated box; `None` until a non-empty shape was added.
    pub fn bounds(&self) -> Option<&BoundingBox3> {
        self.bounds.as_ref()
    }

    /// Accumulated box, or [`ExportError::EmptyDrawing`].
    pub fn require(&self) -> Result<BoundingBox3> {
        self.bounds.ok_or(ExportError::EmptyDrawing)
    }
}

/// Operations shared by the DXF and SVG documents.
pub trait DrawingDocument {
    /// Whether a layer of this name was declared.
    fn has_layer(&self, name: &str) -> bool;

    /// Convert every edge of `shape` onto `layer`.
    ///
    /// Nothing is added when any edge fails to convert.
    fn add_shape(&mut self, shape: &Shape, layer: &str) -> Result<AddShapeReport>;

    /// Serialize the document.
    fn write_to<W: Write>(&self, writer: W) -> Result<()>;

    /// Add the visible and hidden edges of a projection to two layers.
    ///
    /// Both layers must exist before anything is added.
    fn add_drawing(
        &mut self,
        drawing: &Drawing,
        visible_layer: &str,
        hidden_layer: &str,
    ) -> Result<(AddShapeReport, AddShapeReport)> {
        for name in [visible_layer, hidden_layer] {
            if !self.has_layer(name) {
                return Err(ExportError::UndefinedLayer(name.to_string()));
            }
        }
        let visible = self.add_shape(&drawing.visible, visible_layer)?;
        let hidden = self.add_shape(&drawing.hidden, hidden_layer)?;
        Ok((visible, hidden))
    }

    /// Write the document to a file.
    fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// The serialized document as a string.
    fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
