//! 2D drawing export for 3D CAD edges.
//!
//! Converts the line, circle, ellipse and spline edges of a
//! [`Shape`](vdraft_topo::Shape) into DXF entities or SVG elements, grouped
//! onto styled layers:
//!
//! - **Units**: conversion factors between metric and imperial units
//! - **Line types**: the ANSI and ISO dash-pattern catalog plus custom types
//! - **DXF**: `LINE`, `CIRCLE`, `ARC`, `ELLIPSE` and `SPLINE` entities with
//!   `LTYPE` and `LAYER` tables
//! - **SVG**: one stroked group per layer, curves as path arcs and Beziers
//! - **Hidden lines**: visible and hidden edges of a projection go to
//!   separate layers
//!
//! # Example
//!
//! ```
//! use vdraft::{DrawingDocument, ExportSvg, Unit};
//! use vdraft_math::Point3;
//! use vdraft_topo::{Edge, Shape};
//!
//! let shape = Shape::from(Edge::line(Point3::origin(), Point3::new(10.0, 0.0, 0.0)));
//! let mut svg = ExportSvg::new(Unit::Millimeter).unwrap();
//! svg.add_shape(&shape, "").unwrap();
//! let text = svg.render().unwrap();
//! assert!(text.contains(r#"<line x1="0" y1="0" x2="10" y2="0" />"#));
//! ```

pub mod color;
pub mod convert;
pub mod error;
pub mod export;
pub mod layer;
pub mod linetype;
pub mod point;
pub mod settings;
pub mod units;

pub use color::{ColorIndex, Style, DEFAULT_LINE_WEIGHT};
pub use error::{ExportError, Result};
pub use export::{
    AddShapeReport, DrawingDocument, DxfEntity, ExportDxf, ExportSvg, Extents, PathSegment,
    SvgElement, ViewBox,
};
pub use layer::{Layer, LayerSet};
pub use linetype::{
    build_dash_pattern, scale_pattern_for_output, AnsiLineType, DashPattern, IsoLineType,
    LineType, LineTypeTable,
};
pub use point::{Point2D, PointProjector};
pub use settings::{DxfSettings, ExportSettings, SvgSettings};
pub use units::{unit_conversion_scale, unit_conversion_scale_by_name, Unit};
