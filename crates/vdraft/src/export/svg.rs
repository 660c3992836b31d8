//! SVG export of projected edges.
//!
//! Primitives keep drawing coordinates (Y up). The document wraps all
//! layers in one group that flips Y, so the flip happens exactly once.

use std::io::Write;

use tracing::{debug, trace};
use vdraft_math::round_to;
use vdraft_nurbs::BezierCurve;
use vdraft_topo::{Edge, Shape, TopoError};

use super::{AddShapeReport, DrawingDocument, Extents};
use crate::color::{ColorIndex, Style};
use crate::convert::{
    axis_angle, classify, extract_spline, is_large_arc, sweeps_ccw, CurveClass, ELLIPSE_SPLIT,
    SPLIT_TOLERANCE,
};
use crate::error::{ExportError, Result};
use crate::layer::{Layer, LayerSet};
use crate::linetype::{scale_pattern_for_output, LineType, LineTypeTable};
use crate::point::{Point2D, PointProjector};
use crate::settings::SvgSettings;
use crate::units::{unit_conversion_scale, Unit};

/// Name of the layer every SVG drawing has.
pub const DEFAULT_LAYER: &str = "";

/// One command of a path after the initial move.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Line {
        to: Point2D,
    },
    Quadratic {
        control: Point2D,
        to: Point2D,
    },
    Cubic {
        control1: Point2D,
        control2: Point2D,
        to: Point2D,
    },
    /// Elliptical arc; `rotation` in degrees.
    Arc {
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: Point2D,
    },
}

impl PathSegment {
    /// End point of the command.
    pub fn end(&self) -> Point2D {
        match self {
            PathSegment::Line { to }
            | PathSegment::Quadratic { to, .. }
            | PathSegment::Cubic { to, .. }
            | PathSegment::Arc { to, .. } => *to,
        }
    }

    fn push_data(&self, d: &mut String) {
        let command = match self {
            PathSegment::Line { to } => format!("L{}", xy(to)),
            PathSegment::Quadratic { control, to } => format!("Q{} {}", xy(control), xy(to)),
            PathSegment::Cubic {
                control1,
                control2,
                to,
            } => format!("C{} {} {}", xy(control1), xy(control2), xy(to)),
            PathSegment::Arc {
                rx,
                ry,
                rotation,
                large_arc,
                sweep,
                to,
            } => format!(
                "A{},{} {} {},{} {}",
                rx,
                ry,
                rotation,
                u8::from(*large_arc),
                u8::from(*sweep),
                xy(to)
            ),
        };
        d.push(' ');
        d.push_str(&command);
    }
}

fn xy(p: &Point2D) -> String {
    format!("{},{}", p.x, p.y)
}

/// A converted SVG element in drawing coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum SvgElement {
    Line { start: Point2D, end: Point2D },
    Circle { center: Point2D, radius: f64 },
    Path {
        start: Point2D,
        segments: Vec<PathSegment>,
    },
}

impl SvgElement {
    /// `d` attribute of a path element.
    pub fn path_data(&self) -> Option<String> {
        match self {
            SvgElement::Path { start, segments } => {
                let mut d = format!("M{}", xy(start));
                for s in segments {
                    s.push_data(&mut d);
                }
                Some(d)
            }
            _ => None,
        }
    }
}

/// Visible window of the drawing, in drawing units with Y pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// SVG drawing assembled from shapes.
///
/// Only millimetres, centimetres and inches can be used.
#[derive(Debug, Clone)]
pub struct ExportSvg {
    unit: Unit,
    suffix: &'static str,
    scale: f64,
    margin: f64,
    fit_to_stroke: bool,
    precision: u32,
    line_types: LineTypeTable,
    layers: LayerSet<SvgElement>,
    extents: Extents,
}

impl ExportSvg {
    /// Drawing in `unit` with default settings and an unnamed layer.
    pub fn new(unit: Unit) -> Result<Self> {
        Self::from_settings(&SvgSettings {
            unit,
            ..SvgSettings::default()
        })
    }

    /// Drawing configured from settings; the default layer takes the
    /// settings style.
    pub fn from_settings(settings: &SvgSettings) -> Result<Self> {
        settings.validate()?;
        let suffix = settings
            .unit
            .svg_suffix()
            .ok_or_else(|| ExportError::UnsupportedUnit {
                unit: settings.unit.to_string(),
                format: "SVG",
            })?;
        let style = Style::with_overrides(
            settings.color,
            settings.line_weight,
            settings.line_type.clone(),
        );
        let line_types = LineTypeTable::new();
        line_types.resolve(&style.line_type)?;
        Ok(Self {
            unit: settings.unit,
            suffix,
            scale: settings.scale,
            margin: settings.margin,
            fit_to_stroke: settings.fit_to_stroke,
            precision: settings.precision,
            line_types,
            layers: LayerSet::with_layer(DEFAULT_LAYER, style),
            extents: Extents::default(),
        })
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Register a custom line type for this drawing from segment lengths
    /// in millimetres.
    pub fn register_line_type(
        &mut self,
        name: &str,
        description: &str,
        lengths: &[f64],
    ) -> Result<LineType> {
        self.line_types.register(name, description, lengths)
    }

    /// Declare a layer. Unset style fields take the defaults.
    pub fn add_layer(
        &mut self,
        name: &str,
        color: Option<ColorIndex>,
        line_weight: Option<f64>,
        line_type: Option<LineType>,
    ) -> Result<()> {
        if self.layers.contains(name) {
            return Err(ExportError::DuplicateLayer(name.to_string()));
        }
        let style = Style::with_overrides(color, line_weight, line_type);
        self.line_types.resolve(&style.line_type)?;
        self.layers.add(name, style)?;
        Ok(())
    }

    /// Layers in declaration order.
    pub fn layers(&self) -> impl Iterator<Item = &Layer<SvgElement>> {
        self.layers.iter()
    }

    pub fn layer(&self, name: &str) -> Result<&Layer<SvgElement>> {
        self.layers.get(name)
    }

    /// Extents of everything added so far.
    pub fn extents(&self) -> &Extents {
        &self.extents
    }

    /// Factor from millimetres, the unit of line weights, to the drawing unit.
    fn weight_scale(&self) -> f64 {
        unit_conversion_scale(Unit::Millimeter, self.unit)
    }

    /// Window around everything added so far.
    ///
    /// With fit-to-stroke the margin grows by half the widest stroke so
    /// outer strokes are not clipped.
    pub fn viewport(&self) -> Result<ViewBox> {
        let b = self.extents.require()?;
        let mut margin = self.margin;
        if self.fit_to_stroke {
            margin += self.layers.max_line_weight() * self.weight_scale() / 2.0;
        }
        let size = b.size();
        let view = ViewBox {
            left: self.round(b.min[0] - margin),
            top: self.round(-b.max[1] - margin),
            width: self.round(size.x + 2.0 * margin),
            height: self.round(size.y + 2.0 * margin),
        };
        debug!(?view, margin, "computed SVG viewport");
        Ok(view)
    }

    /// Physical document size, `(width, height)` with unit suffix.
    pub fn document_size(&self) -> Result<(String, String)> {
        let view = self.viewport()?;
        Ok((
            format!("{}{}", self.round(view.width * self.scale), self.suffix),
            format!("{}{}", self.round(view.height * self.scale), self.suffix),
        ))
    }

    fn round(&self, value: f64) -> f64 {
        round_to(value, self.precision)
    }

    fn convert_edge(&self, edge: &Edge, points: &mut PointProjector) -> Result<SvgElement> {
        let class = classify(edge);
        trace!(?class, "converting edge to SVG");
        match class {
            CurveClass::Line => Ok(SvgElement::Line {
                start: points.project(&edge.start_point()),
                end: points.project(&edge.end_point()),
            }),
            CurveClass::Circle => {
                let adaptor = edge.adaptor()?;
                let circle = adaptor
                    .circle()
                    .ok_or(TopoError::UnsupportedCurve("circle adaptor"))?;
                if edge.is_closed() {
                    return Ok(SvgElement::Circle {
                        center: points.project(&circle.center),
                        radius: points.round(circle.radius),
                    });
                }
                let r = points.round(circle.radius);
                let arc = PathSegment::Arc {
                    rx: r,
                    ry: r,
                    rotation: points.round(axis_angle(circle.x_dir.as_ref()).to_degrees()),
                    large_arc: is_large_arc(adaptor.first_parameter(), adaptor.last_parameter()),
                    sweep: sweeps_ccw(circle.normal.as_ref().z),
                    to: points.project(&edge.end_point()),
                };
                Ok(SvgElement::Path {
                    start: points.project(&edge.start_point()),
                    segments: vec![arc],
                })
            }
            CurveClass::Ellipse => {
                let adaptor = edge.adaptor()?;
                let ellipse = adaptor
                    .ellipse()
                    .ok_or(TopoError::UnsupportedCurve("ellipse adaptor"))?;
                let rx = points.round(ellipse.major_radius);
                let ry = points.round(ellipse.minor_radius);
                let rotation = points.round(axis_angle(ellipse.x_dir.as_ref()).to_degrees());
                let sweep = sweeps_ccw(ellipse.normal.as_ref().z);
                let arc = |large_arc: bool, to: Point2D| PathSegment::Arc {
                    rx,
                    ry,
                    rotation,
                    large_arc,
                    sweep,
                    to,
                };
                let start = points.project(&edge.start_point());
                let segments = if edge.is_closed() {
                    let mid = points.project(&edge.position_at(ELLIPSE_SPLIT));
                    let end = points.project(&edge.end_point());
                    vec![arc(false, mid), arc(false, end)]
                } else {
                    let large =
                        is_large_arc(adaptor.first_parameter(), adaptor.last_parameter());
                    vec![arc(large, points.project(&edge.end_point()))]
                };
                Ok(SvgElement::Path { start, segments })
            }
            CurveClass::Spline => {
                let curve = extract_spline(edge)?;
                let (u1, u2) = curve.parameter_domain();
                let beziers = curve.bezier_segments(u1, u2, SPLIT_TOLERANCE)?;
                let first = beziers
                    .first()
                    .and_then(|b| b.poles.first())
                    .ok_or(TopoError::UnsupportedCurve("empty spline"))?;
                let start = points.project(first);
                let segments = beziers
                    .iter()
                    .map(|b| bezier_segment(b, points))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SvgElement::Path { start, segments })
            }
        }
    }

    fn write_layer(
        &self,
        writer: &mut impl Write,
        layer: &Layer<SvgElement>,
    ) -> std::io::Result<()> {
        let (r, g, b) = layer.style.color.rgb();
        let width = self.round(layer.style.line_weight * self.weight_scale());
        write!(
            writer,
            r#"    <g stroke="rgb({},{},{})" stroke-width="{}" fill="none""#,
            r, g, b, width
        )?;
        if !layer.name.is_empty() {
            write!(writer, r#" id="{}""#, escape_attr(&layer.name))?;
        }
        if !layer.style.line_type.is_continuous() {
            if let Ok(pattern) = self.line_types.resolve(&layer.style.line_type) {
                let dashes: Vec<String> =
                    scale_pattern_for_output(&pattern, self.unit, layer.style.line_weight)
                        .into_iter()
                        .map(|v| self.round(v).to_string())
                        .collect();
                if !dashes.is_empty() {
                    write!(writer, r#" stroke-dasharray="{}""#, dashes.join(","))?;
                }
            }
        }
        writeln!(writer, ">")?;

        for element in layer.primitives() {
            match element {
                SvgElement::Line { start, end } => writeln!(
                    writer,
                    r#"      <line x1="{}" y1="{}" x2="{}" y2="{}" />"#,
                    start.x, start.y, end.x, end.y
                )?,
                SvgElement::Circle { center, radius } => writeln!(
                    writer,
                    r#"      <circle cx="{}" cy="{}" r="{}" />"#,
                    center.x, center.y, radius
                )?,
                SvgElement::Path { .. } => {
                    if let Some(d) = element.path_data() {
                        writeln!(writer, r#"      <path d="{}" />"#, d)?;
                    }
                }
            }
        }
        writeln!(writer, "    </g>")
    }
}

impl DrawingDocument for ExportSvg {
    fn has_layer(&self, name: &str) -> bool {
        self.layers.contains(name)
    }

    fn add_shape(&mut self, shape: &Shape, layer: &str) -> Result<AddShapeReport> {
        self.layers.get(layer)?;

        let mut points = PointProjector::new(self.precision);
        let elements = shape
            .edges()
            .iter()
            .map(|edge| self.convert_edge(edge, &mut points))
            .collect::<Result<Vec<_>>>()?;

        let report = AddShapeReport {
            edges: elements.len(),
            non_planar_points: points.non_planar_count(),
        };
        self.layers.get_mut(layer)?.extend(elements);
        self.extents.include(shape);
        report.log(layer);
        Ok(report)
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let view = self.viewport()?;
        let (width, height) = self.document_size()?;

        writeln!(writer, r#"<?xml version="1.0" encoding="utf-8" ?>"#)?;
        writeln!(
            writer,
            r#"<svg width="{}" height="{}" viewBox="{} {} {} {}" version="1.1" xmlns="http://www.w3.org/2000/svg">"#,
            width, height, view.left, view.top, view.width, view.height
        )?;
        writeln!(
            writer,
            r#"  <g transform="scale(1,-1)" stroke-linecap="round">"#
        )?;
        for layer in self.layers.iter() {
            self.write_layer(&mut writer, layer)?;
        }
        writeln!(writer, "  </g>")?;
        writeln!(writer, "</svg>")?;
        Ok(())
    }
}

/// Path command for one Bezier span: a line, quadratic or cubic by pole
/// count. Weights are not representable and are dropped.
pub(crate) fn bezier_segment(bezier: &BezierCurve, points: &mut PointProjector) -> Result<PathSegment> {
    let p: Vec<Point2D> = bezier.poles.iter().map(|q| points.project(q)).collect();
    match p.as_slice() {
        [_, to] => Ok(PathSegment::Line { to: *to }),
        [_, control, to] => Ok(PathSegment::Quadratic {
            control: *control,
            to: *to,
        }),
        [_, control1, control2, to] => Ok(PathSegment::Cubic {
            control1: *control1,
            control2: *control2,
            to: *to,
        }),
        _ => Err(ExportError::UnsupportedBezier { poles: p.len() }),
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linetype::IsoLineType;
    use std::f64::consts::{FRAC_PI_2, PI};
    use vdraft_geom::{Circle3d, Ellipse3d};
    use vdraft_math::{Point3, Transform, Vec3};
    use vdraft_nurbs::BSplineCurve;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    fn only_element(doc: &ExportSvg, layer: &str) -> SvgElement {
        let l = doc.layer(layer).unwrap();
        assert_eq!(l.len(), 1);
        l.primitives()[0].clone()
    }

    fn rectangle(w: f64, h: f64) -> Shape {
        Shape::new(vec![
            Edge::line(p(0.0, 0.0), p(w, 0.0)),
            Edge::line(p(w, 0.0), p(w, h)),
            Edge::line(p(w, h), p(0.0, h)),
            Edge::line(p(0.0, h), p(0.0, 0.0)),
        ])
    }

    #[test]
    fn test_unsupported_units() {
        for unit in [Unit::Meter, Unit::Foot, Unit::Micro] {
            assert!(matches!(
                ExportSvg::new(unit),
                Err(ExportError::UnsupportedUnit { format: "SVG", .. })
            ));
        }
        assert!(ExportSvg::new(Unit::Inch).is_ok());
    }

    #[test]
    fn test_line_element_unflipped() {
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        let shape = Shape::from(Edge::line(p(0.0, 0.0), p(1.0, 0.0)));
        doc.add_shape(&shape, "").unwrap();
        assert_eq!(
            only_element(&doc, ""),
            SvgElement::Line {
                start: Point2D::new(0.0, 0.0),
                end: Point2D::new(1.0, 0.0)
            }
        );
        let out = doc.render().unwrap();
        assert!(out.contains(r#"<line x1="0" y1="0" x2="1" y2="0" />"#));
        assert_eq!(out.matches("scale(1,-1)").count(), 1);
    }

    #[test]
    fn test_closed_circle() {
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        doc.add_shape(&Shape::from(Edge::new(Circle3d::new(p(2.0, 3.0), 1.5))), "")
            .unwrap();
        assert_eq!(
            only_element(&doc, ""),
            SvgElement::Circle {
                center: Point2D::new(2.0, 3.0),
                radius: 1.5
            }
        );
    }

    #[test]
    fn test_open_circle_arc_flags() {
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        let c = Circle3d::new(Point3::origin(), 1.0);
        doc.add_shape(&Shape::from(Edge::trimmed(c, 0.0, 1.5 * PI).unwrap()), "")
            .unwrap();
        let el = only_element(&doc, "");
        assert_eq!(el.path_data().unwrap(), "M1,0 A1,1 0 1,1 0,-1");
    }

    #[test]
    fn test_clockwise_arc_clears_sweep() {
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        let c = Circle3d::with_axes(Point3::origin(), 1.0, -Vec3::z(), Vec3::x());
        doc.add_shape(&Shape::from(Edge::trimmed(c, 0.0, FRAC_PI_2).unwrap()), "")
            .unwrap();
        match only_element(&doc, "") {
            SvgElement::Path { segments, .. } => match &segments[0] {
                PathSegment::Arc {
                    sweep, large_arc, ..
                } => assert!(!sweep && !large_arc),
                other => panic!("expected arc, got {:?}", other),
            },
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn test_closed_ellipse_splits_at_midpoint() {
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        let e = Ellipse3d::new(p(1.0, 1.0), 3.0, 1.0, Vec3::new(1.0, 1.0, 0.0));
        let edge = Edge::new(e);
        let mid = edge.position_at(0.5);
        doc.add_shape(&Shape::from(edge), "").unwrap();
        match only_element(&doc, "") {
            SvgElement::Path { segments, .. } => {
                assert_eq!(segments.len(), 2);
                let joint = segments[0].end();
                assert!((joint.x - mid.x).abs() < 1e-6 && (joint.y - mid.y).abs() < 1e-6);
                match &segments[0] {
                    PathSegment::Arc {
                        rx,
                        ry,
                        rotation,
                        large_arc,
                        ..
                    } => {
                        assert_eq!((*rx, *ry, *rotation, *large_arc), (3.0, 1.0, 45.0, false));
                    }
                    other => panic!("expected arc, got {:?}", other),
                }
            }
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn test_open_ellipse_single_arc() {
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        let e = Ellipse3d::new(Point3::origin(), 3.0, 1.0, Vec3::x());
        doc.add_shape(&Shape::from(Edge::trimmed(e, 0.0, 4.0).unwrap()), "")
            .unwrap();
        match only_element(&doc, "") {
            SvgElement::Path { segments, .. } => {
                assert_eq!(segments.len(), 1);
                assert!(matches!(segments[0], PathSegment::Arc { large_arc: true, .. }));
            }
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn test_spline_becomes_cubics() {
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        let curve = BSplineCurve::clamped_uniform(
            vec![p(0.0, 0.0), p(1.0, 2.0), p(2.0, -1.0), p(3.0, 2.0), p(4.0, 0.0)],
            3,
        )
        .unwrap();
        let edge = Edge::new(curve).located(&Transform::translation(1.0, 1.0, 0.0));
        doc.add_shape(&Shape::from(edge), "").unwrap();
        match only_element(&doc, "") {
            SvgElement::Path { start, segments } => {
                assert_eq!(start, Point2D::new(1.0, 1.0));
                assert_eq!(segments.len(), 2);
                assert!(segments
                    .iter()
                    .all(|s| matches!(s, PathSegment::Cubic { .. })));
                assert_eq!(segments[1].end(), Point2D::new(5.0, 1.0));
            }
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn test_spline_across_periodic_seam() {
        let curve = BSplineCurve::with_multiplicities(
            vec![p(1.0, 0.0), p(0.0, 1.0), p(-1.0, 0.0), p(0.0, -1.0)],
            None,
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![1; 5],
            3,
            true,
        )
        .unwrap();
        let near = |a: Point2D, x: f64, y: f64| (a.x - x).abs() < 1e-6 && (a.y - y).abs() < 1e-6;
        for (first, last) in [(3.0, 5.0), (-1.0, 1.0)] {
            let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
            let edge = Edge::trimmed(curve.clone(), first, last).unwrap();
            doc.add_shape(&Shape::from(edge), "").unwrap();
            match only_element(&doc, "") {
                SvgElement::Path { start, segments } => {
                    assert!(near(start, 4.0 / 6.0, 0.0));
                    assert_eq!(segments.len(), 2);
                    assert!(segments
                        .iter()
                        .all(|s| matches!(s, PathSegment::Cubic { .. })));
                    // the seam point sits between the two spans
                    assert!(near(segments[0].end(), 0.0, 4.0 / 6.0));
                    assert!(near(segments[1].end(), -4.0 / 6.0, 0.0));
                }
                other => panic!("expected path, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_spline_range_collapsing_onto_knot_rejected() {
        let quad = BSplineCurve::new(
            vec![p(0.0, 0.0), p(1.0, 2.0), p(3.0, 2.0), p(4.0, 0.0)],
            vec![0.0, 0.0, 0.0, 0.5, 1.0, 1.0, 1.0],
            2,
        )
        .unwrap();
        let edge = Edge::trimmed(quad, 0.5 - 5e-10, 0.5 + 6e-10).unwrap();
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        assert!(matches!(
            doc.add_shape(&Shape::from(edge), ""),
            Err(ExportError::Nurbs(_))
        ));
        assert!(doc.layer("").unwrap().is_empty());
        assert!(doc.extents().bounds().is_none());
    }

    #[test]
    fn test_polygon_edge_becomes_lines() {
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        let mut edge = Edge::from_polygon(vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]);
        edge.build_curve_3d(1e-6).unwrap();
        doc.add_shape(&Shape::from(edge), "").unwrap();
        match only_element(&doc, "") {
            SvgElement::Path { segments, .. } => {
                assert_eq!(segments.len(), 2);
                assert_eq!(segments[1].end(), Point2D::new(1.0, 1.0));
            }
            other => panic!("expected path, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_bezier() {
        let mut points = PointProjector::new(6);
        let quartic = BezierCurve::new((0..5).map(|i| p(i as f64, 0.0)).collect());
        assert!(matches!(
            bezier_segment(&quartic, &mut points),
            Err(ExportError::UnsupportedBezier { poles: 5 })
        ));
        let line = BezierCurve::new(vec![p(0.0, 0.0), p(1.0, 0.0)]);
        assert!(matches!(
            bezier_segment(&line, &mut points),
            Ok(PathSegment::Line { .. })
        ));
    }

    #[test]
    fn test_viewport_requires_shape() {
        let doc = ExportSvg::new(Unit::Millimeter).unwrap();
        assert!(matches!(doc.viewport(), Err(ExportError::EmptyDrawing)));
        assert!(matches!(doc.render(), Err(ExportError::EmptyDrawing)));
    }

    #[test]
    fn test_viewport_margin_and_scale() {
        let settings = SvgSettings {
            margin: 1.0,
            scale: 2.0,
            fit_to_stroke: false,
            ..SvgSettings::default()
        };
        let mut doc = ExportSvg::from_settings(&settings).unwrap();
        doc.add_shape(&rectangle(10.0, 5.0), "").unwrap();
        assert_eq!(
            doc.viewport().unwrap(),
            ViewBox {
                left: -1.0,
                top: -6.0,
                width: 12.0,
                height: 7.0
            }
        );
        assert_eq!(
            doc.document_size().unwrap(),
            ("24mm".to_string(), "14mm".to_string())
        );
        let out = doc.render().unwrap();
        assert!(out.contains(r#"viewBox="-1 -6 12 7""#));
    }

    #[test]
    fn test_fit_to_stroke_grows_margin() {
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        doc.add_layer("thick", None, Some(0.5), None).unwrap();
        doc.add_shape(&rectangle(10.0, 5.0), "thick").unwrap();
        let v = doc.viewport().unwrap();
        assert_eq!(v.left, -0.25);
        assert_eq!(v.width, 10.5);
    }

    #[test]
    fn test_layer_group_style() {
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        doc.add_layer(
            "hidden",
            Some(ColorIndex::Gray),
            Some(0.5),
            Some(LineType::Iso(IsoLineType::Dash)),
        )
        .unwrap();
        doc.add_shape(&rectangle(1.0, 1.0), "hidden").unwrap();
        let out = doc.render().unwrap();
        assert!(out.contains(
            r#"<g stroke="rgb(65,65,65)" stroke-width="0.5" fill="none" id="hidden" stroke-dasharray="6,1.5">"#
        ));
        assert!(out.contains(r#"<g stroke="rgb(0,0,0)" stroke-width="0.09" fill="none">"#));
    }

    #[test]
    fn test_inch_stroke_width() {
        let mut doc = ExportSvg::new(Unit::Inch).unwrap();
        doc.add_layer("w", None, Some(2.54), None).unwrap();
        doc.add_shape(&rectangle(1.0, 1.0), "w").unwrap();
        let out = doc.render().unwrap();
        assert!(out.contains(r#"stroke-width="0.1" fill="none" id="w""#));
        assert!(out.contains(r#"width="1.1in""#));
    }

    #[test]
    fn test_layer_errors() {
        let mut doc = ExportSvg::new(Unit::Millimeter).unwrap();
        assert!(matches!(
            doc.add_layer("", None, None, None),
            Err(ExportError::DuplicateLayer(_))
        ));
        assert!(matches!(
            doc.add_layer("x", None, None, Some(LineType::from("NOPE"))),
            Err(ExportError::UnknownLineType(_))
        ));
        assert!(!doc.has_layer("x"));
        let shape = rectangle(1.0, 1.0);
        assert!(matches!(
            doc.add_shape(&shape, "missing"),
            Err(ExportError::UndefinedLayer(_))
        ));
        assert!(doc.extents().bounds().is_none());
    }

    #[test]
    fn test_layer_id_escaped() {
        assert_eq!(escape_attr(r#"a&b"c"#), "a&amp;b&quot;c");
    }
}
