#![warn(missing_docs)]

//! Edges and edge sets for the vdraft kernel.
//!
//! An [`Edge`] is a trimmed view of a curve placed in the world by a
//! [`Transform`]. A [`Shape`] is the flat edge collection the exporters
//! consume; it knows its bounding box and its centroid.
//!
//! Edges produced by projection may carry only a sampled polygon. Such
//! edges must be given a 3D curve with [`Edge::build_curve_3d`] before
//! they can be adapted or converted.

use thiserror::Error;
use vdraft_geom::{Circle3d, Curve3d, CurveKind, Ellipse3d, Line3d};
use vdraft_math::{BoundingBox3, Point3, Tolerance, Transform, Vec3};
use vdraft_nurbs::{hermite_cubic, BSplineCurve, BezierCurve, NurbsError};

/// Sample count used for bounds, lengths and foreign curve fitting.
const SAMPLES: usize = 64;

/// Errors raised by edge construction and conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopoError {
    /// Spline construction or restriction failed.
    #[error(transparent)]
    Nurbs(#[from] NurbsError),

    /// The curve cannot be handled by the requested operation.
    #[error("unsupported curve: {0}")]
    UnsupportedCurve(&'static str),

    /// The edge has no 3D curve; see [`Edge::build_curve_3d`].
    #[error("edge has no 3D curve")]
    MissingCurve3d,

    /// The trim range is empty or reversed.
    #[error("invalid edge range [{first}, {last}]")]
    InvalidRange {
        /// First parameter.
        first: f64,
        /// Last parameter.
        last: f64,
    },
}

/// Result alias for topology operations.
pub type Result<T> = std::result::Result<T, TopoError>;

// =============================================================================
// Edge curve
// =============================================================================

/// The curve an edge is cut from, in the edge's local frame.
#[derive(Debug, Clone)]
pub enum EdgeCurve {
    /// Straight line.
    Line(Line3d),
    /// Circle.
    Circle(Circle3d),
    /// Ellipse.
    Ellipse(Ellipse3d),
    /// Single-span Bezier curve.
    Bezier(BezierCurve),
    /// B-spline or NURBS curve.
    BSpline(BSplineCurve),
    /// Any other curve the kernel can evaluate.
    Other(Box<dyn Curve3d>),
}

impl EdgeCurve {
    fn as_curve(&self) -> &dyn Curve3d {
        match self {
            EdgeCurve::Line(c) => c,
            EdgeCurve::Circle(c) => c,
            EdgeCurve::Ellipse(c) => c,
            EdgeCurve::Bezier(c) => c,
            EdgeCurve::BSpline(c) => c,
            EdgeCurve::Other(c) => c.as_ref(),
        }
    }

    /// Kind tag of the curve.
    pub fn kind(&self) -> CurveKind {
        match self {
            EdgeCurve::Line(_) => CurveKind::Line,
            EdgeCurve::Circle(_) => CurveKind::Circle,
            EdgeCurve::Ellipse(_) => CurveKind::Ellipse,
            EdgeCurve::Bezier(_) => CurveKind::Bezier,
            EdgeCurve::BSpline(_) => CurveKind::BSpline,
            EdgeCurve::Other(_) => CurveKind::Other,
        }
    }
}

impl From<Line3d> for EdgeCurve {
    fn from(c: Line3d) -> Self {
        EdgeCurve::Line(c)
    }
}

impl From<Circle3d> for EdgeCurve {
    fn from(c: Circle3d) -> Self {
        EdgeCurve::Circle(c)
    }
}

impl From<Ellipse3d> for EdgeCurve {
    fn from(c: Ellipse3d) -> Self {
        EdgeCurve::Ellipse(c)
    }
}

impl From<BezierCurve> for EdgeCurve {
    fn from(c: BezierCurve) -> Self {
        EdgeCurve::Bezier(c)
    }
}

impl From<BSplineCurve> for EdgeCurve {
    fn from(c: BSplineCurve) -> Self {
        EdgeCurve::BSpline(c)
    }
}

// =============================================================================
// Edge
// =============================================================================

/// A bounded piece of a curve with a placement.
#[derive(Debug, Clone)]
pub struct Edge {
    curve: Option<EdgeCurve>,
    polygon: Vec<Point3>,
    first: f64,
    last: f64,
    location: Transform,
}

impl Edge {
    /// Edge spanning the curve's whole domain.
    pub fn new(curve: impl Into<EdgeCurve>) -> Self {
        let curve = curve.into();
        let (first, last) = curve.as_curve().domain();
        Self {
            curve: Some(curve),
            polygon: Vec::new(),
            first,
            last,
            location: Transform::identity(),
        }
    }

    /// Edge restricted to `[first, last]`.
    ///
    /// Non-periodic curves must contain the range; periodic ones may be
    /// offset but not span more than one period.
    pub fn trimmed(curve: impl Into<EdgeCurve>, first: f64, last: f64) -> Result<Self> {
        let curve = curve.into();
        let tol = Tolerance::DEFAULT.parametric;
        if last - first < tol {
            return Err(TopoError::InvalidRange { first, last });
        }
        let c = curve.as_curve();
        let (lo, hi) = c.domain();
        if c.is_periodic() {
            if last - first > hi - lo + tol {
                return Err(TopoError::InvalidRange { first, last });
            }
        } else {
            for u in [first, last] {
                if u < lo - tol || u > hi + tol {
                    return Err(NurbsError::ParameterOutOfRange { u, min: lo, max: hi }.into());
                }
            }
        }
        Ok(Self {
            curve: Some(curve),
            polygon: Vec::new(),
            first,
            last,
            location: Transform::identity(),
        })
    }

    /// Straight edge between two points.
    pub fn line(start: Point3, end: Point3) -> Self {
        Self::new(Line3d::from_points(start, end))
    }

    /// Edge known only by a sampled polygon, parameterized on `[0, 1]`.
    pub fn from_polygon(points: Vec<Point3>) -> Self {
        Self {
            curve: None,
            polygon: points,
            first: 0.0,
            last: 1.0,
            location: Transform::identity(),
        }
    }

    /// Apply a further placement on top of the current one.
    pub fn located(mut self, t: &Transform) -> Self {
        self.location = t.then(&self.location);
        self
    }

    /// Placement of the curve in the world.
    pub fn location(&self) -> &Transform {
        &self.location
    }

    /// Underlying curve in the edge's local frame.
    pub fn curve(&self) -> Option<&EdgeCurve> {
        self.curve.as_ref()
    }

    /// Whether the edge carries a 3D curve.
    pub fn has_curve_3d(&self) -> bool {
        self.curve.is_some()
    }

    /// Kind tag; polygon-only edges report [`CurveKind::Other`].
    pub fn kind(&self) -> CurveKind {
        self.curve.as_ref().map_or(CurveKind::Other, EdgeCurve::kind)
    }

    /// Parameter range `(first, last)` of the edge on its curve.
    pub fn range(&self) -> (f64, f64) {
        (self.first, self.last)
    }

    fn local_point(&self, u: f64) -> Point3 {
        match &self.curve {
            Some(c) => c.as_curve().evaluate(u),
            None => polygon_point(&self.polygon, (u - self.first) / (self.last - self.first)),
        }
    }

    /// World point at normalized parameter `t` in `[0, 1]`.
    pub fn position_at(&self, t: f64) -> Point3 {
        let u = self.first + t * (self.last - self.first);
        self.location.apply_point(&self.local_point(u))
    }

    /// World start point.
    pub fn start_point(&self) -> Point3 {
        self.position_at(0.0)
    }

    /// World end point.
    pub fn end_point(&self) -> Point3 {
        self.position_at(1.0)
    }

    /// Whether start and end coincide.
    pub fn is_closed(&self) -> bool {
        Tolerance::DEFAULT.points_equal(&self.start_point(), &self.end_point())
    }

    /// Evenly spaced world samples, endpoints included.
    pub fn sample(&self, count: usize) -> Vec<Point3> {
        let count = count.max(2);
        (0..count)
            .map(|i| self.position_at(i as f64 / (count - 1) as f64))
            .collect()
    }

    /// Polyline length estimate.
    pub fn length(&self) -> f64 {
        self.sample(SAMPLES)
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum()
    }

    /// Adaptor over the edge's curve.
    pub fn adaptor(&self) -> Result<CurveAdaptor<'_>> {
        match &self.curve {
            Some(curve) => Ok(CurveAdaptor { edge: self, curve }),
            None => Err(TopoError::MissingCurve3d),
        }
    }

    /// Give polygon-only edges a degree-one curve through their samples.
    ///
    /// Consecutive samples closer than `tolerance` are merged. Edges that
    /// already carry a curve are left untouched.
    pub fn build_curve_3d(&mut self, tolerance: f64) -> Result<()> {
        if self.curve.is_some() {
            return Ok(());
        }
        let mut points: Vec<Point3> = Vec::with_capacity(self.polygon.len());
        for p in &self.polygon {
            match points.last() {
                Some(q) if (p - q).norm() < tolerance => {}
                _ => points.push(*p),
            }
        }
        if points.len() < 2 {
            return Err(TopoError::UnsupportedCurve("degenerate polygon"));
        }
        let spline = polyline_spline(&points)?;
        let (first, last) = spline.parameter_domain();
        self.curve = Some(EdgeCurve::BSpline(spline));
        self.first = first;
        self.last = last;
        Ok(())
    }

    /// Same edge with its curve replaced by a spline of degree three or less.
    ///
    /// Lines and conics convert exactly, splines above degree three and
    /// foreign curves are fitted with Hermite cubics. Range and placement
    /// are kept, except that a periodic spline above degree three is first
    /// restricted to the range, so the result spans that restriction's
    /// parameters.
    pub fn to_splines(&self) -> Result<Edge> {
        let curve = self.curve.as_ref().ok_or(TopoError::MissingCurve3d)?;
        let (mut u1, mut u2) = (self.first, self.last);
        let spline = match curve {
            EdgeCurve::BSpline(s) if s.is_periodic() && s.degree() > 3 => {
                let restricted = s.segment(u1, u2, Tolerance::DEFAULT.parametric)?;
                (u1, u2) = restricted.parameter_domain();
                restricted.approximate_cubic(4)?
            }
            EdgeCurve::Line(l) => {
                BSplineCurve::from_segment(l.evaluate(u1), l.evaluate(u2), u1, u2)?
            }
            EdgeCurve::Circle(c) => BSplineCurve::from_circle_arc(c, u1, u2)?,
            EdgeCurve::Ellipse(e) => BSplineCurve::from_ellipse_arc(e, u1, u2)?,
            EdgeCurve::Bezier(b) => b.to_bspline()?.approximate_cubic(4)?,
            EdgeCurve::BSpline(s) => s.approximate_cubic(4)?,
            EdgeCurve::Other(c) => {
                let breaks: Vec<f64> = (0..=SAMPLES)
                    .map(|i| u1 + (u2 - u1) * i as f64 / SAMPLES as f64)
                    .collect();
                hermite_cubic(|u| c.evaluate(u), &breaks)?
            }
        };
        Ok(Edge {
            curve: Some(EdgeCurve::BSpline(spline)),
            polygon: Vec::new(),
            first: u1,
            last: u2,
            location: self.location.clone(),
        })
    }

    /// Bounding box of the placed edge.
    pub fn bounding_box(&self) -> Option<BoundingBox3> {
        match self.curve.as_ref() {
            Some(EdgeCurve::Line(_)) => {
                BoundingBox3::from_points(&[self.start_point(), self.end_point()])
            }
            Some(EdgeCurve::Circle(c)) if self.spans_full_turn() => {
                let c = c.transformed(&self.location);
                Some(conic_box(
                    &c.center,
                    &(c.radius * c.x_dir.as_ref()),
                    &(c.radius * c.y_dir.as_ref()),
                ))
            }
            Some(EdgeCurve::Ellipse(e)) if self.spans_full_turn() => {
                let e = e.transformed(&self.location);
                Some(conic_box(
                    &e.center,
                    &(e.major_radius * e.x_dir.as_ref()),
                    &(e.minor_radius * e.y_dir.as_ref()),
                ))
            }
            _ => BoundingBox3::from_points(&self.sample(SAMPLES)),
        }
    }

    fn spans_full_turn(&self) -> bool {
        (self.last - self.first - std::f64::consts::TAU).abs() < Tolerance::DEFAULT.parametric
    }
}

/// Axis-aligned box of the conic `center + cos(t) xv + sin(t) yv`.
fn conic_box(center: &Point3, xv: &Vec3, yv: &Vec3) -> BoundingBox3 {
    let half = |i: usize| (xv[i] * xv[i] + yv[i] * yv[i]).sqrt();
    let (hx, hy, hz) = (half(0), half(1), half(2));
    BoundingBox3 {
        min: [center.x - hx, center.y - hy, center.z - hz],
        max: [center.x + hx, center.y + hy, center.z + hz],
    }
}

/// Point at fraction `s` of the polygon's vertex sequence.
fn polygon_point(points: &[Point3], s: f64) -> Point3 {
    match points.len() {
        0 => Point3::origin(),
        1 => points[0],
        n => {
            let x = s.clamp(0.0, 1.0) * (n - 1) as f64;
            let i = (x.floor() as usize).min(n - 2);
            let f = x - i as f64;
            points[i] + (points[i + 1] - points[i]) * f
        }
    }
}

/// Degree-one spline through `points`, parameterized by chord length.
fn polyline_spline(points: &[Point3]) -> Result<BSplineCurve> {
    let mut knots = vec![0.0];
    let mut acc = 0.0;
    for w in points.windows(2) {
        acc += (w[1] - w[0]).norm();
        knots.push(acc);
    }
    let mut mults = vec![1; knots.len()];
    mults[0] = 2;
    if let Some(last) = mults.last_mut() {
        *last = 2;
    }
    Ok(BSplineCurve::with_multiplicities(
        points.to_vec(),
        None,
        knots,
        mults,
        1,
        false,
    )?)
}

// =============================================================================
// Curve adaptor
// =============================================================================

/// Read-only view of an edge's curve and trim range.
///
/// Analytic curves are returned already placed in the world. Splines are
/// returned in the edge's local frame; apply [`location`](Self::location)
/// to their poles.
#[derive(Debug, Clone, Copy)]
pub struct CurveAdaptor<'a> {
    edge: &'a Edge,
    curve: &'a EdgeCurve,
}

impl<'a> CurveAdaptor<'a> {
    /// Kind tag of the adapted curve.
    pub fn kind(&self) -> CurveKind {
        self.curve.kind()
    }

    /// First trim parameter.
    pub fn first_parameter(&self) -> f64 {
        self.edge.first
    }

    /// Last trim parameter.
    pub fn last_parameter(&self) -> f64 {
        self.edge.last
    }

    /// Placement applied to the local curve.
    pub fn location(&self) -> &'a Transform {
        &self.edge.location
    }

    /// World line, if the curve is one.
    pub fn line(&self) -> Option<Line3d> {
        match self.curve {
            EdgeCurve::Line(l) => Some(l.transformed(&self.edge.location)),
            _ => None,
        }
    }

    /// World circle, if the curve is one.
    pub fn circle(&self) -> Option<Circle3d> {
        match self.curve {
            EdgeCurve::Circle(c) => Some(c.transformed(&self.edge.location)),
            _ => None,
        }
    }

    /// World ellipse, if the curve is one.
    pub fn ellipse(&self) -> Option<Ellipse3d> {
        match self.curve {
            EdgeCurve::Ellipse(e) => Some(e.transformed(&self.edge.location)),
            _ => None,
        }
    }

    /// Local B-spline, if the curve is one.
    pub fn bspline(&self) -> Option<&'a BSplineCurve> {
        match self.curve {
            EdgeCurve::BSpline(s) => Some(s),
            _ => None,
        }
    }
}

// =============================================================================
// Shape
// =============================================================================

/// A flat collection of edges.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    edges: Vec<Edge>,
}

impl Shape {
    /// Create a shape from edges.
    pub fn new(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    /// The edges, in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Mutable access for in-place repair.
    pub fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    /// Append an edge.
    pub fn push(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Whether the shape has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Apply a placement to every edge.
    pub fn located(self, t: &Transform) -> Self {
        Self {
            edges: self.edges.into_iter().map(|e| e.located(t)).collect(),
        }
    }

    /// Union of the edge bounds; `None` for an empty shape.
    pub fn bounding_box(&self) -> Option<BoundingBox3> {
        self.edges
            .iter()
            .filter_map(Edge::bounding_box)
            .reduce(|a, b| a.union(&b))
    }

    /// Length-weighted centroid of the edges.
    ///
    /// Falls back to the bounding box center when all edges are degenerate.
    pub fn center(&self) -> Option<Point3> {
        let mut total = 0.0;
        let mut acc = Vec3::zeros();
        for edge in &self.edges {
            for w in edge.sample(SAMPLES).windows(2) {
                let len = (w[1] - w[0]).norm();
                let mid = w[0].coords + (w[1] - w[0]) * 0.5;
                acc += mid * len;
                total += len;
            }
        }
        if total > 0.0 {
            Some(Point3::from(acc / total))
        } else {
            self.bounding_box().map(|b| b.center())
        }
    }
}

impl FromIterator<Edge> for Shape {
    fn from_iter<I: IntoIterator<Item = Edge>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<Edge> for Shape {
    fn from(edge: Edge) -> Self {
        Self::new(vec![edge])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    fn square(x0: f64, y0: f64, size: f64) -> Shape {
        let p = [
            Point3::new(x0, y0, 0.0),
            Point3::new(x0 + size, y0, 0.0),
            Point3::new(x0 + size, y0 + size, 0.0),
            Point3::new(x0, y0 + size, 0.0),
        ];
        (0..4).map(|i| Edge::line(p[i], p[(i + 1) % 4])).collect()
    }

    #[test]
    fn test_line_edge_positions() {
        let e = Edge::line(Point3::origin(), Point3::new(2.0, 0.0, 0.0));
        assert_eq!(e.kind(), CurveKind::Line);
        assert_relative_eq!(e.position_at(0.5).x, 1.0);
        assert!(!e.is_closed());
    }

    #[test]
    fn test_full_circle_is_closed() {
        let e = Edge::new(Circle3d::new(Point3::origin(), 1.0));
        assert!(e.is_closed());
        assert_eq!(e.range(), (0.0, TAU));
    }

    #[test]
    fn test_trimmed_validation() {
        let line = Line3d::from_points(Point3::origin(), Point3::new(1.0, 0.0, 0.0));
        assert!(Edge::trimmed(line.clone(), 0.2, 0.8).is_ok());
        assert!(matches!(
            Edge::trimmed(line.clone(), 0.5, 0.5),
            Err(TopoError::InvalidRange { .. })
        ));
        assert!(matches!(
            Edge::trimmed(line, 0.5, 1.5),
            Err(TopoError::Nurbs(NurbsError::ParameterOutOfRange { .. }))
        ));
        let circle = Circle3d::new(Point3::origin(), 1.0);
        assert!(Edge::trimmed(circle, -FRAC_PI_2, FRAC_PI_2).is_ok());
    }

    #[test]
    fn test_location_applies_to_adaptor() {
        let e = Edge::new(Circle3d::new(Point3::origin(), 1.0))
            .located(&Transform::translation(5.0, 0.0, 0.0));
        let c = e.adaptor().unwrap().circle().unwrap();
        assert_relative_eq!(c.center.x, 5.0);
        assert_relative_eq!(e.position_at(0.0).x, 6.0);
    }

    #[test]
    fn test_to_splines_keeps_endpoints() {
        let arc = Edge::trimmed(Circle3d::new(Point3::origin(), 2.0), 0.0, PI)
            .unwrap()
            .located(&Transform::translation(1.0, 1.0, 0.0));
        let s = arc.to_splines().unwrap();
        assert_eq!(s.kind(), CurveKind::BSpline);
        assert!((s.start_point() - arc.start_point()).norm() < 1e-9);
        assert!((s.end_point() - arc.end_point()).norm() < 1e-9);
        let spline = s.adaptor().unwrap().bspline().unwrap();
        assert!(spline.degree() <= 3);
    }

    #[test]
    fn test_to_splines_periodic_quartic_across_seam() {
        let poles = (0..5)
            .map(|i| {
                let a = i as f64 * TAU / 5.0;
                Point3::new(a.cos(), a.sin(), 0.0)
            })
            .collect();
        let quartic = BSplineCurve::with_multiplicities(
            poles,
            None,
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![1; 6],
            4,
            true,
        )
        .unwrap();
        for (first, last) in [(4.0, 6.0), (-1.0, 1.0)] {
            let edge = Edge::trimmed(quartic.clone(), first, last).unwrap();
            let s = edge.to_splines().unwrap();
            let spline = s.adaptor().unwrap().bspline().unwrap();
            assert_eq!(spline.degree(), 3);
            assert_eq!(s.range(), (4.0, 6.0));
            assert!((s.start_point() - edge.start_point()).norm() < 1e-9);
            assert!((s.end_point() - edge.end_point()).norm() < 1e-9);
        }
    }

    #[test]
    fn test_build_curve_3d_from_polygon() {
        let mut e = Edge::from_polygon(vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ]);
        assert!(matches!(e.adaptor(), Err(TopoError::MissingCurve3d)));
        e.build_curve_3d(1e-6).unwrap();
        let s = e.adaptor().unwrap().bspline().unwrap();
        assert_eq!(s.poles().len(), 3);
        assert!((e.end_point() - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_shape_bounds_union() {
        let mut shape = square(0.0, 0.0, 1.0);
        for e in square(5.0, 5.0, 1.0).edges() {
            shape.push(e.clone());
        }
        let bb = shape.bounding_box().unwrap();
        assert_eq!(bb.min, [0.0, 0.0, 0.0]);
        assert_eq!(bb.max, [6.0, 6.0, 0.0]);
    }

    #[test]
    fn test_full_circle_bounds_exact() {
        let tilted = Circle3d::with_normal(Point3::origin(), 1.0, Vec3::new(1.0, 0.0, 1.0));
        let bb = Edge::new(tilted).bounding_box().unwrap();
        assert_relative_eq!(bb.max[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(bb.max[0], 0.5f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_center_of_square() {
        let c = square(0.0, 0.0, 2.0).center().unwrap();
        assert_relative_eq!(c.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(c.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_shape_has_no_bounds() {
        assert!(Shape::default().bounding_box().is_none());
        assert!(Shape::default().center().is_none());
    }
}
