//! Format-independent curve conversion.
//!
//! Both exporters classify an edge with [`CurveClass`] and use the helpers
//! here for angles, sweep direction, and spline data. Only the final
//! primitive is built per format.

use std::f64::consts::PI;

use vdraft_geom::CurveKind;
use vdraft_math::{Point3, Tolerance, Vec3};
use vdraft_nurbs::BSplineCurve;
use vdraft_topo::{Edge, TopoError};

use crate::error::Result;

/// Parametric tolerance used when restricting a curve to an edge range.
pub const SPLIT_TOLERANCE: f64 = Tolerance::DEFAULT.parametric;

/// Normalized parameter at which closed ellipses are split in two.
pub const ELLIPSE_SPLIT: f64 = 0.5;

/// Conversion route for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveClass {
    /// Straight segment.
    Line,
    /// Full circle or circular arc.
    Circle,
    /// Full ellipse or elliptical arc.
    Ellipse,
    /// Everything else, converted through a cubic B-spline.
    Spline,
}

impl From<CurveKind> for CurveClass {
    fn from(kind: CurveKind) -> Self {
        match kind {
            CurveKind::Line => CurveClass::Line,
            CurveKind::Circle => CurveClass::Circle,
            CurveKind::Ellipse => CurveClass::Ellipse,
            CurveKind::Bezier | CurveKind::BSpline | CurveKind::Other => CurveClass::Spline,
        }
    }
}

/// Conversion route for `edge`.
pub fn classify(edge: &Edge) -> CurveClass {
    edge.kind().into()
}

/// Angle of `axis` in the drawing plane, counter-clockwise from +X.
pub fn axis_angle(axis: &Vec3) -> f64 {
    axis.y.atan2(axis.x)
}

/// Start and end angle of a circular arc, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcAngles {
    /// Angle of the arc start, in radians.
    pub start: f64,
    /// Angle of the arc end, in radians.
    pub end: f64,
    /// Whether the arc runs counter-clockwise from `start` to `end`.
    pub ccw: bool,
}

impl ArcAngles {
    /// Same arc described counter-clockwise.
    pub fn to_ccw(self) -> Self {
        if self.ccw {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
                ccw: true,
            }
        }
    }
}

/// Drawing-plane angles of the circle arc `[first, last]`.
///
/// `phi` is the angle of the circle's X axis and `normal_z` the Z component
/// of its normal; a normal facing away from the viewer reverses the sweep.
pub fn circle_arc_angles(phi: f64, normal_z: f64, first: f64, last: f64) -> ArcAngles {
    if normal_z > 0.0 {
        ArcAngles {
            start: phi + first,
            end: phi + last,
            ccw: true,
        }
    } else {
        ArcAngles {
            start: phi - first,
            end: phi - last,
            ccw: false,
        }
    }
}

/// Counter-clockwise parameter range of the ellipse arc `[first, last]`.
pub fn ellipse_parameters(normal_z: f64, first: f64, last: f64) -> (f64, f64) {
    if normal_z > 0.0 {
        (first, last)
    } else {
        (-last, -first)
    }
}

/// Whether an arc spanning `[first, last]` needs the SVG large-arc flag.
pub fn is_large_arc(first: f64, last: f64) -> bool {
    (last - first).abs() > PI
}

/// Whether the edge's curve faces the viewer.
pub fn sweeps_ccw(normal_z: f64) -> bool {
    normal_z > 0.0
}

/// The edge as a cubic-or-lower B-spline restricted to its range and
/// placed in the world.
pub fn extract_spline(edge: &Edge) -> Result<BSplineCurve> {
    let splines = edge.to_splines()?;
    let adaptor = splines.adaptor()?;
    let curve = adaptor
        .bspline()
        .ok_or(TopoError::UnsupportedCurve("spline conversion"))?;
    let restricted = curve.segment(
        adaptor.first_parameter(),
        adaptor.last_parameter(),
        SPLIT_TOLERANCE,
    )?;
    Ok(restricted.transformed(adaptor.location()))
}

/// `items` followed by a copy of its first `pad` entries.
pub fn pad_periodic<T: Clone>(items: &[T], pad: usize) -> Vec<T> {
    items.iter().chain(items.iter().take(pad)).cloned().collect()
}

/// Spline data laid out for consumers without periodic splines.
#[derive(Debug, Clone, PartialEq)]
pub struct SplineData {
    /// Polynomial degree.
    pub degree: usize,
    /// Knot sequence with multiplicities expanded.
    pub knots: Vec<f64>,
    /// Poles with periodic wrap-around copies appended.
    pub poles: Vec<Point3>,
    /// One weight per pole, for rational curves only.
    pub weights: Option<Vec<f64>>,
}

impl SplineData {
    /// Unroll `curve`, padding poles and weights of periodic curves.
    pub fn from_curve(curve: &BSplineCurve) -> Self {
        let pad = curve.periodic_pad();
        let weights = curve
            .weights()
            .filter(|_| curve.is_rational())
            .map(|w| pad_periodic(w, pad));
        Self {
            degree: curve.degree(),
            knots: curve.knot_sequence(),
            poles: pad_periodic(curve.poles(), pad),
            weights,
        }
    }

    /// Spline order, `degree + 1`.
    pub fn order(&self) -> usize {
        self.degree + 1
    }
}
