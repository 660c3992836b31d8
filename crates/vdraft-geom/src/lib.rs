#![warn(missing_docs)]

//! Analytic curve types for the vdraft geometry kernel.
//!
//! Provides the [`Curve3d`] trait and the analytic curves that the drawing
//! exporter converts natively: lines, circles and ellipses. Free-form
//! curves live in `vdraft-nurbs`.

use std::f64::consts::PI;
use vdraft_math::{Dir3, Point3, Transform, Vec3};

// =============================================================================
// Curve trait
// =============================================================================

/// The kind of a curve as reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    /// Straight line.
    Line,
    /// Circle.
    Circle,
    /// Ellipse.
    Ellipse,
    /// Single-span Bezier curve.
    Bezier,
    /// B-spline or NURBS curve.
    BSpline,
    /// Any other parametric curve (offset, swept, projected ...).
    Other,
}

/// A parametric curve in 3D space.
pub trait Curve3d: Send + Sync + std::fmt::Debug {
    /// Evaluate the curve at parameter `t` to get a 3D point.
    fn evaluate(&self, t: f64) -> Point3;

    /// Tangent vector at parameter `t`.
    fn tangent(&self, t: f64) -> Vec3;

    /// Parameter domain `(t_min, t_max)`.
    fn domain(&self) -> (f64, f64);

    /// The kind of this curve.
    fn curve_type(&self) -> CurveKind;

    /// Whether the parametrization wraps around with the period of the domain.
    fn is_periodic(&self) -> bool {
        false
    }

    /// Clone into a boxed trait object.
    fn clone_box(&self) -> Box<dyn Curve3d>;
}

impl Clone for Box<dyn Curve3d> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Pick an in-plane reference direction perpendicular to `n`.
fn perpendicular(n: &Dir3) -> Dir3 {
    // Keep +X as the reference for curves lying in the XY plane.
    let seed = if n.as_ref().z.abs() > 0.9 {
        Vec3::x()
    } else {
        Vec3::z().cross(n.as_ref())
    };
    Dir3::new_normalize(seed - seed.dot(n.as_ref()) * n.as_ref())
}

// =============================================================================
// Line3d
// =============================================================================

/// A 3D line defined by origin and direction.
///
/// Parameterization: `P(t) = origin + t * direction`
#[derive(Debug, Clone)]
pub struct Line3d {
    /// Starting point.
    pub origin: Point3,
    /// Direction; its length sets the parametric speed.
    pub direction: Vec3,
}

impl Line3d {
    /// Create a line from two endpoints, parameterized so `t=0` gives `start` and `t=1` gives `end`.
    pub fn from_points(start: Point3, end: Point3) -> Self {
        Self {
            origin: start,
            direction: end - start,
        }
    }

    /// Apply a placement to this line.
    pub fn transformed(&self, t: &Transform) -> Self {
        Self {
            origin: t.apply_point(&self.origin),
            direction: t.apply_vec(&self.direction),
        }
    }
}

impl Curve3d for Line3d {
    fn evaluate(&self, t: f64) -> Point3 {
        self.origin + t * self.direction
    }

    fn tangent(&self, _t: f64) -> Vec3 {
        self.direction
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn curve_type(&self) -> CurveKind {
        CurveKind::Line
    }

    fn clone_box(&self) -> Box<dyn Curve3d> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Circle3d
// =============================================================================

/// A circle in 3D space defined by center, normal, and radius.
///
/// Parameterization: `P(t) = center + radius * (cos(t) * x_dir + sin(t) * y_dir)`
///
/// Where `t ∈ [0, 2π)`. `y_dir = normal × x_dir`, so the parameter runs
/// counter-clockwise when seen from the tip of `normal`.
#[derive(Debug, Clone)]
pub struct Circle3d {
    /// Center of the circle.
    pub center: Point3,
    /// Radius.
    pub radius: f64,
    /// Reference direction for t=0.
    pub x_dir: Dir3,
    /// Second in-plane direction (perpendicular to x_dir and normal).
    pub y_dir: Dir3,
    /// Normal to the circle plane.
    pub normal: Dir3,
}

impl Circle3d {
    /// Create a circle in the XY plane centered at the given point.
    pub fn new(center: Point3, radius: f64) -> Self {
        Self {
            center,
            radius,
            x_dir: Dir3::new_normalize(Vec3::x()),
            y_dir: Dir3::new_normalize(Vec3::y()),
            normal: Dir3::new_normalize(Vec3::z()),
        }
    }

    /// Create a circle with a custom normal direction.
    pub fn with_normal(center: Point3, radius: f64, normal: Vec3) -> Self {
        let n = Dir3::new_normalize(normal);
        let x = perpendicular(&n);
        Self::with_axes(center, radius, *n.as_ref(), *x.as_ref())
    }

    /// Create a circle from its normal and the reference direction for `t = 0`.
    ///
    /// `x_dir` is projected into the plane of the circle.
    pub fn with_axes(center: Point3, radius: f64, normal: Vec3, x_dir: Vec3) -> Self {
        let n = Dir3::new_normalize(normal);
        let x = Dir3::new_normalize(x_dir - x_dir.dot(n.as_ref()) * n.as_ref());
        let y = Dir3::new_normalize(n.as_ref().cross(x.as_ref()));
        Self {
            center,
            radius,
            x_dir: x,
            y_dir: y,
            normal: n,
        }
    }

    /// Apply a placement to this circle.
    pub fn transformed(&self, t: &Transform) -> Self {
        let x = t.apply_vec(self.x_dir.as_ref());
        let y = t.apply_vec(self.y_dir.as_ref());
        Self {
            center: t.apply_point(&self.center),
            radius: self.radius * t.scale_factor(),
            x_dir: Dir3::new_normalize(x),
            y_dir: Dir3::new_normalize(y),
            normal: Dir3::new_normalize(x.cross(&y)),
        }
    }
}

impl Curve3d for Circle3d {
    fn evaluate(&self, t: f64) -> Point3 {
        let (sin_t, cos_t) = t.sin_cos();
        self.center + self.radius * (cos_t * self.x_dir.as_ref() + sin_t * self.y_dir.as_ref())
    }

    fn tangent(&self, t: f64) -> Vec3 {
        let (sin_t, cos_t) = t.sin_cos();
        self.radius * (-sin_t * self.x_dir.as_ref() + cos_t * self.y_dir.as_ref())
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 2.0 * PI)
    }

    fn curve_type(&self) -> CurveKind {
        CurveKind::Circle
    }

    fn is_periodic(&self) -> bool {
        true
    }

    fn clone_box(&self) -> Box<dyn Curve3d> {
        Box::new(self.clone())
    }
}

// =============================================================================
// Ellipse3d
// =============================================================================

/// An ellipse in 3D space.
///
/// Parameterization:
/// `P(t) = center + major_radius * cos(t) * x_dir + minor_radius * sin(t) * y_dir`
///
/// `x_dir` is the major axis direction.
#[derive(Debug, Clone)]
pub struct Ellipse3d {
    /// Center of the ellipse.
    pub center: Point3,
    /// Semi-major axis length.
    pub major_radius: f64,
    /// Semi-minor axis length.
    pub minor_radius: f64,
    /// Major axis direction (t = 0).
    pub x_dir: Dir3,
    /// Minor axis direction (`normal × x_dir`).
    pub y_dir: Dir3,
    /// Normal to the ellipse plane.
    pub normal: Dir3,
}

impl Ellipse3d {
    /// Create an ellipse in the XY plane with the major axis along `major_dir`.
    pub fn new(center: Point3, major_radius: f64, minor_radius: f64, major_dir: Vec3) -> Self {
        Self::with_axes(center, major_radius, minor_radius, Vec3::z(), major_dir)
    }

    /// Create an ellipse from its normal and major-axis direction.
    pub fn with_axes(
        center: Point3,
        major_radius: f64,
        minor_radius: f64,
        normal: Vec3,
        major_dir: Vec3,
    ) -> Self {
        let n = Dir3::new_normalize(normal);
        let x = Dir3::new_normalize(major_dir - major_dir.dot(n.as_ref()) * n.as_ref());
        let y = Dir3::new_normalize(n.as_ref().cross(x.as_ref()));
        Self {
            center,
            major_radius,
            minor_radius,
            x_dir: x,
            y_dir: y,
            normal: n,
        }
    }

    /// Major axis as a vector from the center to the `t = 0` vertex.
    pub fn major_axis(&self) -> Vec3 {
        self.major_radius * self.x_dir.as_ref()
    }

    /// Apply a placement to this ellipse.
    pub fn transformed(&self, t: &Transform) -> Self {
        let x = t.apply_vec(self.x_dir.as_ref());
        let y = t.apply_vec(self.y_dir.as_ref());
        let s = t.scale_factor();
        Self {
            center: t.apply_point(&self.center),
            major_radius: self.major_radius * s,
            minor_radius: self.minor_radius * s,
            x_dir: Dir3::new_normalize(x),
            y_dir: Dir3::new_normalize(y),
            normal: Dir3::new_normalize(x.cross(&y)),
        }
    }
}

impl Curve3d for Ellipse3d {
    fn evaluate(&self, t: f64) -> Point3 {
        let (sin_t, cos_t) = t.sin_cos();
        self.center
            + self.major_radius * cos_t * self.x_dir.as_ref()
            + self.minor_radius * sin_t * self.y_dir.as_ref()
    }

    fn tangent(&self, t: f64) -> Vec3 {
        let (sin_t, cos_t) = t.sin_cos();
        -self.major_radius * sin_t * self.x_dir.as_ref()
            + self.minor_radius * cos_t * self.y_dir.as_ref()
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 2.0 * PI)
    }

    fn curve_type(&self) -> CurveKind {
        CurveKind::Ellipse
    }

    fn is_periodic(&self) -> bool {
        true
    }

    fn clone_box(&self) -> Box<dyn Curve3d> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line3d() {
        let line = Line3d::from_points(Point3::origin(), Point3::new(10.0, 0.0, 0.0));
        let mid = line.evaluate(0.5);
        assert!((mid.x - 5.0).abs() < 1e-12);
        assert_eq!(line.curve_type(), CurveKind::Line);
    }

    #[test]
    fn test_circle3d() {
        let circle = Circle3d::new(Point3::origin(), 5.0);
        let pt = circle.evaluate(0.0);
        assert!((pt.x - 5.0).abs() < 1e-12);
        let pt90 = circle.evaluate(PI / 2.0);
        assert!(pt90.x.abs() < 1e-12);
        assert!((pt90.y - 5.0).abs() < 1e-12);
        assert!(circle.is_periodic());
    }

    #[test]
    fn test_circle_flipped_normal_runs_clockwise() {
        let circle = Circle3d::with_axes(Point3::origin(), 1.0, -Vec3::z(), Vec3::x());
        let pt90 = circle.evaluate(PI / 2.0);
        assert!((pt90.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_circle_with_normal_is_orthonormal() {
        let circle = Circle3d::with_normal(Point3::origin(), 2.0, Vec3::new(1.0, 1.0, 0.0));
        assert!(circle.x_dir.dot(&circle.normal).abs() < 1e-12);
        assert!(circle.y_dir.dot(&circle.normal).abs() < 1e-12);
        assert!(circle.x_dir.dot(&circle.y_dir).abs() < 1e-12);
    }

    #[test]
    fn test_circle_transform() {
        let circle = Circle3d::new(Point3::origin(), 1.0);
        let t = Transform::translation(3.0, 0.0, 0.0).then(&Transform::scale(2.0, 2.0, 2.0));
        let moved = circle.transformed(&t);
        assert!((moved.radius - 2.0).abs() < 1e-12);
        let p = moved.evaluate(0.0);
        assert!((p.x - 5.0).abs() < 1e-12);
        assert!((moved.normal.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ellipse3d() {
        let e = Ellipse3d::new(Point3::new(1.0, 1.0, 0.0), 4.0, 2.0, Vec3::x());
        let p0 = e.evaluate(0.0);
        assert!((p0.x - 5.0).abs() < 1e-12);
        let p90 = e.evaluate(PI / 2.0);
        assert!((p90.y - 3.0).abs() < 1e-12);
        assert!((e.major_axis().x - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_ellipse_tangent() {
        let e = Ellipse3d::new(Point3::origin(), 4.0, 2.0, Vec3::x());
        let t = e.tangent(0.0);
        assert!(t.x.abs() < 1e-12);
        assert!((t.y - 2.0).abs() < 1e-12);
    }
}
