#![warn(missing_docs)]

//! Math types for the vdraft drawing exporter.
//!
//! Thin wrappers around nalgebra: points, vectors, directions, affine
//! placements, axis-aligned bounds and the tolerance constants shared by
//! the geometry and export crates.

use nalgebra::{Matrix4, Unit, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A 4x4 affine transformation matrix.
///
/// Used as the placement ("location") of an edge relative to the curve
/// geometry it references.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Compose: `self` then `other` (self * other).
    ///
    /// Applying the result to a point applies `other` first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation, applies rotation/scale).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Transform a unit direction, renormalizing the result.
    pub fn apply_dir(&self, d: &Dir3) -> Dir3 {
        Dir3::new_normalize(self.apply_vec(d.as_ref()))
    }

    /// Uniform scale factor of the linear part (cube root of the determinant).
    ///
    /// Radii of circles and ellipses are multiplied by this when a placement
    /// is applied to them.
    pub fn scale_factor(&self) -> f64 {
        self.matrix.fixed_view::<3, 3>(0, 0).determinant().abs().cbrt()
    }

    /// Whether this is the identity placement.
    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix4::identity()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Round `value` to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    let rounded = (value * factor).round() / factor;
    // Normalize negative zero so formatted output never shows "-0".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// 3D axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    /// Minimum corner.
    pub min: [f64; 3],
    /// Maximum corner.
    pub max: [f64; 3],
}

impl BoundingBox3 {
    /// Bounding box of a single point.
    pub fn from_point(p: &Point3) -> Self {
        Self {
            min: [p.x, p.y, p.z],
            max: [p.x, p.y, p.z],
        }
    }

    /// Bounding box of a set of points, `None` if the iterator is empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bb = Self::from_point(first);
        for p in iter {
            bb.include_point(p);
        }
        Some(bb)
    }

    /// Expand the box to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        let c = [p.x, p.y, p.z];
        for i in 0..3 {
            self.min[i] = self.min[i].min(c[i]);
            self.max[i] = self.max[i].max(c[i]);
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox3) -> Self {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        Vec3::new(
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        )
    }

    /// Center of the box.
    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        )
    }
}

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in model units.
    pub linear: f64,
    /// Parametric equality tolerance.
    pub parametric: f64,
}

impl Tolerance {
    /// Default tolerances (1e-6 linear, 1e-9 parametric).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        parametric: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if two curve parameters are effectively equal.
    pub fn params_equal(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.parametric
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result.x - 11.0).abs() < 1e-12);
        assert!((result.y - 22.0).abs() < 1e-12);
        assert!((result.z - 33.0).abs() < 1e-12);
    }

    #[test]
    fn test_compose_applies_other_first() {
        let translate = Transform::translation(1.0, 0.0, 0.0);
        let scale = Transform::scale(2.0, 2.0, 2.0);
        // (scale * translate) * p = scale(translate(p))
        let result = scale.then(&translate).apply_point(&Point3::origin());
        assert!((result.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_scale_factor() {
        assert!((Transform::scale(3.0, 3.0, 3.0).scale_factor() - 3.0).abs() < 1e-12);
        assert!((Transform::translation(4.0, 5.0, 6.0).scale_factor() - 1.0).abs() < 1e-12);
        assert!(Transform::identity().is_identity());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456789, 3), 1.235);
        assert_eq!(round_to(-0.0000001, 3), 0.0);
        assert!(round_to(-0.0000001, 3).is_sign_positive());
    }

    #[test]
    fn test_bounding_box_union() {
        let a = BoundingBox3::from_points(&[Point3::origin(), Point3::new(1.0, 1.0, 0.0)]).unwrap();
        let b = BoundingBox3::from_points(&[Point3::new(5.0, 5.0, 0.0), Point3::new(6.0, 6.0, 0.0)])
            .unwrap();
        let u = a.union(&b);
        assert_eq!(u.min, [0.0, 0.0, 0.0]);
        assert_eq!(u.max, [6.0, 6.0, 0.0]);
        assert!((u.size().x - 6.0).abs() < 1e-12);
        assert!(BoundingBox3::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_tolerance() {
        let tol = Tolerance::DEFAULT;
        assert!(tol.points_equal(&Point3::origin(), &Point3::new(1e-7, 0.0, 0.0)));
        assert!(!tol.points_equal(&Point3::origin(), &Point3::new(1e-3, 0.0, 0.0)));
        assert!(tol.params_equal(1.0, 1.0 + 1e-10));
        assert!(!tol.params_equal(1.0, 1.0 + 1e-8));
    }
}
