//! Mapping of 3D points onto the drawing plane.

use vdraft_math::{round_to, Point3, Tolerance};

/// Depth above which a point counts as lying off the drawing plane.
pub const PLANARITY_TOLERANCE: f64 = Tolerance::DEFAULT.linear;

/// A drawing-plane point rounded to the document precision.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Drops the depth of points while counting those that had one.
///
/// One projector serves one conversion pass; the count starts at zero.
#[derive(Debug, Clone)]
pub struct PointProjector {
    precision: u32,
    tolerance: f64,
    non_planar: usize,
}

impl PointProjector {
    pub fn new(precision: u32) -> Self {
        Self::with_tolerance(precision, PLANARITY_TOLERANCE)
    }

    pub fn with_tolerance(precision: u32, tolerance: f64) -> Self {
        Self {
            precision,
            tolerance,
            non_planar: 0,
        }
    }

    /// Rounded `(x, y)` of `p`.
    pub fn project(&mut self, p: &Point3) -> Point2D {
        if p.z.abs() > self.tolerance {
            self.non_planar += 1;
        }
        Point2D::new(round_to(p.x, self.precision), round_to(p.y, self.precision))
    }

    /// Round a scalar (radius, angle) to the projector precision.
    pub fn round(&self, value: f64) -> f64 {
        round_to(value, self.precision)
    }

    /// Points seen with a depth above tolerance.
    pub fn non_planar_count(&self) -> usize {
        self.non_planar
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }
}
