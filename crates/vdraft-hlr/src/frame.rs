//! Viewing frames and projectors.

use crate::error::{HlrError, Result};
use vdraft_math::{Dir3, Point3, Tolerance, Transform, Vec3};

/// Right-handed viewing frame.
///
/// `direction` points from the model toward the viewer. `x_dir` is
/// `up × direction` and `y_dir` completes the frame, so a drawing made in
/// this frame has `x_dir` to the right and `y_dir` up.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionFrame {
    /// Frame origin (look-at point).
    pub origin: Point3,
    /// Viewing direction, toward the viewer.
    pub direction: Dir3,
    /// Horizontal axis of the drawing.
    pub x_dir: Dir3,
    /// Vertical axis of the drawing.
    pub y_dir: Dir3,
}

impl ProjectionFrame {
    /// Build a frame from a look-from direction and an up vector.
    pub fn new(origin: Point3, look_from: Vec3, look_up: Vec3) -> Result<Self> {
        let direction =
            Dir3::try_new(look_from, 1e-12).ok_or(HlrError::ZeroDirection("look-from"))?;
        let up = Dir3::try_new(look_up, 1e-12).ok_or(HlrError::ZeroDirection("look-up"))?;
        let x_dir = Dir3::try_new(up.as_ref().cross(direction.as_ref()), 1e-9)
            .ok_or(HlrError::DegenerateFrame)?;
        let y_dir = Dir3::new_normalize(direction.as_ref().cross(x_dir.as_ref()));
        Ok(Self {
            origin,
            direction,
            x_dir,
            y_dir,
        })
    }

    /// World-to-view placement: view `x`, `y`, and depth toward the viewer.
    pub fn world_to_view(&self) -> Transform {
        let (x, y, z) = (self.x_dir.as_ref(), self.y_dir.as_ref(), self.direction.as_ref());
        let o = self.origin.coords;
        let mut t = Transform::identity();
        for (row, axis) in [x, y, z].into_iter().enumerate() {
            t.matrix[(row, 0)] = axis.x;
            t.matrix[(row, 1)] = axis.y;
            t.matrix[(row, 2)] = axis.z;
            t.matrix[(row, 3)] = -axis.dot(&o);
        }
        t
    }

    /// Coordinates of `p` in the frame.
    pub fn to_view(&self, p: &Point3) -> Point3 {
        let d = p - self.origin;
        Point3::new(
            d.dot(self.x_dir.as_ref()),
            d.dot(self.y_dir.as_ref()),
            d.dot(self.direction.as_ref()),
        )
    }
}

/// Projection used for hidden-line classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Projector {
    /// Parallel projection along the frame direction.
    Orthographic(ProjectionFrame),
    /// Central projection with the eye at `focus` along the frame direction.
    Perspective {
        /// Viewing frame.
        frame: ProjectionFrame,
        /// Distance from the frame origin to the eye.
        focus: f64,
    },
}

impl Projector {
    /// Orthographic projector, or perspective when `focus` is given.
    pub fn new(frame: ProjectionFrame, focus: Option<f64>) -> Self {
        match focus {
            Some(focus) => Projector::Perspective { frame, focus },
            None => Projector::Orthographic(frame),
        }
    }

    /// The viewing frame.
    pub fn frame(&self) -> &ProjectionFrame {
        match self {
            Projector::Orthographic(frame) => frame,
            Projector::Perspective { frame, .. } => frame,
        }
    }

    /// Whether this is a central projection.
    pub fn is_perspective(&self) -> bool {
        matches!(self, Projector::Perspective { .. })
    }

    /// Project onto the drawing plane (`z = 0`).
    ///
    /// A perspective projector has no image for points on the plane through
    /// the eye.
    pub fn project(&self, p: &Point3) -> Result<Point3> {
        let v = self.frame().to_view(p);
        match self {
            Projector::Orthographic(_) => Ok(Point3::new(v.x, v.y, 0.0)),
            Projector::Perspective { focus, .. } => {
                let depth = focus - v.z;
                if depth.abs() < Tolerance::DEFAULT.linear {
                    return Err(HlrError::OnEyePlane { depth: v.z });
                }
                let s = focus / depth;
                Ok(Point3::new(v.x * s, v.y * s, 0.0))
            }
        }
    }
}
