#![warn(missing_docs)]

//! Hidden-line projection for the vdraft exporters.
//!
//! Builds a viewing frame from look-at / look-from / look-up vectors,
//! hands the shape to a [`HiddenLineKernel`], and gathers the reported
//! edge sets into a [`Drawing`] of visible and hidden edges ready for
//! 2D export.
//!
//! # Example
//!
//! ```
//! use vdraft_hlr::{project, HlrOptions, ViewDirection, WireframeKernel};
//! use vdraft_math::Point3;
//! use vdraft_topo::{Edge, Shape};
//!
//! let shape = Shape::from(Edge::line(Point3::origin(), Point3::new(1.0, 0.0, 0.0)));
//! let options = HlrOptions::from_view(ViewDirection::Top);
//! let drawing = project(&shape, &options, &WireframeKernel::default()).unwrap();
//! assert_eq!(drawing.visible.len(), 1);
//! ```

pub mod error;
pub mod frame;
pub mod kernel;
pub mod options;

pub use error::{HlrError, Result};
pub use frame::{ProjectionFrame, Projector};
pub use kernel::{HiddenLineKernel, HlrEdgeSet, HlrResult, WireframeKernel};
pub use options::{HlrOptions, ViewDirection};

use tracing::debug;
use vdraft_math::{Point3, Tolerance};
use vdraft_topo::Shape;

/// Tolerance used to rebuild missing 3D curves on projected edges.
pub const CURVE_REPAIR_TOLERANCE: f64 = Tolerance::DEFAULT.linear;

/// Visible and hidden edges of a projected shape.
#[derive(Debug, Clone, Default)]
pub struct Drawing {
    /// Edges seen by the viewer.
    pub visible: Shape,
    /// Occluded edges; empty unless requested.
    pub hidden: Shape,
}

/// Projection frame and projector for `shape` under `options`.
pub fn projector_for(shape: &Shape, options: &HlrOptions) -> Result<Projector> {
    let origin = match options.look_at {
        Some(p) => Point3::from(p),
        None => shape.center().unwrap_or_else(Point3::origin),
    };
    let frame = ProjectionFrame::new(origin, options.look_from_vec(), options.look_up_vec())?;
    Ok(Projector::new(frame, options.focus))
}

/// Project `shape` and collect its visible and hidden edges.
///
/// Every collected edge is given a 3D curve, so the result can go straight
/// to the exporters.
pub fn project(
    shape: &Shape,
    options: &HlrOptions,
    kernel: &dyn HiddenLineKernel,
) -> Result<Drawing> {
    let projector = projector_for(shape, options)?;
    let mut result = kernel.classify(shape, &projector)?;

    let visible = collect(&mut result, &HlrEdgeSet::VISIBLE)?;
    let hidden = if options.with_hidden {
        collect(&mut result, &HlrEdgeSet::HIDDEN)?
    } else {
        Shape::default()
    };

    debug!(
        visible = visible.len(),
        hidden = hidden.len(),
        perspective = projector.is_perspective(),
        "collected hidden-line edge sets"
    );
    Ok(Drawing { visible, hidden })
}

fn collect(result: &mut HlrResult, sets: &[HlrEdgeSet]) -> Result<Shape> {
    let mut out = Shape::default();
    for &set in sets {
        let Some(shape) = result.take(set) else {
            continue;
        };
        for mut edge in shape.edges().iter().cloned() {
            edge.build_curve_3d(CURVE_REPAIR_TOLERANCE)?;
            out.push(edge);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use vdraft_topo::Edge;

    /// Kernel returning a fixed edge per reported set.
    struct FixedKernel {
        sets: Vec<HlrEdgeSet>,
        seen: RefCell<Option<Projector>>,
    }

    impl FixedKernel {
        fn new(sets: Vec<HlrEdgeSet>) -> Self {
            Self {
                sets,
                seen: RefCell::new(None),
            }
        }
    }

    impl HiddenLineKernel for FixedKernel {
        fn classify(&self, _shape: &Shape, projector: &Projector) -> Result<HlrResult> {
            *self.seen.borrow_mut() = Some(projector.clone());
            let mut r = HlrResult::new();
            for (i, &set) in self.sets.iter().enumerate() {
                let x = i as f64;
                let edge = Edge::from_polygon(vec![
                    Point3::new(x, 0.0, 0.0),
                    Point3::new(x, 1.0, 0.0),
                ]);
                r.insert(set, Shape::from(edge));
            }
            Ok(r)
        }
    }

    struct FailingKernel;

    impl HiddenLineKernel for FailingKernel {
        fn classify(&self, _shape: &Shape, _projector: &Projector) -> Result<HlrResult> {
            Err(HlrError::Kernel("no faces".into()))
        }
    }

    fn unit_line() -> Shape {
        Shape::from(Edge::line(Point3::origin(), Point3::new(2.0, 0.0, 0.0)))
    }

    #[test]
    fn test_collects_all_sets() {
        let all = [HlrEdgeSet::VISIBLE.as_slice(), HlrEdgeSet::HIDDEN.as_slice()].concat();
        let kernel = FixedKernel::new(all);
        let d = project(&unit_line(), &HlrOptions::default(), &kernel).unwrap();
        assert_eq!(d.visible.len(), 3);
        assert_eq!(d.hidden.len(), 2);
        assert!(d.visible.edges().iter().all(|e| e.has_curve_3d()));
        assert!(d.hidden.edges().iter().all(|e| e.has_curve_3d()));
    }

    #[test]
    fn test_hidden_skipped_when_not_requested() {
        let kernel = FixedKernel::new(vec![HlrEdgeSet::VisibleSharp, HlrEdgeSet::HiddenSharp]);
        let options = HlrOptions::default().with_hidden(false);
        let d = project(&unit_line(), &options, &kernel).unwrap();
        assert_eq!(d.visible.len(), 1);
        assert!(d.hidden.is_empty());
    }

    #[test]
    fn test_origin_defaults_to_center() {
        let kernel = FixedKernel::new(vec![]);
        project(&unit_line(), &HlrOptions::default(), &kernel).unwrap();
        let seen = kernel.seen.borrow().clone().unwrap();
        assert!((seen.frame().origin - Point3::new(1.0, 0.0, 0.0)).norm() < 1e-9);
        assert!(!seen.is_perspective());
    }

    #[test]
    fn test_focus_selects_perspective() {
        let kernel = FixedKernel::new(vec![]);
        let options = HlrOptions {
            look_at: Some([0.0, 0.0, 0.0]),
            ..HlrOptions::default()
        }
        .with_focus(100.0);
        project(&unit_line(), &options, &kernel).unwrap();
        let seen = kernel.seen.borrow().clone().unwrap();
        assert!(seen.is_perspective());
        assert_eq!(seen.frame().origin, Point3::origin());
    }

    #[test]
    fn test_degenerate_frame() {
        let options = HlrOptions {
            look_from: [0.0, 0.0, 1.0],
            look_up: [0.0, 0.0, 1.0],
            ..HlrOptions::default()
        };
        let err = project(&unit_line(), &options, &WireframeKernel::default()).unwrap_err();
        assert_eq!(err, HlrError::DegenerateFrame);
    }

    #[test]
    fn test_kernel_errors_propagate() {
        let err = project(&unit_line(), &HlrOptions::default(), &FailingKernel).unwrap_err();
        assert!(matches!(err, HlrError::Kernel(_)));
    }

    #[test]
    fn test_perspective_eye_plane_point_fails() {
        let options = HlrOptions {
            look_at: Some([0.0, 0.0, 0.0]),
            look_from: [0.0, 0.0, 1.0],
            look_up: [0.0, 1.0, 0.0],
            ..HlrOptions::default()
        }
        .with_focus(5.0);
        let shape = Shape::from(Edge::line(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 5.0),
        ));
        let err = project(&shape, &options, &WireframeKernel::default()).unwrap_err();
        assert!(matches!(err, HlrError::OnEyePlane { .. }));
    }

    #[test]
    fn test_wireframe_top_view() {
        let options = HlrOptions {
            look_at: Some([0.0, 0.0, 0.0]),
            ..HlrOptions::from_view(ViewDirection::Top)
        };
        let d = project(&unit_line(), &options, &WireframeKernel::default()).unwrap();
        let e = &d.visible.edges()[0];
        assert!((e.end_point() - Point3::new(2.0, 0.0, 0.0)).norm() < 1e-12);
    }
}
