//! The hidden-line kernel seam.
//!
//! Visibility classification is delegated to an implementation of
//! [`HiddenLineKernel`]. The crate ships [`WireframeKernel`], which hides
//! nothing and is useful for previews and tests.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::frame::Projector;
use vdraft_geom::CurveKind;
use vdraft_topo::{Edge, Shape};

/// Edge subsets a kernel may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HlrEdgeSet {
    /// Visible sharp edges.
    VisibleSharp,
    /// Visible smooth (G1) edges.
    VisibleSmooth,
    /// Visible silhouettes of curved faces.
    VisibleOutline,
    /// Hidden sharp edges.
    HiddenSharp,
    /// Hidden silhouettes of curved faces.
    HiddenOutline,
}

impl HlrEdgeSet {
    /// Sets collected as visible output.
    pub const VISIBLE: [HlrEdgeSet; 3] = [
        HlrEdgeSet::VisibleSharp,
        HlrEdgeSet::VisibleSmooth,
        HlrEdgeSet::VisibleOutline,
    ];

    /// Sets collected as hidden output.
    pub const HIDDEN: [HlrEdgeSet; 2] = [HlrEdgeSet::HiddenSharp, HlrEdgeSet::HiddenOutline];
}

/// Edge sets reported by a kernel, in drawing-plane coordinates.
#[derive(Debug, Clone, Default)]
pub struct HlrResult {
    sets: BTreeMap<HlrEdgeSet, Shape>,
}

impl HlrResult {
    /// Empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a set, replacing any previous one.
    pub fn insert(&mut self, set: HlrEdgeSet, shape: Shape) {
        self.sets.insert(set, shape);
    }

    /// A reported set; `None` when the kernel produced nothing for it.
    pub fn get(&self, set: HlrEdgeSet) -> Option<&Shape> {
        self.sets.get(&set)
    }

    /// Remove and return a set.
    pub fn take(&mut self, set: HlrEdgeSet) -> Option<Shape> {
        self.sets.remove(&set)
    }
}

/// Visibility classification of a shape's edges.
pub trait HiddenLineKernel {
    /// Classify `shape` as seen through `projector`.
    ///
    /// Returned edges lie in the drawing plane of the projector frame and
    /// may lack 3D curves.
    fn classify(&self, shape: &Shape, projector: &Projector) -> Result<HlrResult>;
}

/// Kernel that projects every edge as visible and sharp.
#[derive(Debug, Clone, Copy)]
pub struct WireframeKernel {
    /// Samples per curved edge.
    pub samples: usize,
}

impl Default for WireframeKernel {
    fn default() -> Self {
        Self { samples: 64 }
    }
}

impl HiddenLineKernel for WireframeKernel {
    fn classify(&self, shape: &Shape, projector: &Projector) -> Result<HlrResult> {
        let edges = shape
            .edges()
            .iter()
            .map(|edge| match edge.kind() {
                CurveKind::Line if !projector.is_perspective() => Ok(Edge::line(
                    projector.project(&edge.start_point())?,
                    projector.project(&edge.end_point())?,
                )),
                _ => Ok(Edge::from_polygon(
                    edge.sample(self.samples)
                        .iter()
                        .map(|p| projector.project(p))
                        .collect::<Result<_>>()?,
                )),
            })
            .collect::<Result<Vec<_>>>()?;
        let mut result = HlrResult::new();
        result.insert(HlrEdgeSet::VisibleSharp, Shape::new(edges));
        Ok(result)
    }
}
