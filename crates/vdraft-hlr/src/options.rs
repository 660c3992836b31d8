//! Projection options and standard views.

use serde::{Deserialize, Serialize};
use vdraft_math::Vec3;

/// Standard drawing views.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewDirection {
    /// Looking along +Y (XZ plane visible).
    #[default]
    Front,
    /// Looking along -Y.
    Back,
    /// Looking along -Z (XY plane visible).
    Top,
    /// Looking along +Z.
    Bottom,
    /// Looking along -X (YZ plane visible).
    Right,
    /// Looking along +X.
    Left,
    /// Pictorial view from the given azimuth and elevation, in radians.
    Isometric {
        /// Rotation around Z.
        azimuth: f64,
        /// Angle above the XY plane.
        elevation: f64,
    },
}

impl ViewDirection {
    /// 30° azimuth, 30° elevation.
    pub const ISOMETRIC_STANDARD: Self = Self::Isometric {
        azimuth: std::f64::consts::FRAC_PI_6,
        elevation: std::f64::consts::FRAC_PI_6,
    };

    /// Unit vector from the viewer toward the model.
    pub fn view_vector(&self) -> Vec3 {
        match self {
            ViewDirection::Front => Vec3::new(0.0, 1.0, 0.0),
            ViewDirection::Back => Vec3::new(0.0, -1.0, 0.0),
            ViewDirection::Top => Vec3::new(0.0, 0.0, -1.0),
            ViewDirection::Bottom => Vec3::new(0.0, 0.0, 1.0),
            ViewDirection::Right => Vec3::new(-1.0, 0.0, 0.0),
            ViewDirection::Left => Vec3::new(1.0, 0.0, 0.0),
            ViewDirection::Isometric { azimuth, elevation } => {
                let (se, ce) = elevation.sin_cos();
                let (sa, ca) = azimuth.sin_cos();
                Vec3::new(-ce * sa, ce * ca, -se)
            }
        }
    }

    /// Up vector of the drawing.
    pub fn up_vector(&self) -> Vec3 {
        match self {
            ViewDirection::Top => Vec3::new(0.0, 1.0, 0.0),
            ViewDirection::Bottom => Vec3::new(0.0, -1.0, 0.0),
            _ => Vec3::new(0.0, 0.0, 1.0),
        }
    }
}

/// Inputs of a hidden-line projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HlrOptions {
    /// Frame origin; the shape centroid when unset.
    pub look_at: Option<[f64; 3]>,
    /// Direction from the model toward the viewer.
    pub look_from: [f64; 3],
    /// Up direction of the drawing.
    pub look_up: [f64; 3],
    /// Collect hidden edges as well as visible ones.
    pub with_hidden: bool,
    /// Perspective eye distance; orthographic when unset.
    pub focus: Option<f64>,
}

impl Default for HlrOptions {
    fn default() -> Self {
        Self {
            look_at: None,
            look_from: [1.0, -1.0, 1.0],
            look_up: [0.0, 0.0, 1.0],
            with_hidden: true,
            focus: None,
        }
    }
}

impl HlrOptions {
    /// Options for a standard view.
    pub fn from_view(view: ViewDirection) -> Self {
        let from = -view.view_vector();
        let up = view.up_vector();
        Self {
            look_from: [from.x, from.y, from.z],
            look_up: [up.x, up.y, up.z],
            ..Self::default()
        }
    }

    /// Builder-style hidden edge toggle.
    pub fn with_hidden(mut self, with_hidden: bool) -> Self {
        self.with_hidden = with_hidden;
        self
    }

    /// Builder-style perspective focus.
    pub fn with_focus(mut self, focus: f64) -> Self {
        self.focus = Some(focus);
        self
    }

    pub(crate) fn look_from_vec(&self) -> Vec3 {
        Vec3::from(self.look_from)
    }

    pub(crate) fn look_up_vec(&self) -> Vec3 {
        Vec3::from(self.look_up)
    }
}
