//! Color indices and the default drawing style.

use serde::{Deserialize, Serialize};

use crate::linetype::LineType;

/// Drawing color, numbered like the first nine CAD color indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorIndex {
    Red = 1,
    Yellow = 2,
    Green = 3,
    Cyan = 4,
    Blue = 5,
    Magenta = 6,
    /// Index 7; rendered black on paper.
    #[default]
    Black = 7,
    Gray = 8,
    #[serde(alias = "light_gray")]
    LightGray = 9,
}

impl ColorIndex {
    /// CAD color index, 1 to 9.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Color for a CAD index, if it is in the palette.
    pub fn from_index(index: u8) -> Option<Self> {
        Some(match index {
            1 => Self::Red,
            2 => Self::Yellow,
            3 => Self::Green,
            4 => Self::Cyan,
            5 => Self::Blue,
            6 => Self::Magenta,
            7 => Self::Black,
            8 => Self::Gray,
            9 => Self::LightGray,
            _ => return None,
        })
    }

    /// Screen RGB of the color.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Red => (255, 0, 0),
            Self::Yellow => (255, 255, 0),
            Self::Green => (0, 255, 0),
            Self::Cyan => (0, 255, 255),
            Self::Blue => (0, 0, 255),
            Self::Magenta => (255, 0, 255),
            Self::Black => (0, 0, 0),
            Self::Gray => (65, 65, 65),
            Self::LightGray => (128, 128, 128),
        }
    }
}

/// Line weight in millimetres used when a layer does not give one.
pub const DEFAULT_LINE_WEIGHT: f64 = 0.09;

/// Color, weight, and line type of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// Stroke color.
    pub color: ColorIndex,
    /// Line weight in millimetres.
    pub line_weight: f64,
    /// Dash pattern of the stroke.
    pub line_type: LineType,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: ColorIndex::Black,
            line_weight: DEFAULT_LINE_WEIGHT,
            line_type: LineType::default(),
        }
    }
}

impl Style {
    /// Default style with the given overrides applied.
    pub fn with_overrides(
        color: Option<ColorIndex>,
        line_weight: Option<f64>,
        line_type: Option<LineType>,
    ) -> Self {
        let d = Self::default();
        Self {
            color: color.unwrap_or(d.color),
            line_weight: line_weight.unwrap_or(d.line_weight),
            line_type: line_type.unwrap_or(d.line_type),
        }
    }
}
