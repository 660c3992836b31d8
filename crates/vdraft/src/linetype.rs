//! Dash-pattern catalog.
//!
//! Patterns are stored in tenths of an inch. The first element is the
//! pattern period (sum of the absolute segment lengths), followed by the
//! segments: positive values are dashes, negative values gaps, and zero a
//! dot.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::units::Unit;

/// Normalize segment lengths given in millimetres into a catalog pattern.
///
/// Prepends the period and expresses every element in tenths of an inch.
pub fn build_dash_pattern(lengths: &[f64]) -> Vec<f64> {
    let period: f64 = lengths.iter().map(|v| v.abs()).sum();
    std::iter::once(period)
        .chain(lengths.iter().copied())
        .map(|v| v / 2.54)
        .collect()
}

/// A named dash pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct DashPattern {
    pub name: String,
    pub description: String,
    /// Period followed by segments, in tenths of an inch.
    pub lengths: Vec<f64>,
}

impl DashPattern {
    /// Total length of one repetition.
    pub fn period(&self) -> f64 {
        self.lengths.first().copied().unwrap_or(0.0)
    }

    /// Signed segment lengths without the period header.
    pub fn segments(&self) -> &[f64] {
        self.lengths.get(1..).unwrap_or(&[])
    }

    /// A pattern without segments draws a solid line.
    pub fn is_continuous(&self) -> bool {
        self.segments().is_empty()
    }
}

/// Dash array to emit for `pattern` on a layer drawn in `unit` with the
/// given line weight.
///
/// Segment lengths become absolute and scale with the stroke, so a thicker
/// line gets proportionally longer dashes.
pub fn scale_pattern_for_output(pattern: &DashPattern, unit: Unit, line_weight: f64) -> Vec<f64> {
    let factor = unit.line_type_scale() * line_weight;
    pattern.segments().iter().map(|v| factor * v.abs()).collect()
}

macro_rules! catalog {
    (
        $(#[$meta:meta])*
        $ty:ident {
            $( $variant:ident => $name:literal, $desc:literal, [$($len:expr),* $(,)?]; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $ty {
            $( $variant, )*
        }

        impl $ty {
            /// Every entry of the catalog.
            pub const ALL: &'static [$ty] = &[$( $ty::$variant, )*];

            /// Line-type name as written to CAD files.
            pub fn name(self) -> &'static str {
                match self {
                    $( $ty::$variant => $name, )*
                }
            }

            /// Human-readable description with an ASCII sketch.
            pub fn description(self) -> &'static str {
                match self {
                    $( $ty::$variant => $desc, )*
                }
            }

            fn raw_lengths(self) -> &'static [f64] {
                match self {
                    $( $ty::$variant => &[$($len),*], )*
                }
            }

            /// Look an entry up by its exact name.
            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|t| t.name() == name)
            }
        }
    };
}

catalog! {
    /// Simple repeating patterns, already given in tenths of an inch.
    AnsiLineType {
        Continuous => "CONTINUOUS", "Solid", [0.0];
        Center => "CENTER", "Center ____ _ ____ _ ____ _ ____ _ ____ _ ____",
            [2.0, 1.25, -0.25, 0.25, -0.25];
        CenterX2 => "CENTERX2", "Center (2x) ________  __  ________  __  _____",
            [3.5, 2.5, -0.25, 0.5, -0.25];
        Center2 => "CENTER2", "Center (.5x) ____ _ ____ _ ____ _ ____ _ ____",
            [1.0, 0.625, -0.125, 0.125, -0.125];
        Dashed => "DASHED", "Dashed __ __ __ __ __ __ __ __ __ __ __ __ __ _",
            [0.6, 0.5, -0.1];
        DashedX2 => "DASHEDX2", "Dashed (2x) ____  ____  ____  ____  ____  ___",
            [1.2, 1.0, -0.2];
        Dashed2 => "DASHED2", "Dashed (.5x) _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _ _",
            [0.3, 0.25, -0.05];
        Phantom => "PHANTOM", "Phantom ______  __  __  ______  __  __  ______",
            [2.5, 1.25, -0.25, 0.25, -0.25, 0.25, -0.25];
        PhantomX2 => "PHANTOMX2", "Phantom (2x)____________    ____    ____    _",
            [4.25, 2.5, -0.25, 0.5, -0.25, 0.5, -0.25];
        Phantom2 => "PHANTOM2", "Phantom (.5x) ___ _ _ ___ _ _ ___ _ _ ___ _ _",
            [1.25, 0.625, -0.125, 0.125, -0.125, 0.125, -0.125];
        DashDot => "DASHDOT", "Dash dot __ . __ . __ . __ . __ . __ . __ . __",
            [1.4, 1.0, -0.2, 0.0, -0.2];
        DashDotX2 => "DASHDOTX2", "Dash dot (2x) ____  .  ____  .  ____  .  ____",
            [2.4, 2.0, -0.2, 0.0, -0.2];
        DashDot2 => "DASHDOT2", "Dash dot (.5x) _ . _ . _ . _ . _ . _ . _ . _",
            [0.7, 0.5, -0.1, 0.0, -0.1];
        Dot => "DOT", "Dot .  .  .  .  .  .  .  .  .  .  .  .  .  .  .",
            [0.2, 0.0, -0.2];
        DotX2 => "DOTX2", "Dot (2x) .    .    .    .    .    .    .    .",
            [0.4, 0.0, -0.4];
        Dot2 => "DOT2", "Dot (.5x) . . . . . . . . . . . . . . . . . . .",
            [0.1, 0.0, -0.1];
        Divide => "DIVIDE", "Divide __ . . __ . . __ . . __ . . __ . . __",
            [1.6, 1.0, -0.2, 0.0, -0.2, 0.0, -0.2];
        DivideX2 => "DIVIDEX2", "Divide (2x) ____  . .  ____  . .  ____  . .  ____",
            [2.6, 2.0, -0.2, 0.0, -0.2, 0.0, -0.2];
        Divide2 => "DIVIDE2", "Divide (.5x) __..__..__..__..__..__..__..__.._",
            [0.8, 0.5, -0.1, 0.0, -0.1, 0.0, -0.1];
    }
}

catalog! {
    /// ISO 128 patterns for a 1 mm pen, segment lengths in millimetres.
    IsoLineType {
        Dash => "ACAD_ISO02W100",
            "ISO dash __ __ __ __ __ __ __ __ __ __ __ __ __",
            [12.0, -3.0];
        DashSpace => "ACAD_ISO03W100",
            "ISO dash space __    __    __    __    __    __",
            [12.0, -18.0];
        LongDashDot => "ACAD_ISO04W100",
            "ISO long-dash dot ____ . ____ . ____ . ____ . _",
            [24.0, -3.0, 0.0, -3.0];
        LongDashDoubleDot => "ACAD_ISO05W100",
            "ISO long-dash double-dot ____ .. ____ .. ____ . ",
            [24.0, -3.0, 0.0, -3.0, 0.0, -3.0];
        LongDashTripleDot => "ACAD_ISO06W100",
            "ISO long-dash triple-dot ____ ... ____ ... ____",
            [24.0, -3.0, 0.0, -3.0, 0.0, -3.0, 0.0, -3.0];
        Dot => "ACAD_ISO07W100",
            "ISO dot . . . . . . . . . . . . . . . . . . . . ",
            [0.0, -3.0];
        LongDashShortDash => "ACAD_ISO08W100",
            "ISO long-dash short-dash ____ __ ____ __ ____ _",
            [24.0, -3.0, 6.0, -3.0];
        LongDashDoubleShortDash => "ACAD_ISO09W100",
            "ISO long-dash double-short-dash ____ __ __ ____",
            [24.0, -3.0, 6.0, -3.0, 6.0, -3.0];
        DashDot => "ACAD_ISO10W100",
            "ISO dash dot __ . __ . __ . __ . __ . __ . __ . ",
            [12.0, -3.0, 0.0, -3.0];
        DoubleDashDot => "ACAD_ISO11W100",
            "ISO double-dash dot __ __ . __ __ . __ __ . __ _",
            [12.0, -3.0, 12.0, -3.0, 0.0, -3.0];
        DashDoubleDot => "ACAD_ISO12W100",
            "ISO dash double-dot __ . . __ . . __ . . __ . . ",
            [12.0, -3.0, 0.0, -3.0, 0.0, -3.0];
        DoubleDashDoubleDot => "ACAD_ISO13W100",
            "ISO double-dash double-dot __ __ . . __ __ . . _",
            [12.0, -3.0, 12.0, -3.0, 0.0, -3.0, 0.0, -3.0];
        DashTripleDot => "ACAD_ISO14W100",
            "ISO dash triple-dot __ . . . __ . . . __ . . . _",
            [12.0, -3.0, 0.0, -3.0, 0.0, -3.0, 0.0, -3.0];
        DoubleDashTripleDot => "ACAD_ISO15W100",
            "ISO double-dash triple-dot __ __ . . . __ __ . .",
            [12.0, -3.0, 12.0, -3.0, 0.0, -3.0, 0.0, -3.0, 0.0, -3.0];
    }
}

impl AnsiLineType {
    /// Catalog pattern in tenths of an inch.
    pub fn pattern(self) -> DashPattern {
        DashPattern {
            name: self.name().to_string(),
            description: self.description().to_string(),
            lengths: self.raw_lengths().to_vec(),
        }
    }
}

impl IsoLineType {
    /// Catalog pattern in tenths of an inch.
    pub fn pattern(self) -> DashPattern {
        DashPattern {
            name: self.name().to_string(),
            description: self.description().to_string(),
            lengths: build_dash_pattern(self.raw_lengths()),
        }
    }
}

/// Reference to a line type by catalog entry or custom name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LineType {
    Ansi(AnsiLineType),
    Iso(IsoLineType),
    /// Pattern registered on a document under this name.
    Custom(String),
}

impl Default for LineType {
    fn default() -> Self {
        LineType::Ansi(AnsiLineType::Continuous)
    }
}

impl LineType {
    /// Name the line type is declared under.
    pub fn name(&self) -> &str {
        match self {
            LineType::Ansi(t) => t.name(),
            LineType::Iso(t) => t.name(),
            LineType::Custom(name) => name,
        }
    }

    /// Whether this is the solid catalog line type.
    pub fn is_continuous(&self) -> bool {
        matches!(self, LineType::Ansi(AnsiLineType::Continuous))
    }

    /// Catalog entry named `name`, or a custom reference.
    ///
    /// Catalog names match case-insensitively.
    pub fn from_name(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        if let Some(t) = AnsiLineType::from_name(&upper) {
            LineType::Ansi(t)
        } else if let Some(t) = IsoLineType::from_name(&upper) {
            LineType::Iso(t)
        } else {
            LineType::Custom(name.to_string())
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for LineType {
    fn from(name: &str) -> Self {
        LineType::from_name(name)
    }
}

impl From<String> for LineType {
    fn from(name: String) -> Self {
        LineType::from_name(&name)
    }
}

impl From<LineType> for String {
    fn from(t: LineType) -> Self {
        t.name().to_string()
    }
}

impl From<AnsiLineType> for LineType {
    fn from(t: AnsiLineType) -> Self {
        LineType::Ansi(t)
    }
}

impl From<IsoLineType> for LineType {
    fn from(t: IsoLineType) -> Self {
        LineType::Iso(t)
    }
}

/// Catalog plus the custom patterns registered on one document.
#[derive(Debug, Clone, Default)]
pub struct LineTypeTable {
    custom: Vec<DashPattern>,
}

impl LineTypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom pattern from segment lengths in millimetres.
    ///
    /// Fails if the name is taken by the catalog or an earlier registration.
    pub fn register(&mut self, name: &str, description: &str, lengths: &[f64]) -> Result<LineType> {
        if !matches!(LineType::from_name(name), LineType::Custom(_))
            || self.custom.iter().any(|p| p.name == name)
        {
            return Err(ExportError::DuplicateLineType(name.to_string()));
        }
        debug!(name, segments = lengths.len(), "registered custom line type");
        self.custom.push(DashPattern {
            name: name.to_string(),
            description: description.to_string(),
            lengths: build_dash_pattern(lengths),
        });
        Ok(LineType::Custom(name.to_string()))
    }

    /// Pattern behind a line-type reference.
    pub fn resolve(&self, line_type: &LineType) -> Result<DashPattern> {
        match line_type {
            LineType::Ansi(t) => Ok(t.pattern()),
            LineType::Iso(t) => Ok(t.pattern()),
            LineType::Custom(name) => self
                .custom
                .iter()
                .find(|p| &p.name == name)
                .cloned()
                .ok_or_else(|| ExportError::UnknownLineType(name.clone())),
        }
    }

    /// Whether `line_type` resolves in this table.
    pub fn contains(&self, line_type: &LineType) -> bool {
        self.resolve(line_type).is_ok()
    }
}
