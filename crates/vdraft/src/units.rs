//! Length units and their conversion factors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

/// Drawing length unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Unit {
    /// Micrometre.
    #[serde(rename = "micro", alias = "um")]
    Micro,
    /// Millimetre.
    #[default]
    #[serde(rename = "mm")]
    Millimeter,
    /// Centimetre.
    #[serde(rename = "cm")]
    Centimeter,
    /// Metre.
    #[serde(rename = "m")]
    Meter,
    /// Inch.
    #[serde(rename = "inch", alias = "in")]
    Inch,
    /// Foot.
    #[serde(rename = "foot", alias = "ft")]
    Foot,
}

impl Unit {
    /// Every unit, smallest first.
    pub const ALL: [Unit; 6] = [
        Unit::Micro,
        Unit::Millimeter,
        Unit::Centimeter,
        Unit::Inch,
        Unit::Foot,
        Unit::Meter,
    ];

    /// How many of this unit make one metre.
    pub fn units_per_meter(self) -> f64 {
        match self {
            Unit::Micro => 1e6,
            Unit::Millimeter => 1000.0,
            Unit::Centimeter => 100.0,
            Unit::Meter => 1.0,
            Unit::Inch => 100.0 / 2.54,
            Unit::Foot => 100.0 / (12.0 * 2.54),
        }
    }

    /// Canonical short name.
    pub fn name(self) -> &'static str {
        match self {
            Unit::Micro => "micro",
            Unit::Millimeter => "mm",
            Unit::Centimeter => "cm",
            Unit::Meter => "m",
            Unit::Inch => "inch",
            Unit::Foot => "foot",
        }
    }

    /// Whether the unit belongs to the metric system.
    pub fn is_metric(self) -> bool {
        matches!(self, Unit::Millimeter | Unit::Centimeter | Unit::Meter)
    }

    /// Factor converting line-type catalog lengths (tenths of an inch,
    /// expressed through millimetres) into this unit.
    pub fn line_type_scale(self) -> f64 {
        2.54 * unit_conversion_scale(Unit::Millimeter, self)
    }

    /// `$INSUNITS` code of the unit.
    pub fn dxf_code(self) -> u8 {
        match self {
            Unit::Micro => 13,
            Unit::Millimeter => 4,
            Unit::Centimeter => 5,
            Unit::Meter => 6,
            Unit::Inch => 1,
            Unit::Foot => 2,
        }
    }

    /// Length suffix accepted by SVG, if any.
    pub fn svg_suffix(self) -> Option<&'static str> {
        match self {
            Unit::Millimeter => Some("mm"),
            Unit::Centimeter => Some("cm"),
            Unit::Inch => Some("in"),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Unit {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "micro" | "um" | "µm" => Ok(Unit::Micro),
            "mm" | "millimeter" => Ok(Unit::Millimeter),
            "cm" | "centimeter" => Ok(Unit::Centimeter),
            "m" | "meter" => Ok(Unit::Meter),
            "inch" | "in" => Ok(Unit::Inch),
            "foot" | "ft" => Ok(Unit::Foot),
            _ => Err(ExportError::UnknownUnit(s.to_string())),
        }
    }
}

/// Factor converting a length in `from` into `to`.
pub fn unit_conversion_scale(from: Unit, to: Unit) -> f64 {
    to.units_per_meter() / from.units_per_meter()
}

/// [`unit_conversion_scale`] for unit names.
pub fn unit_conversion_scale_by_name(from: &str, to: &str) -> Result<f64> {
    Ok(unit_conversion_scale(from.parse()?, to.parse()?))
}
