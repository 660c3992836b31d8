//! Export settings, loadable from TOML.
//!
//! ```toml
//! [hlr]
//! look_from = [0.0, 0.0, 1.0]
//! look_up = [0.0, 1.0, 0.0]
//! with_hidden = false
//!
//! [svg]
//! unit = "mm"
//! scale = 2.0
//! margin = 5.0
//!
//! [dxf]
//! unit = "inch"
//! line_type = "DASHED"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use vdraft_hlr::HlrOptions;

use crate::color::ColorIndex;
use crate::error::{ExportError, Result};
use crate::linetype::LineType;
use crate::units::Unit;

/// Decimal places allowed for rounded output.
const MAX_PRECISION: u32 = 15;

/// DXF drawing parameters.
///
/// The style fields restyle layer `"0"` when any of them is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DxfSettings {
    /// Drawing unit written to `$INSUNITS`.
    pub unit: Unit,
    /// Color of layer `"0"`.
    pub color: Option<ColorIndex>,
    /// Line weight in millimetres.
    pub line_weight: Option<f64>,
    /// Line type of layer `"0"`.
    pub line_type: Option<LineType>,
    /// Decimal places of written coordinates.
    pub precision: u32,
}

impl Default for DxfSettings {
    fn default() -> Self {
        Self {
            unit: Unit::Millimeter,
            color: None,
            line_weight: None,
            line_type: None,
            precision: 6,
        }
    }
}

impl DxfSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        validate_precision(self.precision)?;
        validate_line_weight(self.line_weight)
    }

    pub(crate) fn has_style_overrides(&self) -> bool {
        self.color.is_some() || self.line_weight.is_some() || self.line_type.is_some()
    }
}

/// SVG drawing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgSettings {
    /// One of mm, cm or inch.
    pub unit: Unit,
    /// Physical size of one drawing unit.
    pub scale: f64,
    /// Space around the drawing, in drawing units.
    pub margin: f64,
    /// Grow the margin by half the widest stroke.
    pub fit_to_stroke: bool,
    /// Decimal places of written coordinates.
    pub precision: u32,
    /// Style of the unnamed default layer.
    pub color: Option<ColorIndex>,
    /// Line weight in millimetres.
    pub line_weight: Option<f64>,
    /// Line type of the default layer.
    pub line_type: Option<LineType>,
}

impl Default for SvgSettings {
    fn default() -> Self {
        Self {
            unit: Unit::Millimeter,
            scale: 1.0,
            margin: 0.0,
            fit_to_stroke: true,
            precision: 6,
            color: None,
            line_weight: None,
            line_type: None,
        }
    }
}

impl SvgSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ExportError::InvalidSettings("scale must be positive".into()));
        }
        if self.margin.is_nan() || self.margin < 0.0 {
            return Err(ExportError::InvalidSettings(
                "margin must not be negative".into(),
            ));
        }
        validate_precision(self.precision)?;
        validate_line_weight(self.line_weight)
    }
}

fn validate_precision(precision: u32) -> Result<()> {
    if precision > MAX_PRECISION {
        return Err(ExportError::InvalidSettings(format!(
            "precision must be at most {MAX_PRECISION}"
        )));
    }
    Ok(())
}

fn validate_line_weight(line_weight: Option<f64>) -> Result<()> {
    match line_weight {
        Some(w) if w.is_nan() || w <= 0.0 => Err(ExportError::InvalidSettings(
            "line_weight must be positive".into(),
        )),
        _ => Ok(()),
    }
}

/// Projection and output settings of one export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExportSettings {
    pub hlr: HlrOptions,
    pub dxf: DxfSettings,
    pub svg: SvgSettings,
}

impl ExportSettings {
    /// Parse settings from TOML text; missing keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        self.dxf.validate()?;
        self.svg.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linetype::AnsiLineType;

    #[test]
    fn test_defaults() {
        let s = ExportSettings::default();
        assert_eq!(s.svg.scale, 1.0);
        assert_eq!(s.svg.margin, 0.0);
        assert!(s.svg.fit_to_stroke);
        assert_eq!(s.svg.precision, 6);
        assert_eq!(s.dxf.unit, Unit::Millimeter);
        assert!(!s.dxf.has_style_overrides());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let s = ExportSettings::from_toml_str(
            r#"
            [hlr]
            with_hidden = false

            [svg]
            unit = "in"
            margin = 0.5

            [dxf]
            unit = "foot"
            color = "red"
            line_type = "dashed"
            "#,
        )
        .unwrap();
        assert!(!s.hlr.with_hidden);
        assert_eq!(s.svg.unit, Unit::Inch);
        assert_eq!(s.svg.margin, 0.5);
        assert_eq!(s.dxf.unit, Unit::Foot);
        assert_eq!(s.dxf.color, Some(ColorIndex::Red));
        assert_eq!(s.dxf.line_type, Some(LineType::Ansi(AnsiLineType::Dashed)));
        assert!(s.dxf.has_style_overrides());
    }

    #[test]
    fn test_invalid_values() {
        let svg = SvgSettings {
            scale: 0.0,
            ..SvgSettings::default()
        };
        assert!(matches!(svg.validate(), Err(ExportError::InvalidSettings(_))));
        let dxf = DxfSettings {
            line_weight: Some(-1.0),
            ..DxfSettings::default()
        };
        assert!(matches!(dxf.validate(), Err(ExportError::InvalidSettings(_))));
        assert!(matches!(
            ExportSettings::from_toml_str("[svg]\nprecision = 40\n"),
            Err(ExportError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            ExportSettings::from_toml_str("[svg]\nunit = \"parsec\"\n"),
            Err(ExportError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ExportSettings::from_file("/nonexistent/vdraft.toml"),
            Err(ExportError::Io(_))
        ));
    }

    #[test]
    fn test_load_from_temp_file() {
        let path = std::env::temp_dir().join("vdraft_settings_test.toml");
        std::fs::write(&path, "[svg]\nscale = 3.0\n").unwrap();
        let s = ExportSettings::from_file(&path).unwrap();
        assert_eq!(s.svg.scale, 3.0);
    }
}
