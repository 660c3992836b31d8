//! DXF export of projected edges.
//!
//! Edges are converted to native entities: `LINE`, `CIRCLE`, `ARC`,
//! `ELLIPSE`, and `SPLINE` for everything else. Layers and the line types
//! they use are written to the `TABLES` section.

use std::io::Write;

use tracing::{debug, trace};
use vdraft_math::Point3;
use vdraft_topo::{Edge, Shape, TopoError};

use super::{AddShapeReport, DrawingDocument, Extents};
use crate::color::{ColorIndex, Style};
use crate::convert::{
    axis_angle, circle_arc_angles, classify, ellipse_parameters, extract_spline, CurveClass,
    SplineData,
};
use crate::error::{ExportError, Result};
use crate::layer::{Layer, LayerSet};
use crate::linetype::{AnsiLineType, DashPattern, LineType, LineTypeTable};
use crate::point::{Point2D, PointProjector};
use crate::settings::DxfSettings;
use crate::units::Unit;

/// Name of the layer every DXF drawing has.
pub const DEFAULT_LAYER: &str = "0";

/// A converted DXF entity in drawing coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DxfEntity {
    Line {
        start: Point2D,
        end: Point2D,
    },
    Circle {
        center: Point2D,
        radius: f64,
    },
    /// Circular arc; angles in degrees.
    Arc {
        center: Point2D,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        /// Whether the arc runs counter-clockwise from start to end. DXF
        /// arcs are always counter-clockwise, so clockwise arcs are written
        /// with their angles swapped.
        ccw: bool,
    },
    Ellipse {
        center: Point2D,
        /// Major axis end point relative to the center.
        major_axis: Point2D,
        /// Minor to major radius ratio.
        ratio: f64,
        start_param: f64,
        end_param: f64,
    },
    Spline {
        degree: usize,
        knots: Vec<f64>,
        poles: Vec<Point2D>,
        weights: Option<Vec<f64>>,
    },
}

impl DxfEntity {
    /// Entity type name.
    pub fn kind(&self) -> &'static str {
        match self {
            DxfEntity::Line { .. } => "LINE",
            DxfEntity::Circle { .. } => "CIRCLE",
            DxfEntity::Arc { .. } => "ARC",
            DxfEntity::Ellipse { .. } => "ELLIPSE",
            DxfEntity::Spline { .. } => "SPLINE",
        }
    }
}

/// DXF drawing assembled from shapes.
///
/// Starts with layer `"0"`; the empty layer name refers to it as well.
#[derive(Debug, Clone)]
pub struct ExportDxf {
    unit: Unit,
    precision: u32,
    line_types: LineTypeTable,
    /// Line types in use, in order of first use.
    registered: Vec<DashPattern>,
    layers: LayerSet<DxfEntity>,
    extents: Extents,
}

impl ExportDxf {
    /// Drawing in `unit` with a default-styled layer `"0"`.
    pub fn new(unit: Unit) -> Self {
        let mut doc = Self {
            unit,
            precision: DxfSettings::default().precision,
            line_types: LineTypeTable::new(),
            registered: Vec::new(),
            layers: LayerSet::with_layer(DEFAULT_LAYER, Style::default()),
            extents: Extents::default(),
        };
        doc.use_pattern(AnsiLineType::Continuous.pattern());
        doc
    }

    /// Drawing configured from settings; the default layer takes the
    /// settings style.
    pub fn from_settings(settings: &DxfSettings) -> Result<Self> {
        settings.validate()?;
        let mut doc = Self::new(settings.unit);
        doc.precision = settings.precision;
        if settings.has_style_overrides() {
            let style = Style::with_overrides(
                settings.color,
                settings.line_weight,
                settings.line_type.clone(),
            );
            doc.restyle_default_layer(style)?;
        }
        Ok(doc)
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Factor applied to catalog patterns when written.
    ///
    /// Metric drawings use the millimetre scale of the catalog.
    pub fn line_type_scale(&self) -> f64 {
        if self.unit.is_metric() {
            Unit::Millimeter.line_type_scale()
        } else {
            1.0
        }
    }

    /// Register a custom line type for this drawing from segment lengths
    /// in millimetres.
    pub fn register_line_type(
        &mut self,
        name: &str,
        description: &str,
        lengths: &[f64],
    ) -> Result<LineType> {
        self.line_types.register(name, description, lengths)
    }

    /// Declare a layer. Unset style fields take the defaults.
    pub fn add_layer(
        &mut self,
        name: &str,
        color: Option<ColorIndex>,
        line_weight: Option<f64>,
        line_type: Option<LineType>,
    ) -> Result<()> {
        if self.layers.contains(name) || (name.is_empty() && self.layers.contains(DEFAULT_LAYER)) {
            return Err(ExportError::DuplicateLayer(name.to_string()));
        }
        let style = Style::with_overrides(color, line_weight, line_type);
        let pattern = self.line_types.resolve(&style.line_type)?;
        self.use_pattern(pattern);
        self.layers.add(name, style)?;
        Ok(())
    }

    fn restyle_default_layer(&mut self, style: Style) -> Result<()> {
        let pattern = self.line_types.resolve(&style.line_type)?;
        self.use_pattern(pattern);
        self.layers.get_mut(DEFAULT_LAYER)?.style = style;
        Ok(())
    }

    /// Add `pattern` to the `LTYPE` table unless it is there already.
    fn use_pattern(&mut self, pattern: DashPattern) {
        if self.registered.iter().any(|p| p.name == pattern.name) {
            return;
        }
        debug!(line_type = %pattern.name, "registered line type");
        self.registered.push(pattern);
    }

    /// Line types written to the `LTYPE` table.
    pub fn line_types(&self) -> &[DashPattern] {
        &self.registered
    }

    /// Layers in declaration order.
    pub fn layers(&self) -> impl Iterator<Item = &Layer<DxfEntity>> {
        self.layers.iter()
    }

    pub fn layer(&self, name: &str) -> Result<&Layer<DxfEntity>> {
        self.layers.get(layer_name(name))
    }

    /// Extents of everything added so far.
    pub fn extents(&self) -> &Extents {
        &self.extents
    }

    fn convert_edge(&self, edge: &Edge, points: &mut PointProjector) -> Result<DxfEntity> {
        let class = classify(edge);
        trace!(?class, "converting edge to DXF");
        match class {
            CurveClass::Line => Ok(DxfEntity::Line {
                start: points.project(&edge.start_point()),
                end: points.project(&edge.end_point()),
            }),
            CurveClass::Circle => {
                let adaptor = edge.adaptor()?;
                let circle = adaptor
                    .circle()
                    .ok_or(TopoError::UnsupportedCurve("circle adaptor"))?;
                let center = points.project(&circle.center);
                let radius = points.round(circle.radius);
                if edge.is_closed() {
                    return Ok(DxfEntity::Circle { center, radius });
                }
                let angles = circle_arc_angles(
                    axis_angle(circle.x_dir.as_ref()),
                    circle.normal.as_ref().z,
                    adaptor.first_parameter(),
                    adaptor.last_parameter(),
                );
                Ok(DxfEntity::Arc {
                    center,
                    radius,
                    start_angle: points.round(angles.start.to_degrees()),
                    end_angle: points.round(angles.end.to_degrees()),
                    ccw: angles.ccw,
                })
            }
            CurveClass::Ellipse => {
                let adaptor = edge.adaptor()?;
                let ellipse = adaptor
                    .ellipse()
                    .ok_or(TopoError::UnsupportedCurve("ellipse adaptor"))?;
                let (start_param, end_param) = ellipse_parameters(
                    ellipse.normal.as_ref().z,
                    adaptor.first_parameter(),
                    adaptor.last_parameter(),
                );
                Ok(DxfEntity::Ellipse {
                    center: points.project(&ellipse.center),
                    major_axis: points.project(&Point3::from(ellipse.major_axis())),
                    ratio: ellipse.minor_radius / ellipse.major_radius,
                    start_param,
                    end_param,
                })
            }
            CurveClass::Spline => {
                let data = SplineData::from_curve(&extract_spline(edge)?);
                Ok(DxfEntity::Spline {
                    degree: data.degree,
                    poles: data.poles.iter().map(|p| points.project(p)).collect(),
                    knots: data.knots,
                    weights: data.weights,
                })
            }
        }
    }

    // ------------------------------------------------------------------
    // Writer
    // ------------------------------------------------------------------

    fn write_header(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "SECTION")?;
        writeln!(writer, "2")?;
        writeln!(writer, "HEADER")?;

        writeln!(writer, "9")?;
        writeln!(writer, "$ACADVER")?;
        writeln!(writer, "1")?;
        writeln!(writer, "AC1015")?;

        writeln!(writer, "9")?;
        writeln!(writer, "$INSUNITS")?;
        writeln!(writer, "70")?;
        writeln!(writer, "{}", self.unit.dxf_code())?;

        if let Some(b) = self.extents.bounds() {
            writeln!(writer, "9")?;
            writeln!(writer, "$EXTMIN")?;
            self.write_xyz(writer, 10, b.min)?;
            writeln!(writer, "9")?;
            writeln!(writer, "$EXTMAX")?;
            self.write_xyz(writer, 10, b.max)?;
        }

        writeln!(writer, "0")?;
        writeln!(writer, "ENDSEC")?;
        Ok(())
    }

    fn write_tables(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "SECTION")?;
        writeln!(writer, "2")?;
        writeln!(writer, "TABLES")?;

        self.write_ltype_table(writer)?;
        self.write_layer_table(writer)?;

        writeln!(writer, "0")?;
        writeln!(writer, "ENDSEC")?;
        Ok(())
    }

    fn write_ltype_table(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "TABLE")?;
        writeln!(writer, "2")?;
        writeln!(writer, "LTYPE")?;
        writeln!(writer, "70")?;
        writeln!(writer, "{}", self.registered.len())?;

        let scale = self.line_type_scale();
        for pattern in &self.registered {
            writeln!(writer, "0")?;
            writeln!(writer, "LTYPE")?;
            writeln!(writer, "2")?;
            writeln!(writer, "{}", pattern.name)?;
            writeln!(writer, "70")?;
            writeln!(writer, "0")?;
            writeln!(writer, "3")?;
            writeln!(writer, "{}", pattern.description)?;
            writeln!(writer, "72")?;
            writeln!(writer, "65")?; // alignment 'A'
            writeln!(writer, "73")?;
            writeln!(writer, "{}", pattern.segments().len())?;
            self.write_real(writer, 40, pattern.period() * scale)?;
            for element in pattern.segments() {
                self.write_real(writer, 49, element * scale)?;
            }
        }

        writeln!(writer, "0")?;
        writeln!(writer, "ENDTAB")?;
        Ok(())
    }

    fn write_layer_table(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "TABLE")?;
        writeln!(writer, "2")?;
        writeln!(writer, "LAYER")?;
        writeln!(writer, "70")?;
        writeln!(writer, "{}", self.layers.len())?;

        for layer in self.layers.iter() {
            writeln!(writer, "0")?;
            writeln!(writer, "LAYER")?;
            writeln!(writer, "2")?;
            writeln!(writer, "{}", layer.name)?;
            writeln!(writer, "70")?;
            writeln!(writer, "0")?;
            writeln!(writer, "62")?;
            writeln!(writer, "{}", layer.style.color.index())?;
            writeln!(writer, "6")?;
            writeln!(writer, "{}", layer.style.line_type.name())?;
            writeln!(writer, "370")?;
            writeln!(writer, "{}", lineweight_code(layer.style.line_weight))?;
        }

        writeln!(writer, "0")?;
        writeln!(writer, "ENDTAB")?;
        Ok(())
    }

    fn write_entities(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "SECTION")?;
        writeln!(writer, "2")?;
        writeln!(writer, "ENTITIES")?;

        for layer in self.layers.iter() {
            for entity in layer.primitives() {
                self.write_entity(writer, &layer.name, entity)?;
            }
        }

        writeln!(writer, "0")?;
        writeln!(writer, "ENDSEC")?;
        Ok(())
    }

    fn write_entity(
        &self,
        writer: &mut impl Write,
        layer: &str,
        entity: &DxfEntity,
    ) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "{}", entity.kind())?;
        writeln!(writer, "100")?;
        writeln!(writer, "AcDbEntity")?;
        writeln!(writer, "8")?;
        writeln!(writer, "{}", layer)?;

        match entity {
            DxfEntity::Line { start, end } => {
                writeln!(writer, "100")?;
                writeln!(writer, "AcDbLine")?;
                self.write_point(writer, 10, start)?;
                self.write_point(writer, 11, end)?;
            }
            DxfEntity::Circle { center, radius } => {
                writeln!(writer, "100")?;
                writeln!(writer, "AcDbCircle")?;
                self.write_point(writer, 10, center)?;
                self.write_real(writer, 40, *radius)?;
            }
            DxfEntity::Arc {
                center,
                radius,
                start_angle,
                end_angle,
                ccw,
            } => {
                let (start, end) = if *ccw {
                    (start_angle, end_angle)
                } else {
                    (end_angle, start_angle)
                };
                writeln!(writer, "100")?;
                writeln!(writer, "AcDbCircle")?;
                self.write_point(writer, 10, center)?;
                self.write_real(writer, 40, *radius)?;
                writeln!(writer, "100")?;
                writeln!(writer, "AcDbArc")?;
                self.write_real(writer, 50, *start)?;
                self.write_real(writer, 51, *end)?;
            }
            DxfEntity::Ellipse {
                center,
                major_axis,
                ratio,
                start_param,
                end_param,
            } => {
                writeln!(writer, "100")?;
                writeln!(writer, "AcDbEllipse")?;
                self.write_point(writer, 10, center)?;
                self.write_point(writer, 11, major_axis)?;
                self.write_real(writer, 40, *ratio)?;
                self.write_real(writer, 41, *start_param)?;
                self.write_real(writer, 42, *end_param)?;
            }
            DxfEntity::Spline {
                degree,
                knots,
                poles,
                weights,
            } => {
                // 8 = planar, 4 = rational
                let flags = 8 + if weights.is_some() { 4 } else { 0 };
                writeln!(writer, "100")?;
                writeln!(writer, "AcDbSpline")?;
                writeln!(writer, "210")?;
                writeln!(writer, "0.0")?;
                writeln!(writer, "220")?;
                writeln!(writer, "0.0")?;
                writeln!(writer, "230")?;
                writeln!(writer, "1.0")?;
                writeln!(writer, "70")?;
                writeln!(writer, "{}", flags)?;
                writeln!(writer, "71")?;
                writeln!(writer, "{}", degree)?;
                writeln!(writer, "72")?;
                writeln!(writer, "{}", knots.len())?;
                writeln!(writer, "73")?;
                writeln!(writer, "{}", poles.len())?;
                writeln!(writer, "74")?;
                writeln!(writer, "0")?;
                for k in knots {
                    self.write_real(writer, 40, *k)?;
                }
                if let Some(weights) = weights {
                    for w in weights {
                        self.write_real(writer, 41, *w)?;
                    }
                }
                for p in poles {
                    self.write_point(writer, 10, p)?;
                }
            }
        }
        Ok(())
    }

    fn write_real(&self, writer: &mut impl Write, code: u16, value: f64) -> std::io::Result<()> {
        writeln!(writer, "{}", code)?;
        writeln!(writer, "{:.*}", self.precision as usize, value)
    }

    fn write_point(&self, writer: &mut impl Write, code: u16, p: &Point2D) -> std::io::Result<()> {
        self.write_xyz(writer, code, [p.x, p.y, 0.0])
    }

    fn write_xyz(&self, writer: &mut impl Write, code: u16, p: [f64; 3]) -> std::io::Result<()> {
        self.write_real(writer, code, p[0])?;
        self.write_real(writer, code + 10, p[1])?;
        self.write_real(writer, code + 20, p[2])
    }
}

impl DrawingDocument for ExportDxf {
    fn has_layer(&self, name: &str) -> bool {
        self.layers.contains(layer_name(name))
    }

    fn add_shape(&mut self, shape: &Shape, layer: &str) -> Result<AddShapeReport> {
        let name = layer_name(layer);
        self.layers.get(name)?;

        let mut points = PointProjector::new(self.precision);
        let entities = shape
            .edges()
            .iter()
            .map(|edge| self.convert_edge(edge, &mut points))
            .collect::<Result<Vec<_>>>()?;

        let report = AddShapeReport {
            edges: entities.len(),
            non_planar_points: points.non_planar_count(),
        };
        self.layers.get_mut(name)?.extend(entities);
        self.extents.include(shape);
        report.log(name);
        Ok(report)
    }

    fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        self.write_header(&mut writer)?;
        self.write_tables(&mut writer)?;
        self.write_entities(&mut writer)?;

        writeln!(writer, "0")?;
        writeln!(writer, "EOF")?;
        Ok(())
    }
}

impl Default for ExportDxf {
    fn default() -> Self {
        Self::new(Unit::default())
    }
}

fn layer_name(name: &str) -> &str {
    if name.is_empty() {
        DEFAULT_LAYER
    } else {
        name
    }
}

/// Group 370 value: line weight in hundredths of a millimetre.
fn lineweight_code(line_weight: f64) -> i32 {
    (line_weight * 100.0).round() as i32
}
