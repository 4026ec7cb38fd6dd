//! Typed model of `.kicad_pcb` documents.

use serde::Serialize;

use crate::common::{stroke_or_width, At, Effects, Stroke};
use crate::error::ParseError;
use crate::schema::{FromSexpr, Reader};
use crate::sexpr::Sexpr;
use crate::ParseOptions;

// ─── Board stackup ───────────────────────────────────────────────────

/// One entry of the `(layers ...)` table. The table's children are headed
/// by the layer ordinal rather than a symbol, so it is walked by hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardLayerDef {
    pub ordinal: i64,
    pub canonical_name: String,
    pub layer_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

fn parse_layer_table(node: &Sexpr) -> Vec<BoardLayerDef> {
    let mut out = Vec::new();
    for child in node.children() {
        let items = child.items();
        let (Some(ordinal), Some(name)) = (
            items.first().and_then(|i| i.as_f64()),
            items.get(1).and_then(|i| i.as_atom()),
        ) else {
            continue;
        };
        out.push(BoardLayerDef {
            ordinal: ordinal as i64,
            canonical_name: name.to_string(),
            layer_type: items
                .get(2)
                .and_then(|i| i.as_atom())
                .unwrap_or("user")
                .to_string(),
            user_name: items.get(3).and_then(|i| i.as_atom()).map(String::from),
        });
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Net {
    pub number: i64,
    pub name: String,
}

impl FromSexpr for Net {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "net")?;
        Ok(Self {
            number: r.positional_int().unwrap_or(0),
            name: r.positional_str().unwrap_or_default(),
        })
    }
}

// ─── Board-level graphics ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoardGraphic {
    Line(GrLine),
    Rect(GrRect),
    Circle(GrCircle),
    Arc(GrArc),
    Poly(GrPoly),
    Curve(GrCurve),
    Text(GrText),
}

impl BoardGraphic {
    pub const TAGS: &'static [&'static str] = &[
        "gr_line", "gr_rect", "gr_circle", "gr_arc", "gr_poly", "gr_curve", "gr_text",
    ];

    pub fn layer(&self) -> &str {
        match self {
            Self::Line(g) => &g.layer,
            Self::Rect(g) => &g.layer,
            Self::Circle(g) => &g.layer,
            Self::Arc(g) => &g.layer,
            Self::Poly(g) => &g.layer,
            Self::Curve(g) => &g.layer,
            Self::Text(g) => &g.layer,
        }
    }
}

impl FromSexpr for BoardGraphic {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        match expr.tag() {
            Some("gr_line") => Ok(Self::Line(GrLine::from_sexpr(expr)?)),
            Some("gr_rect") => Ok(Self::Rect(GrRect::from_sexpr(expr)?)),
            Some("gr_circle") => Ok(Self::Circle(GrCircle::from_sexpr(expr)?)),
            Some("gr_arc") => Ok(Self::Arc(GrArc::from_sexpr(expr)?)),
            Some("gr_poly") => Ok(Self::Poly(GrPoly::from_sexpr(expr)?)),
            Some("gr_curve") => Ok(Self::Curve(GrCurve::from_sexpr(expr)?)),
            Some("gr_text") => Ok(Self::Text(GrText::from_sexpr(expr)?)),
            other => Err(ParseError::UnexpectedTag {
                expected: "gr_*".to_string(),
                found: other.unwrap_or("").to_string(),
            }),
        }
    }
}

fn read_layer(r: &mut Reader) -> String {
    r.pair_str("layer").unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrLine {
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub stroke: Stroke,
    pub layer: String,
}

impl FromSexpr for GrLine {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::over(expr);
        Ok(Self {
            start: r.pair_xy("start").unwrap_or([0.0, 0.0]),
            end: r.pair_xy("end").unwrap_or([0.0, 0.0]),
            stroke: stroke_or_width(&mut r)?,
            layer: read_layer(&mut r),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrRect {
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub stroke: Stroke,
    pub fill: bool,
    pub layer: String,
}

impl FromSexpr for GrRect {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::over(expr);
        Ok(Self {
            start: r.pair_xy("start").unwrap_or([0.0, 0.0]),
            end: r.pair_xy("end").unwrap_or([0.0, 0.0]),
            stroke: stroke_or_width(&mut r)?,
            fill: filled(&mut r),
            layer: read_layer(&mut r),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrCircle {
    pub center: [f64; 2],
    pub end: [f64; 2],
    pub stroke: Stroke,
    pub fill: bool,
    pub layer: String,
}

impl FromSexpr for GrCircle {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::over(expr);
        Ok(Self {
            center: r
                .pair_xy("center")
                .or_else(|| r.pair_xy("start"))
                .unwrap_or([0.0, 0.0]),
            end: r.pair_xy("end").unwrap_or([0.0, 0.0]),
            stroke: stroke_or_width(&mut r)?,
            fill: filled(&mut r),
            layer: read_layer(&mut r),
        })
    }
}

/// Arcs are three-point since format revision 7; older files store
/// center+endpoint+angle, normalized here to three points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrArc {
    pub start: [f64; 2],
    pub mid: [f64; 2],
    pub end: [f64; 2],
    pub stroke: Stroke,
    pub layer: String,
}

impl FromSexpr for GrArc {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::over(expr);
        let start = r.pair_xy("start").unwrap_or([0.0, 0.0]);
        let end = r.pair_xy("end").unwrap_or([0.0, 0.0]);
        let mid = match r.pair_xy("mid") {
            Some(mid) => mid,
            None => legacy_arc_mid(start, end, r.pair_f64("angle").unwrap_or(0.0)),
        };
        Ok(Self {
            start,
            mid,
            end,
            stroke: stroke_or_width(&mut r)?,
            layer: read_layer(&mut r),
        })
    }
}

/// Midpoint of a legacy `(start=center, end=arc start, angle)` arc.
fn legacy_arc_mid(center: [f64; 2], arc_start: [f64; 2], angle_deg: f64) -> [f64; 2] {
    let dx = arc_start[0] - center[0];
    let dy = arc_start[1] - center[1];
    let half = (angle_deg / 2.0).to_radians();
    let (sin, cos) = half.sin_cos();
    [
        center[0] + dx * cos - dy * sin,
        center[1] + dx * sin + dy * cos,
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrPoly {
    pub pts: Vec<[f64; 2]>,
    pub stroke: Stroke,
    pub fill: bool,
    pub layer: String,
}

impl FromSexpr for GrPoly {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::over(expr);
        Ok(Self {
            pts: r.xy_list("pts"),
            stroke: stroke_or_width(&mut r)?,
            fill: filled_default(&mut r, true),
            layer: read_layer(&mut r),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrCurve {
    pub pts: Vec<[f64; 2]>,
    pub stroke: Stroke,
    pub layer: String,
}

impl FromSexpr for GrCurve {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::over(expr);
        Ok(Self {
            pts: r.xy_list("pts"),
            stroke: stroke_or_width(&mut r)?,
            layer: read_layer(&mut r),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrText {
    pub text: String,
    pub at: At,
    pub layer: String,
    pub effects: Effects,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for GrText {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::over(expr);
        Ok(Self {
            text: r.positional_str().unwrap_or_default(),
            at: r.item::<At>("at")?.unwrap_or_default(),
            layer: read_layer(&mut r),
            effects: r.item::<Effects>("effects")?.unwrap_or_default(),
            uuid: r.pair_str("uuid"),
        })
    }
}

/// `(fill yes|no|solid|none)` in newer files, `(fill (type solid))` in
/// older ones.
fn filled(r: &mut Reader) -> bool {
    filled_default(r, false)
}

fn filled_default(r: &mut Reader, default: bool) -> bool {
    let Some(node) = r.child("fill") else {
        return default;
    };
    match node.children().first().and_then(|v| v.as_atom()) {
        Some(token) => matches!(token, "yes" | "true" | "solid"),
        None => matches!(node.value("type"), Some("solid")),
    }
}

// ─── Footprints ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FootprintGraphic {
    Line(GrLine),
    Rect(GrRect),
    Circle(GrCircle),
    Arc(GrArc),
    Poly(GrPoly),
    Curve(GrCurve),
    Text(FpText),
}

impl FootprintGraphic {
    pub const TAGS: &'static [&'static str] = &[
        "fp_line", "fp_rect", "fp_circle", "fp_arc", "fp_poly", "fp_curve", "fp_text",
    ];

    pub fn layer(&self) -> &str {
        match self {
            Self::Line(g) => &g.layer,
            Self::Rect(g) => &g.layer,
            Self::Circle(g) => &g.layer,
            Self::Arc(g) => &g.layer,
            Self::Poly(g) => &g.layer,
            Self::Curve(g) => &g.layer,
            Self::Text(g) => &g.layer,
        }
    }
}

impl FromSexpr for FootprintGraphic {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        match expr.tag() {
            Some("fp_line") => Ok(Self::Line(GrLine::from_sexpr(expr)?)),
            Some("fp_rect") => Ok(Self::Rect(GrRect::from_sexpr(expr)?)),
            Some("fp_circle") => Ok(Self::Circle(GrCircle::from_sexpr(expr)?)),
            Some("fp_arc") => Ok(Self::Arc(GrArc::from_sexpr(expr)?)),
            Some("fp_poly") => Ok(Self::Poly(GrPoly::from_sexpr(expr)?)),
            Some("fp_curve") => Ok(Self::Curve(GrCurve::from_sexpr(expr)?)),
            Some("fp_text") => Ok(Self::Text(FpText::from_sexpr(expr)?)),
            other => Err(ParseError::UnexpectedTag {
                expected: "fp_*".to_string(),
                found: other.unwrap_or("").to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FpTextKind {
    Reference,
    Value,
    #[default]
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FpText {
    pub kind: FpTextKind,
    pub text: String,
    pub at: At,
    pub layer: String,
    pub hide: bool,
    pub effects: Effects,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for FpText {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "fp_text")?;
        Ok(Self {
            kind: match r.positional_str().as_deref() {
                Some("reference") => FpTextKind::Reference,
                Some("value") => FpTextKind::Value,
                _ => FpTextKind::User,
            },
            text: r.positional_str().unwrap_or_default(),
            at: r.item::<At>("at")?.unwrap_or_default(),
            layer: read_layer(&mut r),
            hide: r.flag("hide"),
            effects: r.item::<Effects>("effects")?.unwrap_or_default(),
            uuid: r.pair_str("uuid"),
        })
    }
}

/// Footprint fields in the revision-8 `(property ...)` spelling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FpProperty {
    pub name: String,
    pub value: String,
    pub at: At,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    pub hide: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<Effects>,
}

impl FromSexpr for FpProperty {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "property")?;
        Ok(Self {
            name: r.positional_str().unwrap_or_default(),
            value: r.positional_str().unwrap_or_default(),
            at: r.item::<At>("at")?.unwrap_or_default(),
            layer: r.pair_str("layer"),
            hide: r.flag("hide"),
            effects: r.item("effects")?,
        })
    }
}

// ─── Pads ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PadType {
    ThruHole,
    #[default]
    Smd,
    Connect,
    NpThruHole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PadShape {
    Circle,
    #[default]
    Rect,
    Oval,
    Trapezoid,
    RoundRect,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PadDrill {
    pub oval: bool,
    pub diameter: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<[f64; 2]>,
}

impl FromSexpr for PadDrill {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "drill")?;
        let oval = r.flag("oval");
        Ok(Self {
            oval,
            diameter: r.positional_f64().unwrap_or(0.0),
            width: r.positional_f64(),
            offset: r.pair_xy("offset"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PadNet {
    pub number: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pad {
    pub number: String,
    pub pad_type: PadType,
    pub shape: PadShape,
    pub at: At,
    pub size: [f64; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect_delta: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drill: Option<PadDrill>,
    /// Raw layer list, wildcards included; expand with
    /// [`Pad::expanded_layers`].
    pub layers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roundrect_rratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chamfer_ratio: Option<f64>,
    /// Chamfered corner mask: 1=top_left, 2=top_right, 4=bottom_right,
    /// 8=bottom_left.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chamfer: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<PadNet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinfunction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pintype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for Pad {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "pad")?;
        Ok(Self {
            number: r.positional_str().unwrap_or_default(),
            pad_type: match r.positional_str().as_deref() {
                Some("thru_hole") => PadType::ThruHole,
                Some("np_thru_hole") => PadType::NpThruHole,
                Some("connect") => PadType::Connect,
                _ => PadType::Smd,
            },
            shape: match r.positional_str().as_deref() {
                Some("circle") => PadShape::Circle,
                Some("oval") => PadShape::Oval,
                Some("trapezoid") => PadShape::Trapezoid,
                Some("roundrect") => PadShape::RoundRect,
                Some("custom") => PadShape::Custom,
                _ => PadShape::Rect,
            },
            at: r.item::<At>("at")?.unwrap_or_default(),
            size: r.pair_xy("size").unwrap_or([0.0, 0.0]),
            rect_delta: r.pair_xy("rect_delta"),
            drill: r.item("drill")?,
            layers: r
                .child("layers")
                .map(|node| {
                    node.children()
                        .iter()
                        .filter_map(|c| c.as_atom())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            roundrect_rratio: r.pair_f64("roundrect_rratio"),
            chamfer_ratio: r.pair_f64("chamfer_ratio"),
            chamfer: r.child("chamfer").map(|node| {
                let mut mask = 0u8;
                for corner in node.children().iter().filter_map(|c| c.as_atom()) {
                    mask |= match corner {
                        "top_left" => 1,
                        "top_right" => 2,
                        "bottom_right" => 4,
                        "bottom_left" => 8,
                        _ => 0,
                    };
                }
                mask
            }),
            net: r.child("net").map(|node| PadNet {
                number: node.f64_at(0).unwrap_or(0.0) as i64,
                name: node.atom_at(1).unwrap_or("").to_string(),
            }),
            pinfunction: r.pair_str("pinfunction"),
            pintype: r.pair_str("pintype"),
            uuid: r.pair_str("uuid"),
        })
    }
}

impl Pad {
    /// Expand layer wildcards against the board's copper stackup.
    pub fn expanded_layers(&self, copper_layers: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        for entry in &self.layers {
            match entry.as_str() {
                "*.Cu" => out.extend(copper_layers.iter().map(|l| l.to_string())),
                "*.Mask" => {
                    out.push("F.Mask".to_string());
                    out.push("B.Mask".to_string());
                }
                "*.Paste" => {
                    out.push("F.Paste".to_string());
                    out.push("B.Paste".to_string());
                }
                name => out.push(name.to_string()),
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footprint {
    pub library_link: String,
    pub layer: String,
    pub at: At,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub attr: Vec<String>,
    pub properties: Vec<FpProperty>,
    pub graphics: Vec<FootprintGraphic>,
    pub pads: Vec<Pad>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for Footprint {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let tag = match expr.tag() {
            Some("footprint") => "footprint",
            // pre-6 name, still common in converted boards
            Some("module") => "module",
            other => {
                return Err(ParseError::UnexpectedTag {
                    expected: "footprint".to_string(),
                    found: other.unwrap_or("").to_string(),
                })
            }
        };
        let mut r = Reader::start(expr, tag)?;
        Ok(Self {
            library_link: r.positional_str().unwrap_or_default(),
            layer: read_layer(&mut r),
            at: r.item::<At>("at")?.unwrap_or_default(),
            descr: r.pair_str("descr"),
            tags: r.pair_str("tags"),
            path: r.pair_str("path"),
            attr: r
                .child("attr")
                .map(|node| {
                    node.children()
                        .iter()
                        .filter_map(|c| c.as_atom())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            properties: r.collect(&["property"])?,
            graphics: r.collect(FootprintGraphic::TAGS)?,
            pads: r.collect(&["pad"])?,
            uuid: r.pair_str("uuid"),
        })
    }
}

impl Footprint {
    pub fn reference(&self) -> &str {
        self.field("Reference", FpTextKind::Reference).unwrap_or("?")
    }

    pub fn value(&self) -> &str {
        self.field("Value", FpTextKind::Value).unwrap_or("")
    }

    fn field(&self, prop: &str, kind: FpTextKind) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == prop)
            .map(|p| p.value.as_str())
            .or_else(|| {
                self.graphics.iter().find_map(|g| match g {
                    FootprintGraphic::Text(t) if t.kind == kind => Some(t.text.as_str()),
                    _ => None,
                })
            })
    }

    pub fn is_flipped(&self) -> bool {
        self.layer.starts_with("B.")
    }
}

// ─── Tracks, vias, zones ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSegment {
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub width: f64,
    pub layer: String,
    pub net: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for TrackSegment {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "segment")?;
        Ok(Self {
            start: r.pair_xy("start").unwrap_or([0.0, 0.0]),
            end: r.pair_xy("end").unwrap_or([0.0, 0.0]),
            width: r.pair_f64("width").unwrap_or(0.25),
            layer: read_layer(&mut r),
            net: r.pair_int("net").unwrap_or(0),
            uuid: r.pair_str("uuid"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackArc {
    pub start: [f64; 2],
    pub mid: [f64; 2],
    pub end: [f64; 2],
    pub width: f64,
    pub layer: String,
    pub net: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for TrackArc {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "arc")?;
        Ok(Self {
            start: r.pair_xy("start").unwrap_or([0.0, 0.0]),
            mid: r.pair_xy("mid").unwrap_or([0.0, 0.0]),
            end: r.pair_xy("end").unwrap_or([0.0, 0.0]),
            width: r.pair_f64("width").unwrap_or(0.25),
            layer: read_layer(&mut r),
            net: r.pair_int("net").unwrap_or(0),
            uuid: r.pair_str("uuid"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Via {
    pub blind: bool,
    pub micro: bool,
    pub at: At,
    pub size: f64,
    pub drill: f64,
    /// The two copper layers the via spans.
    pub layers: Vec<String>,
    pub net: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for Via {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "via")?;
        Ok(Self {
            blind: r.flag("blind"),
            micro: r.flag("micro"),
            at: r.item::<At>("at")?.unwrap_or_default(),
            size: r.pair_f64("size").unwrap_or(0.6),
            drill: r.pair_f64("drill").unwrap_or(0.3),
            layers: r
                .child("layers")
                .map(|node| {
                    node.children()
                        .iter()
                        .filter_map(|c| c.as_atom())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            net: r.pair_int("net").unwrap_or(0),
            uuid: r.pair_str("uuid"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilledPolygon {
    pub layer: String,
    pub pts: Vec<[f64; 2]>,
}

impl FromSexpr for FilledPolygon {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "filled_polygon")?;
        Ok(Self {
            layer: read_layer(&mut r),
            pts: r.xy_list("pts"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub net: i64,
    pub net_name: String,
    /// Layers this zone exists on; single `(layer ...)` and multi
    /// `(layers ...)` spellings both land here.
    pub layers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub priority: i64,
    pub min_thickness: f64,
    pub filled_polygons: Vec<FilledPolygon>,
    /// Outline of the zone as drawn, before fill.
    pub outline: Vec<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for Zone {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "zone")?;
        let mut layers: Vec<String> = r
            .child("layers")
            .map(|node| {
                node.children()
                    .iter()
                    .filter_map(|c| c.as_atom())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        if let Some(single) = r.pair_str("layer") {
            layers.push(single);
        }
        let outline = match r.child("polygon") {
            Some(node) => Reader::over(node).xy_list("pts"),
            None => Vec::new(),
        };
        Ok(Self {
            net: r.pair_int("net").unwrap_or(0),
            net_name: r.pair_str("net_name").unwrap_or_default(),
            layers,
            name: r.pair_str("name"),
            priority: r.pair_int("priority").unwrap_or(0),
            min_thickness: r.pair_f64("min_thickness").unwrap_or(0.0),
            filled_polygons: r.collect(&["filled_polygon"])?,
            outline,
            uuid: r.pair_str("uuid"),
        })
    }
}

// ─── Document root ───────────────────────────────────────────────────

/// One drawable item of a board, by reference.
#[derive(Debug, Clone, Copy)]
pub enum BoardItem<'a> {
    Segment(&'a TrackSegment),
    Arc(&'a TrackArc),
    Via(&'a Via),
    Zone(&'a Zone),
    Graphic(&'a BoardGraphic),
    Footprint(&'a Footprint),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KicadPcb {
    pub version: i64,
    pub generator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thickness: Option<f64>,
    pub paper: crate::common::PaperSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_block: Option<crate::common::TitleBlock>,
    pub layers: Vec<BoardLayerDef>,
    pub nets: Vec<Net>,
    pub footprints: Vec<Footprint>,
    pub segments: Vec<TrackSegment>,
    pub arcs: Vec<TrackArc>,
    pub vias: Vec<Via>,
    pub zones: Vec<Zone>,
    pub drawings: Vec<BoardGraphic>,
}

const IGNORED_PCB_RECORDS: &[&str] = &[
    "general",
    "setup",
    "group",
    "target",
    "dimension",
    "gr_text_box",
    "property",
    "net_class",
    "embedded_fonts",
    "generator_version",
];

impl KicadPcb {
    pub fn parse(root: &Sexpr, opts: &ParseOptions) -> Result<Self, ParseError> {
        let mut r = Reader::start(root, "kicad_pcb")?;
        let thickness = r
            .child("general")
            .and_then(|node| node.value_f64("thickness"));
        let layers = r.child("layers").map(parse_layer_table).unwrap_or_default();
        let mut footprints: Vec<Footprint> = r.collect(&["footprint"])?;
        footprints.extend(r.collect::<Footprint>(&["module"])?);
        let pcb = Self {
            version: r.pair_int("version").unwrap_or(0),
            generator: r.pair_str("generator").unwrap_or_default(),
            thickness,
            paper: r.item("paper")?.unwrap_or_default(),
            title_block: r.item("title_block")?,
            layers,
            nets: r.collect(&["net"])?,
            footprints,
            segments: r.collect(&["segment"])?,
            arcs: r.collect(&["arc"])?,
            vias: r.collect(&["via"])?,
            zones: r.collect(&["zone"])?,
            drawings: r.collect(BoardGraphic::TAGS)?,
        };
        for tag in r.unconsumed_tags() {
            if IGNORED_PCB_RECORDS.contains(&tag) {
                continue;
            }
            if opts.strict {
                return Err(ParseError::UnknownRecord(tag.to_string()));
            }
            log::debug!("skipping unknown board record `{tag}`");
        }
        Ok(pcb)
    }

    /// Copper layer names in stackup order.
    pub fn copper_layers(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|l| l.canonical_name.ends_with(".Cu"))
            .map(|l| l.canonical_name.as_str())
            .collect()
    }

    pub fn net_name(&self, number: i64) -> Option<&str> {
        self.nets
            .iter()
            .find(|n| n.number == number)
            .map(|n| n.name.as_str())
    }

    /// Every drawable item, in a stable order.
    pub fn items(&self) -> impl Iterator<Item = BoardItem<'_>> {
        let zones = self.zones.iter().map(BoardItem::Zone);
        let segments = self.segments.iter().map(BoardItem::Segment);
        let arcs = self.arcs.iter().map(BoardItem::Arc);
        let vias = self.vias.iter().map(BoardItem::Via);
        let drawings = self.drawings.iter().map(BoardItem::Graphic);
        let footprints = self.footprints.iter().map(BoardItem::Footprint);
        zones
            .chain(segments)
            .chain(arcs)
            .chain(vias)
            .chain(drawings)
            .chain(footprints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexpr::parse;
    use approx::assert_relative_eq;

    #[test]
    fn test_layer_table() {
        let root = parse(
            "(kicad_pcb (version 20221018) (generator pcbnew) \
             (layers (0 \"F.Cu\" signal) (31 \"B.Cu\" signal) \
                     (36 \"B.SilkS\" user \"B.Silkscreen\")))",
        )
        .unwrap();
        let pcb = KicadPcb::parse(&root, &ParseOptions::default()).unwrap();
        assert_eq!(pcb.layers.len(), 3);
        assert_eq!(pcb.layers[2].user_name.as_deref(), Some("B.Silkscreen"));
        assert_eq!(pcb.copper_layers(), vec!["F.Cu", "B.Cu"]);
    }

    #[test]
    fn test_pad_wildcard_layers() {
        let expr = parse(
            "(pad \"1\" thru_hole circle (at 0 0) (size 1.7 1.7) \
             (drill 1.0) (layers *.Cu *.Mask) (net 1 \"GND\"))",
        )
        .unwrap();
        let pad = Pad::from_sexpr(&expr).unwrap();
        assert_eq!(pad.pad_type, PadType::ThruHole);
        assert_eq!(pad.shape, PadShape::Circle);
        assert_eq!(
            pad.expanded_layers(&["F.Cu", "In1.Cu", "B.Cu"]),
            vec!["F.Cu", "In1.Cu", "B.Cu", "F.Mask", "B.Mask"]
        );
        assert_eq!(pad.net.as_ref().unwrap().name, "GND");
    }

    #[test]
    fn test_oval_drill() {
        let expr = parse("(drill oval 0.6 1.2 (offset 0.1 0))").unwrap();
        let drill = PadDrill::from_sexpr(&expr).unwrap();
        assert!(drill.oval);
        assert_eq!(drill.diameter, 0.6);
        assert_eq!(drill.width, Some(1.2));
        assert_eq!(drill.offset, Some([0.1, 0.0]));
    }

    #[test]
    fn test_legacy_arc_normalized() {
        // Quarter arc around the origin starting at (1, 0).
        let expr = parse("(gr_arc (start 0 0) (end 1 0) (angle 90) (width 0.1) (layer \"Edge.Cuts\"))").unwrap();
        let BoardGraphic::Arc(arc) = BoardGraphic::from_sexpr(&expr).unwrap() else {
            panic!("expected arc");
        };
        let half = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(arc.mid[0], half, epsilon = 1e-9);
        assert_relative_eq!(arc.mid[1], half, epsilon = 1e-9);
    }

    #[test]
    fn test_zone_filled_polygons() {
        let expr = parse(
            "(zone (net 2) (net_name \"VCC\") (layers \"F.Cu\" \"B.Cu\") \
             (polygon (pts (xy 0 0) (xy 10 0) (xy 10 10))) \
             (filled_polygon (layer \"F.Cu\") (pts (xy 0 0) (xy 9 0) (xy 9 9))))",
        )
        .unwrap();
        let zone = Zone::from_sexpr(&expr).unwrap();
        assert_eq!(zone.layers, vec!["F.Cu", "B.Cu"]);
        assert_eq!(zone.outline.len(), 3);
        assert_eq!(zone.filled_polygons.len(), 1);
        assert_eq!(zone.filled_polygons[0].layer, "F.Cu");
    }

    #[test]
    fn test_footprint_reference_both_spellings() {
        let v8 = parse(
            "(footprint \"R_0402\" (layer \"F.Cu\") (at 10 20 90) \
             (property \"Reference\" \"R1\" (at 0 0 0) (layer \"F.SilkS\")) \
             (pad \"1\" smd rect (at -0.5 0) (size 0.6 0.5) (layers \"F.Cu\")))",
        )
        .unwrap();
        let fp = Footprint::from_sexpr(&v8).unwrap();
        assert_eq!(fp.reference(), "R1");
        assert!(!fp.is_flipped());

        let v6 = parse(
            "(footprint \"R_0402\" (layer \"B.Cu\") (at 10 20) \
             (fp_text reference \"R2\" (at 0 0) (layer \"B.SilkS\")))",
        )
        .unwrap();
        let fp = Footprint::from_sexpr(&v6).unwrap();
        assert_eq!(fp.reference(), "R2");
        assert!(fp.is_flipped());
    }
}
