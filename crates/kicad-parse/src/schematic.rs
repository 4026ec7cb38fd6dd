//! Typed model of `.kicad_sch` documents.
//!
//! Each record's `FromSexpr` impl is the authoritative grammar for that
//! record. Library symbols are shared templates referenced by name;
//! placed symbols hold lookup keys into the library table, never
//! references into it.

use serde::Serialize;

use crate::common::{stroke_or_width, At, Effects, Fill, Stroke};
use crate::error::{LookupError, ParseError};
use crate::schema::{FromSexpr, Reader};
use crate::sexpr::Sexpr;
use crate::ParseOptions;

// ─── Wires, buses, junctions ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wire {
    pub pts: Vec<[f64; 2]>,
    pub stroke: Stroke,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for Wire {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "wire")?;
        Ok(Self {
            pts: r.xy_list("pts"),
            stroke: stroke_or_width(&mut r)?,
            uuid: r.pair_str("uuid"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bus {
    pub pts: Vec<[f64; 2]>,
    pub stroke: Stroke,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for Bus {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "bus")?;
        Ok(Self {
            pts: r.xy_list("pts"),
            stroke: stroke_or_width(&mut r)?,
            uuid: r.pair_str("uuid"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Junction {
    pub at: At,
    pub diameter: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<crate::common::Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for Junction {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "junction")?;
        Ok(Self {
            at: r.item::<At>("at")?.unwrap_or_default(),
            diameter: r.pair_f64("diameter").unwrap_or(0.0),
            color: r.item("color")?,
            uuid: r.pair_str("uuid"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoConnect {
    pub at: At,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for NoConnect {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "no_connect")?;
        Ok(Self {
            at: r.item::<At>("at")?.unwrap_or_default(),
            uuid: r.pair_str("uuid"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusEntry {
    pub at: At,
    pub size: [f64; 2],
    pub stroke: Stroke,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for BusEntry {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "bus_entry")?;
        Ok(Self {
            at: r.item::<At>("at")?.unwrap_or_default(),
            size: r.pair_xy("size").unwrap_or([2.54, 2.54]),
            stroke: stroke_or_width(&mut r)?,
            uuid: r.pair_str("uuid"),
        })
    }
}

// ─── Free-standing graphics and text ─────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polyline {
    pub pts: Vec<[f64; 2]>,
    pub stroke: Stroke,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for Polyline {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "polyline")?;
        Ok(Self {
            pts: r.xy_list("pts"),
            stroke: stroke_or_width(&mut r)?,
            fill: r.item("fill")?,
            uuid: r.pair_str("uuid"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub text: String,
    pub at: At,
    pub effects: Effects,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for Text {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "text")?;
        Ok(Self {
            text: r.positional_str().unwrap_or_default(),
            at: r.item::<At>("at")?.unwrap_or_default(),
            effects: r.item::<Effects>("effects")?.unwrap_or_default(),
            uuid: r.pair_str("uuid"),
        })
    }
}

// ─── Labels ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelShape {
    #[default]
    Input,
    Output,
    Bidirectional,
    TriState,
    Passive,
}

impl LabelShape {
    fn from_token(s: &str) -> Self {
        match s {
            "output" => Self::Output,
            "bidirectional" => Self::Bidirectional,
            "tri_state" => Self::TriState,
            "passive" => Self::Passive,
            _ => Self::Input,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
    pub at: At,
    pub effects: Effects,
    pub fields_autoplaced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for Label {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "label")?;
        Ok(Self {
            text: r.positional_str().unwrap_or_default(),
            at: r.item::<At>("at")?.unwrap_or_default(),
            effects: r.item::<Effects>("effects")?.unwrap_or_default(),
            fields_autoplaced: r.flag("fields_autoplaced"),
            uuid: r.pair_str("uuid"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalLabel {
    pub text: String,
    pub shape: LabelShape,
    pub at: At,
    pub effects: Effects,
    pub fields_autoplaced: bool,
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for GlobalLabel {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "global_label")?;
        Ok(Self {
            text: r.positional_str().unwrap_or_default(),
            shape: r
                .pair_str("shape")
                .map(|s| LabelShape::from_token(&s))
                .unwrap_or_default(),
            at: r.item::<At>("at")?.unwrap_or_default(),
            effects: r.item::<Effects>("effects")?.unwrap_or_default(),
            fields_autoplaced: r.flag("fields_autoplaced"),
            properties: r.collect(&["property"])?,
            uuid: r.pair_str("uuid"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchicalLabel {
    pub text: String,
    pub shape: LabelShape,
    pub at: At,
    pub effects: Effects,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for HierarchicalLabel {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "hierarchical_label")?;
        Ok(Self {
            text: r.positional_str().unwrap_or_default(),
            shape: r
                .pair_str("shape")
                .map(|s| LabelShape::from_token(&s))
                .unwrap_or_default(),
            at: r.item::<At>("at")?.unwrap_or_default(),
            effects: r.item::<Effects>("effects")?.unwrap_or_default(),
            uuid: r.pair_str("uuid"),
        })
    }
}

// ─── Properties ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub at: At,
    /// Absent effects fall back through the owning symbol's library
    /// definition; see [`SchematicSymbol::resolved_effects`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<Effects>,
    pub show_name: bool,
}

impl FromSexpr for Property {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "property")?;
        Ok(Self {
            name: r.positional_str().unwrap_or_default(),
            value: r.positional_str().unwrap_or_default(),
            id: r.pair_int("id"),
            at: r.item::<At>("at")?.unwrap_or_default(),
            effects: r.item("effects")?,
            show_name: r.flag("show_name"),
        })
    }
}

// ─── Library symbols ─────────────────────────────────────────────────

/// Body graphics of a library symbol. One heterogeneous collection so the
/// document order of overlapping shapes is preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolGraphic {
    Arc(GraphicArc),
    Circle(GraphicCircle),
    Rectangle(GraphicRectangle),
    Polyline(GraphicPolyline),
    Bezier(GraphicBezier),
    Text(LibText),
}

impl SymbolGraphic {
    pub const TAGS: &'static [&'static str] =
        &["arc", "circle", "rectangle", "polyline", "bezier", "text"];
}

impl FromSexpr for SymbolGraphic {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        match expr.tag() {
            Some("arc") => Ok(Self::Arc(GraphicArc::from_sexpr(expr)?)),
            Some("circle") => Ok(Self::Circle(GraphicCircle::from_sexpr(expr)?)),
            Some("rectangle") => Ok(Self::Rectangle(GraphicRectangle::from_sexpr(expr)?)),
            Some("polyline") => Ok(Self::Polyline(GraphicPolyline::from_sexpr(expr)?)),
            Some("bezier") => Ok(Self::Bezier(GraphicBezier::from_sexpr(expr)?)),
            Some("text") => Ok(Self::Text(LibText::from_sexpr(expr)?)),
            other => Err(ParseError::UnexpectedTag {
                expected: "arc|circle|rectangle|polyline|bezier|text".to_string(),
                found: other.unwrap_or("").to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicArc {
    pub start: [f64; 2],
    pub mid: [f64; 2],
    pub end: [f64; 2],
    pub stroke: Stroke,
    pub fill: Fill,
}

impl FromSexpr for GraphicArc {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "arc")?;
        Ok(Self {
            start: r.pair_xy("start").unwrap_or([0.0, 0.0]),
            mid: r.pair_xy("mid").unwrap_or([0.0, 0.0]),
            end: r.pair_xy("end").unwrap_or([0.0, 0.0]),
            stroke: stroke_or_width(&mut r)?,
            fill: r.item::<Fill>("fill")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicCircle {
    pub center: [f64; 2],
    pub radius: f64,
    pub stroke: Stroke,
    pub fill: Fill,
}

impl FromSexpr for GraphicCircle {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "circle")?;
        Ok(Self {
            center: r.pair_xy("center").unwrap_or([0.0, 0.0]),
            radius: r.pair_f64("radius").unwrap_or(0.0),
            stroke: stroke_or_width(&mut r)?,
            fill: r.item::<Fill>("fill")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicRectangle {
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub stroke: Stroke,
    pub fill: Fill,
}

impl FromSexpr for GraphicRectangle {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "rectangle")?;
        Ok(Self {
            start: r.pair_xy("start").unwrap_or([0.0, 0.0]),
            end: r.pair_xy("end").unwrap_or([0.0, 0.0]),
            stroke: stroke_or_width(&mut r)?,
            fill: r.item::<Fill>("fill")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicPolyline {
    pub pts: Vec<[f64; 2]>,
    pub stroke: Stroke,
    pub fill: Fill,
}

impl FromSexpr for GraphicPolyline {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "polyline")?;
        Ok(Self {
            pts: r.xy_list("pts"),
            stroke: stroke_or_width(&mut r)?,
            fill: r.item::<Fill>("fill")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphicBezier {
    pub pts: Vec<[f64; 2]>,
    pub stroke: Stroke,
    pub fill: Fill,
}

impl FromSexpr for GraphicBezier {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "bezier")?;
        Ok(Self {
            pts: r.xy_list("pts"),
            stroke: stroke_or_width(&mut r)?,
            fill: r.item::<Fill>("fill")?.unwrap_or_default(),
        })
    }
}

/// Text inside a symbol body. `at.rotation` is stored in decidegrees, a
/// historical quirk of symbol-owned text; painters divide by ten.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibText {
    pub text: String,
    pub at: At,
    pub effects: Effects,
}

impl FromSexpr for LibText {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "text")?;
        Ok(Self {
            text: r.positional_str().unwrap_or_default(),
            at: r.item::<At>("at")?.unwrap_or_default(),
            effects: r.item::<Effects>("effects")?.unwrap_or_default(),
        })
    }
}

// ─── Pins ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PinElectrical {
    Input,
    Output,
    Bidirectional,
    TriState,
    #[default]
    Passive,
    Free,
    Unspecified,
    PowerIn,
    PowerOut,
    OpenCollector,
    OpenEmitter,
    NoConnect,
}

impl PinElectrical {
    fn from_token(s: &str) -> Self {
        match s {
            "input" => Self::Input,
            "output" => Self::Output,
            "bidirectional" => Self::Bidirectional,
            "tri_state" => Self::TriState,
            "free" => Self::Free,
            "unspecified" => Self::Unspecified,
            "power_in" => Self::PowerIn,
            "power_out" => Self::PowerOut,
            "open_collector" => Self::OpenCollector,
            "open_emitter" => Self::OpenEmitter,
            "no_connect" => Self::NoConnect,
            _ => Self::Passive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PinShape {
    #[default]
    Line,
    Inverted,
    Clock,
    InvertedClock,
    InputLow,
    ClockLow,
    OutputLow,
    EdgeClockHigh,
    NonLogic,
}

impl PinShape {
    fn from_token(s: &str) -> Self {
        match s {
            "inverted" => Self::Inverted,
            "clock" => Self::Clock,
            "inverted_clock" => Self::InvertedClock,
            "input_low" => Self::InputLow,
            "clock_low" => Self::ClockLow,
            "output_low" => Self::OutputLow,
            "edge_clock_high" => Self::EdgeClockHigh,
            "non_logic" => Self::NonLogic,
            _ => Self::Line,
        }
    }
}

/// `(name "TEXT" (effects ...))` / `(number "1" (effects ...))`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PinIdent {
    pub text: String,
    pub effects: Effects,
}

impl PinIdent {
    fn read(r: &mut Reader, tag: &str) -> Result<Self, ParseError> {
        let Some(node) = r.child(tag) else {
            return Ok(Self::default());
        };
        let mut inner = Reader::over(node);
        Ok(Self {
            text: inner.positional_str().unwrap_or_default(),
            effects: inner.item::<Effects>("effects")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PinDefinition {
    pub electrical: PinElectrical,
    pub shape: PinShape,
    pub at: At,
    pub length: f64,
    pub hide: bool,
    pub name: PinIdent,
    pub number: PinIdent,
}

impl FromSexpr for PinDefinition {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "pin")?;
        Ok(Self {
            electrical: r
                .positional_str()
                .map(|s| PinElectrical::from_token(&s))
                .unwrap_or_default(),
            shape: r
                .positional_str()
                .map(|s| PinShape::from_token(&s))
                .unwrap_or_default(),
            at: r.item::<At>("at")?.unwrap_or_default(),
            length: r.pair_f64("length").unwrap_or(2.54),
            hide: r.flag("hide"),
            name: PinIdent::read(&mut r, "name")?,
            number: PinIdent::read(&mut r, "number")?,
        })
    }
}

// ─── LibSymbol ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PinNumbers {
    pub hide: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PinNames {
    pub offset: f64,
    pub hide: bool,
}

impl Default for PinNames {
    fn default() -> Self {
        Self {
            offset: 0.508,
            hide: false,
        }
    }
}

impl FromSexpr for PinNumbers {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "pin_numbers")?;
        Ok(Self { hide: r.flag("hide") })
    }
}

impl FromSexpr for PinNames {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "pin_names")?;
        Ok(Self {
            offset: r.pair_f64("offset").unwrap_or(0.508),
            hide: r.flag("hide"),
        })
    }
}

/// A shared, deduplicated symbol template. Multi-unit symbols nest child
/// symbols whose names carry a `_<unit>_<bodystyle>` suffix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibSymbol {
    pub name: String,
    pub power: bool,
    pub pin_numbers: PinNumbers,
    pub pin_names: PinNames,
    pub in_bom: bool,
    pub on_board: bool,
    pub properties: Vec<Property>,
    pub drawings: Vec<SymbolGraphic>,
    pub pins: Vec<PinDefinition>,
    pub units: Vec<LibSymbol>,
}

impl FromSexpr for LibSymbol {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "symbol")?;
        let name = r.positional_str().unwrap_or_default();
        let pins = r.collect(&["pin"])?;
        Ok(Self {
            name,
            power: r.flag("power"),
            pin_numbers: r.item::<PinNumbers>("pin_numbers")?.unwrap_or_default(),
            pin_names: r.item::<PinNames>("pin_names")?.unwrap_or_default(),
            in_bom: r.pair_bool("in_bom").unwrap_or(true),
            on_board: r.pair_bool("on_board").unwrap_or(true),
            properties: r.collect(&["property"])?,
            drawings: r.collect(SymbolGraphic::TAGS)?,
            pins,
            units: r.collect(&["symbol"])?,
        })
    }
}

impl LibSymbol {
    /// `(unit, body_style)` parsed from a child-unit name suffix, e.g.
    /// `R_0_1` is unit 0 (common to all units), body style 1.
    pub fn unit_and_style(&self) -> Option<(i64, i64)> {
        let mut parts = self.name.rsplitn(3, '_');
        let style: i64 = parts.next()?.parse().ok()?;
        let unit: i64 = parts.next()?.parse().ok()?;
        Some((unit, style))
    }

    /// Child units that contribute graphics when instance unit `unit` is
    /// shown: the shared unit 0 plus the matching unit, base body style.
    pub fn units_for(&self, unit: i64) -> impl Iterator<Item = &LibSymbol> {
        self.units.iter().filter(move |u| match u.unit_and_style() {
            Some((u_num, style)) => (u_num == 0 || u_num == unit) && style <= 1,
            None => true,
        })
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_by_id(&self, id: i64) -> Option<&Property> {
        self.properties.iter().find(|p| p.id == Some(id))
    }

    /// All pins of every unit, recursively.
    pub fn all_pins(&self) -> impl Iterator<Item = &PinDefinition> {
        self.pins
            .iter()
            .chain(self.units.iter().flat_map(|u| u.pins.iter()))
    }

    pub fn pin_by_number(&self, number: &str) -> Result<&PinDefinition, LookupError> {
        self.all_pins()
            .find(|p| p.number.text == number)
            .ok_or_else(|| LookupError::PinNotFound {
                number: number.to_string(),
                symbol: self.name.clone(),
            })
    }
}

// ─── Placed symbols ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mirror {
    X,
    Y,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolPin {
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate: Option<String>,
}

impl FromSexpr for SymbolPin {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "pin")?;
        Ok(Self {
            number: r.positional_str().unwrap_or_default(),
            uuid: r.pair_str("uuid"),
            alternate: r.pair_str("alternate"),
        })
    }
}

/// A placed occurrence of a library symbol. Effective geometry is always
/// the library definition transformed by this placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchematicSymbol {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lib_name: Option<String>,
    pub lib_id: String,
    pub at: At,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mirror: Option<Mirror>,
    pub unit: i64,
    pub in_bom: bool,
    pub on_board: bool,
    pub dnp: bool,
    pub fields_autoplaced: bool,
    pub properties: Vec<Property>,
    pub pins: Vec<SymbolPin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for SchematicSymbol {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "symbol")?;
        Ok(Self {
            lib_name: r.pair_str("lib_name"),
            lib_id: r.pair_str("lib_id").unwrap_or_default(),
            at: r.item::<At>("at")?.unwrap_or_default(),
            mirror: r.pair_str("mirror").and_then(|m| match m.as_str() {
                "x" => Some(Mirror::X),
                "y" => Some(Mirror::Y),
                _ => None,
            }),
            unit: r.pair_int("unit").unwrap_or(1),
            in_bom: r.pair_bool("in_bom").unwrap_or(true),
            on_board: r.pair_bool("on_board").unwrap_or(true),
            dnp: r.flag("dnp"),
            fields_autoplaced: r.flag("fields_autoplaced"),
            properties: r.collect(&["property"])?,
            pins: r.collect(&["pin"])?,
            uuid: r.pair_str("uuid"),
        })
    }
}

impl SchematicSymbol {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn reference(&self) -> &str {
        self.property("Reference").map(|p| p.value.as_str()).unwrap_or("?")
    }

    pub fn value(&self) -> &str {
        self.property("Value").map(|p| p.value.as_str()).unwrap_or("")
    }

    /// Effective text effects for one of this instance's properties:
    /// explicit per-instance effects, else the library symbol's property of
    /// the same id (falling back to same name), else the defaults.
    pub fn resolved_effects(&self, lib: &LibSymbol, property: &Property) -> Effects {
        if let Some(effects) = &property.effects {
            return effects.clone();
        }
        let inherited = match property.id {
            Some(id) => lib.property_by_id(id).or_else(|| lib.property(&property.name)),
            None => lib.property(&property.name),
        };
        match inherited.and_then(|p| p.effects.as_ref()) {
            Some(effects) => effects.clone(),
            None => Effects::default(),
        }
    }
}

// ─── Sheets ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetPin {
    pub name: String,
    pub shape: LabelShape,
    pub at: At,
    pub effects: Effects,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for SheetPin {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "pin")?;
        Ok(Self {
            name: r.positional_str().unwrap_or_default(),
            shape: r
                .positional_str()
                .map(|s| LabelShape::from_token(&s))
                .unwrap_or_default(),
            at: r.item::<At>("at")?.unwrap_or_default(),
            effects: r.item::<Effects>("effects")?.unwrap_or_default(),
            uuid: r.pair_str("uuid"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub at: At,
    pub size: [f64; 2],
    pub stroke: Stroke,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    pub properties: Vec<Property>,
    pub pins: Vec<SheetPin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

impl FromSexpr for Sheet {
    fn from_sexpr(expr: &Sexpr) -> Result<Self, ParseError> {
        let mut r = Reader::start(expr, "sheet")?;
        Ok(Self {
            at: r.item::<At>("at")?.unwrap_or_default(),
            size: r.pair_xy("size").unwrap_or([0.0, 0.0]),
            stroke: stroke_or_width(&mut r)?,
            fill: r.item("fill")?,
            properties: r.collect(&["property"])?,
            pins: r.collect(&["pin"])?,
            uuid: r.pair_str("uuid"),
        })
    }
}

impl Sheet {
    pub fn sheet_name(&self) -> &str {
        self.properties
            .iter()
            .find(|p| p.name == "Sheetname" || p.name == "Sheet name")
            .map(|p| p.value.as_str())
            .unwrap_or("")
    }

    pub fn sheet_file(&self) -> &str {
        self.properties
            .iter()
            .find(|p| p.name == "Sheetfile" || p.name == "Sheet file")
            .map(|p| p.value.as_str())
            .unwrap_or("")
    }
}

// ─── Document root ───────────────────────────────────────────────────

/// One drawable item of a schematic, by reference. The closed set painters
/// dispatch over.
#[derive(Debug, Clone, Copy)]
pub enum SchematicItem<'a> {
    Wire(&'a Wire),
    Bus(&'a Bus),
    BusEntry(&'a BusEntry),
    Junction(&'a Junction),
    NoConnect(&'a NoConnect),
    Polyline(&'a Polyline),
    Text(&'a Text),
    Label(&'a Label),
    GlobalLabel(&'a GlobalLabel),
    HierarchicalLabel(&'a HierarchicalLabel),
    Sheet(&'a Sheet),
    Symbol(&'a SchematicSymbol),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct KicadSch {
    pub version: i64,
    pub generator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub paper: crate::common::PaperSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_block: Option<crate::common::TitleBlock>,
    pub lib_symbols: Vec<LibSymbol>,
    pub wires: Vec<Wire>,
    pub buses: Vec<Bus>,
    pub bus_entries: Vec<BusEntry>,
    pub junctions: Vec<Junction>,
    pub no_connects: Vec<NoConnect>,
    pub polylines: Vec<Polyline>,
    pub texts: Vec<Text>,
    pub labels: Vec<Label>,
    pub global_labels: Vec<GlobalLabel>,
    pub hierarchical_labels: Vec<HierarchicalLabel>,
    pub sheets: Vec<Sheet>,
    pub symbols: Vec<SchematicSymbol>,
}

/// Records that appear in files but carry nothing this renderer draws.
const IGNORED_SCH_RECORDS: &[&str] = &[
    "sheet_instances",
    "symbol_instances",
    "bus_alias",
    "embedded_fonts",
    "image",
    "text_box",
];

impl KicadSch {
    pub fn parse(root: &Sexpr, opts: &ParseOptions) -> Result<Self, ParseError> {
        let mut r = Reader::start(root, "kicad_sch")?;
        let lib_symbols = match r.child("lib_symbols") {
            Some(node) => Reader::over(node).collect(&["symbol"])?,
            None => Vec::new(),
        };
        let sch = Self {
            version: r.pair_int("version").unwrap_or(0),
            generator: r.pair_str("generator").unwrap_or_default(),
            uuid: r.pair_str("uuid"),
            paper: r.item("paper")?.unwrap_or_default(),
            title_block: r.item("title_block")?,
            lib_symbols,
            wires: r.collect(&["wire"])?,
            buses: r.collect(&["bus"])?,
            bus_entries: r.collect(&["bus_entry"])?,
            junctions: r.collect(&["junction"])?,
            no_connects: r.collect(&["no_connect"])?,
            polylines: r.collect(&["polyline"])?,
            texts: r.collect(&["text"])?,
            labels: r.collect(&["label"])?,
            global_labels: r.collect(&["global_label"])?,
            hierarchical_labels: r.collect(&["hierarchical_label"])?,
            sheets: r.collect(&["sheet"])?,
            symbols: r.collect(&["symbol"])?,
        };
        for tag in r.unconsumed_tags() {
            if IGNORED_SCH_RECORDS.contains(&tag) {
                continue;
            }
            if opts.strict {
                return Err(ParseError::UnknownRecord(tag.to_string()));
            }
            log::debug!("skipping unknown schematic record `{tag}`");
        }
        Ok(sch)
    }

    /// Resolve a placed symbol to its library template. `lib_name` (set
    /// when the instance carries a local, modified copy) wins over
    /// `lib_id`.
    pub fn lib_symbol(&self, symbol: &SchematicSymbol) -> Result<&LibSymbol, LookupError> {
        let key = symbol.lib_name.as_deref().unwrap_or(&symbol.lib_id);
        self.lib_symbols
            .iter()
            .find(|ls| ls.name == key)
            .ok_or_else(|| LookupError::LibSymbolNotFound(key.to_string()))
    }

    /// Every drawable item, in a stable order.
    pub fn items(&self) -> impl Iterator<Item = SchematicItem<'_>> {
        let wires = self.wires.iter().map(SchematicItem::Wire);
        let buses = self.buses.iter().map(SchematicItem::Bus);
        let entries = self.bus_entries.iter().map(SchematicItem::BusEntry);
        let junctions = self.junctions.iter().map(SchematicItem::Junction);
        let ncs = self.no_connects.iter().map(SchematicItem::NoConnect);
        let polys = self.polylines.iter().map(SchematicItem::Polyline);
        let texts = self.texts.iter().map(SchematicItem::Text);
        let labels = self.labels.iter().map(SchematicItem::Label);
        let globals = self.global_labels.iter().map(SchematicItem::GlobalLabel);
        let hiers = self
            .hierarchical_labels
            .iter()
            .map(SchematicItem::HierarchicalLabel);
        let sheets = self.sheets.iter().map(SchematicItem::Sheet);
        let symbols = self.symbols.iter().map(SchematicItem::Symbol);
        wires
            .chain(buses)
            .chain(entries)
            .chain(junctions)
            .chain(ncs)
            .chain(polys)
            .chain(texts)
            .chain(labels)
            .chain(globals)
            .chain(hiers)
            .chain(sheets)
            .chain(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexpr::parse;

    fn sch(src: &str) -> KicadSch {
        KicadSch::parse(&parse(src).unwrap(), &ParseOptions::default()).unwrap()
    }

    #[test]
    fn test_wire_through_bus_descriptor_fails() {
        let expr = parse("(wire (pts (xy 0 0) (xy 1 0)) (stroke (width 0)))").unwrap();
        assert!(matches!(
            Bus::from_sexpr(&expr),
            Err(ParseError::UnexpectedTag { .. })
        ));
    }

    #[test]
    fn test_minimal_schematic() {
        let doc = sch(
            "(kicad_sch (version 20230121) (generator eeschema) \
             (wire (pts (xy 0 0) (xy 2.54 0)) (stroke (width 0) (type default))) \
             (junction (at 2.54 0) (diameter 0) (color 0 0 0 0)))",
        );
        assert_eq!(doc.version, 20230121);
        assert_eq!(doc.wires.len(), 1);
        assert_eq!(doc.junctions.len(), 1);
        assert!(doc.junctions[0].color.unwrap().is_transparent());
    }

    #[test]
    fn test_strict_mode_rejects_unknown_records() {
        let root = parse("(kicad_sch (version 1) (frobnicator 9))").unwrap();
        assert!(KicadSch::parse(&root, &ParseOptions::default()).is_ok());
        let err = KicadSch::parse(&root, &ParseOptions { strict: true }).unwrap_err();
        assert!(matches!(err, ParseError::UnknownRecord(t) if t == "frobnicator"));
    }

    #[test]
    fn test_lib_symbol_drawing_order() {
        // Heterogeneous drawings keep their document order.
        let expr = parse(
            "(symbol \"X\" \
               (arc (start 0 0) (mid 1 1) (end 2 0) (stroke (width 0.254))) \
               (circle (center 0 0) (radius 1) (stroke (width 0.254))) \
               (polyline (pts (xy 0 0) (xy 1 0)) (stroke (width 0.254))))",
        )
        .unwrap();
        let sym = LibSymbol::from_sexpr(&expr).unwrap();
        assert_eq!(sym.drawings.len(), 3);
        assert!(matches!(sym.drawings[0], SymbolGraphic::Arc(_)));
        assert!(matches!(sym.drawings[1], SymbolGraphic::Circle(_)));
        assert!(matches!(sym.drawings[2], SymbolGraphic::Polyline(_)));
    }

    #[test]
    fn test_unit_name_suffix() {
        let expr = parse("(symbol \"TL072_1_1\" (pin passive line (at 0 0 0) (length 2.54) (name \"A\") (number \"3\")))").unwrap();
        let unit = LibSymbol::from_sexpr(&expr).unwrap();
        assert_eq!(unit.unit_and_style(), Some((1, 1)));
    }

    #[test]
    fn test_pin_lookup_error() {
        let expr = parse(
            "(symbol \"R\" (symbol \"R_0_1\" \
               (pin passive line (at 0 3.81 270) (length 1.27) \
                 (name \"~\" (effects (font (size 1.27 1.27)))) \
                 (number \"1\" (effects (font (size 1.27 1.27)))))))",
        )
        .unwrap();
        let sym = LibSymbol::from_sexpr(&expr).unwrap();
        assert!(sym.pin_by_number("1").is_ok());
        let err = sym.pin_by_number("7").unwrap_err();
        assert_eq!(
            err.to_string(),
            "no pin numbered 7 on library symbol R"
        );
    }

    #[test]
    fn test_property_effects_fallback_chain() {
        let lib_expr = parse(
            "(symbol \"R\" \
               (property \"Reference\" \"R\" (id 0) (at 0 0 0) \
                 (effects (font (size 2.54 2.54) bold))))",
        )
        .unwrap();
        let lib = LibSymbol::from_sexpr(&lib_expr).unwrap();

        // No explicit effects on the instance: the library's same-id
        // property wins.
        let inst_expr = parse(
            "(symbol (lib_id \"Device:R\") (at 0 0 0) \
               (property \"Reference\" \"R7\" (id 0) (at 0 0 0)))",
        )
        .unwrap();
        let inst = SchematicSymbol::from_sexpr(&inst_expr).unwrap();
        let effects = inst.resolved_effects(&lib, &inst.properties[0]);
        assert!(effects.font.bold);
        assert_eq!(effects.font.size, [2.54, 2.54]);

        // Explicit effects take precedence over the library's.
        let inst_expr = parse(
            "(symbol (lib_id \"Device:R\") (at 0 0 0) \
               (property \"Reference\" \"R7\" (id 0) (at 0 0 0) \
                 (effects (font (size 1.27 1.27)))))",
        )
        .unwrap();
        let inst = SchematicSymbol::from_sexpr(&inst_expr).unwrap();
        let effects = inst.resolved_effects(&lib, &inst.properties[0]);
        assert!(!effects.font.bold);
        assert_eq!(effects.font.size, [1.27, 1.27]);

        // Neither side has effects: defaults.
        let bare_lib = LibSymbol::from_sexpr(&parse("(symbol \"C\")").unwrap()).unwrap();
        let effects = inst.resolved_effects(&bare_lib, &Property {
            name: "Value".to_string(),
            value: "10k".to_string(),
            id: Some(1),
            at: At::default(),
            effects: None,
            show_name: false,
        });
        assert_eq!(effects, Effects::default());
    }
}
