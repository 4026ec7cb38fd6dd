//! Painters for schematic documents.

use kicad_parse::common::{Effects, FillType, HAlign, Stroke, VAlign};
use kicad_parse::schematic::{
    Bus, BusEntry, GlobalLabel, HierarchicalLabel, Junction, KicadSch, Label, LabelShape,
    LibSymbol, LibText, Mirror, NoConnect, PinDefinition, PinShape, Polyline, SchematicItem,
    SchematicSymbol, Sheet, SymbolGraphic, Text, Wire,
};

use super::{bezier_points, convert_color, emit_text, readable_angle};
use crate::error::DrawError;
use crate::geom::{Angle, ArcGeom, Matrix3, Vec2};
use crate::layers::{sch, ItemHandle, ViewLayerSet};
use crate::render::Renderer;
use crate::text::{StrokeFont, TextAttributes};
use crate::theme::{Color, SchematicTheme};

/// Default size of the no-connect cross and junction dot, in mm.
const NO_CONNECT_SIZE: f64 = 1.27;
const JUNCTION_RADIUS: f64 = 0.4572;

/// Pin decoration radius and text gaps, in mm.
const PIN_INVERTED_RADIUS: f64 = 0.3175;
const PIN_CLOCK_SIZE: f64 = 0.6;
const PIN_NUMBER_OFFSET: f64 = 0.45;

/// Ambient context installed while a symbol instance is being painted and
/// consumed by the nested body/pin/field painters. Passed explicitly so
/// painting stays pure and reentrant.
pub struct SymbolContext<'a> {
    pub symbol: &'a SchematicSymbol,
    pub lib: &'a LibSymbol,
    pub transform: SymbolTransform,
}

/// Placement of a symbol instance: quarter-turn count, mirror flags, and
/// the composed matrix mapping library space (y up) into document space.
#[derive(Debug, Clone, Copy)]
pub struct SymbolTransform {
    pub matrix: Matrix3,
    pub rotations: i32,
    pub mirror_x: bool,
    pub mirror_y: bool,
}

impl SymbolTransform {
    pub fn for_symbol(symbol: &SchematicSymbol) -> Self {
        let mirror_x = symbol.mirror == Some(Mirror::X);
        let mirror_y = symbol.mirror == Some(Mirror::Y);
        // library geometry is y-up; the base scale flips it into the
        // document's y-down space
        let sx = if mirror_y { -1.0 } else { 1.0 };
        let sy = if mirror_x { 1.0 } else { -1.0 };
        let matrix = Matrix3::translation(symbol.at.pos[0], symbol.at.pos[1])
            .rotate(Angle::from_degrees(-symbol.at.rotation))
            .scale(sx, sy);
        Self {
            matrix,
            rotations: ((symbol.at.rotation / 90.0).round() as i32).rem_euclid(4),
            mirror_x,
            mirror_y,
        }
    }
}

/// Which half of a symbol body a pass draws: background fills go on the
/// background layer, strokes and outline fills on the foreground.
#[derive(Clone, Copy, PartialEq)]
enum BodyPass {
    Background,
    Foreground,
}

pub struct SchematicPainter<'a> {
    theme: &'a SchematicTheme,
    font: &'static StrokeFont,
}

impl<'a> SchematicPainter<'a> {
    pub fn new(theme: &'a SchematicTheme) -> Self {
        Self {
            theme,
            font: StrokeFont::get(),
        }
    }

    /// Paint a whole document: phase 1 files items onto layers, phase 2
    /// walks layers in display order emitting primitives and recording
    /// per-item boxes for hit-testing.
    pub fn paint(
        &self,
        renderer: &mut dyn Renderer,
        layers: &mut ViewLayerSet,
        document: &KicadSch,
    ) -> Result<(), DrawError> {
        layers.clear_items();
        let items: Vec<SchematicItem> = document.items().collect();

        for (index, item) in items.iter().enumerate() {
            let targets = Self::layers_for(item);
            if targets.is_empty() {
                log::warn!("no painter for schematic item {index}, skipping");
                continue;
            }
            for name in targets {
                match layers.by_name_mut(name) {
                    Some(layer) => layer.items.push(ItemHandle(index as u32)),
                    None => log::warn!("no view layer named `{name}`"),
                }
            }
        }

        let order: Vec<String> = layers
            .in_display_order()
            .map(|l| l.name.clone())
            .collect();
        for name in order {
            renderer.start_layer(&name);
            let handles = layers
                .by_name(&name)
                .map(|l| l.items.clone())
                .unwrap_or_default();
            for handle in handles {
                let item = &items[handle.0 as usize];
                renderer.start_bbox();
                self.paint_item(renderer, &name, item, document)?;
                let bbox = renderer.end_bbox();
                if let Some(layer) = layers.by_name_mut(&name) {
                    layer.set_bbox(handle, bbox);
                }
            }
            renderer.end_layer();
        }
        Ok(())
    }

    /// The view layers an item contributes graphics to.
    fn layers_for(item: &SchematicItem) -> &'static [&'static str] {
        match item {
            SchematicItem::Wire(_) => &[sch::WIRE],
            SchematicItem::Bus(_) => &[sch::BUS],
            SchematicItem::BusEntry(_) => &[sch::WIRE],
            SchematicItem::Junction(_) => &[sch::JUNCTION],
            SchematicItem::NoConnect(_) => &[sch::JUNCTION],
            SchematicItem::Polyline(_) => &[sch::NOTES],
            SchematicItem::Text(_) => &[sch::NOTES],
            SchematicItem::Label(_) => &[sch::LABEL],
            SchematicItem::GlobalLabel(_) => &[sch::LABEL],
            SchematicItem::HierarchicalLabel(_) => &[sch::LABEL],
            SchematicItem::Sheet(_) => &[sch::SHEET],
            SchematicItem::Symbol(_) => &[
                sch::SYMBOL_BACKGROUND,
                sch::SYMBOL_FOREGROUND,
                sch::SYMBOL_PIN,
                sch::SYMBOL_FIELD,
            ],
        }
    }

    fn paint_item(
        &self,
        renderer: &mut dyn Renderer,
        layer: &str,
        item: &SchematicItem,
        document: &KicadSch,
    ) -> Result<(), DrawError> {
        match item {
            SchematicItem::Wire(wire) => self.paint_wire(renderer, wire),
            SchematicItem::Bus(bus) => self.paint_bus(renderer, bus),
            SchematicItem::BusEntry(entry) => self.paint_bus_entry(renderer, entry),
            SchematicItem::Junction(junction) => self.paint_junction(renderer, junction),
            SchematicItem::NoConnect(nc) => self.paint_no_connect(renderer, nc),
            SchematicItem::Polyline(poly) => self.paint_polyline(renderer, poly),
            SchematicItem::Text(text) => self.paint_text(renderer, text),
            SchematicItem::Label(label) => self.paint_label(renderer, label),
            SchematicItem::GlobalLabel(label) => self.paint_global_label(renderer, label),
            SchematicItem::HierarchicalLabel(label) => {
                self.paint_hierarchical_label(renderer, label)
            }
            SchematicItem::Sheet(sheet) => self.paint_sheet(renderer, sheet),
            SchematicItem::Symbol(symbol) => {
                let lib = document.lib_symbol(symbol)?;
                let ctx = SymbolContext {
                    symbol,
                    lib,
                    transform: SymbolTransform::for_symbol(symbol),
                };
                self.paint_symbol(renderer, layer, &ctx);
            }
        }
        Ok(())
    }

    // ─── Stroke fallbacks ────────────────────────────────────────────

    /// A zero stroke width falls back to the theme default.
    fn stroke_width(&self, stroke: &Stroke) -> f64 {
        if stroke.width > 0.0 {
            stroke.width
        } else {
            self.theme.default_line_width
        }
    }

    /// An absent or fully transparent stroke color falls back to the
    /// color of the layer being painted into.
    fn stroke_color(&self, stroke: &Stroke, layer_default: Color) -> Color {
        match stroke.color {
            Some(c) if !c.is_transparent() => convert_color(c),
            _ => layer_default,
        }
    }

    // ─── Connectivity items ──────────────────────────────────────────

    fn paint_wire(&self, renderer: &mut dyn Renderer, wire: &Wire) {
        let points: Vec<Vec2> = wire.pts.iter().map(|p| Vec2::from(*p)).collect();
        let color = self.stroke_color(&wire.stroke, self.theme.wire);
        renderer.line(&points, self.stroke_width(&wire.stroke), color);
    }

    fn paint_bus(&self, renderer: &mut dyn Renderer, bus: &Bus) {
        let points: Vec<Vec2> = bus.pts.iter().map(|p| Vec2::from(*p)).collect();
        let color = self.stroke_color(&bus.stroke, self.theme.bus);
        // buses read heavier than wires
        let width = if bus.stroke.width > 0.0 {
            bus.stroke.width
        } else {
            self.theme.default_line_width * 3.0
        };
        renderer.line(&points, width, color);
    }

    fn paint_bus_entry(&self, renderer: &mut dyn Renderer, entry: &BusEntry) {
        let start = Vec2::from(entry.at.pos);
        let end = start + Vec2::from(entry.size);
        let color = self.stroke_color(&entry.stroke, self.theme.wire);
        renderer.line(&[start, end], self.stroke_width(&entry.stroke), color);
    }

    fn paint_junction(&self, renderer: &mut dyn Renderer, junction: &Junction) {
        let radius = if junction.diameter > 0.0 {
            junction.diameter / 2.0
        } else {
            JUNCTION_RADIUS
        };
        let color = match junction.color {
            Some(c) if !c.is_transparent() => convert_color(c),
            _ => self.theme.junction,
        };
        renderer.circle(Vec2::from(junction.at.pos), radius, color);
    }

    fn paint_no_connect(&self, renderer: &mut dyn Renderer, nc: &NoConnect) {
        let center = Vec2::from(nc.at.pos);
        let half = NO_CONNECT_SIZE / 2.0;
        let width = self.theme.default_line_width;
        let color = self.theme.no_connect;
        renderer.line(
            &[
                center + Vec2::new(-half, -half),
                center + Vec2::new(half, half),
            ],
            width,
            color,
        );
        renderer.line(
            &[
                center + Vec2::new(half, -half),
                center + Vec2::new(-half, half),
            ],
            width,
            color,
        );
    }

    // ─── Notes ───────────────────────────────────────────────────────

    fn paint_polyline(&self, renderer: &mut dyn Renderer, poly: &Polyline) {
        let points: Vec<Vec2> = poly.pts.iter().map(|p| Vec2::from(*p)).collect();
        let color = self.stroke_color(&poly.stroke, self.theme.note);
        if let Some(fill) = &poly.fill {
            match fill.fill_type {
                FillType::None => {}
                FillType::Outline => renderer.polygon(&points, color),
                FillType::Background => renderer.polygon(&points, self.theme.component_body),
                FillType::Color => {
                    let fill_color = fill.color.map(convert_color).unwrap_or(color);
                    renderer.polygon(&points, fill_color);
                }
            }
        }
        renderer.line(&points, self.stroke_width(&poly.stroke), color);
    }

    fn paint_text(&self, renderer: &mut dyn Renderer, text: &Text) {
        let mut attrs = TextAttributes::from_effects(&text.effects);
        let (angle, h_align) = readable_angle(text.at.rotation, attrs.h_align);
        attrs.angle = Angle::from_degrees(-angle);
        attrs.h_align = h_align;
        let rendered = self.font.draw(&text.text, Vec2::from(text.at.pos), &attrs);
        emit_text(renderer, &rendered, self.theme.note);
    }

    // ─── Labels ──────────────────────────────────────────────────────

    fn paint_label(&self, renderer: &mut dyn Renderer, label: &Label) {
        let mut attrs = TextAttributes::from_effects(&label.effects);
        let (angle, h_align) = readable_angle(label.at.rotation, attrs.h_align);
        attrs.h_align = h_align;
        attrs.angle = Angle::from_degrees(-angle);
        // lift the text off the wire it names
        let lift = attrs.size.y * 0.35;
        let mut position = Vec2::from(label.at.pos);
        if angle == 90.0 {
            position.x -= lift;
        } else {
            position.y -= lift;
        }
        let rendered = self.font.draw(&label.text, position, &attrs);
        emit_text(renderer, &rendered, self.theme.label_local);
    }

    /// Flag outline of a global label, anchor at the connection point,
    /// body extending toward +x before rotation.
    fn global_label_outline(&self, label: &GlobalLabel, attrs: &TextAttributes) -> Vec<Vec2> {
        let extents = self.font.get_line_extents(
            &label.text,
            attrs.size,
            attrs.thickness,
            attrs.bold,
            attrs.italic,
        );
        let margin = attrs.size.y * 0.375;
        let half = extents.y / 2.0 + margin;
        let body = extents.x + 2.0 * margin;
        let (point_left, point_right) = match label.shape {
            LabelShape::Input => (true, false),
            LabelShape::Output => (false, true),
            LabelShape::Bidirectional | LabelShape::TriState => (true, true),
            LabelShape::Passive => (false, false),
        };
        let lead = if point_left { half } else { 0.0 };
        let tail = if point_right { half } else { 0.0 };
        let width = lead + body + tail;

        let mut points = Vec::new();
        if point_left {
            points.push(Vec2::new(0.0, 0.0));
        }
        points.push(Vec2::new(lead, -half));
        if point_right {
            points.push(Vec2::new(width - tail, -half));
            points.push(Vec2::new(width, 0.0));
            points.push(Vec2::new(width - tail, half));
        } else {
            points.push(Vec2::new(width, -half));
            points.push(Vec2::new(width, half));
        }
        points.push(Vec2::new(lead, half));
        if let Some(first) = points.first().copied() {
            points.push(first);
        }
        points
    }

    fn paint_global_label(&self, renderer: &mut dyn Renderer, label: &GlobalLabel) {
        let mut attrs = TextAttributes::from_effects(&label.effects);
        let (angle, _) = readable_angle(label.at.rotation, attrs.h_align);
        let rotation = Angle::from_degrees(-angle);
        let anchor = Vec2::from(label.at.pos);
        let color = self.theme.label_global;

        let outline = self.global_label_outline(label, &attrs);
        let world: Vec<Vec2> = outline
            .iter()
            .map(|p| p.rotate(rotation) + anchor)
            .collect();
        renderer.line(&world, self.theme.default_line_width, color);

        let margin = attrs.size.y * 0.375;
        let lead = match label.shape {
            LabelShape::Input | LabelShape::Bidirectional | LabelShape::TriState => {
                self.font
                    .get_line_extents(
                        &label.text,
                        attrs.size,
                        attrs.thickness,
                        attrs.bold,
                        attrs.italic,
                    )
                    .y
                    / 2.0
                    + margin
            }
            _ => 0.0,
        };
        attrs.h_align = HAlign::Left;
        attrs.v_align = VAlign::Center;
        attrs.angle = rotation;
        let text_pos = Vec2::new(lead + margin, 0.0).rotate(rotation) + anchor;
        let rendered = self.font.draw(&label.text, text_pos, &attrs);
        emit_text(renderer, &rendered, color);
    }

    fn shape_glyph(shape: LabelShape, size: f64) -> Vec<Vec2> {
        let h = size / 2.0;
        let mut points = match shape {
            LabelShape::Input => vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(h, -h),
                Vec2::new(size, -h),
                Vec2::new(size, h),
                Vec2::new(h, h),
            ],
            LabelShape::Output => vec![
                Vec2::new(0.0, -h),
                Vec2::new(h, -h),
                Vec2::new(size, 0.0),
                Vec2::new(h, h),
                Vec2::new(0.0, h),
            ],
            LabelShape::Bidirectional | LabelShape::TriState => vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(h, -h),
                Vec2::new(size - h, -h),
                Vec2::new(size, 0.0),
                Vec2::new(size - h, h),
                Vec2::new(h, h),
            ],
            LabelShape::Passive => vec![
                Vec2::new(0.0, -h),
                Vec2::new(size, -h),
                Vec2::new(size, h),
                Vec2::new(0.0, h),
            ],
        };
        if let Some(first) = points.first().copied() {
            points.push(first);
        }
        points
    }

    fn paint_hierarchical_label(&self, renderer: &mut dyn Renderer, label: &HierarchicalLabel) {
        let mut attrs = TextAttributes::from_effects(&label.effects);
        let (angle, _) = readable_angle(label.at.rotation, attrs.h_align);
        let rotation = Angle::from_degrees(-angle);
        let anchor = Vec2::from(label.at.pos);
        let color = self.theme.label_hier;
        let size = attrs.size.y;

        let glyph: Vec<Vec2> = Self::shape_glyph(label.shape, size)
            .iter()
            .map(|p| p.rotate(rotation) + anchor)
            .collect();
        renderer.line(&glyph, self.theme.default_line_width, color);

        attrs.h_align = HAlign::Left;
        attrs.v_align = VAlign::Center;
        attrs.angle = rotation;
        let text_pos = Vec2::new(size + attrs.size.x * 0.3, 0.0).rotate(rotation) + anchor;
        let rendered = self.font.draw(&label.text, text_pos, &attrs);
        emit_text(renderer, &rendered, color);
    }

    // ─── Sheets ──────────────────────────────────────────────────────

    fn paint_sheet(&self, renderer: &mut dyn Renderer, sheet: &Sheet) {
        let origin = Vec2::from(sheet.at.pos);
        let size = Vec2::from(sheet.size);
        let corners = [
            origin,
            origin + Vec2::new(size.x, 0.0),
            origin + size,
            origin + Vec2::new(0.0, size.y),
            origin,
        ];
        let fill = match &sheet.fill {
            Some(f) if f.fill_type != FillType::None => f
                .color
                .map(convert_color)
                .unwrap_or(self.theme.sheet_background),
            _ => self.theme.sheet_background,
        };
        renderer.polygon(&corners[..4], fill);
        renderer.line(
            &corners,
            self.stroke_width(&sheet.stroke),
            self.stroke_color(&sheet.stroke, self.theme.sheet),
        );

        let mut attrs = TextAttributes {
            h_align: HAlign::Left,
            v_align: VAlign::Bottom,
            ..TextAttributes::default()
        };
        let name = self.font.draw(
            sheet.sheet_name(),
            origin + Vec2::new(0.0, -0.4),
            &attrs,
        );
        emit_text(renderer, &name, self.theme.sheet_name);

        attrs.v_align = VAlign::Top;
        attrs.italic = true;
        let file = self.font.draw(
            &format!("File: {}", sheet.sheet_file()),
            origin + Vec2::new(0.0, size.y + 0.4),
            &attrs,
        );
        emit_text(renderer, &file, self.theme.sheet_filename);

        for pin in &sheet.pins {
            let mut pin_attrs = TextAttributes::from_effects(&pin.effects);
            let (angle, _) = readable_angle(pin.at.rotation, pin_attrs.h_align);
            let rotation = Angle::from_degrees(-angle);
            let anchor = Vec2::from(pin.at.pos);
            let glyph: Vec<Vec2> = Self::shape_glyph(pin.shape, pin_attrs.size.y)
                .iter()
                .map(|p| p.rotate(rotation) + anchor)
                .collect();
            renderer.line(&glyph, self.theme.default_line_width, self.theme.sheet_label);
            pin_attrs.h_align = HAlign::Left;
            pin_attrs.v_align = VAlign::Center;
            pin_attrs.angle = rotation;
            let text_pos =
                Vec2::new(pin_attrs.size.y + pin_attrs.size.x * 0.3, 0.0).rotate(rotation) + anchor;
            let rendered = self.font.draw(&pin.name, text_pos, &pin_attrs);
            emit_text(renderer, &rendered, self.theme.sheet_label);
        }
    }

    // ─── Symbols ─────────────────────────────────────────────────────

    fn paint_symbol(&self, renderer: &mut dyn Renderer, layer: &str, ctx: &SymbolContext) {
        match layer {
            sch::SYMBOL_BACKGROUND => self.paint_symbol_body(renderer, ctx, BodyPass::Background),
            sch::SYMBOL_FOREGROUND => self.paint_symbol_body(renderer, ctx, BodyPass::Foreground),
            sch::SYMBOL_PIN => self.paint_symbol_pins(renderer, ctx),
            sch::SYMBOL_FIELD => self.paint_symbol_fields(renderer, ctx),
            _ => {}
        }
    }

    fn symbol_graphics<'b>(&self, ctx: &'b SymbolContext) -> Vec<&'b SymbolGraphic> {
        let mut graphics: Vec<&SymbolGraphic> = ctx.lib.drawings.iter().collect();
        for unit in ctx.lib.units_for(ctx.symbol.unit) {
            graphics.extend(unit.drawings.iter());
        }
        graphics
    }

    fn paint_symbol_body(&self, renderer: &mut dyn Renderer, ctx: &SymbolContext, pass: BodyPass) {
        renderer.push_state();
        let matrix = renderer.state_mut().matrix.multiply(&ctx.transform.matrix);
        renderer.state_mut().matrix = matrix;

        for graphic in self.symbol_graphics(ctx) {
            match graphic {
                SymbolGraphic::Arc(arc) => {
                    if pass == BodyPass::Foreground {
                        match ArcGeom::from_three_points(
                            Vec2::from(arc.start),
                            Vec2::from(arc.mid),
                            Vec2::from(arc.end),
                        ) {
                            Some(geom) => renderer.arc(
                                geom.center,
                                geom.radius,
                                geom.start_angle,
                                geom.end_angle,
                                self.stroke_width(&arc.stroke),
                                self.stroke_color(&arc.stroke, self.theme.component_outline),
                            ),
                            None => renderer.line(
                                &[Vec2::from(arc.start), Vec2::from(arc.end)],
                                self.stroke_width(&arc.stroke),
                                self.stroke_color(&arc.stroke, self.theme.component_outline),
                            ),
                        }
                    }
                }
                SymbolGraphic::Circle(circle) => {
                    let center = Vec2::from(circle.center);
                    match pass {
                        BodyPass::Background => {
                            if circle.fill.fill_type == FillType::Background {
                                renderer.circle(center, circle.radius, self.theme.component_body);
                            }
                        }
                        BodyPass::Foreground => {
                            let color =
                                self.stroke_color(&circle.stroke, self.theme.component_outline);
                            if circle.fill.fill_type == FillType::Outline {
                                renderer.circle(center, circle.radius, color);
                            }
                            renderer.arc(
                                center,
                                circle.radius,
                                Angle::from_degrees(0.0),
                                Angle::from_degrees(360.0),
                                self.stroke_width(&circle.stroke),
                                color,
                            );
                        }
                    }
                }
                SymbolGraphic::Rectangle(rect) => {
                    let points = [
                        Vec2::from(rect.start),
                        Vec2::new(rect.end[0], rect.start[1]),
                        Vec2::from(rect.end),
                        Vec2::new(rect.start[0], rect.end[1]),
                        Vec2::from(rect.start),
                    ];
                    self.body_shape(renderer, &points, &rect.stroke, rect.fill.fill_type, pass);
                }
                SymbolGraphic::Polyline(poly) => {
                    let points: Vec<Vec2> = poly.pts.iter().map(|p| Vec2::from(*p)).collect();
                    self.body_shape(renderer, &points, &poly.stroke, poly.fill.fill_type, pass);
                }
                SymbolGraphic::Bezier(bezier) => {
                    let points = bezier_points(&bezier.pts, 16);
                    self.body_shape(renderer, &points, &bezier.stroke, bezier.fill.fill_type, pass);
                }
                SymbolGraphic::Text(text) => {
                    if pass == BodyPass::Foreground {
                        self.paint_lib_text(renderer, ctx, text);
                    }
                }
            }
        }
        renderer.pop_state();
    }

    fn body_shape(
        &self,
        renderer: &mut dyn Renderer,
        points: &[Vec2],
        stroke: &Stroke,
        fill: FillType,
        pass: BodyPass,
    ) {
        match pass {
            BodyPass::Background => {
                if fill == FillType::Background {
                    renderer.polygon(points, self.theme.component_body);
                }
            }
            BodyPass::Foreground => {
                let color = self.stroke_color(stroke, self.theme.component_outline);
                if fill == FillType::Outline {
                    renderer.polygon(points, color);
                }
                renderer.line(points, self.stroke_width(stroke), color);
            }
        }
    }

    /// Body text inside a symbol. The rotation of symbol-owned text is
    /// stored in decidegrees; divide by ten before use.
    fn paint_lib_text(&self, renderer: &mut dyn Renderer, ctx: &SymbolContext, text: &LibText) {
        // pop out of the body transform: text is placed in document space
        // so it stays readable under mirroring
        renderer.push_state();
        renderer.state_mut().matrix = Matrix3::identity();
        let mut attrs = TextAttributes::from_effects(&text.effects);
        let total = text.at.rotation / 10.0 + ctx.symbol.at.rotation;
        let (angle, h_align) = readable_angle(total, attrs.h_align);
        attrs.angle = Angle::from_degrees(-angle);
        attrs.h_align = h_align;
        let position = ctx.transform.matrix.transform(Vec2::from(text.at.pos));
        let rendered = self.font.draw(&text.text, position, &attrs);
        emit_text(renderer, &rendered, self.theme.component_outline);
        renderer.pop_state();
    }

    fn symbol_pins<'b>(&self, ctx: &'b SymbolContext) -> Vec<&'b PinDefinition> {
        let mut pins: Vec<&PinDefinition> = ctx.lib.pins.iter().collect();
        for unit in ctx.lib.units_for(ctx.symbol.unit) {
            pins.extend(unit.pins.iter());
        }
        pins
    }

    fn paint_symbol_pins(&self, renderer: &mut dyn Renderer, ctx: &SymbolContext) {
        for pin in self.symbol_pins(ctx) {
            if pin.hide {
                continue;
            }
            self.paint_pin(renderer, ctx, pin);
        }
    }

    fn pin_direction(rotation: f64) -> Vec2 {
        match (rotation as i32).rem_euclid(360) {
            90 => Vec2::new(0.0, 1.0),
            180 => Vec2::new(-1.0, 0.0),
            270 => Vec2::new(0.0, -1.0),
            _ => Vec2::new(1.0, 0.0),
        }
    }

    fn paint_pin(&self, renderer: &mut dyn Renderer, ctx: &SymbolContext, pin: &PinDefinition) {
        let width = self.theme.default_line_width;
        let color = self.theme.pin;
        let start = Vec2::from(pin.at.pos);
        let dir = Self::pin_direction(pin.at.rotation);
        let end = start + dir * pin.length;

        renderer.push_state();
        let matrix = renderer.state_mut().matrix.multiply(&ctx.transform.matrix);
        renderer.state_mut().matrix = matrix;
        match pin.shape {
            PinShape::Inverted | PinShape::InvertedClock => {
                let r = PIN_INVERTED_RADIUS;
                renderer.line(&[start, end - dir * (2.0 * r)], width, color);
                renderer.arc(
                    end - dir * r,
                    r,
                    Angle::from_degrees(0.0),
                    Angle::from_degrees(360.0),
                    width,
                    color,
                );
            }
            PinShape::NonLogic => {
                renderer.line(&[start, end], width, color);
                let s = PIN_CLOCK_SIZE / 2.0;
                renderer.line(
                    &[start + Vec2::new(-s, -s), start + Vec2::new(s, s)],
                    width,
                    color,
                );
                renderer.line(
                    &[start + Vec2::new(s, -s), start + Vec2::new(-s, s)],
                    width,
                    color,
                );
            }
            _ => renderer.line(&[start, end], width, color),
        }
        if matches!(pin.shape, PinShape::Clock | PinShape::InvertedClock) {
            // clock wedge just inside the body
            let perp = Vec2::new(-dir.y, dir.x) * (PIN_CLOCK_SIZE / 2.0);
            renderer.line(
                &[end + perp, end + dir * PIN_CLOCK_SIZE, end - perp],
                width,
                color,
            );
        }
        renderer.pop_state();

        // labels are placed in document space so orientation stays
        // readable whatever the ambient symbol transform did
        let world_start = ctx.transform.matrix.transform(start);
        let world_end = ctx.transform.matrix.transform(end);
        let delta = world_end - world_start;
        let horizontal = delta.x.abs() >= delta.y.abs();

        if !ctx.lib.pin_numbers.hide && !pin.number.text.is_empty() {
            let mut attrs = TextAttributes::from_effects(&pin.number.effects);
            attrs.h_align = HAlign::Center;
            attrs.v_align = VAlign::Bottom;
            let mid = world_start + delta * 0.5;
            let (position, angle) = if horizontal {
                (mid + Vec2::new(0.0, -PIN_NUMBER_OFFSET / 2.0), 0.0)
            } else {
                (mid + Vec2::new(-PIN_NUMBER_OFFSET / 2.0, 0.0), 90.0)
            };
            attrs.angle = Angle::from_degrees(-angle);
            let rendered = self.font.draw(&pin.number.text, position, &attrs);
            emit_text(renderer, &rendered, self.theme.pin_number);
        }

        if !ctx.lib.pin_names.hide && !pin.name.text.is_empty() && pin.name.text != "~" {
            let offset = ctx.lib.pin_names.offset;
            let mut attrs = TextAttributes::from_effects(&pin.name.effects);
            attrs.v_align = VAlign::Center;
            let (position, angle) = if offset > 0.0 {
                // inside the body, just past the pin end
                let step = if horizontal {
                    Vec2::new(delta.x.signum() * offset, 0.0)
                } else {
                    Vec2::new(0.0, delta.y.signum() * offset)
                };
                attrs.h_align = if horizontal {
                    if delta.x > 0.0 {
                        HAlign::Left
                    } else {
                        HAlign::Right
                    }
                } else if delta.y < 0.0 {
                    HAlign::Left
                } else {
                    HAlign::Right
                };
                (world_end + step, if horizontal { 0.0 } else { 90.0 })
            } else {
                // no offset: name rides above the pin line
                let mid = world_start + delta * 0.5;
                attrs.h_align = HAlign::Center;
                attrs.v_align = VAlign::Bottom;
                if horizontal {
                    (mid + Vec2::new(0.0, -PIN_NUMBER_OFFSET), 0.0)
                } else {
                    (mid + Vec2::new(-PIN_NUMBER_OFFSET, 0.0), 90.0)
                }
            };
            attrs.angle = Angle::from_degrees(-angle);
            let rendered = self.font.draw(&pin.name.text, position, &attrs);
            emit_text(renderer, &rendered, self.theme.pin_name);
        }
    }

    fn paint_symbol_fields(&self, renderer: &mut dyn Renderer, ctx: &SymbolContext) {
        for property in &ctx.symbol.properties {
            if property.value.is_empty() {
                continue;
            }
            let effects: Effects = ctx.symbol.resolved_effects(ctx.lib, property);
            if effects.hide {
                continue;
            }
            let mut attrs = TextAttributes::from_effects(&effects);
            let (angle, h_align) = readable_angle(property.at.rotation, attrs.h_align);
            attrs.angle = Angle::from_degrees(-angle);
            attrs.h_align = h_align;
            let color = match property.name.as_str() {
                "Reference" => self.theme.reference,
                "Value" => self.theme.value,
                _ => self.theme.fields,
            };
            let rendered =
                self.font
                    .draw(&property.value, Vec2::from(property.at.pos), &attrs);
            emit_text(renderer, &rendered, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::ViewLayerSet;
    use crate::render::RecordingRenderer;
    use kicad_parse::{parse_schematic, ParseOptions};

    const SCHEMATIC: &str = r#"(kicad_sch (version 20230121) (generator eeschema)
        (lib_symbols
          (symbol "Device:R" (pin_numbers hide) (pin_names (offset 0))
            (property "Reference" "R" (id 0) (at 2.032 0 90)
              (effects (font (size 1.27 1.27))))
            (property "Value" "R" (id 1) (at 0 0 90)
              (effects (font (size 1.27 1.27))))
            (symbol "R_0_1"
              (rectangle (start -1.016 -2.54) (end 1.016 2.54)
                (stroke (width 0.254) (type default)) (fill (type none))))
            (symbol "R_1_1"
              (pin passive line (at 0 3.81 270) (length 1.27)
                (name "~" (effects (font (size 1.27 1.27))))
                (number "1" (effects (font (size 1.27 1.27)))))
              (pin passive line (at 0 -3.81 90) (length 1.27)
                (name "~" (effects (font (size 1.27 1.27))))
                (number "2" (effects (font (size 1.27 1.27))))))))
        (wire (pts (xy 0 0) (xy 10.16 0)) (stroke (width 0) (type default)))
        (junction (at 10.16 0) (diameter 0) (color 0 0 0 0))
        (label "OUT" (at 5.08 0 0) (effects (font (size 1.27 1.27)) (justify left bottom)))
        (symbol (lib_id "Device:R") (at 20.32 10.16 0) (unit 1)
          (in_bom yes) (on_board yes)
          (property "Reference" "R1" (id 0) (at 22.352 9.2 0)
            (effects (font (size 1.27 1.27)) (justify left)))
          (property "Value" "10k" (id 1) (at 22.352 11.1 0))
          (pin "1" (uuid a)) (pin "2" (uuid b))))"#;

    fn paint() -> (RecordingRenderer, ViewLayerSet) {
        let sch = parse_schematic(SCHEMATIC, &ParseOptions::default()).unwrap();
        let theme = SchematicTheme::default();
        let painter = SchematicPainter::new(&theme);
        let mut layers = ViewLayerSet::for_schematic(&theme);
        let mut renderer = RecordingRenderer::new();
        painter.paint(&mut renderer, &mut layers, &sch).unwrap();
        (renderer, layers)
    }

    #[test]
    fn test_paint_populates_expected_layers() {
        let (renderer, layers) = paint();
        let wire_layer = layers.by_name(sch::WIRE).unwrap();
        assert_eq!(wire_layer.items.len(), 1);
        assert_eq!(layers.by_name(sch::JUNCTION).unwrap().items.len(), 1);
        // the symbol fans out across its four layers
        for name in [
            sch::SYMBOL_FOREGROUND,
            sch::SYMBOL_BACKGROUND,
            sch::SYMBOL_PIN,
            sch::SYMBOL_FIELD,
        ] {
            assert_eq!(layers.by_name(name).unwrap().items.len(), 1, "{name}");
        }
        // something was actually drawn on the wire layer
        let recorded = renderer
            .layers()
            .iter()
            .find(|l| l.name == sch::WIRE)
            .unwrap();
        assert_eq!(recorded.primitives.len(), 1);
    }

    #[test]
    fn test_item_bboxes_recorded_for_hit_testing() {
        let (_, layers) = paint();
        let wire_layer = layers.by_name(sch::WIRE).unwrap();
        let handle = wire_layer.items[0];
        let bbox = wire_layer.bbox(handle).unwrap();
        assert!(bbox.contains(Vec2::new(5.08, 0.0)));
        // query_point finds the wire on an interactive layer
        assert!(!layers.query_point(Vec2::new(5.08, 0.0)).is_empty());
    }

    #[test]
    fn test_repaint_is_idempotent() {
        let sch = parse_schematic(SCHEMATIC, &ParseOptions::default()).unwrap();
        let theme = SchematicTheme::default();
        let painter = SchematicPainter::new(&theme);

        let mut run = || {
            let mut layers = ViewLayerSet::for_schematic(&theme);
            let mut renderer = RecordingRenderer::new();
            painter.paint(&mut renderer, &mut layers, &sch).unwrap();
            renderer.into_layers()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_unknown_lib_symbol_is_an_error() {
        let text = r#"(kicad_sch (version 1) (generator t)
            (symbol (lib_id "Ghost:X") (at 0 0 0)))"#;
        let sch = parse_schematic(text, &ParseOptions::default()).unwrap();
        let theme = SchematicTheme::default();
        let painter = SchematicPainter::new(&theme);
        let mut layers = ViewLayerSet::for_schematic(&theme);
        let mut renderer = RecordingRenderer::new();
        let err = painter.paint(&mut renderer, &mut layers, &sch).unwrap_err();
        assert!(err.to_string().contains("Ghost:X"));
    }

    #[test]
    fn test_symbol_transform_mirror_flags() {
        let text = r#"(symbol (lib_id "Device:R") (at 10 20 90) (mirror y) (unit 1))"#;
        let expr = kicad_parse::sexpr::parse(text).unwrap();
        let symbol =
            <SchematicSymbol as kicad_parse::schema::FromSexpr>::from_sexpr(&expr).unwrap();
        let t = SymbolTransform::for_symbol(&symbol);
        assert_eq!(t.rotations, 1);
        assert!(t.mirror_y);
        assert!(!t.mirror_x);
        // library y-up flips into document y-down: a point above the
        // origin lands above the anchor when unrotated
        let t0 = SymbolTransform::for_symbol(
            &<SchematicSymbol as kicad_parse::schema::FromSexpr>::from_sexpr(
                &kicad_parse::sexpr::parse(r#"(symbol (lib_id "X") (at 10 20 0))"#).unwrap(),
            )
            .unwrap(),
        );
        let p = t0.matrix.transform(Vec2::new(0.0, 3.81));
        assert!((p.y - (20.0 - 3.81)).abs() < 1e-9);
        assert!((p.x - 10.0).abs() < 1e-9);
    }
}
