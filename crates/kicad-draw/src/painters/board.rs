//! Painters for board documents.

use kicad_parse::board::{
    BoardGraphic, BoardItem, Footprint, FootprintGraphic, FpText, GrArc, GrCircle, GrCurve,
    GrLine, GrPoly, GrRect, GrText, KicadPcb, Pad, PadShape, PadType, TrackArc, TrackSegment,
    Via, Zone,
};
use kicad_parse::common::Stroke;

use super::{bezier_points, emit_text, readable_angle, rect_points, rounded_rect_points};
use crate::error::DrawError;
use crate::geom::{Angle, ArcGeom, Matrix3, Vec2};
use crate::layers::{board as vlayer, ItemHandle, ViewLayerSet};
use crate::render::Renderer;
use crate::text::{StrokeFont, TextAttributes};
use crate::theme::{BoardTheme, Color};

pub struct BoardPainter<'a> {
    theme: &'a BoardTheme,
    font: &'static StrokeFont,
}

impl<'a> BoardPainter<'a> {
    pub fn new(theme: &'a BoardTheme) -> Self {
        Self {
            theme,
            font: StrokeFont::get(),
        }
    }

    pub fn paint(
        &self,
        renderer: &mut dyn Renderer,
        layers: &mut ViewLayerSet,
        document: &KicadPcb,
    ) -> Result<(), DrawError> {
        layers.clear_items();
        let items: Vec<BoardItem> = document.items().collect();

        for (index, item) in items.iter().enumerate() {
            let targets = self.layers_for(item, document);
            if targets.is_empty() {
                log::warn!("no painter output for board item {index}, skipping");
                continue;
            }
            for name in targets {
                match layers.by_name_mut(&name) {
                    Some(layer) => layer.items.push(ItemHandle(index as u32)),
                    None => log::debug!("board item references unknown layer `{name}`"),
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

    /// View layers an item contributes to. Unlike the schematic side this
    /// is data-driven: copper items name their layer, pads fan out over
    /// copper/mask/paste/holes.
    fn layers_for(&self, item: &BoardItem, document: &KicadPcb) -> Vec<String> {
        match item {
            BoardItem::Segment(s) => vec![s.layer.clone()],
            BoardItem::Arc(a) => vec![a.layer.clone()],
            BoardItem::Via(_) => vec![vlayer::VIAS.to_string(), vlayer::VIA_HOLES.to_string()],
            BoardItem::Zone(zone) => {
                let mut out: Vec<String> = zone
                    .filled_polygons
                    .iter()
                    .map(|fp| vlayer::zones(&fp.layer))
                    .collect();
                out.sort();
                out.dedup();
                out
            }
            BoardItem::Graphic(graphic) => vec![graphic.layer().to_string()],
            BoardItem::Footprint(fp) => self.footprint_layers(fp, document),
        }
    }

    fn footprint_layers(&self, fp: &Footprint, document: &KicadPcb) -> Vec<String> {
        let copper = document.copper_layers();
        let mut out: Vec<String> = Vec::new();
        for graphic in &fp.graphics {
            let hidden = matches!(graphic, FootprintGraphic::Text(t) if t.hide);
            if !hidden {
                out.push(graphic.layer().to_string());
            }
        }
        for property in &fp.properties {
            if !property.hide {
                if let Some(layer) = &property.layer {
                    out.push(layer.clone());
                }
            }
        }
        for pad in &fp.pads {
            for layer in pad.expanded_layers(&copper) {
                match layer.as_str() {
                    "F.Cu" => out.push(vlayer::PADS_FRONT.to_string()),
                    "B.Cu" => out.push(vlayer::PADS_BACK.to_string()),
                    other => out.push(other.to_string()),
                }
            }
            if pad.drill.is_some() {
                out.push(vlayer::PAD_HOLES.to_string());
            }
        }
        out.sort();
        out.dedup();
        out
    }

    fn paint_item(
        &self,
        renderer: &mut dyn Renderer,
        layer: &str,
        item: &BoardItem,
        document: &KicadPcb,
    ) -> Result<(), DrawError> {
        match item {
            BoardItem::Segment(segment) => self.paint_segment(renderer, layer, segment),
            BoardItem::Arc(arc) => self.paint_track_arc(renderer, layer, arc),
            BoardItem::Via(via) => self.paint_via(renderer, layer, via),
            BoardItem::Zone(zone) => self.paint_zone(renderer, layer, zone),
            BoardItem::Graphic(graphic) => self.paint_graphic(renderer, layer, graphic),
            BoardItem::Footprint(fp) => self.paint_footprint(renderer, layer, fp, document),
        }
        Ok(())
    }

    fn layer_color(&self, layer: &str) -> Color {
        match layer {
            vlayer::PADS_FRONT => self.theme.f_cu,
            vlayer::PADS_BACK => self.theme.b_cu,
            vlayer::PAD_HOLES => self.theme.pad_hole,
            vlayer::VIAS => self.theme.via,
            vlayer::VIA_HOLES => self.theme.via_hole,
            name => match name.strip_prefix(":Zones:") {
                Some(copper) => self.theme.for_layer(copper).with_alpha(self.theme.zone_alpha),
                None => self.theme.for_layer(name),
            },
        }
    }

    // ─── Copper ──────────────────────────────────────────────────────

    fn paint_segment(&self, renderer: &mut dyn Renderer, layer: &str, segment: &TrackSegment) {
        renderer.line(
            &[Vec2::from(segment.start), Vec2::from(segment.end)],
            segment.width,
            self.layer_color(layer),
        );
    }

    fn paint_track_arc(&self, renderer: &mut dyn Renderer, layer: &str, arc: &TrackArc) {
        let color = self.layer_color(layer);
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
                arc.width,
                color,
            ),
            None => renderer.line(
                &[Vec2::from(arc.start), Vec2::from(arc.end)],
                arc.width,
                color,
            ),
        }
    }

    fn paint_via(&self, renderer: &mut dyn Renderer, layer: &str, via: &Via) {
        let center = Vec2::from(via.at.pos);
        match layer {
            vlayer::VIAS => renderer.circle(center, via.size / 2.0, self.theme.via),
            vlayer::VIA_HOLES => renderer.circle(center, via.drill / 2.0, self.theme.via_hole),
            _ => {}
        }
    }

    fn paint_zone(&self, renderer: &mut dyn Renderer, layer: &str, zone: &Zone) {
        let color = self.layer_color(layer);
        for filled in &zone.filled_polygons {
            if vlayer::zones(&filled.layer) != layer {
                continue;
            }
            let points: Vec<Vec2> = filled.pts.iter().map(|p| Vec2::from(*p)).collect();
            renderer.polygon(&points, color);
        }
    }

    // ─── Board-level graphics ────────────────────────────────────────

    fn paint_graphic(&self, renderer: &mut dyn Renderer, layer: &str, graphic: &BoardGraphic) {
        let color = self.layer_color(layer);
        match graphic {
            BoardGraphic::Line(line) => self.gr_line(renderer, line, color),
            BoardGraphic::Rect(rect) => self.gr_rect(renderer, rect, color),
            BoardGraphic::Circle(circle) => self.gr_circle(renderer, circle, color),
            BoardGraphic::Arc(arc) => self.gr_arc(renderer, arc, color),
            BoardGraphic::Poly(poly) => self.gr_poly(renderer, poly, color),
            BoardGraphic::Curve(curve) => self.gr_curve(renderer, curve, color),
            BoardGraphic::Text(text) => self.gr_text(renderer, text, color),
        }
    }

    fn stroke_width(&self, stroke: &Stroke) -> f64 {
        if stroke.width > 0.0 {
            stroke.width
        } else {
            0.12
        }
    }

    fn gr_line(&self, renderer: &mut dyn Renderer, line: &GrLine, color: Color) {
        renderer.line(
            &[Vec2::from(line.start), Vec2::from(line.end)],
            self.stroke_width(&line.stroke),
            color,
        );
    }

    fn gr_rect(&self, renderer: &mut dyn Renderer, rect: &GrRect, color: Color) {
        let points = [
            Vec2::from(rect.start),
            Vec2::new(rect.end[0], rect.start[1]),
            Vec2::from(rect.end),
            Vec2::new(rect.start[0], rect.end[1]),
            Vec2::from(rect.start),
        ];
        if rect.fill {
            renderer.polygon(&points[..4], color);
        }
        renderer.line(&points, self.stroke_width(&rect.stroke), color);
    }

    fn gr_circle(&self, renderer: &mut dyn Renderer, circle: &GrCircle, color: Color) {
        let center = Vec2::from(circle.center);
        let radius = (Vec2::from(circle.end) - center).length();
        if circle.fill {
            renderer.circle(center, radius, color);
        } else {
            renderer.arc(
                center,
                radius,
                Angle::from_degrees(0.0),
                Angle::from_degrees(360.0),
                self.stroke_width(&circle.stroke),
                color,
            );
        }
    }

    fn gr_arc(&self, renderer: &mut dyn Renderer, arc: &GrArc, color: Color) {
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
                color,
            ),
            None => renderer.line(
                &[Vec2::from(arc.start), Vec2::from(arc.end)],
                self.stroke_width(&arc.stroke),
                color,
            ),
        }
    }

    fn gr_poly(&self, renderer: &mut dyn Renderer, poly: &GrPoly, color: Color) {
        let mut points: Vec<Vec2> = poly.pts.iter().map(|p| Vec2::from(*p)).collect();
        if poly.fill {
            renderer.polygon(&points, color);
        }
        if let Some(first) = points.first().copied() {
            points.push(first);
        }
        renderer.line(&points, self.stroke_width(&poly.stroke), color);
    }

    fn gr_curve(&self, renderer: &mut dyn Renderer, curve: &GrCurve, color: Color) {
        renderer.line(
            &bezier_points(&curve.pts, 16),
            self.stroke_width(&curve.stroke),
            color,
        );
    }

    fn gr_text(&self, renderer: &mut dyn Renderer, text: &GrText, color: Color) {
        let mut attrs = TextAttributes::from_effects(&text.effects);
        let (angle, h_align) = readable_angle(text.at.rotation, attrs.h_align);
        attrs.angle = Angle::from_degrees(-angle);
        attrs.h_align = h_align;
        attrs.mirrored ^= text.layer.starts_with("B.");
        let rendered = self.font.draw(&text.text, Vec2::from(text.at.pos), &attrs);
        emit_text(renderer, &rendered, color);
    }

    // ─── Footprints ──────────────────────────────────────────────────

    fn paint_footprint(
        &self,
        renderer: &mut dyn Renderer,
        layer: &str,
        fp: &Footprint,
        document: &KicadPcb,
    ) {
        let transform = Matrix3::translation(fp.at.pos[0], fp.at.pos[1])
            .rotate(Angle::from_degrees(-fp.at.rotation));

        renderer.push_state();
        let matrix = renderer.state_mut().matrix.multiply(&transform);
        renderer.state_mut().matrix = matrix;

        for graphic in &fp.graphics {
            if graphic.layer() != layer {
                continue;
            }
            let color = self.layer_color(layer);
            match graphic {
                FootprintGraphic::Line(line) => self.gr_line(renderer, line, color),
                FootprintGraphic::Rect(rect) => self.gr_rect(renderer, rect, color),
                FootprintGraphic::Circle(circle) => self.gr_circle(renderer, circle, color),
                FootprintGraphic::Arc(arc) => self.gr_arc(renderer, arc, color),
                FootprintGraphic::Poly(poly) => self.gr_poly(renderer, poly, color),
                FootprintGraphic::Curve(curve) => self.gr_curve(renderer, curve, color),
                FootprintGraphic::Text(text) => self.fp_text(renderer, fp, text),
            }
        }

        for property in &fp.properties {
            if property.hide || property.layer.as_deref() != Some(layer) {
                continue;
            }
            let text = FpText {
                kind: kicad_parse::board::FpTextKind::User,
                text: property.value.clone(),
                at: property.at,
                layer: layer.to_string(),
                hide: false,
                effects: property.effects.clone().unwrap_or_default(),
                uuid: None,
            };
            self.fp_text(renderer, fp, &text);
        }

        let copper = document.copper_layers();
        for pad in &fp.pads {
            self.paint_pad(renderer, layer, fp, pad, &copper);
        }

        renderer.pop_state();
    }

    /// Footprint text: the stored angle is relative to the footprint, so
    /// the total orientation adds the footprint's own rotation.
    fn fp_text(&self, renderer: &mut dyn Renderer, fp: &Footprint, text: &FpText) {
        if text.hide {
            return;
        }
        let mut attrs = TextAttributes::from_effects(&text.effects);
        let (angle, h_align) = readable_angle(text.at.rotation + fp.at.rotation, attrs.h_align);
        attrs.h_align = h_align;
        // the ambient transform already rotates; counter it so text keeps
        // the resolved readable angle
        attrs.angle = Angle::from_degrees(fp.at.rotation - angle);
        attrs.mirrored ^= text.layer.starts_with("B.");
        let rendered = self.font.draw(&text.text, Vec2::from(text.at.pos), &attrs);
        emit_text(renderer, &rendered, self.layer_color(&text.layer));
    }

    fn pad_is_on(&self, pad: &Pad, view_layer: &str, copper: &[&str]) -> bool {
        for layer in pad.expanded_layers(copper) {
            let mapped = match layer.as_str() {
                "F.Cu" => vlayer::PADS_FRONT,
                "B.Cu" => vlayer::PADS_BACK,
                other => other,
            };
            if mapped == view_layer {
                return true;
            }
        }
        false
    }

    fn paint_pad(
        &self,
        renderer: &mut dyn Renderer,
        layer: &str,
        fp: &Footprint,
        pad: &Pad,
        copper: &[&str],
    ) {
        if layer == vlayer::PAD_HOLES {
            if let Some(drill) = &pad.drill {
                let offset = drill.offset.map(Vec2::from).unwrap_or_default();
                let center = Vec2::from(pad.at.pos) + offset;
                if drill.oval {
                    let size = [drill.diameter, drill.width.unwrap_or(drill.diameter)];
                    self.pad_polygon(
                        renderer,
                        pad,
                        center,
                        rounded_rect_points(size[0], size[1], size[0].min(size[1]) / 2.0),
                        self.theme.pad_hole,
                    );
                } else {
                    renderer.circle(center, drill.diameter / 2.0, self.theme.pad_hole);
                }
            }
            return;
        }
        if !self.pad_is_on(pad, layer, copper) {
            return;
        }
        let color = self.layer_color(layer);
        let center = Vec2::from(pad.at.pos);
        let (w, h) = (pad.size[0], pad.size[1]);
        match pad.shape {
            PadShape::Circle => renderer.circle(center, w / 2.0, color),
            PadShape::Rect => {
                self.pad_polygon(renderer, pad, center, rect_points(w, h), color);
            }
            PadShape::Oval => {
                self.pad_polygon(
                    renderer,
                    pad,
                    center,
                    rounded_rect_points(w, h, w.min(h) / 2.0),
                    color,
                );
            }
            PadShape::RoundRect => {
                let radius = pad.roundrect_rratio.unwrap_or(0.25) * w.min(h);
                self.pad_polygon(renderer, pad, center, rounded_rect_points(w, h, radius), color);
            }
            PadShape::Trapezoid => {
                let delta = pad.rect_delta.unwrap_or([0.0, 0.0]);
                let (dx, dy) = (delta[0] / 2.0, delta[1] / 2.0);
                let points = vec![
                    Vec2::new(-w / 2.0 - dy, -h / 2.0 + dx),
                    Vec2::new(w / 2.0 + dy, -h / 2.0 - dx),
                    Vec2::new(w / 2.0 - dy, h / 2.0 + dx),
                    Vec2::new(-w / 2.0 + dy, h / 2.0 - dx),
                ];
                self.pad_polygon(renderer, pad, center, points, color);
            }
            PadShape::Custom => {
                // custom pad primitives have no painter yet; the anchor
                // shape keeps the pad visible
                log::warn!(
                    "no painter for custom pad geometry ({} pad {}), drawing anchor",
                    fp.reference(),
                    pad.number
                );
                if pad.pad_type == PadType::NpThruHole {
                    renderer.circle(center, w.max(h) / 2.0, color);
                } else {
                    self.pad_polygon(renderer, pad, center, rect_points(w, h), color);
                }
            }
        }
    }

    /// Emit a pad outline polygon rotated by the pad's own angle around
    /// its center.
    fn pad_polygon(
        &self,
        renderer: &mut dyn Renderer,
        pad: &Pad,
        center: Vec2,
        points: Vec<Vec2>,
        color: Color,
    ) {
        let rotation = Angle::from_degrees(-pad.at.rotation);
        let world: Vec<Vec2> = points
            .into_iter()
            .map(|p| p.rotate(rotation) + center)
            .collect();
        renderer.polygon(&world, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::ViewLayerSet;
    use crate::render::RecordingRenderer;
    use kicad_parse::{parse_board, ParseOptions};

    const BOARD: &str = r#"(kicad_pcb (version 20221018) (generator pcbnew)
        (general (thickness 1.6))
        (layers
          (0 "F.Cu" signal) (31 "B.Cu" signal)
          (36 "B.SilkS" user) (37 "F.SilkS" user)
          (44 "Edge.Cuts" user))
        (net 0 "") (net 1 "GND")
        (footprint "R_0402" (layer "F.Cu") (at 10 10 90)
          (fp_line (start -1 0) (end 1 0) (stroke (width 0.12)) (layer "F.SilkS"))
          (pad "1" smd rect (at -0.5 0) (size 0.6 0.5) (layers "F.Cu" "F.Mask"))
          (pad "2" thru_hole circle (at 0.5 0) (size 1.0 1.0) (drill 0.5)
            (layers *.Cu *.Mask) (net 1 "GND")))
        (segment (start 0 0) (end 10 0) (width 0.25) (layer "F.Cu") (net 1))
        (via (at 10 0) (size 0.6) (drill 0.3) (layers "F.Cu" "B.Cu") (net 1))
        (zone (net 1) (net_name "GND") (layer "F.Cu")
          (polygon (pts (xy 0 0) (xy 20 0) (xy 20 20)))
          (filled_polygon (layer "F.Cu") (pts (xy 1 1) (xy 19 1) (xy 19 19))))
        (gr_line (start 0 0) (end 30 0) (stroke (width 0.1)) (layer "Edge.Cuts")))"#;

    fn paint() -> (RecordingRenderer, ViewLayerSet) {
        let pcb = parse_board(BOARD, &ParseOptions::default()).unwrap();
        let theme = BoardTheme::default();
        let painter = BoardPainter::new(&theme);
        let mut layers = ViewLayerSet::for_board(&pcb, &theme);
        let mut renderer = RecordingRenderer::new();
        painter.paint(&mut renderer, &mut layers, &pcb).unwrap();
        (renderer, layers)
    }

    fn primitives_on(renderer: &RecordingRenderer, name: &str) -> usize {
        renderer
            .layers()
            .iter()
            .filter(|l| l.name == name)
            .map(|l| l.primitives.len())
            .sum()
    }

    #[test]
    fn test_pad_fans_out_across_layers() {
        let (_, layers) = paint();
        let fp_handle = |name: &str| layers.by_name(name).map(|l| l.items.len());
        // the footprint lands on front pads, back pads (thru-hole), mask
        // layers, holes, and its silk layer
        assert_eq!(fp_handle(vlayer::PADS_FRONT), Some(1));
        assert_eq!(fp_handle(vlayer::PADS_BACK), Some(1));
        assert_eq!(fp_handle(vlayer::PAD_HOLES), Some(1));
        assert_eq!(fp_handle("F.SilkS"), Some(1));
    }

    #[test]
    fn test_via_annulus_and_hole() {
        let (renderer, _) = paint();
        assert_eq!(primitives_on(&renderer, vlayer::VIAS), 1);
        assert_eq!(primitives_on(&renderer, vlayer::VIA_HOLES), 1);
    }

    #[test]
    fn test_zone_fill_on_zone_layer() {
        let (renderer, _) = paint();
        assert_eq!(primitives_on(&renderer, &vlayer::zones("F.Cu")), 1);
    }

    #[test]
    fn test_track_and_edge() {
        let (renderer, _) = paint();
        assert_eq!(primitives_on(&renderer, "F.Cu"), 1);
        assert_eq!(primitives_on(&renderer, "Edge.Cuts"), 1);
    }

    #[test]
    fn test_footprint_transform_applies_to_pads() {
        let (renderer, _) = paint();
        let layer = renderer
            .layers()
            .iter()
            .find(|l| l.name == vlayer::PADS_FRONT)
            .unwrap();
        // footprint at (10,10) rotated 90°: pad "1" local (-0.5, 0) moves
        // onto the vertical axis through the footprint origin
        let mut xs = Vec::new();
        for p in &layer.primitives {
            if let crate::render::Primitive::Polygon { points, .. } = p {
                for point in points {
                    xs.push(point.x);
                }
            }
        }
        assert!(!xs.is_empty());
        let min = xs.iter().cloned().fold(f64::MAX, f64::min);
        let max = xs.iter().cloned().fold(f64::MIN, f64::max);
        // rotated 90°, the pad's long axis is vertical, so x stays close
        // to the footprint origin
        assert!(min > 9.0 && max < 11.0, "pad x range {min}..{max}");
    }

    #[test]
    fn test_repaint_is_idempotent() {
        let pcb = parse_board(BOARD, &ParseOptions::default()).unwrap();
        let theme = BoardTheme::default();
        let painter = BoardPainter::new(&theme);
        let mut run = || {
            let mut layers = ViewLayerSet::for_board(&pcb, &theme);
            let mut renderer = RecordingRenderer::new();
            painter.paint(&mut renderer, &mut layers, &pcb).unwrap();
            renderer.into_layers()
        };
        assert_eq!(run(), run());
    }
}
