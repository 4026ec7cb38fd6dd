//! View layers: named, ordered, independently visible buckets of drawable
//! items plus their computed bounding boxes for hit-testing.
//!
//! Distinct from physical board copper layers, which are just one use of
//! the concept.

use std::collections::HashMap;

use kicad_parse::board::KicadPcb;

use crate::geom::{BBox, Vec2};
use crate::theme::{BoardTheme, Color, SchematicTheme};

/// The always-present topmost layer for selection chrome and the like.
pub const OVERLAY_LAYER: &str = ":Overlay";

/// Schematic view layer names, front to back.
pub mod sch {
    pub const SYMBOL_FIELD: &str = ":Symbol:Field";
    pub const LABEL: &str = ":Label";
    pub const JUNCTION: &str = ":Junction";
    pub const WIRE: &str = ":Wire";
    pub const BUS: &str = ":Bus";
    pub const SYMBOL_PIN: &str = ":Symbol:Pin";
    pub const SYMBOL_FOREGROUND: &str = ":Symbol:Foreground";
    pub const NOTES: &str = ":Notes";
    pub const SHEET: &str = ":Sheet";
    pub const SYMBOL_BACKGROUND: &str = ":Symbol:Background";
}

/// Virtual board layers that have no entry in the file's layer table.
pub mod board {
    pub const PAD_HOLES: &str = ":Pads:Holes";
    pub const VIA_HOLES: &str = ":Via:Holes";
    pub const VIAS: &str = ":Vias";
    pub const PADS_FRONT: &str = ":Pads:Front";
    pub const PADS_BACK: &str = ":Pads:Back";

    pub fn zones(copper_layer: &str) -> String {
        format!(":Zones:{copper_layer}")
    }
}

/// Stable identity of one document item within a paint pass: its index in
/// the document's item iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visibility {
    Visible,
    Hidden,
    /// Visible while `opacity > 0`; evaluated on every query, never
    /// cached.
    WhenOpaque,
}

#[derive(Debug, Clone)]
pub struct ViewLayer {
    pub name: String,
    pub visibility: Visibility,
    pub interactive: bool,
    pub highlighted: bool,
    pub color: Color,
    pub opacity: f64,
    pub items: Vec<ItemHandle>,
    bboxes: HashMap<ItemHandle, BBox>,
}

impl ViewLayer {
    pub fn new(name: impl Into<String>, interactive: bool, color: Color) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Visible,
            interactive,
            highlighted: false,
            color,
            opacity: 1.0,
            items: Vec::new(),
            bboxes: HashMap::new(),
        }
    }

    fn hidden(mut self) -> Self {
        self.visibility = Visibility::WhenOpaque;
        self.opacity = 0.0;
        self
    }

    pub fn visible(&self) -> bool {
        match self.visibility {
            Visibility::Visible => true,
            Visibility::Hidden => false,
            Visibility::WhenOpaque => self.opacity > 0.0,
        }
    }

    pub fn set_bbox(&mut self, item: ItemHandle, bbox: BBox) {
        self.bboxes.insert(item, bbox);
    }

    pub fn bbox(&self, item: ItemHandle) -> Option<&BBox> {
        self.bboxes.get(&item)
    }

    /// Union of the layer's item boxes.
    pub fn bounds(&self) -> BBox {
        let mut out = BBox::empty();
        for bbox in self.bboxes.values() {
            out = out.union(bbox);
        }
        out
    }

    /// Drop all derived state, keeping identity and flags. Called before a
    /// repaint so stale geometry can never leak through.
    pub fn clear(&mut self) {
        self.items.clear();
        self.bboxes.clear();
    }
}

/// An ordered set of view layers. Declared order is front to back; the
/// overlay layer is implicit and always paints last.
pub struct ViewLayerSet {
    layers: Vec<ViewLayer>,
    overlay: ViewLayer,
}

impl ViewLayerSet {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            overlay: ViewLayer::new(OVERLAY_LAYER, false, Color::TRANSPARENT),
        }
    }

    /// Append layers in front-to-back declared order.
    pub fn add(&mut self, layers: impl IntoIterator<Item = ViewLayer>) {
        self.layers.extend(layers);
    }

    /// The standard schematic layer set.
    pub fn for_schematic(theme: &SchematicTheme) -> Self {
        let mut set = Self::new();
        set.add([
            ViewLayer::new(sch::SYMBOL_FIELD, false, theme.fields),
            ViewLayer::new(sch::LABEL, true, theme.label_local),
            ViewLayer::new(sch::JUNCTION, false, theme.junction),
            ViewLayer::new(sch::WIRE, true, theme.wire),
            ViewLayer::new(sch::BUS, false, theme.bus),
            ViewLayer::new(sch::SYMBOL_PIN, false, theme.pin),
            ViewLayer::new(sch::SYMBOL_FOREGROUND, true, theme.component_outline),
            ViewLayer::new(sch::NOTES, false, theme.note),
            ViewLayer::new(sch::SHEET, true, theme.sheet),
            ViewLayer::new(sch::SYMBOL_BACKGROUND, false, theme.component_body),
        ]);
        set
    }

    /// A board layer set generated from the document's stackup: virtual
    /// pad/via/zone layers interleaved with the file's own layer table.
    /// Mask and paste start hidden, matching the usual editor defaults.
    pub fn for_board(pcb: &KicadPcb, theme: &BoardTheme) -> Self {
        let mut set = Self::new();
        set.add([
            ViewLayer::new(board::PAD_HOLES, false, theme.pad_hole),
            ViewLayer::new(board::VIA_HOLES, false, theme.via_hole),
            ViewLayer::new(board::VIAS, true, theme.via),
            ViewLayer::new("Edge.Cuts", false, theme.edge_cuts),
            ViewLayer::new(board::PADS_FRONT, true, theme.f_cu),
        ]);
        for def in &pcb.layers {
            let name = def.canonical_name.as_str();
            if name == "Edge.Cuts" || name.ends_with(".Cu") {
                continue;
            }
            if name.starts_with("B.") {
                continue; // back non-copper layers go behind the copper stack
            }
            let layer = ViewLayer::new(name, false, theme.for_layer(name));
            set.add([if name.ends_with(".Mask") || name.ends_with(".Paste") {
                layer.hidden()
            } else {
                layer
            }]);
        }
        for copper in pcb.copper_layers() {
            set.add([
                ViewLayer::new(copper, true, theme.for_layer(copper)),
                ViewLayer::new(
                    board::zones(copper),
                    false,
                    theme.for_layer(copper).with_alpha(theme.zone_alpha),
                ),
            ]);
        }
        set.add([ViewLayer::new(board::PADS_BACK, true, theme.b_cu)]);
        for def in &pcb.layers {
            let name = def.canonical_name.as_str();
            if !name.starts_with("B.") || name.ends_with(".Cu") {
                continue;
            }
            let layer = ViewLayer::new(name, false, theme.for_layer(name));
            set.add([if name.ends_with(".Mask") || name.ends_with(".Paste") {
                layer.hidden()
            } else {
                layer
            }]);
        }
        set
    }

    pub fn by_name(&self, name: &str) -> Option<&ViewLayer> {
        if name == OVERLAY_LAYER {
            return Some(&self.overlay);
        }
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut ViewLayer> {
        if name == OVERLAY_LAYER {
            return Some(&mut self.overlay);
        }
        self.layers.iter_mut().find(|l| l.name == name)
    }

    /// Declared (front-to-back) order, overlay first.
    pub fn in_order(&self) -> impl Iterator<Item = &ViewLayer> {
        std::iter::once(&self.overlay).chain(self.layers.iter())
    }

    /// Paint order: back to front, highlighted layers deferred to paint
    /// on top of everything except the overlay, which is always last.
    pub fn in_display_order(&self) -> impl Iterator<Item = &ViewLayer> {
        let normal = self.layers.iter().rev().filter(|l| !l.highlighted);
        let highlighted = self.layers.iter().rev().filter(|l| l.highlighted);
        normal.chain(highlighted).chain(std::iter::once(&self.overlay))
    }

    pub fn highlight(&mut self, name: &str) {
        for layer in &mut self.layers {
            layer.highlighted = layer.name == name;
        }
    }

    pub fn clear_highlight(&mut self) {
        for layer in &mut self.layers {
            layer.highlighted = false;
        }
    }

    /// Dispose all derived per-item state before repopulating.
    pub fn clear_items(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
        self.overlay.clear();
    }

    /// Interactive layers in declared order; visibility is re-evaluated
    /// here on every call.
    pub fn interactive_layers(&self) -> impl Iterator<Item = &ViewLayer> {
        self.layers.iter().filter(|l| l.interactive && l.visible())
    }

    /// Every (layer, item, bbox) hit at `point` among interactive layers.
    pub fn query_point(&self, point: Vec2) -> Vec<(&ViewLayer, ItemHandle, BBox)> {
        let mut hits = Vec::new();
        for layer in self.interactive_layers() {
            for (item, bbox) in &layer.bboxes {
                if bbox.contains(point) {
                    hits.push((layer, *item, *bbox));
                }
            }
        }
        hits
    }

    /// Union of every layer's bounds.
    pub fn bounds(&self) -> BBox {
        let mut out = BBox::empty();
        for layer in &self.layers {
            out = out.union(&layer.bounds());
        }
        out
    }
}

impl Default for ViewLayerSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_set() -> ViewLayerSet {
        let mut set = ViewLayerSet::new();
        set.add([
            ViewLayer::new("A", true, Color::rgb(255, 0, 0)),
            ViewLayer::new("B", false, Color::rgb(0, 255, 0)),
            ViewLayer::new("C", false, Color::rgb(0, 0, 255)),
        ]);
        set
    }

    fn order(set: &ViewLayerSet) -> Vec<&str> {
        set.in_display_order().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn test_display_order_reverses_declared_order() {
        let set = simple_set();
        assert_eq!(order(&set), vec!["C", "B", "A", OVERLAY_LAYER]);
    }

    #[test]
    fn test_highlighted_layer_paints_last_before_overlay() {
        let mut set = simple_set();
        set.highlight("B");
        assert_eq!(order(&set), vec!["C", "A", "B", OVERLAY_LAYER]);
        set.clear_highlight();
        assert_eq!(order(&set), vec!["C", "B", "A", OVERLAY_LAYER]);
    }

    #[test]
    fn test_query_point_interactive_only() {
        let mut set = simple_set();
        let bbox = BBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 10.0,
        };
        set.by_name_mut("A").unwrap().set_bbox(ItemHandle(0), bbox);
        set.by_name_mut("B").unwrap().set_bbox(ItemHandle(1), bbox);

        let hits = set.query_point(Vec2::new(5.0, 5.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.name, "A");
        assert_eq!(hits[0].1, ItemHandle(0));
        assert!(set.query_point(Vec2::new(50.0, 5.0)).is_empty());
    }

    #[test]
    fn test_computed_visibility_not_cached() {
        let mut set = simple_set();
        let layer = set.by_name_mut("A").unwrap();
        layer.visibility = Visibility::WhenOpaque;
        layer.opacity = 0.0;
        let bbox = BBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 10.0,
            max_y: 10.0,
        };
        layer.set_bbox(ItemHandle(0), bbox);
        assert!(set.query_point(Vec2::new(5.0, 5.0)).is_empty());
        // raising opacity is picked up by the very next query
        set.by_name_mut("A").unwrap().opacity = 0.5;
        assert_eq!(set.query_point(Vec2::new(5.0, 5.0)).len(), 1);
    }

    #[test]
    fn test_clear_items_disposes_derived_state() {
        let mut set = simple_set();
        let layer = set.by_name_mut("A").unwrap();
        layer.items.push(ItemHandle(0));
        layer.set_bbox(
            ItemHandle(0),
            BBox {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 1.0,
                max_y: 1.0,
            },
        );
        set.clear_items();
        let layer = set.by_name("A").unwrap();
        assert!(layer.items.is_empty());
        assert!(layer.bbox(ItemHandle(0)).is_none());
    }
}
