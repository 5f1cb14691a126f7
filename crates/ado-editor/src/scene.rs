//! The rendering-engine boundary.
//!
//! The composer never talks to a concrete canvas library. It drives a
//! [`SceneGraph`]: one text node per layer, addressed by layer id, with
//! property get/set, paint-order moves and a selection highlight. The web
//! host implements it over the JS stage; tests use [`MemoryScene`].

use ado_core::id::LayerId;
use ado_core::model::{Alignment, LayerField, Shadow, TextLayer};
use smallvec::SmallVec;

// ─── Node properties ─────────────────────────────────────────────────────

/// A text node's visual properties, named the way the engine names them.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProps {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    /// Weight token as the engine's `fontStyle` expects it.
    pub font_style: String,
    pub fill: String,
    pub opacity: f64,
    pub align: Alignment,
    pub line_height: f64,
    pub letter_spacing: f64,
    pub shadow: Option<Shadow>,
}

impl NodeProps {
    /// What a node must look like to display `layer`.
    pub fn from_layer(layer: &TextLayer) -> Self {
        Self {
            x: layer.x,
            y: layer.y,
            rotation: layer.rotation,
            scale_x: layer.scale_x,
            scale_y: layer.scale_y,
            text: layer.text.clone(),
            font_size: layer.font_size,
            font_family: layer.font_family.clone(),
            font_style: layer.font_weight.to_string(),
            fill: layer.color.clone(),
            opacity: layer.opacity,
            align: layer.alignment,
            line_height: layer.line_height,
            letter_spacing: layer.letter_spacing,
            shadow: layer.shadow.clone(),
        }
    }

    /// The node property carrying descriptor `field`, valued from `self`.
    /// `None` for fields with no node counterpart (z-index is paint order).
    pub fn prop_for(&self, field: LayerField) -> Option<NodeProp> {
        Some(match field {
            LayerField::Text => NodeProp::Text(self.text.clone()),
            LayerField::X => NodeProp::X(self.x),
            LayerField::Y => NodeProp::Y(self.y),
            LayerField::FontSize => NodeProp::FontSize(self.font_size),
            LayerField::FontFamily => NodeProp::FontFamily(self.font_family.clone()),
            LayerField::FontWeight => NodeProp::FontStyle(self.font_style.clone()),
            LayerField::Color => NodeProp::Fill(self.fill.clone()),
            LayerField::Opacity => NodeProp::Opacity(self.opacity),
            LayerField::Alignment => NodeProp::Align(self.align),
            LayerField::Rotation => NodeProp::Rotation(self.rotation),
            LayerField::ScaleX => NodeProp::ScaleX(self.scale_x),
            LayerField::ScaleY => NodeProp::ScaleY(self.scale_y),
            LayerField::LineHeight => NodeProp::LineHeight(self.line_height),
            LayerField::LetterSpacing => NodeProp::LetterSpacing(self.letter_spacing),
            LayerField::Shadow => NodeProp::Shadow(self.shadow.clone()),
            LayerField::ZIndex => return None,
        })
    }

    /// True if `prop` already holds on `self`.
    pub fn holds(&self, prop: &NodeProp) -> bool {
        let mut probe = self.clone();
        probe.apply(prop.clone());
        probe == *self
    }

    pub fn apply(&mut self, prop: NodeProp) {
        match prop {
            NodeProp::X(v) => self.x = v,
            NodeProp::Y(v) => self.y = v,
            NodeProp::Rotation(v) => self.rotation = v,
            NodeProp::ScaleX(v) => self.scale_x = v,
            NodeProp::ScaleY(v) => self.scale_y = v,
            NodeProp::Text(v) => self.text = v,
            NodeProp::FontSize(v) => self.font_size = v,
            NodeProp::FontFamily(v) => self.font_family = v,
            NodeProp::FontStyle(v) => self.font_style = v,
            NodeProp::Fill(v) => self.fill = v,
            NodeProp::Opacity(v) => self.opacity = v,
            NodeProp::Align(v) => self.align = v,
            NodeProp::LineHeight(v) => self.line_height = v,
            NodeProp::LetterSpacing(v) => self.letter_spacing = v,
            NodeProp::Shadow(v) => self.shadow = v,
        }
    }

    pub fn transform(&self) -> NodeTransform {
        NodeTransform {
            x: self.x,
            y: self.y,
            rotation: self.rotation,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
        }
    }
}

/// One settable node property.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeProp {
    X(f64),
    Y(f64),
    Rotation(f64),
    ScaleX(f64),
    ScaleY(f64),
    Text(String),
    FontSize(f64),
    FontFamily(String),
    FontStyle(String),
    Fill(String),
    Opacity(f64),
    Align(Alignment),
    LineHeight(f64),
    LetterSpacing(f64),
    Shadow(Option<Shadow>),
}

impl NodeProp {
    /// Engine attribute name (`fill`, `fontStyle`, …).
    pub fn name(&self) -> &'static str {
        match self {
            NodeProp::X(_) => "x",
            NodeProp::Y(_) => "y",
            NodeProp::Rotation(_) => "rotation",
            NodeProp::ScaleX(_) => "scaleX",
            NodeProp::ScaleY(_) => "scaleY",
            NodeProp::Text(_) => "text",
            NodeProp::FontSize(_) => "fontSize",
            NodeProp::FontFamily(_) => "fontFamily",
            NodeProp::FontStyle(_) => "fontStyle",
            NodeProp::Fill(_) => "fill",
            NodeProp::Opacity(_) => "opacity",
            NodeProp::Align(_) => "align",
            NodeProp::LineHeight(_) => "lineHeight",
            NodeProp::LetterSpacing(_) => "letterSpacing",
            NodeProp::Shadow(_) => "shadow",
        }
    }
}

pub type PropList = SmallVec<[NodeProp; 4]>;

/// The part of a node a user gesture can change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

/// Paint-order move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    Up,
    Down,
    Top,
}

/// Something the user did on the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneEvent {
    /// Click or tap on a text node.
    Click(LayerId),
    DragStart(LayerId),
    DragEnd(LayerId),
    TransformEnd(LayerId),
    /// Click on the background image or bare stage.
    StageClick,
}

// ─── Engine contract ─────────────────────────────────────────────────────

/// A retained-mode stage holding one text node per layer.
///
/// Calls naming a node that does not exist are no-ops returning `false`.
pub trait SceneGraph {
    fn create_node(&mut self, id: LayerId, props: &NodeProps);
    fn destroy_node(&mut self, id: LayerId) -> bool;
    fn node_props(&self, id: LayerId) -> Option<NodeProps>;
    fn set_props(&mut self, id: LayerId, props: &[NodeProp]) -> bool;
    fn move_node(&mut self, id: LayerId, order: ZOrder) -> bool;
    /// Node ids, bottom to top.
    fn node_ids(&self) -> Vec<LayerId>;

    /// Attach the transform-handle widget to `id`, detaching it elsewhere.
    fn attach_handles(&mut self, id: LayerId) -> bool;
    fn detach_handles(&mut self);
    fn set_stroke(&mut self, id: LayerId, on: bool) -> bool;

    fn has_node(&self, id: LayerId) -> bool {
        self.node_props(id).is_some()
    }

    /// Redraw after a batch of changes. Engines that draw eagerly ignore it.
    fn batch_draw(&mut self) {}
}

// ─── In-memory scene ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct MemoryNode {
    id: LayerId,
    props: NodeProps,
    stroke: bool,
}

/// Write counters, for asserting how much work a sync did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneCounters {
    pub created: usize,
    pub destroyed: usize,
    /// Individual property writes.
    pub prop_writes: usize,
    pub moves: usize,
}

/// A [`SceneGraph`] held in memory. Also plays the user: `drag_to` and
/// `transform_to` change a node the way the engine would mid-gesture.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    nodes: Vec<MemoryNode>,
    handles: Option<LayerId>,
    counters: SceneCounters,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> SceneCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = SceneCounters::default();
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn handles(&self) -> Option<LayerId> {
        self.handles
    }

    pub fn has_stroke(&self, id: LayerId) -> bool {
        self.node(id).is_some_and(|n| n.stroke)
    }

    /// Move a node as a drag gesture would. Bypasses the counters.
    pub fn drag_to(&mut self, id: LayerId, x: f64, y: f64) -> bool {
        match self.node_mut(id) {
            Some(n) => {
                n.props.x = x;
                n.props.y = y;
                true
            }
            None => false,
        }
    }

    /// Change a node as the transform handles would.
    pub fn transform_to(&mut self, id: LayerId, t: NodeTransform) -> bool {
        match self.node_mut(id) {
            Some(n) => {
                n.props.x = t.x;
                n.props.y = t.y;
                n.props.rotation = t.rotation;
                n.props.scale_x = t.scale_x;
                n.props.scale_y = t.scale_y;
                true
            }
            None => false,
        }
    }

    fn node(&self, id: LayerId) -> Option<&MemoryNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: LayerId) -> Option<&mut MemoryNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    fn index_of(&self, id: LayerId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }
}

impl SceneGraph for MemoryScene {
    fn create_node(&mut self, id: LayerId, props: &NodeProps) {
        // Engines allow duplicate ids; the synchronizer never asks for one.
        debug_assert!(self.node(id).is_none(), "duplicate node {id:?}");
        self.nodes.push(MemoryNode {
            id,
            props: props.clone(),
            stroke: false,
        });
        self.counters.created += 1;
    }

    fn destroy_node(&mut self, id: LayerId) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        self.nodes.remove(i);
        if self.handles == Some(id) {
            self.handles = None;
        }
        self.counters.destroyed += 1;
        true
    }

    fn node_props(&self, id: LayerId) -> Option<NodeProps> {
        self.node(id).map(|n| n.props.clone())
    }

    fn set_props(&mut self, id: LayerId, props: &[NodeProp]) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        for p in props {
            node.props.apply(p.clone());
        }
        self.counters.prop_writes += props.len();
        true
    }

    fn move_node(&mut self, id: LayerId, order: ZOrder) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        let target = match order {
            ZOrder::Up => (i + 1).min(self.nodes.len() - 1),
            ZOrder::Down => i.saturating_sub(1),
            ZOrder::Top => self.nodes.len() - 1,
        };
        if target != i {
            let node = self.nodes.remove(i);
            self.nodes.insert(target, node);
        }
        self.counters.moves += 1;
        true
    }

    fn node_ids(&self) -> Vec<LayerId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    fn attach_handles(&mut self, id: LayerId) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        self.handles = Some(id);
        true
    }

    fn detach_handles(&mut self) {
        self.handles = None;
    }

    fn set_stroke(&mut self, id: LayerId, on: bool) -> bool {
        match self.node_mut(id) {
            Some(n) => {
                n.stroke = on;
                true
            }
            None => false,
        }
    }
}
