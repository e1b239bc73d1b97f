//! Core data model for diagram documents.
//!
//! The diagram is a flat list of typed nodes connected by edges. Node
//! positions live in canvas space; the `CanvasTransform` maps canvas space
//! to the viewport. Everything here is plain data; interaction logic lives
//! in the editor crate and mutates this model through the `GraphStore`
//! contract.

use crate::id::{EdgeId, NodeId};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 3.0;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// Quantize to 8-bit channels.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// CSS `rgba(...)` notation, used by SVG and Canvas2D output.
    pub fn to_css(&self) -> String {
        let [r, g, b, _] = self.to_rgba8();
        if self.a >= 1.0 {
            format!("rgb({r}, {g}, {b})")
        } else {
            format!("rgba({r}, {g}, {b}, {})", self.a)
        }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// The kind of system-design component a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Start,
    Process,
    End,
}

impl NodeType {
    /// Icon reference used when a node is created without an explicit icon.
    pub fn default_icon(self) -> &'static str {
        match self {
            NodeType::Start => "play",
            NodeType::Process => "cog",
            NodeType::End => "flag",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::Process => "process",
            NodeType::End => "end",
        }
    }
}

/// Scalar value of a node configuration entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

/// A typed node placed on the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    /// Top-left corner in canvas space.
    pub position: Point,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub icon: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, ConfigValue>,
}

impl Node {
    pub fn new(id: NodeId, node_type: NodeType, label: impl Into<String>, position: Point) -> Self {
        Self {
            id,
            label: label.into(),
            position,
            node_type,
            icon: node_type.default_icon().to_string(),
            config: BTreeMap::new(),
        }
    }
}

/// Partial update applied by `GraphStore::update_node`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodePatch {
    pub label: Option<String>,
    pub icon: Option<String>,
    pub node_type: Option<NodeType>,
    /// Entries to insert; a `None` value removes the key.
    pub config: Vec<(String, Option<ConfigValue>)>,
}

impl NodePatch {
    pub fn apply(self, node: &mut Node) {
        if let Some(label) = self.label {
            node.label = label;
        }
        if let Some(icon) = self.icon {
            node.icon = icon;
        }
        if let Some(node_type) = self.node_type {
            node.node_type = node_type;
        }
        for (key, value) in self.config {
            match value {
                Some(v) => {
                    node.config.insert(key, v);
                }
                None => {
                    node.config.remove(&key);
                }
            }
        }
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// A connection between two distinct nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            id: EdgeId::for_pair(source, target),
            source,
            target,
        }
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }

    /// Undirected pair match: `(a, b)` and `(b, a)` are the same connection.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// Preview line drawn while a connection gesture is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempLine {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl TempLine {
    pub fn anchored(at: Point) -> Self {
        Self {
            x1: at.x,
            y1: at.y,
            x2: at.x,
            y2: at.y,
        }
    }

    pub fn with_end(self, end: Point) -> Self {
        Self {
            x2: end.x,
            y2: end.y,
            ..self
        }
    }
}

// ─── Transform ───────────────────────────────────────────────────────────

/// Maps canvas space to viewport space: `viewport = canvas * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CanvasTransform {
    pub const IDENTITY: CanvasTransform = CanvasTransform {
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };

    pub fn translation(&self) -> Vec2 {
        Vec2::new(self.translate_x, self.translate_y)
    }

    /// Same transform with `scale` clamped into `[min, max]`.
    /// Non-finite scales fall back to 1.0 before clamping.
    pub fn clamped(self, min: f64, max: f64) -> Self {
        Self {
            scale: clamp_zoom(self.scale, min, max),
            ..self
        }
    }
}

/// Clamp a zoom factor into `[min, max]`.
pub fn clamp_zoom(scale: f64, min: f64, max: f64) -> f64 {
    let scale = if scale.is_finite() { scale } else { 1.0 };
    scale.clamp(min, max)
}

/// Partial update applied by `GraphStore::update_canvas_transform`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformPatch {
    pub scale: Option<f64>,
    pub translate_x: Option<f64>,
    pub translate_y: Option<f64>,
}

impl TransformPatch {
    pub fn apply(self, t: &mut CanvasTransform) {
        if let Some(s) = self.scale {
            t.scale = s;
        }
        if let Some(x) = self.translate_x {
            t.translate_x = x;
        }
        if let Some(y) = self.translate_y {
            t.translate_y = y;
        }
    }
}

/// Anchor captured at drag start: `canvas_pointer - node.position`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DragOffset {
    pub x: f64,
    pub y: f64,
}

impl DragOffset {
    pub fn between(pointer: Point, position: Point) -> Self {
        let d = pointer - position;
        Self { x: d.x, y: d.y }
    }

    /// Node position that keeps the captured anchor under `pointer`.
    pub fn position_for(&self, pointer: Point) -> Point {
        Point::new(pointer.x - self.x, pointer.y - self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_output() {
        assert_eq!(Color::WHITE.to_hex(), "#FFFFFF");
        assert_eq!(Color::rgba(0.0, 0.0, 0.0, 128.0 / 255.0).to_hex(), "#00000080");
    }

    #[test]
    fn node_defaults_icon_by_type() {
        let n = Node::new(NodeId(1), NodeType::End, "Done", Point::ORIGIN);
        assert_eq!(n.icon, "flag");
        assert!(n.config.is_empty());
    }

    #[test]
    fn node_patch_updates_and_removes_config() {
        let mut n = Node::new(NodeId(1), NodeType::Process, "Queue", Point::ORIGIN);
        n.config.insert("retries".into(), ConfigValue::Number(3.0));
        NodePatch {
            label: Some("Worker".into()),
            config: vec![
                ("retries".into(), None),
                ("durable".into(), Some(ConfigValue::Bool(true))),
            ],
            ..Default::default()
        }
        .apply(&mut n);
        assert_eq!(n.label, "Worker");
        assert_eq!(n.config.get("durable"), Some(&ConfigValue::Bool(true)));
        assert!(!n.config.contains_key("retries"));
    }

    #[test]
    fn edge_connects_is_undirected() {
        let e = Edge::new(NodeId(1), NodeId(2));
        assert!(e.connects(NodeId(2), NodeId(1)));
        assert!(!e.connects(NodeId(1), NodeId(3)));
    }

    #[test]
    fn transform_clamps_scale() {
        let t = CanvasTransform {
            scale: 40.0,
            ..CanvasTransform::IDENTITY
        };
        assert_eq!(t.clamped(MIN_ZOOM, MAX_ZOOM).scale, MAX_ZOOM);
        assert_eq!(clamp_zoom(f64::NAN, MIN_ZOOM, MAX_ZOOM), 1.0);
        assert_eq!(clamp_zoom(0.0, MIN_ZOOM, MAX_ZOOM), MIN_ZOOM);
    }

    #[test]
    fn node_serializes_type_field() {
        let n = Node::new(NodeId(7), NodeType::Start, "Begin", Point::new(1.0, 2.0));
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "start");
        assert_eq!(json["id"], 7);
        assert_eq!(json["position"]["x"], 1.0);
    }
}
