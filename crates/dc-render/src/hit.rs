//! Hit testing: point → node / edge / drawing object lookup.
//!
//! Walks items front-to-back (last painted = topmost). Node and edge
//! lookups work in canvas space; drawing objects in overlay space.

use dc_core::{DrawingObject, Edge, EdgeId, GraphState, Node, NodeId, ObjectId, Shape};
use kurbo::{Point, Rect, Size, Vec2};

/// Rendered size of a diagram node in canvas units.
pub const NODE_SIZE: Size = Size::new(160.0, 56.0);
/// Radius of the connection handle on a node's right edge.
pub const HANDLE_RADIUS: f64 = 7.0;
/// Extra pick distance around thin strokes.
pub const STROKE_TOLERANCE: f64 = 4.0;

/// What a canvas-space point lands on in the diagram layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramHit {
    Handle(NodeId),
    Node(NodeId),
    Edge(EdgeId),
}

pub fn node_bounds(node: &Node) -> Rect {
    Rect::from_origin_size(node.position, NODE_SIZE)
}

/// Centre of the node's connection handle (right-middle).
pub fn handle_center(node: &Node) -> Point {
    let b = node_bounds(node);
    Point::new(b.x1, b.center().y)
}

/// Find the topmost diagram item at `p`. Handles win over node bodies,
/// node bodies over edges.
pub fn hit_test_diagram(state: &GraphState, p: Point) -> Option<DiagramHit> {
    for node in state.nodes.iter().rev() {
        if handle_center(node).distance(p) <= HANDLE_RADIUS + STROKE_TOLERANCE {
            return Some(DiagramHit::Handle(node.id));
        }
        if node_bounds(node).contains(p) {
            return Some(DiagramHit::Node(node.id));
        }
    }
    state
        .edges
        .iter()
        .rev()
        .find(|e| edge_hit(state, e, p))
        .map(|e| DiagramHit::Edge(e.id))
}

fn edge_hit(state: &GraphState, edge: &Edge, p: Point) -> bool {
    let (Some(a), Some(b)) = (state.node(edge.source), state.node(edge.target)) else {
        return false;
    };
    distance_to_segment(p, handle_center(a), node_bounds(b).center()) <= STROKE_TOLERANCE
}

/// Find the topmost evented drawing object at `p`.
pub fn hit_test_objects(objects: &[DrawingObject], p: Point) -> Option<ObjectId> {
    objects
        .iter()
        .rev()
        .find(|o| o.evented && object_contains(o, p))
        .map(|o| o.id)
}

fn object_contains(obj: &DrawingObject, p: Point) -> bool {
    let reach = obj.style.stroke_width / 2.0 + STROKE_TOLERANCE;
    match &obj.shape {
        Shape::Rectangle { .. } | Shape::Text { .. } => obj.bounds().inflate(reach, reach).contains(p),
        Shape::Circle { .. } => {
            let b = obj.bounds();
            let (rx, ry) = (b.width() / 2.0 + reach, b.height() / 2.0 + reach);
            let d = p - b.center();
            (d.x / rx).powi(2) + (d.y / ry).powi(2) <= 1.0
        }
        Shape::Line { end } | Shape::Arrow { end } => {
            distance_to_segment(p, obj.origin(), obj.to_world(*end)) <= reach
        }
        Shape::Freehand { points } => points
            .windows(2)
            .any(|w| distance_to_segment(p, obj.to_world(w[0]), obj.to_world(w[1])) <= reach),
    }
}

/// Euclidean distance from `p` to the segment `a`–`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab: Vec2 = b - a;
    let len2 = ab.hypot2();
    if len2 <= f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
