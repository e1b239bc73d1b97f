//! Graph interaction controller: selection, node drag, connections.
//!
//! All operations are generic over the `GraphStore` contract. Pointer
//! positions arrive in client space and are mapped to canvas space with
//! the store's current transform.

use dc_core::{
    DragOffset, Edge, EdgeId, GraphStore, Node, NodeId, NodePatch, NodeType, TempLine, to_canvas,
};
use kurbo::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Press {
    node: NodeId,
    start: Point,
}

#[derive(Debug, Clone)]
pub struct GraphController {
    drag_threshold: f64,
    press: Option<Press>,
    /// Set once a press moves past the threshold; consumed by the next click.
    has_dragged: bool,
}

impl GraphController {
    pub fn new(drag_threshold: f64) -> Self {
        Self {
            drag_threshold,
            press: None,
            has_dragged: false,
        }
    }

    pub fn has_dragged(&self) -> bool {
        self.has_dragged
    }

    fn canvas_point<S: GraphStore>(store: &S, client: Point, origin: Point) -> Point {
        to_canvas(client, &store.state().canvas_transform, origin)
    }

    // ─── Click vs drag ───────────────────────────────────────────────────

    /// Press on a node body: remember where it started and begin dragging.
    pub fn pointer_down_on_node<S: GraphStore>(&mut self, store: &mut S, node: NodeId, client: Point, origin: Point) {
        self.press = Some(Press { node, start: client });
        self.has_dragged = false;
        let canvas = Self::canvas_point(store, client, origin);
        self.drag_start(store, node, canvas);
    }

    pub fn pointer_move<S: GraphStore>(&mut self, store: &mut S, client: Point, origin: Point) {
        if let Some(press) = self.press
            && !self.has_dragged
            && press.start.distance(client) > self.drag_threshold
        {
            log::trace!("GRAPH press on {:?} became a drag", press.node);
            self.has_dragged = true;
        }
        let canvas = Self::canvas_point(store, client, origin);
        self.drag_move(store, canvas);
    }

    /// Click on a node. Swallowed (and the flag reset) when it ends a drag.
    pub fn click_node<S: GraphStore>(&mut self, store: &mut S, node: NodeId) -> bool {
        if std::mem::take(&mut self.has_dragged) {
            log::trace!("GRAPH click on {node:?} swallowed after drag");
            return false;
        }
        self.select(store, node);
        true
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a node and clear edge selection. Re-selecting is a no-op.
    pub fn select<S: GraphStore>(&self, store: &mut S, node: NodeId) {
        if store.state().selected_node == Some(node) {
            return;
        }
        store.set_selected_node(Some(node));
        store.set_selected_edge(None);
    }

    pub fn select_edge<S: GraphStore>(&self, store: &mut S, edge: EdgeId) {
        if store.state().selected_edge == Some(edge) {
            return;
        }
        store.set_selected_edge(Some(edge));
        store.set_selected_node(None);
    }

    pub fn clear_selection<S: GraphStore>(&self, store: &mut S) {
        let state = store.state();
        if state.selected_node.is_some() {
            store.set_selected_node(None);
        }
        if store.state().selected_edge.is_some() {
            store.set_selected_edge(None);
        }
    }

    // ─── Drag ────────────────────────────────────────────────────────────

    /// Start dragging `node`. A connection in progress is abandoned.
    pub fn drag_start<S: GraphStore>(&mut self, store: &mut S, node: NodeId, canvas: Point) -> bool {
        let Some(position) = store.state().node(node).map(|n| n.position) else {
            return false;
        };
        self.cancel_connection(store);
        store.set_drag_offset(DragOffset::between(canvas, position));
        store.set_dragging_node(Some(node));
        true
    }

    /// Move the dragged node so the grab offset stays under the pointer.
    pub fn drag_move<S: GraphStore>(&mut self, store: &mut S, canvas: Point) -> bool {
        let state = store.state();
        let Some(node) = state.dragging_node else {
            return false;
        };
        let position = state.drag_offset.position_for(canvas);
        store.update_node_position(node, position)
    }

    pub fn drag_end<S: GraphStore>(&mut self, store: &mut S) {
        self.press = None;
        if store.state().dragging_node.is_some() {
            store.set_dragging_node(None);
        }
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Start a connection from `source`. A node drag in progress ends.
    pub fn connection_start<S: GraphStore>(&mut self, store: &mut S, source: NodeId) -> bool {
        let Some(position) = store.state().node(source).map(|n| n.position) else {
            return false;
        };
        self.drag_end(store);
        store.set_connecting(Some(source));
        store.set_temp_line(Some(TempLine::anchored(position)));
        true
    }

    pub fn connection_drag<S: GraphStore>(&mut self, store: &mut S, client: Point, origin: Point) {
        let Some(line) = store.state().temp_line else {
            return;
        };
        let end = Self::canvas_point(store, client, origin);
        store.set_temp_line(Some(line.with_end(end)));
    }

    /// Finish a connection on `target`. Self-loops and duplicates are
    /// silently rejected; the gesture state is cleared either way.
    pub fn connection_end<S: GraphStore>(&mut self, store: &mut S, target: NodeId) -> Option<EdgeId> {
        let source = store.state().connecting;
        self.cancel_connection(store);
        let source = source?;
        if source == target || store.state().has_connection(source, target) {
            log::trace!("GRAPH reject connection {source:?} -> {target:?}");
            return None;
        }
        self.add_edge(store, source, target)
    }

    pub fn cancel_connection<S: GraphStore>(&mut self, store: &mut S) {
        let state = store.state();
        if state.connecting.is_some() {
            store.set_connecting(None);
        }
        if store.state().temp_line.is_some() {
            store.set_temp_line(None);
        }
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Add a node with the next free id and the type's default icon.
    pub fn add_node<S: GraphStore>(
        &mut self,
        store: &mut S,
        node_type: NodeType,
        label: impl Into<String>,
        position: Point,
    ) -> Option<NodeId> {
        let Some(id) = store.state().next_node_id() else {
            log::warn!("GRAPH node ids exhausted, {} not added", node_type.as_str());
            return None;
        };
        store
            .add_node(Node::new(id, node_type, label, position))
            .then_some(id)
    }

    pub fn update_node<S: GraphStore>(&mut self, store: &mut S, id: NodeId, patch: NodePatch) -> bool {
        store.update_node(id, patch)
    }

    pub fn add_edge<S: GraphStore>(&mut self, store: &mut S, source: NodeId, target: NodeId) -> Option<EdgeId> {
        let edge = Edge::new(source, target);
        let id = edge.id;
        store.add_edge(edge).then_some(id)
    }

    /// Remove a node and every edge touching it.
    pub fn delete_node<S: GraphStore>(&mut self, store: &mut S, id: NodeId) -> bool {
        if store.state().dragging_node == Some(id) {
            self.press = None;
        }
        store.delete_node(id)
    }

    pub fn delete_edge<S: GraphStore>(&mut self, store: &mut S, id: EdgeId) -> bool {
        store.delete_edge(id)
    }

    /// Delete the selected node (cascading) or else the selected edge.
    pub fn delete_selected<S: GraphStore>(&mut self, store: &mut S) -> bool {
        let state = store.state();
        if let Some(node) = state.selected_node {
            return self.delete_node(store, node);
        }
        if let Some(edge) = state.selected_edge {
            return self.delete_edge(store, edge);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_core::MemoryStore;

    fn store() -> MemoryStore {
        MemoryStore::from_parts(
            vec![
                Node::new(NodeId(1), NodeType::Start, "Start", Point::new(0.0, 0.0)),
                Node::new(NodeId(2), NodeType::Process, "Work", Point::new(300.0, 0.0)),
            ],
            vec![],
        )
    }

    #[test]
    fn drag_keeps_grab_offset() {
        let mut s = store();
        let mut g = GraphController::new(3.0);
        g.pointer_down_on_node(&mut s, NodeId(1), Point::new(20.0, 10.0), Point::ORIGIN);
        assert_eq!(s.state().dragging_node, Some(NodeId(1)));
        g.pointer_move(&mut s, Point::new(120.0, 60.0), Point::ORIGIN);
        assert_eq!(s.state().node(NodeId(1)).unwrap().position, Point::new(100.0, 50.0));
        assert!(g.has_dragged());
        g.drag_end(&mut s);
        assert_eq!(s.state().dragging_node, None);
    }

    #[test]
    fn small_jitter_still_selects() {
        let mut s = store();
        let mut g = GraphController::new(3.0);
        g.pointer_down_on_node(&mut s, NodeId(2), Point::new(310.0, 10.0), Point::ORIGIN);
        g.pointer_move(&mut s, Point::new(312.0, 11.0), Point::ORIGIN);
        g.drag_end(&mut s);
        assert!(g.click_node(&mut s, NodeId(2)));
        assert_eq!(s.state().selected_node, Some(NodeId(2)));
    }

    #[test]
    fn reselect_is_idempotent() {
        let mut s = store();
        let g = GraphController::new(3.0);
        g.select(&mut s, NodeId(1));
        g.select(&mut s, NodeId(1));
        assert_eq!(s.state().selected_node, Some(NodeId(1)));
    }

    #[test]
    fn edge_selection_clears_node() {
        let mut s = store();
        let mut g = GraphController::new(3.0);
        let edge = g.add_edge(&mut s, NodeId(1), NodeId(2)).unwrap();
        g.select(&mut s, NodeId(1));
        g.select_edge(&mut s, edge);
        assert_eq!(s.state().selected_node, None);
        assert_eq!(s.state().selected_edge, Some(edge));
        assert!(g.delete_selected(&mut s));
        assert!(s.state().edges.is_empty());
    }

    #[test]
    fn connection_lifecycle() {
        let mut s = store();
        let mut g = GraphController::new(3.0);
        assert!(g.connection_start(&mut s, NodeId(1)));
        assert_eq!(s.state().temp_line, Some(TempLine::anchored(Point::ORIGIN)));
        g.connection_drag(&mut s, Point::new(50.0, 40.0), Point::ORIGIN);
        assert_eq!(s.state().temp_line.unwrap().x2, 50.0);

        let edge = g.connection_end(&mut s, NodeId(2));
        assert_eq!(edge, Some(EdgeId::for_pair(NodeId(1), NodeId(2))));
        assert_eq!(s.state().connecting, None);
        assert_eq!(s.state().temp_line, None);
    }

    #[test]
    fn self_loop_and_reverse_duplicate_are_rejected() {
        let mut s = store();
        let mut g = GraphController::new(3.0);
        g.connection_start(&mut s, NodeId(1));
        assert_eq!(g.connection_end(&mut s, NodeId(1)), None);
        assert_eq!(s.state().temp_line, None);

        g.add_edge(&mut s, NodeId(1), NodeId(2));
        g.connection_start(&mut s, NodeId(2));
        assert_eq!(g.connection_end(&mut s, NodeId(1)), None);
        assert_eq!(s.state().edges.len(), 1);
    }

    #[test]
    fn add_node_uses_next_id_and_default_icon() {
        let mut s = store();
        let mut g = GraphController::new(3.0);
        let id = g
            .add_node(&mut s, NodeType::End, "Done", Point::new(600.0, 0.0))
            .unwrap();
        assert_eq!(id, NodeId(3));
        let node = s.state().node(id).unwrap();
        assert_eq!(node.icon, "flag");
        assert!(node.config.is_empty());

        assert!(g.update_node(
            &mut s,
            id,
            NodePatch {
                label: Some("Finished".into()),
                ..NodePatch::default()
            }
        ));
        assert_eq!(s.state().node(id).unwrap().label, "Finished");
    }
}
