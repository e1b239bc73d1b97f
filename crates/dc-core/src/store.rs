//! Graph-store contract.
//!
//! The diagram state is owned by an external state container. Interaction
//! code never touches a concrete store: it reads `GraphState` and calls
//! the mutators of the `GraphStore` trait. `MemoryStore` is the in-process
//! implementation used by the wasm bridge and by tests.

use crate::id::{EdgeId, NodeId};
use crate::model::*;
use kurbo::Point;
use serde::Serialize;

/// Readable state exposed by a graph store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphState {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub selected_node: Option<NodeId>,
    pub selected_edge: Option<EdgeId>,
    pub dragging_node: Option<NodeId>,
    pub drag_offset: DragOffset,
    pub connecting: Option<NodeId>,
    pub temp_line: Option<TempLine>,
    pub canvas_transform: CanvasTransform,
}

impl GraphState {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Whether any edge joins `a` and `b`, in either direction.
    pub fn has_connection(&self, a: NodeId, b: NodeId) -> bool {
        self.edges.iter().any(|e| e.connects(a, b))
    }

    /// Next free node id (`max + 1`, starting at 1). `None` once the
    /// largest id is `u32::MAX`.
    pub fn next_node_id(&self) -> Option<NodeId> {
        let max = self.nodes.iter().map(|n| n.id.0).max().unwrap_or(0);
        max.checked_add(1).map(NodeId)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn FnMut(&GraphState)>;

/// Read/write/subscribe contract of the external graph state container.
pub trait GraphStore {
    fn state(&self) -> &GraphState;

    fn add_node(&mut self, node: Node) -> bool;
    /// Removes the node and every edge touching it.
    fn delete_node(&mut self, id: NodeId) -> bool;
    fn update_node(&mut self, id: NodeId, patch: NodePatch) -> bool;
    fn update_node_position(&mut self, id: NodeId, position: Point) -> bool;
    /// Rejects self-loops, dangling endpoints and duplicate connections.
    fn add_edge(&mut self, edge: Edge) -> bool;
    fn delete_edge(&mut self, id: EdgeId) -> bool;

    fn set_canvas_transform(&mut self, transform: CanvasTransform);
    fn update_canvas_transform(&mut self, patch: TransformPatch);

    fn set_selected_node(&mut self, id: Option<NodeId>);
    fn set_selected_edge(&mut self, id: Option<EdgeId>);
    fn set_dragging_node(&mut self, id: Option<NodeId>);
    fn set_drag_offset(&mut self, offset: DragOffset);
    fn set_connecting(&mut self, id: Option<NodeId>);
    fn set_temp_line(&mut self, line: Option<TempLine>);

    fn subscribe(&mut self, listener: Listener) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// In-memory graph store with change notification.
pub struct MemoryStore {
    state: GraphState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    min_zoom: f64,
    max_zoom: f64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_zoom_range(MIN_ZOOM, MAX_ZOOM)
    }

    /// Store whose transform writes clamp scale into `[min_zoom, max_zoom]`.
    pub fn with_zoom_range(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            state: GraphState::default(),
            listeners: Vec::new(),
            next_subscription: 0,
            min_zoom,
            max_zoom,
        }
    }

    /// Seed a store with existing nodes and edges. Edges violating the
    /// graph invariants are dropped.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut store = Self::new();
        store.seed(nodes, edges);
        store
    }

    /// Swap in a new diagram, keeping the transform, zoom range and
    /// listeners. Interaction state is reset.
    pub fn replace_graph(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        let transform = self.state.canvas_transform;
        self.state = GraphState {
            canvas_transform: transform,
            ..GraphState::default()
        };
        self.seed(nodes, edges);
        self.notify();
    }

    fn seed(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        self.state.nodes = nodes;
        for edge in edges {
            if !self.insert_edge(edge.clone()) {
                log::warn!("dropping invalid edge {} ({} -> {})", edge.id, edge.source, edge.target);
            }
        }
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    fn insert_edge(&mut self, edge: Edge) -> bool {
        let s = &self.state;
        let valid = edge.source != edge.target
            && s.node(edge.source).is_some()
            && s.node(edge.target).is_some()
            && !s.has_connection(edge.source, edge.target)
            && s.edge(edge.id).is_none();
        if valid {
            self.state.edges.push(edge);
        }
        valid
    }

    fn changed(&mut self, changed: bool) -> bool {
        if changed {
            self.notify();
        }
        changed
    }
}

impl GraphStore for MemoryStore {
    fn state(&self) -> &GraphState {
        &self.state
    }

    fn add_node(&mut self, node: Node) -> bool {
        if self.state.node(node.id).is_some() {
            return false;
        }
        self.state.nodes.push(node);
        self.changed(true)
    }

    fn delete_node(&mut self, id: NodeId) -> bool {
        let before = self.state.nodes.len();
        self.state.nodes.retain(|n| n.id != id);
        if self.state.nodes.len() == before {
            return false;
        }
        let s = &mut self.state;
        s.edges.retain(|e| !e.touches(id));
        if s.selected_edge.is_some_and(|e| s.edges.iter().all(|x| x.id != e)) {
            s.selected_edge = None;
        }
        for slot in [&mut s.selected_node, &mut s.dragging_node, &mut s.connecting] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        if s.connecting.is_none() {
            s.temp_line = None;
        }
        self.changed(true)
    }

    fn update_node(&mut self, id: NodeId, patch: NodePatch) -> bool {
        let Some(node) = self.state.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        patch.apply(node);
        self.changed(true)
    }

    fn update_node_position(&mut self, id: NodeId, position: Point) -> bool {
        let Some(node) = self.state.nodes.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        node.position = position;
        self.changed(true)
    }

    fn add_edge(&mut self, edge: Edge) -> bool {
        let added = self.insert_edge(edge);
        self.changed(added)
    }

    fn delete_edge(&mut self, id: EdgeId) -> bool {
        let before = self.state.edges.len();
        self.state.edges.retain(|e| e.id != id);
        let removed = self.state.edges.len() != before;
        if removed && self.state.selected_edge == Some(id) {
            self.state.selected_edge = None;
        }
        self.changed(removed)
    }

    fn set_canvas_transform(&mut self, transform: CanvasTransform) {
        self.state.canvas_transform = transform.clamped(self.min_zoom, self.max_zoom);
        self.notify();
    }

    fn update_canvas_transform(&mut self, patch: TransformPatch) {
        let mut t = self.state.canvas_transform;
        patch.apply(&mut t);
        self.set_canvas_transform(t);
    }

    fn set_selected_node(&mut self, id: Option<NodeId>) {
        self.state.selected_node = id;
        self.notify();
    }

    fn set_selected_edge(&mut self, id: Option<EdgeId>) {
        self.state.selected_edge = id;
        self.notify();
    }

    fn set_dragging_node(&mut self, id: Option<NodeId>) {
        self.state.dragging_node = id;
        self.notify();
    }

    fn set_drag_offset(&mut self, offset: DragOffset) {
        self.state.drag_offset = offset;
    }

    fn set_connecting(&mut self, id: Option<NodeId>) {
        self.state.connecting = id;
        self.notify();
    }

    fn set_temp_line(&mut self, line: Option<TempLine>) {
        self.state.temp_line = line;
        self.notify();
    }

    fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }
}
