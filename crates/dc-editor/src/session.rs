//! Session orchestrator.
//!
//! Owns the graph store, the viewport and graph controllers and the
//! annotation engine, and routes every `InputEvent` to exactly one of
//! them. Any annotation tool other than select takes the pointer away
//! from the diagram: no pan, no zoom, no node drag while it is active.

use crate::config::EditorConfig;
use crate::graph::GraphController;
use crate::input::{InputEvent, Modifiers, TouchPoint};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::viewport::ViewportController;
use dc_annotate::{
    AnnotationEngine, AnnotationTool, CanvasState, DrawingFinished, HistoryExport, ThemeSignals,
};
use dc_core::{Clock, Container, EdgeId, GraphStore, NodeId, NodePatch, NodeType, to_canvas};
use dc_render::{DiagramHit, hit_test_diagram};
use kurbo::{Point, Rect};

/// Completed gesture reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishEvent {
    Drawing(DrawingFinished),
    /// A connection gesture ended. `edge` is `None` when it was released
    /// off a node or the edge was rejected (self-loop, duplicate).
    Connection {
        source: NodeId,
        target: Option<NodeId>,
        edge: Option<EdgeId>,
    },
}

type FinishCallback = Box<dyn FnMut(&FinishEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Idle,
    Pan,
    NodeDrag,
    Connect(NodeId),
    /// Pointer belongs to the annotation overlay until release.
    Annotate,
}

pub struct Session<S: GraphStore> {
    store: S,
    config: EditorConfig,
    viewport: ViewportController,
    graph: GraphController,
    annotations: AnnotationEngine,
    gesture: Gesture,
    /// The last pan moved past the drag threshold; swallows the next click.
    pan_moved: bool,
    last_touch: Option<Point>,
    on_finish: Option<FinishCallback>,
}

impl<S: GraphStore> Session<S> {
    pub fn new(
        store: S,
        config: EditorConfig,
        container: Container,
        clock: Box<dyn Clock>,
        signals: ThemeSignals,
    ) -> Self {
        let annotations = AnnotationEngine::new(config.annotation.clone(), container.size, clock, signals);
        Self {
            viewport: ViewportController::new(&config, container),
            graph: GraphController::new(config.drag_threshold),
            annotations,
            store,
            config,
            gesture: Gesture::Idle,
            pan_moved: false,
            last_touch: None,
            on_finish: None,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn graph(&self) -> &GraphController {
        &self.graph
    }

    pub fn annotations(&self) -> &AnnotationEngine {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut AnnotationEngine {
        &mut self.annotations
    }

    pub fn tool(&self) -> AnnotationTool {
        self.annotations.tool()
    }

    pub fn set_on_finish(&mut self, callback: impl FnMut(&FinishEvent) + 'static) {
        self.on_finish = Some(Box::new(callback));
    }

    pub fn clear_on_finish(&mut self) {
        self.on_finish = None;
    }

    fn emit(&mut self, event: FinishEvent) {
        log::debug!("SESSION finished {event:?}");
        if let Some(callback) = self.on_finish.as_mut() {
            callback(&event);
        }
    }

    fn emit_drawing(&mut self, finished: Option<DrawingFinished>) {
        if let Some(f) = finished {
            self.emit(FinishEvent::Drawing(f));
        }
    }

    fn diagram_active(&self) -> bool {
        self.annotations.tool() == AnnotationTool::Select
    }

    fn local(&self, client: Point) -> Point {
        self.viewport.container().to_local(client)
    }

    fn diagram_hit(&self, client: Point) -> Option<DiagramHit> {
        let origin = self.viewport.container().origin;
        let canvas = to_canvas(client, &self.store.state().canvas_transform, origin);
        hit_test_diagram(self.store.state(), canvas)
    }

    // ─── Tools ───────────────────────────────────────────────────────────

    /// Switch the active tool. Leaving select abandons any diagram gesture.
    pub fn set_tool(&mut self, tool: AnnotationTool) {
        if tool != AnnotationTool::Select {
            self.cancel_diagram_gesture();
        }
        if self.gesture == Gesture::Annotate {
            self.gesture = Gesture::Idle;
        }
        let finished = self.annotations.set_tool(tool);
        self.emit_drawing(finished);
    }

    /// `set_tool` by name, accepting aliases.
    pub fn set_tool_name(&mut self, name: &str) -> AnnotationTool {
        let tool = AnnotationTool::normalize(name);
        self.set_tool(tool);
        tool
    }

    fn cancel_diagram_gesture(&mut self) {
        match self.gesture {
            Gesture::Pan => {
                self.pan_moved = self.viewport.pan_end();
            }
            Gesture::NodeDrag => self.graph.drag_end(&mut self.store),
            Gesture::Connect(_) => self.graph.cancel_connection(&mut self.store),
            Gesture::Idle | Gesture::Annotate => {}
        }
        if self.gesture != Gesture::Annotate {
            self.gesture = Gesture::Idle;
        }
    }

    /// Abandon every gesture in flight: global pointer-up and Escape.
    fn cancel_all(&mut self) {
        if self.gesture == Gesture::Annotate {
            self.annotations.cancel();
        }
        self.cancel_diagram_gesture();
        self.graph.cancel_connection(&mut self.store);
        self.gesture = Gesture::Idle;
        self.last_touch = None;
    }

    // ─── Event routing ───────────────────────────────────────────────────

    /// Route one input event. Returns whether anything handled it.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                modifiers,
                target,
            } => self.pointer_down(Point::new(x, y), modifiers, target.as_deref()),
            InputEvent::PointerMove { x, y, modifiers } => self.pointer_move(Point::new(x, y), modifiers),
            InputEvent::PointerUp { x, y, modifiers } => self.pointer_up(Point::new(x, y), modifiers),
            InputEvent::GlobalPointerUp => {
                let active = self.gesture != Gesture::Idle;
                if active {
                    log::trace!("SESSION global pointer-up cancels {:?}", self.gesture);
                    self.cancel_all();
                }
                active
            }
            InputEvent::Click { x, y, .. } => self.click(Point::new(x, y)),
            InputEvent::Wheel(wheel) => self.diagram_active() && self.viewport.wheel(&mut self.store, &wheel),
            InputEvent::TouchStart { touches, target } => self.touch_start(&touches, target.as_deref()),
            InputEvent::TouchMove { touches } => self.touch_move(&touches),
            InputEvent::TouchEnd { touches } => self.touch_end(&touches),
            InputEvent::Key { key, modifiers } => self.key(&key, modifiers),
        }
    }

    fn pointer_down(&mut self, client: Point, modifiers: Modifiers, target: Option<&str>) -> bool {
        self.pan_moved = false;
        let local = self.local(client);
        if !self.diagram_active() {
            self.gesture = Gesture::Annotate;
            let finished = self.annotations.pointer_down(local, modifiers.shift);
            self.emit_drawing(finished);
            return true;
        }

        // Overlay objects sit above the diagram.
        if self.annotations.object_at(local).is_some() {
            self.gesture = Gesture::Annotate;
            self.annotations.pointer_down(local, modifiers.shift);
            return true;
        }
        // Background press on the overlay drops its selection.
        self.annotations.pointer_down(local, modifiers.shift);

        let origin = self.viewport.container().origin;
        match self.diagram_hit(client) {
            Some(DiagramHit::Handle(node)) => {
                if self.graph.connection_start(&mut self.store, node) {
                    self.gesture = Gesture::Connect(node);
                }
                true
            }
            Some(DiagramHit::Node(node)) => {
                self.graph.pointer_down_on_node(&mut self.store, node, client, origin);
                self.gesture = Gesture::NodeDrag;
                true
            }
            Some(DiagramHit::Edge(_)) => true,
            None => {
                if self.viewport.pan_start(client, target) {
                    self.gesture = Gesture::Pan;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn pointer_move(&mut self, client: Point, modifiers: Modifiers) -> bool {
        let origin = self.viewport.container().origin;
        match self.gesture {
            Gesture::Annotate => {
                let local = self.local(client);
                let finished = self.annotations.pointer_move(local, modifiers.shift);
                self.emit_drawing(finished);
                true
            }
            Gesture::Pan => self.viewport.pan_move(&mut self.store, client),
            Gesture::NodeDrag => {
                self.graph.pointer_move(&mut self.store, client, origin);
                true
            }
            Gesture::Connect(_) => {
                self.graph.connection_drag(&mut self.store, client, origin);
                true
            }
            Gesture::Idle => false,
        }
    }

    fn pointer_up(&mut self, client: Point, modifiers: Modifiers) -> bool {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Annotate => {
                let local = self.local(client);
                let finished = self.annotations.pointer_up(local, modifiers.shift);
                self.emit_drawing(finished);
                true
            }
            Gesture::Pan => {
                self.pan_moved = self.viewport.pan_end();
                true
            }
            Gesture::NodeDrag => {
                self.graph.drag_end(&mut self.store);
                true
            }
            Gesture::Connect(source) => {
                let target = match self.diagram_hit(client) {
                    Some(DiagramHit::Node(id) | DiagramHit::Handle(id)) => Some(id),
                    Some(DiagramHit::Edge(_)) | None => None,
                };
                let edge = match target {
                    Some(t) => self.graph.connection_end(&mut self.store, t),
                    None => {
                        self.graph.cancel_connection(&mut self.store);
                        None
                    }
                };
                self.emit(FinishEvent::Connection { source, target, edge });
                true
            }
            Gesture::Idle => false,
        }
    }

    fn click(&mut self, client: Point) -> bool {
        if !self.diagram_active() {
            return false;
        }
        if std::mem::take(&mut self.pan_moved) {
            return false;
        }
        if self.annotations.object_at(self.local(client)).is_some() {
            return false;
        }
        match self.diagram_hit(client) {
            Some(DiagramHit::Node(node)) => self.graph.click_node(&mut self.store, node),
            Some(DiagramHit::Edge(edge)) => {
                self.graph.select_edge(&mut self.store, edge);
                true
            }
            Some(DiagramHit::Handle(_)) => false,
            None => {
                self.graph.clear_selection(&mut self.store);
                true
            }
        }
    }

    // ─── Touch ───────────────────────────────────────────────────────────

    fn touch_start(&mut self, touches: &[TouchPoint], target: Option<&str>) -> bool {
        let single = match touches {
            [one] => Some(one.position()),
            _ => None,
        };
        if !self.diagram_active() {
            let Some(client) = single else {
                return false;
            };
            self.last_touch = Some(client);
            return self.pointer_down(client, Modifiers::NONE, target);
        }
        if let Some(client) = single {
            match self.diagram_hit(client) {
                Some(DiagramHit::Handle(node)) => {
                    if self.graph.connection_start(&mut self.store, node) {
                        self.gesture = Gesture::Connect(node);
                        self.last_touch = Some(client);
                    }
                    return true;
                }
                Some(DiagramHit::Node(node)) => {
                    let origin = self.viewport.container().origin;
                    self.graph.pointer_down_on_node(&mut self.store, node, client, origin);
                    self.gesture = Gesture::NodeDrag;
                    self.last_touch = Some(client);
                    return true;
                }
                Some(DiagramHit::Edge(_)) | None => {}
            }
        }
        // A second finger turns a node drag or connection into a pinch.
        if matches!(self.gesture, Gesture::NodeDrag | Gesture::Connect(_)) {
            self.cancel_diagram_gesture();
            self.last_touch = None;
        }
        self.viewport.touch_start(&self.store, touches, target)
    }

    fn touch_move(&mut self, touches: &[TouchPoint]) -> bool {
        match (self.gesture, touches.first()) {
            (Gesture::Annotate | Gesture::NodeDrag | Gesture::Connect(_), Some(first)) => {
                self.last_touch = Some(first.position());
                self.pointer_move(first.position(), Modifiers::NONE)
            }
            _ if self.diagram_active() => self.viewport.touch_move(&mut self.store, touches),
            _ => false,
        }
    }

    fn touch_end(&mut self, remaining: &[TouchPoint]) -> bool {
        match self.gesture {
            Gesture::Annotate | Gesture::NodeDrag | Gesture::Connect(_) => {
                let at = self.last_touch.take().unwrap_or_default();
                self.pointer_up(at, Modifiers::NONE)
            }
            _ => {
                self.viewport.touch_end(remaining);
                true
            }
        }
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    fn key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        if self.annotations.editing().is_some() {
            return self.edit_key(key, modifiers);
        }
        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return false;
        };
        log::trace!("SESSION shortcut {action:?}");
        match action {
            ShortcutAction::Undo => self.annotations.undo(),
            ShortcutAction::Redo => self.annotations.redo(),
            ShortcutAction::ZoomIn | ShortcutAction::ZoomOut | ShortcutAction::ResetZoom
                if !self.diagram_active() =>
            {
                false
            }
            ShortcutAction::ZoomIn => {
                self.viewport.zoom_in(&mut self.store);
                true
            }
            ShortcutAction::ZoomOut => {
                self.viewport.zoom_out(&mut self.store);
                true
            }
            ShortcutAction::ResetZoom => {
                self.viewport.reset_viewport(&mut self.store);
                true
            }
            ShortcutAction::Tool(tool) => {
                self.set_tool(tool);
                true
            }
            ShortcutAction::Cancel => {
                self.cancel_all();
                self.set_tool(AnnotationTool::Select);
                true
            }
            ShortcutAction::Delete => {
                if self.annotations.delete_selected() {
                    return true;
                }
                self.diagram_active() && self.graph.delete_selected(&mut self.store)
            }
        }
    }

    /// Keys while a text object is being edited go to its content.
    fn edit_key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        match key {
            "Escape" => {
                let finished = self.annotations.exit_editing();
                self.emit_drawing(finished);
                self.set_tool(AnnotationTool::Select);
                true
            }
            "Backspace" => self.annotations.backspace(),
            "Enter" => self.annotations.type_text("\n"),
            _ if !modifiers.command() && key.chars().count() == 1 => self.annotations.type_text(key),
            _ => false,
        }
    }

    // ─── Host surface ────────────────────────────────────────────────────

    /// The container moved or resized. The overlay rescale is debounced.
    pub fn set_container(&mut self, container: Container) {
        self.viewport.set_container(container);
        self.annotations.observe_resize(container.size);
    }

    /// Fire due timers; returns a snapshot when an auto-save is due.
    pub fn tick(&mut self) -> Option<CanvasState> {
        self.annotations.tick();
        self.annotations.poll_auto_save()
    }

    /// Flush pending annotation work and return its history for a remount.
    pub fn teardown(mut self) -> HistoryExport<CanvasState> {
        self.cancel_diagram_gesture();
        self.graph.cancel_connection(&mut self.store);
        self.annotations.teardown()
    }

    pub fn add_node(&mut self, node_type: NodeType, label: impl Into<String>, position: Point) -> Option<NodeId> {
        self.graph.add_node(&mut self.store, node_type, label, position)
    }

    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) -> bool {
        self.graph.update_node(&mut self.store, id, patch)
    }

    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Option<EdgeId> {
        self.graph.add_edge(&mut self.store, source, target)
    }

    pub fn delete_node(&mut self, id: NodeId) -> bool {
        self.graph.delete_node(&mut self.store, id)
    }

    pub fn delete_edge(&mut self, id: EdgeId) -> bool {
        self.graph.delete_edge(&mut self.store, id)
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in(&mut self.store);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out(&mut self.store);
    }

    pub fn set_zoom(&mut self, scale: f64) {
        self.viewport.set_zoom(&mut self.store, scale);
    }

    pub fn reset_viewport(&mut self) {
        self.viewport.reset_viewport(&mut self.store);
    }

    pub fn register_region(&mut self, name: impl Into<String>, rect: Rect) {
        self.viewport.register_region(name, rect);
    }

    pub fn unregister_region(&mut self, name: &str) -> bool {
        self.viewport.unregister_region(name)
    }

    pub fn register_tag(&mut self, tag: impl Into<String>) {
        self.viewport.register_tag(tag);
    }
}
