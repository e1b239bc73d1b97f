//! WASM bridge for Diagram Canvas: exposes the session to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Structured values cross
//! the boundary as JSON strings.

mod observe;
mod render2d;

use dc_annotate::{AnnotationError, AnnotationTool, CanvasState, EngineStatus, HistoryExport, Theme, ThemeSignals};
use dc_core::{Clock, Container, Edge, EdgeId, GraphStore, MemoryStore, Node, NodeId, NodePatch, NodeType, Point, Rect, Size};
use dc_editor::{ConfigError, EditorConfig, FinishEvent, InputEvent, Modifiers, Session};
use dc_render::ExportOptions;
use observe::Observers;
use serde::Deserialize;
use serde_json::json;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// Wall clock backed by `Date.now()`.
struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Graph payload accepted by `set_graph`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GraphPayload {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// The canvas handle held by the host component.
///
/// Owns the session (graph store, viewport, annotation engine) and the DOM
/// observers. The host forwards input, calls `tick` from its animation
/// frame and `render` when anything changed.
#[wasm_bindgen]
pub struct DiagramCanvas {
    session: Session<MemoryStore>,
    observers: Option<Observers>,
}

#[wasm_bindgen]
impl DiagramCanvas {
    /// Create a canvas of the given container size. `config` is partial
    /// editor config JSON; missing keys keep their defaults. `snapshot` is
    /// an optional initial annotation snapshot, as returned by `snapshot`.
    #[wasm_bindgen(constructor)]
    pub fn new(
        width: f64,
        height: f64,
        config: Option<String>,
        snapshot: Option<String>,
    ) -> Result<DiagramCanvas, JsValue> {
        console_error_panic_hook_setup();
        let session = open_session(width, height, config.as_deref(), snapshot.as_deref(), Box::new(JsClock))
            .map_err(js_err)?;
        Ok(Self {
            session,
            observers: None,
        })
    }

    /// Start observing the container size and the page theme.
    pub fn attach(&mut self, container: &web_sys::Element) -> Result<(), JsValue> {
        let observers = Observers::attach(container)?;
        if let Some(signals) = observers.take_signals() {
            self.session.annotations_mut().set_theme_signals(signals);
        }
        self.observers = Some(observers);
        Ok(())
    }

    /// Container geometry in client coordinates, for hosts without observers.
    pub fn set_container(&mut self, left: f64, top: f64, width: f64, height: f64) {
        self.session
            .set_container(Container::new(Point::new(left, top), Size::new(width, height)));
    }

    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let theme = match self.session.annotations().theme() {
            Theme::Light => render2d::CanvasTheme::light(),
            Theme::Dark => render2d::CanvasTheme::dark(),
        };
        let size = self.session.viewport().container().size;
        let annotations = self.session.annotations();
        let objects = annotations.surface().map(|s| s.objects()).unwrap_or_default();
        render2d::render_scene(
            ctx,
            self.session.store().state(),
            objects,
            annotations.selected(),
            size.width,
            size.height,
            &theme,
        );
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Handle an `InputEvent` given as JSON. Returns true if anything changed.
    pub fn handle_event(&mut self, event: &str) -> Result<bool, JsValue> {
        let event: InputEvent = serde_json::from_str(event).map_err(js_err)?;
        Ok(self.session.handle(event))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        target: Option<String>,
    ) -> bool {
        self.session.handle(InputEvent::PointerDown {
            x,
            y,
            modifiers: Modifiers {
                ctrl,
                shift,
                alt,
                meta,
            },
            target,
        })
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64, shift: bool) -> bool {
        self.session.handle(InputEvent::PointerMove {
            x,
            y,
            modifiers: Modifiers {
                shift,
                ..Modifiers::NONE
            },
        })
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64, shift: bool) -> bool {
        self.session.handle(InputEvent::PointerUp {
            x,
            y,
            modifiers: Modifiers {
                shift,
                ..Modifiers::NONE
            },
        })
    }

    /// Pointer released anywhere in the window.
    pub fn handle_global_pointer_up(&mut self) -> bool {
        self.session.handle(InputEvent::GlobalPointerUp)
    }

    pub fn handle_click(&mut self, x: f64, y: f64) -> bool {
        self.session.handle(InputEvent::click(x, y))
    }

    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> bool {
        self.session.handle(InputEvent::key(
            key,
            Modifiers {
                ctrl,
                shift,
                alt,
                meta,
            },
        ))
    }

    // ─── Tools & lifecycle ───────────────────────────────────────────────

    /// Set the active tool by name (aliases accepted). Returns the canonical name.
    pub fn set_tool(&mut self, name: &str) -> String {
        self.session.set_tool_name(name).as_str().to_string()
    }

    pub fn tool(&self) -> String {
        self.session.tool().as_str().to_string()
    }

    /// CSS cursor for the active tool.
    pub fn cursor(&self) -> String {
        self.session.annotations().mode().cursor.as_css().to_string()
    }

    /// Register the host's `onFinish` callback; it receives event JSON.
    pub fn set_on_finish(&mut self, callback: js_sys::Function) {
        self.session.set_on_finish(move |event| {
            let payload = JsValue::from_str(&finish_json(event));
            if let Err(e) = callback.call1(&JsValue::NULL, &payload) {
                web_sys::console::error_2(&"onFinish callback threw".into(), &e);
            }
        });
    }

    /// Drain observer signals and fire due timers. Returns snapshot JSON
    /// when an auto-save is due; report its outcome with `save_finished`.
    pub fn tick(&mut self) -> Option<String> {
        if let Some(observers) = &self.observers {
            if let Some(signals) = observers.take_signals() {
                self.session.annotations_mut().set_theme_signals(signals);
            }
            if let Some(container) = observers.take_container() {
                self.session.set_container(container);
            }
        }
        let state = self.session.tick()?;
        self.snapshot_json(&state)
    }

    /// Start an explicit save; `None` while another save is in flight.
    pub fn save_now(&mut self) -> Option<String> {
        let state = self.session.annotations_mut().save_now()?;
        self.snapshot_json(&state)
    }

    /// Report the outcome of a save handed out by `tick` or `save_now`.
    pub fn save_finished(&mut self, error: Option<String>) {
        let result = match error {
            Some(e) => Err(e),
            None => Ok(()),
        };
        self.session.annotations_mut().save_finished(result);
    }

    fn snapshot_json(&mut self, state: &CanvasState) -> Option<String> {
        match state.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                self.session.annotations_mut().save_finished(Err(e.to_string()));
                None
            }
        }
    }

    /// `{"ready":true}` or `{"ready":false,"reason":"..."}`.
    pub fn status(&self) -> String {
        status_json(&self.session.annotations().status())
    }

    /// Re-attempt drawing-surface creation after a failed init.
    pub fn retry(&mut self) -> Result<(), JsValue> {
        let size = self.session.viewport().container().size;
        self.session.annotations_mut().retry(size).map_err(js_err)
    }

    /// Flush pending work, detach observers and return the annotation
    /// history JSON for a later `import_history`.
    pub fn teardown(self) -> Result<String, JsValue> {
        let DiagramCanvas { session, observers } = self;
        drop(observers);
        session.teardown().to_json().map_err(js_err)
    }

    // ─── Graph ───────────────────────────────────────────────────────────

    /// Nodes, edges, selection and transform as JSON.
    pub fn graph_json(&self) -> String {
        serde_json::to_string(self.session.store().state()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Replace the diagram with `{nodes, edges}` JSON. Invalid edges are dropped.
    pub fn set_graph(&mut self, json: &str) -> Result<(), JsValue> {
        let payload: GraphPayload = serde_json::from_str(json).map_err(js_err)?;
        self.session.store_mut().replace_graph(payload.nodes, payload.edges);
        Ok(())
    }

    pub fn add_node(&mut self, node_type: &str, label: &str, x: f64, y: f64) -> Result<Option<u32>, JsValue> {
        let node_type = parse_node_type(node_type).ok_or_else(|| js_err(format!("unknown node type {node_type:?}")))?;
        Ok(self.session.add_node(node_type, label, Point::new(x, y)).map(|id| id.0))
    }

    /// Apply a `NodePatch` given as JSON.
    pub fn update_node(&mut self, id: u32, patch: &str) -> Result<bool, JsValue> {
        let patch: NodePatch = serde_json::from_str(patch).map_err(js_err)?;
        Ok(self.session.update_node(NodeId(id), patch))
    }

    pub fn delete_node(&mut self, id: u32) -> bool {
        self.session.delete_node(NodeId(id))
    }

    pub fn add_edge(&mut self, source: u32, target: u32) -> Option<String> {
        self.session
            .add_edge(NodeId(source), NodeId(target))
            .map(|id| id.to_string())
    }

    pub fn delete_edge(&mut self, id: &str) -> bool {
        EdgeId::lookup(id).is_some_and(|edge| self.session.delete_edge(edge))
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) {
        self.session.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.session.zoom_out();
    }

    pub fn set_zoom(&mut self, scale: f64) {
        self.session.set_zoom(scale);
    }

    pub fn reset_viewport(&mut self) {
        self.session.reset_viewport();
    }

    /// Client-space rectangle where gestures never pan (toolbar, dock).
    pub fn register_region(&mut self, name: &str, left: f64, top: f64, width: f64, height: f64) {
        self.session
            .register_region(name, Rect::new(left, top, left + width, top + height));
    }

    pub fn unregister_region(&mut self, name: &str) -> bool {
        self.session.unregister_region(name)
    }

    /// Event-target tag that never starts a pan.
    pub fn register_tag(&mut self, tag: &str) {
        self.session.register_tag(tag);
    }

    // ─── Annotation handle ───────────────────────────────────────────────

    pub fn snapshot(&self) -> Result<String, JsValue> {
        let state = self.session.annotations().snapshot().map_err(js_err)?;
        state.to_json().map_err(js_err)
    }

    /// Restore a snapshot. Resolves once the overlay has been rebuilt;
    /// rejects (leaving the canvas unchanged) on a bad payload.
    pub fn load(&mut self, snapshot: &str) -> js_sys::Promise {
        let result = CanvasState::from_json(snapshot)
            .and_then(|state| self.session.annotations_mut().load(&state));
        match result {
            Ok(()) => js_sys::Promise::resolve(&JsValue::TRUE),
            Err(e) => {
                log::warn!("WASM load rejected: {e}");
                js_sys::Promise::reject(&js_err(e))
            }
        }
    }

    /// Raster export as a `data:` URL. `options` is `{format, quality, multiplier}` JSON.
    pub fn export_png(&self, options: Option<String>) -> Result<String, JsValue> {
        let options = match options {
            Some(json) => serde_json::from_str::<ExportOptions>(&json).map_err(js_err)?,
            None => ExportOptions::default(),
        };
        self.session.annotations().export_png(&options).map_err(js_err)
    }

    pub fn export_svg(&self) -> Result<String, JsValue> {
        self.session.annotations().export_svg().map_err(js_err)
    }

    pub fn clear(&mut self) {
        self.session.annotations_mut().clear();
    }

    pub fn undo(&mut self) -> bool {
        self.session.annotations_mut().undo()
    }

    pub fn redo(&mut self) -> bool {
        self.session.annotations_mut().redo()
    }

    pub fn can_undo(&self) -> bool {
        self.session.annotations().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.annotations().can_redo()
    }

    /// The live drawing surface: `{width, height, tool, objects}` JSON.
    pub fn get_canvas(&self) -> Result<String, JsValue> {
        let annotations = self.session.annotations();
        let surface = annotations.surface().ok_or_else(|| js_err("drawing surface not ready"))?;
        let size = surface.size();
        serde_json::to_string(&json!({
            "width": size.width,
            "height": size.height,
            "tool": annotations.tool().as_str(),
            "objects": surface.objects(),
        }))
        .map_err(js_err)
    }

    pub fn import_history(&mut self, json: &str) -> Result<(), JsValue> {
        let export = HistoryExport::<CanvasState>::from_json(json).map_err(js_err)?;
        self.session.annotations_mut().import_history(export).map_err(js_err)
    }

    pub fn export_history(&mut self) -> Result<String, JsValue> {
        self.session.annotations_mut().export_history().to_json().map_err(js_err)
    }

    /// `import_history` for the MessagePack form of `export_history_msgpack`.
    pub fn import_history_msgpack(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        let export = HistoryExport::<CanvasState>::from_msgpack(bytes).map_err(js_err)?;
        self.session.annotations_mut().import_history(export).map_err(js_err)
    }

    /// Annotation history as MessagePack bytes (a `Uint8Array` on the JS side).
    pub fn export_history_msgpack(&mut self) -> Result<Vec<u8>, JsValue> {
        self.session.annotations_mut().export_history().to_msgpack().map_err(js_err)
    }

    /// Like `teardown`, but hands the history back as MessagePack bytes.
    pub fn teardown_msgpack(self) -> Result<Vec<u8>, JsValue> {
        let DiagramCanvas { session, observers } = self;
        drop(observers);
        session.teardown().to_msgpack().map_err(js_err)
    }
}

/// Errors raised while opening a session from host input.
#[derive(Debug, thiserror::Error)]
enum OpenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid initial snapshot: {0}")]
    Snapshot(#[from] AnnotationError),
}

/// Build the session behind a `DiagramCanvas`, applying the initial
/// snapshot once the drawing surface exists.
fn open_session(
    width: f64,
    height: f64,
    config: Option<&str>,
    snapshot: Option<&str>,
    clock: Box<dyn Clock>,
) -> Result<Session<MemoryStore>, OpenError> {
    let config = match config {
        Some(json) => EditorConfig::from_json(json)?,
        None => EditorConfig::default(),
    };
    let store = MemoryStore::with_zoom_range(config.min_zoom, config.max_zoom);
    let mut session = Session::new(
        store,
        config,
        Container::new(Point::ORIGIN, Size::new(width, height)),
        clock,
        ThemeSignals::default(),
    );
    if let Some(json) = snapshot {
        let state = CanvasState::from_json(json)?;
        session.annotations_mut().load(&state)?;
        log::info!("WASM opened with initial snapshot from {}", state.timestamp);
    }
    Ok(session)
}

/// Make a font (TTF/OTF/TTC bytes) available to text in raster exports.
/// Browsers expose no system fonts to wasm, so hosts register at least one.
#[wasm_bindgen]
pub fn register_font(data: Vec<u8>) {
    dc_render::load_font_data(data);
}

fn parse_node_type(name: &str) -> Option<NodeType> {
    match name {
        "start" => Some(NodeType::Start),
        "process" => Some(NodeType::Process),
        "end" => Some(NodeType::End),
        _ => None,
    }
}

fn finish_json(event: &FinishEvent) -> String {
    let value = match event {
        FinishEvent::Drawing(d) => json!({
            "kind": "drawing",
            "id": d.id.0,
            "tool": d.tool.as_str(),
        }),
        FinishEvent::Connection { source, target, edge } => json!({
            "kind": "connection",
            "source": source.0,
            "target": target.map(|t| t.0),
            "edge": edge.map(|e| e.to_string()),
        }),
    };
    value.to_string()
}

fn status_json(status: &EngineStatus) -> String {
    match status {
        EngineStatus::Ready => json!({ "ready": true }),
        EngineStatus::Failed { reason } => json!({ "ready": false, "reason": reason }),
    }
    .to_string()
}

/// Canonical tool names, for host toolbars.
#[wasm_bindgen]
pub fn tool_names() -> String {
    let names: Vec<&str> = AnnotationTool::ALL.iter().map(|t| t.as_str()).collect();
    serde_json::to_string(&names).unwrap_or_else(|_| "[]".to_string())
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Diagram Canvas panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            let _ = log::set_logger(&CONSOLE_LOGGER).map(|()| log::set_max_level(log::LevelFilter::Info));
        });
    }
}

/// Forwards `log` records to the browser console.
#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
static CONSOLE_LOGGER: ConsoleLogger = ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            log::Level::Info => web_sys::console::info_1(&msg),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&msg),
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_annotate::DrawingFinished;
    use dc_core::{DrawingObject, ManualClock, ObjectId, ObjectStyle, Shape};
    use pretty_assertions::assert_eq;

    #[test]
    fn finish_events_serialize_for_the_host() {
        let drawing = FinishEvent::Drawing(DrawingFinished {
            id: ObjectId(7),
            tool: AnnotationTool::Arrow,
        });
        let v: serde_json::Value = serde_json::from_str(&finish_json(&drawing)).unwrap();
        assert_eq!(v, json!({"kind": "drawing", "id": 7, "tool": "arrow"}));

        let rejected = FinishEvent::Connection {
            source: NodeId(1),
            target: Some(NodeId(1)),
            edge: None,
        };
        let v: serde_json::Value = serde_json::from_str(&finish_json(&rejected)).unwrap();
        assert_eq!(v["edge"], serde_json::Value::Null);
        assert_eq!(v["target"], 1);
    }

    #[test]
    fn status_reports_failure_reason() {
        let failed = EngineStatus::Failed {
            reason: "zero-size container".into(),
        };
        assert_eq!(status_json(&EngineStatus::Ready), r#"{"ready":true}"#);
        assert!(status_json(&failed).contains("zero-size container"));
    }

    #[test]
    fn node_types_parse_lowercase() {
        assert_eq!(parse_node_type("process"), Some(NodeType::Process));
        assert_eq!(parse_node_type("Process"), None);
    }

    fn rect_snapshot() -> String {
        let rect = DrawingObject::new(
            Point::new(40.0, 40.0),
            Shape::Rectangle {
                width: 80.0,
                height: 50.0,
            },
            ObjectStyle::default(),
        );
        CanvasState::capture(&[rect], Size::new(800.0, 600.0), 1)
            .unwrap()
            .to_json()
            .unwrap()
    }

    #[test]
    fn initial_snapshot_is_applied_on_open() {
        let _ = env_logger::builder().is_test(true).try_init();
        let session = open_session(800.0, 600.0, None, Some(&rect_snapshot()), Box::new(ManualClock::new(0))).unwrap();
        let objects = session.annotations().surface().unwrap().objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].left, 40.0);
    }

    #[test]
    fn bad_initial_snapshot_fails_open() {
        let err = open_session(800.0, 600.0, None, Some("{\"version\":"), Box::new(ManualClock::new(0)))
            .err()
            .unwrap();
        assert!(matches!(err, OpenError::Snapshot(_)));
        let err = open_session(800.0, 600.0, Some(r#"{"minZoom": 4, "maxZoom": 2}"#), None, Box::new(ManualClock::new(0)))
            .err()
            .unwrap();
        assert!(matches!(err, OpenError::Config(_)));
    }

    #[test]
    fn msgpack_history_moves_between_sessions() {
        let _ = env_logger::builder().is_test(true).try_init();
        let first = open_session(800.0, 600.0, None, Some(&rect_snapshot()), Box::new(ManualClock::new(0))).unwrap();
        let bytes = first.teardown().to_msgpack().unwrap();

        let mut second = open_session(800.0, 600.0, None, None, Box::new(ManualClock::new(0))).unwrap();
        let export = HistoryExport::<CanvasState>::from_msgpack(&bytes).unwrap();
        second.annotations_mut().import_history(export).unwrap();
        assert_eq!(second.annotations().surface().unwrap().objects().len(), 1);
        assert!(second.annotations().can_undo());
    }

    #[test]
    fn graph_payload_defaults_missing_lists() {
        let payload: GraphPayload =
            serde_json::from_str(r#"{"nodes":[{"id":1,"label":"A","position":{"x":0,"y":0},"type":"start","icon":"play"}]}"#)
                .unwrap();
        assert_eq!(payload.nodes.len(), 1);
        assert!(payload.edges.is_empty());
    }
}
