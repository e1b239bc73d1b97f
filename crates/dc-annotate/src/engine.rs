//! The annotation engine: imperative handle over one drawing surface.
//!
//! Pointer events run through the active tool, mutations are applied to
//! the surface, and every mutation that should reach history enqueues a
//! `Commit`. Timers (commit debounce, resize debounce, auto-save) are
//! deadlines checked against the injected clock on `tick`.

use crate::autosave::AutoSave;
use crate::commit::{Commit, CommitQueue};
use crate::config::AnnotationConfig;
use crate::error::AnnotationError;
use crate::history::{History, HistoryExport};
use crate::pipeline::{PointerEvent, SurfaceMutation, ToolBox, ToolContext};
use crate::resize::ResizeTracker;
use crate::snapshot::CanvasState;
use crate::surface::{DrawingSurface, TextEditOutcome};
use crate::theme::{Theme, ThemeSignals, ThemeWatcher};
use crate::tool::{AnnotationTool, SurfaceMode};
use dc_core::{Clock, DrawingObject, ObjectId, ObjectStyle, Shape, calculate_resize_scale};
use dc_render::{ExportOptions, export_raster, export_svg, hit_test_objects};
use kurbo::{Point, Size};

/// A drawing object was completed and committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawingFinished {
    pub id: ObjectId,
    pub tool: AnnotationTool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Ready,
    /// The surface could not be created; `retry` may recover.
    Failed { reason: String },
}

enum Slot {
    Ready(DrawingSurface),
    Failed { reason: String },
}

pub struct AnnotationEngine {
    config: AnnotationConfig,
    clock: Box<dyn Clock>,
    slot: Slot,
    tool: AnnotationTool,
    tools: ToolBox,
    history: History<CanvasState>,
    commits: CommitQueue,
    resize: ResizeTracker,
    auto_save: AutoSave,
    theme: ThemeWatcher,
    /// Bumped whenever the canvas content changes.
    revision: u64,
}

impl AnnotationEngine {
    /// Create the engine and its surface. A surface that fails to
    /// initialize leaves the engine in `EngineStatus::Failed`.
    pub fn new(
        config: AnnotationConfig,
        size: Size,
        clock: Box<dyn Clock>,
        signals: ThemeSignals,
    ) -> Self {
        let now = clock.now_ms();
        let mut engine = Self {
            history: History::new(config.history_capacity),
            commits: CommitQueue::new(config.save_debounce_ms),
            resize: ResizeTracker::new(size, config.resize_debounce_ms),
            auto_save: AutoSave::new(config.auto_save_interval_ms, now),
            theme: ThemeWatcher::new(signals),
            slot: Slot::Failed {
                reason: "not initialized".into(),
            },
            tool: AnnotationTool::Select,
            tools: ToolBox::default(),
            config,
            clock,
            revision: 0,
        };
        // Failure is recorded in `slot` and logged.
        let _ = engine.init_surface(size);
        engine
    }

    fn init_surface(&mut self, size: Size) -> Result<(), AnnotationError> {
        let mut surface = match DrawingSurface::new(size, self.theme.current().palette()) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("ANNOTATE surface init failed: {e}");
                self.slot = Slot::Failed {
                    reason: e.to_string(),
                };
                return Err(e);
            }
        };
        surface.set_mode(self.tool.surface_mode());
        self.slot = Slot::Ready(surface);
        self.resize.reset(size);

        match self.history.current().cloned() {
            Some(state) => {
                self.replay(&state);
            }
            None => {
                let now = self.clock.now_ms();
                self.history.push(CanvasState::empty(size, now), now);
            }
        }
        log::debug!("ANNOTATE surface ready at {}x{}", size.width, size.height);
        Ok(())
    }

    /// Re-attempt surface creation after a failure.
    pub fn retry(&mut self, size: Size) -> Result<(), AnnotationError> {
        if matches!(self.slot, Slot::Ready(_)) {
            return Ok(());
        }
        log::debug!("ANNOTATE retry surface init");
        self.init_surface(size)
    }

    pub fn status(&self) -> EngineStatus {
        match &self.slot {
            Slot::Ready(_) => EngineStatus::Ready,
            Slot::Failed { reason } => EngineStatus::Failed {
                reason: reason.clone(),
            },
        }
    }

    /// The drawing surface, once initialized.
    pub fn surface(&self) -> Option<&DrawingSurface> {
        match &self.slot {
            Slot::Ready(s) => Some(s),
            Slot::Failed { .. } => None,
        }
    }

    fn surface_mut(&mut self) -> Option<&mut DrawingSurface> {
        match &mut self.slot {
            Slot::Ready(s) => Some(s),
            Slot::Failed { .. } => None,
        }
    }

    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    pub fn history(&self) -> &History<CanvasState> {
        &self.history
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ─── Tools ───────────────────────────────────────────────────────────

    pub fn tool(&self) -> AnnotationTool {
        self.tool
    }

    pub fn mode(&self) -> SurfaceMode {
        self.tool.surface_mode()
    }

    /// Switch tools. An active text edit is exited first and any gesture in
    /// progress is abandoned.
    pub fn set_tool(&mut self, tool: AnnotationTool) -> Option<DrawingFinished> {
        if tool == self.tool {
            return None;
        }
        let finished = self.exit_editing();
        self.cancel();
        self.tool = tool;
        if let Some(s) = self.surface_mut() {
            s.set_mode(tool.surface_mode());
        }
        log::debug!("ANNOTATE tool {tool}");
        finished
    }

    /// `set_tool` by name, accepting aliases.
    pub fn set_tool_name(&mut self, name: &str) -> AnnotationTool {
        let tool = AnnotationTool::normalize(name);
        self.set_tool(tool);
        tool
    }

    /// Abandon the active tool's gesture.
    pub fn cancel(&mut self) {
        let cancelled = self.tools.get(self.tool).cancel();
        self.apply_all(cancelled);
    }

    // ─── Pointer pipeline ────────────────────────────────────────────────

    pub fn pointer_down(&mut self, at: Point, shift: bool) -> Option<DrawingFinished> {
        self.dispatch(PointerEvent::Down { at, shift })
    }

    pub fn pointer_move(&mut self, at: Point, shift: bool) -> Option<DrawingFinished> {
        self.dispatch(PointerEvent::Move { at, shift })
    }

    pub fn pointer_up(&mut self, at: Point, shift: bool) -> Option<DrawingFinished> {
        self.dispatch(PointerEvent::Up { at, shift })
    }

    /// Topmost pickable object at `at`.
    pub fn object_at(&self, at: Point) -> Option<ObjectId> {
        self.surface().and_then(|s| hit_test_objects(s.objects(), at))
    }

    fn dispatch(&mut self, event: PointerEvent) -> Option<DrawingFinished> {
        let Slot::Ready(surface) = &self.slot else {
            return None;
        };
        let mode = surface.mode();
        let at = match event {
            PointerEvent::Down { at, .. } | PointerEvent::Move { at, .. } | PointerEvent::Up { at, .. } => at,
        };
        let hit = if mode.skip_target_find || !mode.selection {
            None
        } else {
            hit_test_objects(surface.objects(), at).and_then(|id| surface.object(id))
        };
        let palette = self.theme.current().palette();
        let ctx = ToolContext {
            hit,
            style: ObjectStyle {
                stroke: palette.ink,
                stroke_width: palette.stroke_width,
                fill: None,
            },
            font_size: self.config.text_font_size,
            editing: surface.editing(),
        };
        let mutations = self.tools.get(self.tool).handle(&event, &ctx);
        self.apply_all(mutations)
    }

    fn apply_all(&mut self, mutations: Vec<SurfaceMutation>) -> Option<DrawingFinished> {
        mutations
            .into_iter()
            .fold(None, |done, m| self.apply(m).or(done))
    }

    fn apply(&mut self, mutation: SurfaceMutation) -> Option<DrawingFinished> {
        let tool = self.tool;
        let palette = self.theme.current().palette();
        let font_size = self.config.text_font_size;
        let surface = self.surface_mut()?;
        match mutation {
            SurfaceMutation::Add(obj) => surface.add(obj),
            SurfaceMutation::Reshape { id, origin, shape } => {
                if let Some(o) = surface.object_mut(id) {
                    o.left = origin.x;
                    o.top = origin.y;
                    o.shape = shape;
                }
            }
            SurfaceMutation::Finalize { id } => {
                let Some(o) = surface.object_mut(id) else {
                    return None;
                };
                if o.is_degenerate() {
                    log::trace!("DRAW drop degenerate {id:?}");
                    surface.remove(id);
                    return None;
                }
                o.finalize();
                self.enqueue(Commit::Immediate);
                return Some(DrawingFinished { id, tool });
            }
            SurfaceMutation::Discard { id } => {
                surface.remove(id);
            }
            SurfaceMutation::BeginStroke(at) => surface.begin_stroke(at),
            SurfaceMutation::ExtendStroke(at) => surface.extend_stroke(at),
            SurfaceMutation::EndStroke => {
                let id = surface.end_stroke()?;
                self.enqueue(Commit::Immediate);
                return Some(DrawingFinished {
                    id,
                    tool: AnnotationTool::Freehand,
                });
            }
            SurfaceMutation::CancelStroke => surface.cancel_stroke(),
            SurfaceMutation::Select(id) => surface.select(id),
            SurfaceMutation::Move { id, delta } => {
                if surface.translate(id, delta) {
                    self.enqueue(Commit::Debounced);
                }
            }
            SurfaceMutation::Moved { id } => {
                if surface.object(id).is_some() {
                    self.enqueue(Commit::Debounced);
                }
            }
            SurfaceMutation::PlaceText { at } => {
                let mut obj = DrawingObject::new(
                    at,
                    Shape::Text {
                        content: String::new(),
                        font_size,
                    },
                    ObjectStyle::default(),
                );
                obj.set_ink(palette.ink, palette.stroke_width);
                let id = obj.id;
                surface.add(obj);
                surface.begin_text_edit(id, true);
                log::trace!("TEXT place {id:?}");
            }
            SurfaceMutation::EditText { id } => {
                surface.begin_text_edit(id, false);
            }
            SurfaceMutation::ExitTextEdit => return self.exit_editing(),
        }
        None
    }

    // ─── Text editing ────────────────────────────────────────────────────

    pub fn editing(&self) -> Option<ObjectId> {
        self.surface().and_then(|s| s.editing())
    }

    pub fn type_text(&mut self, text: &str) -> bool {
        self.surface_mut()
            .is_some_and(|s| s.edit_text(|content| content.push_str(text)))
    }

    pub fn backspace(&mut self) -> bool {
        self.surface_mut().is_some_and(|s| {
            s.edit_text(|content| {
                content.pop();
            })
        })
    }

    /// Leave text edit mode. An empty new object is dropped without a
    /// history entry.
    pub fn exit_editing(&mut self) -> Option<DrawingFinished> {
        let outcome = self.surface_mut()?.end_text_edit()?;
        match outcome {
            TextEditOutcome::Changed(id) => {
                self.enqueue(Commit::Immediate);
                Some(DrawingFinished {
                    id,
                    tool: AnnotationTool::Text,
                })
            }
            TextEditOutcome::Removed { was_new: false, .. } => {
                self.enqueue(Commit::Immediate);
                None
            }
            TextEditOutcome::Removed { was_new: true, .. } | TextEditOutcome::Unchanged(_) => None,
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn selected(&self) -> Option<ObjectId> {
        self.surface().and_then(|s| s.selected())
    }

    /// Remove the selected object. Ignored while editing text.
    pub fn delete_selected(&mut self) -> bool {
        let Some(surface) = self.surface_mut() else {
            return false;
        };
        if surface.editing().is_some() {
            return false;
        }
        let Some(id) = surface.selected() else {
            return false;
        };
        if surface.remove(id).is_none() {
            return false;
        }
        log::trace!("ANNOTATE delete {id:?}");
        self.enqueue(Commit::Immediate);
        true
    }

    // ─── Commits & history ───────────────────────────────────────────────

    fn enqueue(&mut self, commit: Commit) {
        let now = self.clock.now_ms();
        if self.commits.enqueue(commit, now) && self.commits.poll(now) {
            self.record(now);
        }
    }

    fn record(&mut self, now: u64) {
        match self.snapshot() {
            Ok(state) => {
                self.history.push(state, now);
                self.revision += 1;
                log::trace!("HISTORY push, {} entries", self.history.len());
            }
            Err(e) => log::error!("ANNOTATE snapshot failed, history unchanged: {e}"),
        }
    }

    /// Finish edits and gestures and write any pending commit.
    fn settle(&mut self) {
        self.exit_editing();
        let cancelled = self.tools.cancel_all();
        self.apply_all(cancelled);
        if self.commits.flush() {
            let now = self.clock.now_ms();
            self.record(now);
        }
    }

    /// Decode `state` onto the surface. Leaves the surface untouched on error.
    fn restore(&mut self, state: &CanvasState) -> Result<(), AnnotationError> {
        let palette = self.theme.current().palette();
        let surface = self.surface_mut().ok_or(AnnotationError::NotReady)?;
        let mut objects = state
            .objects()
            .inspect_err(|e| log::warn!("ANNOTATE restore failed, canvas unchanged: {e}"))?;
        let scale = calculate_resize_scale(state.canvas_size, surface.size());
        for o in &mut objects {
            o.id.reserve();
            o.finalize();
            if !scale.is_identity() {
                o.rescale(scale);
            }
            o.set_ink(palette.ink, palette.stroke_width);
        }
        surface.replace_objects(objects);
        Ok(())
    }

    /// Restore a history state without recording the restore itself.
    fn replay(&mut self, state: &CanvasState) -> bool {
        self.commits.suspend();
        let result = self.restore(state);
        self.commits.resume();
        if result.is_ok() {
            self.revision += 1;
        }
        result.is_ok()
    }

    pub fn undo(&mut self) -> bool {
        if self.surface().is_none() {
            return false;
        }
        self.settle();
        let Some(state) = self.history.undo().cloned() else {
            return false;
        };
        if self.replay(&state) {
            log::debug!("HISTORY undo -> {}", self.history.cursor());
            true
        } else {
            self.history.redo();
            false
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.surface().is_none() {
            return false;
        }
        self.settle();
        let Some(state) = self.history.redo().cloned() else {
            return false;
        };
        if self.replay(&state) {
            log::debug!("HISTORY redo -> {}", self.history.cursor());
            true
        } else {
            self.history.undo();
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whole history, including any commit still waiting on its debounce.
    pub fn export_history(&mut self) -> HistoryExport<CanvasState> {
        if self.commits.flush() {
            let now = self.clock.now_ms();
            self.record(now);
        }
        self.history.export()
    }

    /// Replace the history and show its current entry. On error nothing
    /// changes.
    pub fn import_history(&mut self, export: HistoryExport<CanvasState>) -> Result<(), AnnotationError> {
        let mut next = History::new(self.config.history_capacity);
        next.import(export).map_err(AnnotationError::History)?;
        let Some(current) = next.current().cloned() else {
            return Err(AnnotationError::History("history has no entries".into()));
        };
        if self.surface().is_some() {
            self.settle();
            self.commits.suspend();
            let restored = self.restore(&current);
            self.commits.resume();
            restored?;
        }
        self.history = next;
        self.revision += 1;
        log::debug!("ANNOTATE imported history of {} entries", self.history.len());
        Ok(())
    }

    // ─── Imperative surface ──────────────────────────────────────────────

    pub fn snapshot(&self) -> Result<CanvasState, AnnotationError> {
        let surface = self.surface().ok_or(AnnotationError::NotReady)?;
        CanvasState::capture(&surface.committed(), surface.size(), self.clock.now_ms())
            .inspect_err(|e| log::warn!("ANNOTATE snapshot failed: {e}"))
    }

    /// Replace the canvas with `state` and record it in history.
    pub fn load(&mut self, state: &CanvasState) -> Result<(), AnnotationError> {
        if self.surface().is_none() {
            return Err(AnnotationError::NotReady);
        }
        self.settle();
        self.restore(state)?;
        self.enqueue(Commit::Immediate);
        log::debug!("ANNOTATE loaded snapshot from {}", state.timestamp);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.settle();
        let Some(surface) = self.surface_mut() else {
            return;
        };
        surface.clear();
        self.enqueue(Commit::Immediate);
    }

    /// Raster export as a `data:` URL.
    pub fn export_png(&self, options: &ExportOptions) -> Result<String, AnnotationError> {
        let surface = self.surface().ok_or(AnnotationError::NotReady)?;
        export_raster(&surface.committed(), surface.size(), options, None)
            .inspect_err(|e| log::warn!("ANNOTATE export failed: {e}"))
            .map_err(AnnotationError::from)
    }

    pub fn export_svg(&self) -> Result<String, AnnotationError> {
        let surface = self.surface().ok_or(AnnotationError::NotReady)?;
        Ok(export_svg(&surface.committed(), surface.size(), None))
    }

    // ─── Environment ─────────────────────────────────────────────────────

    pub fn theme(&self) -> Theme {
        self.theme.current()
    }

    /// Feed theme signals; recolours everything when the theme flips.
    pub fn set_theme_signals(&mut self, signals: ThemeSignals) -> Option<Theme> {
        let theme = self.theme.update(signals)?;
        if let Some(s) = self.surface_mut() {
            s.apply_palette(theme.palette());
        }
        Some(theme)
    }

    /// Record an observed container size; applied on a later `tick`.
    pub fn observe_resize(&mut self, size: Size) {
        let now = self.clock.now_ms();
        self.resize.observe(size, now);
    }

    /// Fire any timer whose deadline has passed.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        if let Some((size, scale)) = self.resize.poll(now)
            && let Some(s) = self.surface_mut()
        {
            s.resize(size, scale);
        }
        if self.commits.poll(now) {
            self.record(now);
        }
    }

    /// A snapshot to persist if the auto-save interval has elapsed, the
    /// canvas changed and no save is in flight.
    pub fn poll_auto_save(&mut self) -> Option<CanvasState> {
        let now = self.clock.now_ms();
        if !self.auto_save.due(now, self.revision) {
            return None;
        }
        self.begin_save()
    }

    /// Start an explicit save. `None` while another save is in flight.
    pub fn save_now(&mut self) -> Option<CanvasState> {
        self.begin_save()
    }

    fn begin_save(&mut self) -> Option<CanvasState> {
        if self.surface().is_none() || !self.auto_save.begin(self.revision) {
            return None;
        }
        match self.snapshot() {
            Ok(state) => Some(state),
            Err(e) => {
                self.auto_save.finish(Err(e.to_string()));
                None
            }
        }
    }

    /// Report the outcome of a save handed out by `poll_auto_save`/`save_now`.
    pub fn save_finished(&mut self, result: Result<(), String>) {
        self.auto_save.finish(result);
    }

    pub fn is_saving(&self) -> bool {
        self.auto_save.in_flight()
    }

    /// Flush everything pending and hand back the history for a later
    /// mount. Consumes the engine so no timer can fire afterwards.
    pub fn teardown(mut self) -> HistoryExport<CanvasState> {
        self.exit_editing();
        let cancelled = self.tools.cancel_all();
        self.apply_all(cancelled);
        if let Some((size, scale)) = self.resize.flush()
            && let Some(s) = self.surface_mut()
        {
            s.resize(size, scale);
        }
        if self.commits.flush() {
            log::debug!("ANNOTATE teardown flushed pending commit");
            let now = self.clock.now_ms();
            self.record(now);
        }
        self.history.export()
    }
}
