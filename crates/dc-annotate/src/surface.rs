//! The drawing surface: object list, native brush and edit state.

use crate::error::AnnotationError;
use crate::theme::ThemePalette;
use crate::tool::SurfaceMode;
use dc_core::{Color, DrawingObject, ObjectId, ObjectStyle, ResizeScale, Shape};
use kurbo::{Point, Size, Vec2};

/// Brush used by the freehand tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Color,
    pub width: f64,
}

impl Brush {
    pub fn style(&self) -> ObjectStyle {
        ObjectStyle {
            stroke: self.color,
            stroke_width: self.width,
            fill: None,
        }
    }
}

#[derive(Debug, Clone)]
struct TextEdit {
    id: ObjectId,
    /// Content before editing started; `None` for a freshly placed object.
    original: Option<String>,
}

/// How a text edit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEditOutcome {
    Unchanged(ObjectId),
    Changed(ObjectId),
    /// Emptied and removed. `was_new` objects never reached history.
    Removed { id: ObjectId, was_new: bool },
}

#[derive(Debug, Clone)]
pub struct DrawingSurface {
    objects: Vec<DrawingObject>,
    size: Size,
    mode: SurfaceMode,
    brush: Brush,
    stroke: Option<Vec<Point>>,
    selected: Option<ObjectId>,
    editing: Option<TextEdit>,
}

impl DrawingSurface {
    /// Create a surface for a container of `size`.
    pub fn new(size: Size, palette: ThemePalette) -> Result<Self, AnnotationError> {
        if !(size.width.is_finite() && size.height.is_finite()) || size.width <= 0.0 || size.height <= 0.0 {
            return Err(AnnotationError::Init(format!(
                "container has no usable size ({}x{})",
                size.width, size.height
            )));
        }
        Ok(Self {
            objects: Vec::new(),
            size,
            mode: SurfaceMode::default(),
            brush: Brush {
                color: palette.ink,
                width: palette.stroke_width,
            },
            stroke: None,
            selected: None,
            editing: None,
        })
    }

    pub fn objects(&self) -> &[DrawingObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&DrawingObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut DrawingObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Objects that have finished drawing and belong in snapshots.
    pub fn committed(&self) -> Vec<DrawingObject> {
        self.objects.iter().filter(|o| o.selectable).cloned().collect()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn mode(&self) -> SurfaceMode {
        self.mode
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    pub fn editing(&self) -> Option<ObjectId> {
        self.editing.as_ref().map(|e| e.id)
    }

    /// Points of the stroke being drawn, in world space.
    pub fn pending_stroke(&self) -> Option<&[Point]> {
        self.stroke.as_deref()
    }

    pub fn set_mode(&mut self, mode: SurfaceMode) {
        if !mode.drawing_mode && self.stroke.take().is_some() {
            log::trace!("SURFACE drop unfinished stroke");
        }
        if !mode.selection {
            self.selected = None;
        }
        self.mode = mode;
    }

    pub fn select(&mut self, id: Option<ObjectId>) {
        self.selected = id.filter(|id| self.object(*id).is_some_and(|o| o.selectable));
    }

    pub fn add(&mut self, object: DrawingObject) {
        self.objects.push(object);
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<DrawingObject> {
        let idx = self.objects.iter().position(|o| o.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.editing() == Some(id) {
            self.editing = None;
        }
        Some(self.objects.remove(idx))
    }

    pub fn translate(&mut self, id: ObjectId, delta: Vec2) -> bool {
        match self.object_mut(id) {
            Some(o) => {
                o.translate(delta);
                true
            }
            None => false,
        }
    }

    /// Remove every object and reset transient state.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.reset_transient();
    }

    /// Swap in restored objects.
    pub fn replace_objects(&mut self, objects: Vec<DrawingObject>) {
        self.objects = objects;
        self.reset_transient();
    }

    fn reset_transient(&mut self) {
        self.stroke = None;
        self.selected = None;
        self.editing = None;
    }

    /// Rescale every object for a new container size.
    pub fn resize(&mut self, size: Size, scale: ResizeScale) {
        self.size = size;
        if scale.is_identity() {
            return;
        }
        for o in &mut self.objects {
            o.rescale(scale);
        }
        log::debug!(
            "SURFACE rescaled {} objects by {:.3}x{:.3}",
            self.objects.len(),
            scale.scale_x,
            scale.scale_y
        );
    }

    /// Recolour the brush and every object.
    pub fn apply_palette(&mut self, palette: ThemePalette) {
        self.brush = Brush {
            color: palette.ink,
            width: palette.stroke_width,
        };
        for o in &mut self.objects {
            o.set_ink(palette.ink, palette.stroke_width);
        }
    }

    // ─── Native brush ────────────────────────────────────────────────────

    pub fn begin_stroke(&mut self, at: Point) {
        if !self.mode.drawing_mode {
            return;
        }
        self.stroke = Some(vec![at]);
    }

    pub fn extend_stroke(&mut self, at: Point) {
        if let Some(points) = &mut self.stroke
            && points.last() != Some(&at)
        {
            points.push(at);
        }
    }

    /// Turn the pending stroke into a finished freehand object.
    pub fn end_stroke(&mut self) -> Option<ObjectId> {
        let points = self.stroke.take()?;
        if points.len() < 2 {
            return None;
        }
        let origin = points[0];
        let local = points.iter().map(|p| (*p - origin).to_point()).collect();
        let mut obj = DrawingObject::new(origin, Shape::Freehand { points: local }, self.brush.style());
        obj.finalize();
        let id = obj.id;
        self.objects.push(obj);
        Some(id)
    }

    pub fn cancel_stroke(&mut self) {
        self.stroke = None;
    }

    // ─── Text editing ────────────────────────────────────────────────────

    /// Enter edit mode on a text object.
    pub fn begin_text_edit(&mut self, id: ObjectId, is_new: bool) -> bool {
        let Some(Shape::Text { content, .. }) = self.object(id).map(|o| &o.shape) else {
            return false;
        };
        self.editing = Some(TextEdit {
            id,
            original: (!is_new).then(|| content.clone()),
        });
        true
    }

    /// Mutate the content of the object being edited.
    pub fn edit_text(&mut self, f: impl FnOnce(&mut String)) -> bool {
        let Some(id) = self.editing() else {
            return false;
        };
        match self.object_mut(id).map(|o| &mut o.shape) {
            Some(Shape::Text { content, .. }) => {
                f(content);
                true
            }
            _ => false,
        }
    }

    pub fn end_text_edit(&mut self) -> Option<TextEditOutcome> {
        let edit = self.editing.take()?;
        let content = match self.object(edit.id).map(|o| &o.shape) {
            Some(Shape::Text { content, .. }) => content.clone(),
            _ => return None,
        };
        if content.is_empty() {
            self.remove(edit.id);
            return Some(TextEditOutcome::Removed {
                id: edit.id,
                was_new: edit.original.is_none(),
            });
        }
        if edit.original.as_deref() == Some(content.as_str()) {
            return Some(TextEditOutcome::Unchanged(edit.id));
        }
        if let Some(o) = self.object_mut(edit.id) {
            o.finalize();
        }
        Some(TextEditOutcome::Changed(edit.id))
    }
}
