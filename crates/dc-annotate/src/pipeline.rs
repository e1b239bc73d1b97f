//! Drawing pipeline: each tool translates overlay pointer events into
//! `SurfaceMutation`s that the engine applies to the drawing surface.
//!
//! | Modifier  | Rectangle | Circle | Line / Arrow        |
//! |-----------|-----------|--------|---------------------|
//! | **Shift** | Square    | none   | Snap to 45° steps   |

use crate::tool::AnnotationTool;
use dc_core::{DrawingObject, ObjectId, ObjectStyle, Shape, circle_from_drag, normalize_rectangle};
use kurbo::{Point, Vec2};

/// Pointer input in overlay space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { at: Point, shift: bool },
    Move { at: Point, shift: bool },
    Up { at: Point, shift: bool },
}

/// What the engine knows about the surface when dispatching an event.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    /// Topmost pickable object under the pointer (`None` when hit-testing is off).
    pub hit: Option<&'a DrawingObject>,
    pub style: ObjectStyle,
    pub font_size: f64,
    /// Text object in edit mode, if any.
    pub editing: Option<ObjectId>,
}

/// Changes a tool asks the engine to make.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceMutation {
    Add(DrawingObject),
    Reshape { id: ObjectId, origin: Point, shape: Shape },
    Finalize { id: ObjectId },
    Discard { id: ObjectId },
    BeginStroke(Point),
    ExtendStroke(Point),
    EndStroke,
    CancelStroke,
    Select(Option<ObjectId>),
    Move { id: ObjectId, delta: Vec2 },
    /// A move gesture on `id` ended.
    Moved { id: ObjectId },
    PlaceText { at: Point },
    EditText { id: ObjectId },
    ExitTextEdit,
}

pub trait Tool {
    fn kind(&self) -> AnnotationTool;

    fn handle(&mut self, event: &PointerEvent, ctx: &ToolContext<'_>) -> Vec<SurfaceMutation>;

    /// Abandon any gesture in progress.
    fn cancel(&mut self) -> Vec<SurfaceMutation> {
        vec![]
    }
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SelectTool {
    dragging: Option<ObjectId>,
    last: Point,
    moved: bool,
}

impl Tool for SelectTool {
    fn kind(&self) -> AnnotationTool {
        AnnotationTool::Select
    }

    fn handle(&mut self, event: &PointerEvent, ctx: &ToolContext<'_>) -> Vec<SurfaceMutation> {
        match *event {
            PointerEvent::Down { at, .. } => match ctx.hit.filter(|o| o.selectable) {
                Some(obj) => {
                    self.dragging = Some(obj.id);
                    self.last = at;
                    self.moved = false;
                    vec![SurfaceMutation::Select(Some(obj.id))]
                }
                None => {
                    self.dragging = None;
                    vec![SurfaceMutation::Select(None)]
                }
            },
            PointerEvent::Move { at, .. } => {
                let Some(id) = self.dragging else {
                    return vec![];
                };
                let delta = at - self.last;
                if delta == Vec2::ZERO {
                    return vec![];
                }
                self.last = at;
                self.moved = true;
                vec![SurfaceMutation::Move { id, delta }]
            }
            PointerEvent::Up { .. } => {
                let ended = self.dragging.take().filter(|_| self.moved);
                self.moved = false;
                ended.map(|id| SurfaceMutation::Moved { id }).into_iter().collect()
            }
        }
    }

    fn cancel(&mut self) -> Vec<SurfaceMutation> {
        let ended = self.dragging.take().filter(|_| self.moved);
        self.moved = false;
        ended.map(|id| SurfaceMutation::Moved { id }).into_iter().collect()
    }
}

// ─── Shape Tools ─────────────────────────────────────────────────────────

/// Shapes drawn by click-and-drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Line,
    Arrow,
}

impl ShapeKind {
    /// Geometry for a drag from `start` to `current`: world origin and local shape.
    pub fn geometry(self, start: Point, current: Point, shift: bool) -> (Point, Shape) {
        match self {
            ShapeKind::Rectangle => {
                let end = if shift { square_end(start, current) } else { current };
                let r = normalize_rectangle(start.x, start.y, end.x, end.y);
                (
                    Point::new(r.left, r.top),
                    Shape::Rectangle {
                        width: r.width,
                        height: r.height,
                    },
                )
            }
            ShapeKind::Circle => {
                let c = circle_from_drag(start, current);
                (Point::new(c.left, c.top), Shape::Circle { radius: c.radius })
            }
            ShapeKind::Line => {
                let end = if shift { snap_45(start, current) } else { current };
                (start, Shape::Line { end: (end - start).to_point() })
            }
            ShapeKind::Arrow => {
                let end = if shift { snap_45(start, current) } else { current };
                (start, Shape::Arrow { end: (end - start).to_point() })
            }
        }
    }

    fn tool(self) -> AnnotationTool {
        match self {
            ShapeKind::Rectangle => AnnotationTool::Rectangle,
            ShapeKind::Circle => AnnotationTool::Circle,
            ShapeKind::Line => AnnotationTool::Line,
            ShapeKind::Arrow => AnnotationTool::Arrow,
        }
    }
}

fn square_end(start: Point, current: Point) -> Point {
    let d = current - start;
    let side = d.x.abs().max(d.y.abs());
    Point::new(start.x + side.copysign(d.x), start.y + side.copysign(d.y))
}

fn snap_45(start: Point, current: Point) -> Point {
    let d = current - start;
    let step = std::f64::consts::FRAC_PI_4;
    let angle = (d.atan2() / step).round() * step;
    start + Vec2::from_angle(angle) * d.hypot()
}

#[derive(Debug)]
pub struct ShapeTool {
    kind: ShapeKind,
    drawing: Option<(ObjectId, Point)>,
}

impl ShapeTool {
    pub fn new(kind: ShapeKind) -> Self {
        Self { kind, drawing: None }
    }
}

impl Tool for ShapeTool {
    fn kind(&self) -> AnnotationTool {
        self.kind.tool()
    }

    fn handle(&mut self, event: &PointerEvent, ctx: &ToolContext<'_>) -> Vec<SurfaceMutation> {
        match *event {
            PointerEvent::Down { at, shift } => {
                let (origin, shape) = self.kind.geometry(at, at, shift);
                let obj = DrawingObject::new(origin, shape, ctx.style);
                self.drawing = Some((obj.id, at));
                log::trace!("DRAW start {:?} {:?}", self.kind, obj.id);
                vec![SurfaceMutation::Add(obj)]
            }
            PointerEvent::Move { at, shift } => match self.drawing {
                Some((id, start)) => {
                    let (origin, shape) = self.kind.geometry(start, at, shift);
                    vec![SurfaceMutation::Reshape { id, origin, shape }]
                }
                None => vec![],
            },
            PointerEvent::Up { at, shift } => match self.drawing.take() {
                Some((id, start)) => {
                    let (origin, shape) = self.kind.geometry(start, at, shift);
                    vec![
                        SurfaceMutation::Reshape { id, origin, shape },
                        SurfaceMutation::Finalize { id },
                    ]
                }
                None => vec![],
            },
        }
    }

    fn cancel(&mut self) -> Vec<SurfaceMutation> {
        self.drawing
            .take()
            .map(|(id, _)| SurfaceMutation::Discard { id })
            .into_iter()
            .collect()
    }
}

// ─── Freehand Tool ───────────────────────────────────────────────────────

/// Delegates to the surface's native brush.
#[derive(Debug, Default)]
pub struct FreehandTool {
    active: bool,
}

impl Tool for FreehandTool {
    fn kind(&self) -> AnnotationTool {
        AnnotationTool::Freehand
    }

    fn handle(&mut self, event: &PointerEvent, _ctx: &ToolContext<'_>) -> Vec<SurfaceMutation> {
        match *event {
            PointerEvent::Down { at, .. } => {
                self.active = true;
                vec![SurfaceMutation::BeginStroke(at)]
            }
            PointerEvent::Move { at, .. } if self.active => vec![SurfaceMutation::ExtendStroke(at)],
            PointerEvent::Move { .. } => vec![],
            PointerEvent::Up { at, .. } if self.active => {
                self.active = false;
                vec![SurfaceMutation::ExtendStroke(at), SurfaceMutation::EndStroke]
            }
            PointerEvent::Up { .. } => vec![],
        }
    }

    fn cancel(&mut self) -> Vec<SurfaceMutation> {
        if std::mem::take(&mut self.active) {
            vec![SurfaceMutation::CancelStroke]
        } else {
            vec![]
        }
    }
}

// ─── Text Tool ───────────────────────────────────────────────────────────

/// Click to place a text object, or click an existing one to edit it.
/// Clicking while editing ends the edit.
#[derive(Debug, Default)]
pub struct TextTool;

impl Tool for TextTool {
    fn kind(&self) -> AnnotationTool {
        AnnotationTool::Text
    }

    fn handle(&mut self, event: &PointerEvent, ctx: &ToolContext<'_>) -> Vec<SurfaceMutation> {
        let PointerEvent::Down { at, .. } = *event else {
            return vec![];
        };
        if let Some(editing) = ctx.editing {
            if ctx.hit.is_some_and(|o| o.id == editing) {
                return vec![];
            }
            return vec![SurfaceMutation::ExitTextEdit];
        }
        match ctx.hit {
            Some(obj) if matches!(obj.shape, Shape::Text { .. }) => {
                vec![SurfaceMutation::EditText { id: obj.id }]
            }
            _ => vec![SurfaceMutation::PlaceText { at }],
        }
    }
}

// ─── Tool Box ────────────────────────────────────────────────────────────

/// One instance of every tool; gesture state survives tool switches only
/// until `cancel`.
#[derive(Debug)]
pub struct ToolBox {
    select: SelectTool,
    rectangle: ShapeTool,
    circle: ShapeTool,
    line: ShapeTool,
    arrow: ShapeTool,
    freehand: FreehandTool,
    text: TextTool,
}

impl Default for ToolBox {
    fn default() -> Self {
        Self {
            select: SelectTool::default(),
            rectangle: ShapeTool::new(ShapeKind::Rectangle),
            circle: ShapeTool::new(ShapeKind::Circle),
            line: ShapeTool::new(ShapeKind::Line),
            arrow: ShapeTool::new(ShapeKind::Arrow),
            freehand: FreehandTool::default(),
            text: TextTool,
        }
    }
}

impl ToolBox {
    pub fn get(&mut self, kind: AnnotationTool) -> &mut dyn Tool {
        match kind {
            AnnotationTool::Select => &mut self.select,
            AnnotationTool::Rectangle => &mut self.rectangle,
            AnnotationTool::Circle => &mut self.circle,
            AnnotationTool::Line => &mut self.line,
            AnnotationTool::Arrow => &mut self.arrow,
            AnnotationTool::Freehand => &mut self.freehand,
            AnnotationTool::Text => &mut self.text,
        }
    }

    /// Cancel gestures on every tool.
    pub fn cancel_all(&mut self) -> Vec<SurfaceMutation> {
        AnnotationTool::ALL
            .into_iter()
            .flat_map(|kind| self.get(kind).cancel())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> ToolContext<'static> {
        ToolContext {
            hit: None,
            style: ObjectStyle::default(),
            font_size: 18.0,
            editing: None,
        }
    }

    fn down(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Down {
            at: Point::new(x, y),
            shift: false,
        }
    }

    fn mv(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move {
            at: Point::new(x, y),
            shift: false,
        }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up {
            at: Point::new(x, y),
            shift: false,
        }
    }

    #[test]
    fn rectangle_inverted_drag_normalizes() {
        let mut tool = ShapeTool::new(ShapeKind::Rectangle);
        let added = tool.handle(&down(50.0, 60.0), &ctx());
        let SurfaceMutation::Add(obj) = &added[0] else {
            panic!("expected Add, got {added:?}");
        };
        assert_eq!(obj.shape, Shape::Rectangle { width: 0.0, height: 0.0 });

        let moved = tool.handle(&mv(10.0, 20.0), &ctx());
        assert_eq!(
            moved,
            vec![SurfaceMutation::Reshape {
                id: obj.id,
                origin: Point::new(10.0, 20.0),
                shape: Shape::Rectangle {
                    width: 40.0,
                    height: 40.0
                },
            }]
        );

        let ended = tool.handle(&up(10.0, 20.0), &ctx());
        assert_eq!(ended.last(), Some(&SurfaceMutation::Finalize { id: obj.id }));
    }

    #[test]
    fn shift_squares_rectangle() {
        let (origin, shape) = ShapeKind::Rectangle.geometry(Point::ORIGIN, Point::new(-30.0, 10.0), true);
        assert_eq!(origin, Point::new(-30.0, 0.0));
        assert_eq!(shape, Shape::Rectangle { width: 30.0, height: 30.0 });
    }

    #[test]
    fn circle_uses_half_distance() {
        let (origin, shape) = ShapeKind::Circle.geometry(Point::new(30.0, 40.0), Point::ORIGIN, false);
        assert_eq!(origin, Point::ORIGIN);
        assert_eq!(shape, Shape::Circle { radius: 25.0 });
    }

    #[test]
    fn arrow_end_is_local() {
        let (origin, shape) = ShapeKind::Arrow.geometry(Point::new(10.0, 10.0), Point::new(30.0, 5.0), false);
        assert_eq!(origin, Point::new(10.0, 10.0));
        assert_eq!(shape, Shape::Arrow { end: Point::new(20.0, -5.0) });
    }

    #[test]
    fn cancel_discards_shape_in_progress() {
        let mut tool = ShapeTool::new(ShapeKind::Circle);
        let added = tool.handle(&down(0.0, 0.0), &ctx());
        let SurfaceMutation::Add(obj) = &added[0] else {
            panic!("expected Add");
        };
        assert_eq!(tool.cancel(), vec![SurfaceMutation::Discard { id: obj.id }]);
        assert!(tool.handle(&up(5.0, 5.0), &ctx()).is_empty());
    }

    #[test]
    fn freehand_drives_brush() {
        let mut tool = FreehandTool::default();
        assert!(tool.handle(&mv(1.0, 1.0), &ctx()).is_empty());
        assert_eq!(
            tool.handle(&down(0.0, 0.0), &ctx()),
            vec![SurfaceMutation::BeginStroke(Point::ORIGIN)]
        );
        assert_eq!(
            tool.handle(&up(2.0, 2.0), &ctx()),
            vec![
                SurfaceMutation::ExtendStroke(Point::new(2.0, 2.0)),
                SurfaceMutation::EndStroke
            ]
        );
    }

    #[test]
    fn select_drag_moves_then_reports_release() {
        let mut obj = DrawingObject::new(
            Point::ORIGIN,
            Shape::Circle { radius: 10.0 },
            ObjectStyle::default(),
        );
        obj.finalize();
        let hit_ctx = ToolContext {
            hit: Some(&obj),
            ..ctx()
        };
        let mut tool = SelectTool::default();
        assert_eq!(
            tool.handle(&down(5.0, 5.0), &hit_ctx),
            vec![SurfaceMutation::Select(Some(obj.id))]
        );
        assert_eq!(
            tool.handle(&mv(8.0, 9.0), &ctx()),
            vec![SurfaceMutation::Move {
                id: obj.id,
                delta: Vec2::new(3.0, 4.0)
            }]
        );
        assert_eq!(tool.handle(&up(8.0, 9.0), &ctx()), vec![SurfaceMutation::Moved { id: obj.id }]);
    }

    #[test]
    fn select_click_without_move_reports_nothing_on_release() {
        let mut obj = DrawingObject::new(Point::ORIGIN, Shape::Circle { radius: 10.0 }, ObjectStyle::default());
        obj.finalize();
        let hit_ctx = ToolContext {
            hit: Some(&obj),
            ..ctx()
        };
        let mut tool = SelectTool::default();
        tool.handle(&down(5.0, 5.0), &hit_ctx);
        assert!(tool.handle(&up(5.0, 5.0), &ctx()).is_empty());
    }

    #[test]
    fn text_tool_places_or_exits() {
        let mut tool = TextTool;
        assert_eq!(
            tool.handle(&down(3.0, 4.0), &ctx()),
            vec![SurfaceMutation::PlaceText { at: Point::new(3.0, 4.0) }]
        );
        let editing = ToolContext {
            editing: Some(ObjectId(999)),
            ..ctx()
        };
        assert_eq!(tool.handle(&down(3.0, 4.0), &editing), vec![SurfaceMutation::ExitTextEdit]);
    }
}
