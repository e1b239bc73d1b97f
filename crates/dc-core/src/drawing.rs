//! Drawing objects of the annotation overlay.
//!
//! Every object has a world-space origin (`left`, `top`), a per-axis scale
//! factor, and a `Shape` whose geometry is local to the origin:
//! `world = origin + local * scale`. Container resizes only touch the
//! origin and scale; the local geometry is what the user drew.

use crate::geometry::ResizeScale;
use crate::id::ObjectId;
use crate::model::Color;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Approximate glyph advance as a fraction of font size.
const GLYPH_ADVANCE: f64 = 0.6;
/// Line height as a fraction of font size.
const LINE_HEIGHT: f64 = 1.2;

/// Geometry of a drawing object, local to its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Rectangle { width: f64, height: f64 },
    Circle { radius: f64 },
    /// Straight segment from the origin to `end`.
    Line { end: Point },
    /// Like `Line`, with an arrow head at `end`.
    Arrow { end: Point },
    Text { content: String, font_size: f64 },
    /// Brush stroke; the first point is usually the origin.
    Freehand { points: Vec<Point> },
}

impl Shape {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Rectangle { .. } => "rectangle",
            Shape::Circle { .. } => "circle",
            Shape::Line { .. } => "line",
            Shape::Arrow { .. } => "arrow",
            Shape::Text { .. } => "text",
            Shape::Freehand { .. } => "freehand",
        }
    }

    /// Local bounding box (before scale).
    fn local_bounds(&self) -> Rect {
        match self {
            Shape::Rectangle { width, height } => Rect::new(0.0, 0.0, *width, *height),
            Shape::Circle { radius } => Rect::new(0.0, 0.0, radius * 2.0, radius * 2.0),
            Shape::Line { end } | Shape::Arrow { end } => Rect::from_points(Point::ORIGIN, *end),
            Shape::Text { content, font_size } => {
                let longest = content.lines().map(|l| l.chars().count()).max().unwrap_or(0);
                let lines = content.lines().count().max(1);
                Rect::new(
                    0.0,
                    0.0,
                    (longest.max(1) as f64) * font_size * GLYPH_ADVANCE,
                    lines as f64 * font_size * LINE_HEIGHT,
                )
            }
            Shape::Freehand { points } => {
                let mut iter = points.iter();
                let Some(first) = iter.next() else {
                    return Rect::ZERO;
                };
                iter.fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
            }
        }
    }
}

/// Stroke and fill applied to a drawing object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectStyle {
    pub stroke: Color,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
}

impl Default for ObjectStyle {
    fn default() -> Self {
        Self {
            stroke: Color::BLACK,
            stroke_width: 2.0,
            fill: None,
        }
    }
}

/// An individual item on the annotation overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingObject {
    pub id: ObjectId,
    pub left: f64,
    pub top: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub shape: Shape,
    pub style: ObjectStyle,
    /// Can be picked by the select tool.
    pub selectable: bool,
    /// Receives pointer events at all (hit-testing enabled).
    pub evented: bool,
}

impl DrawingObject {
    /// New object at `origin`, not yet interactive (still being drawn).
    pub fn new(origin: Point, shape: Shape, style: ObjectStyle) -> Self {
        Self {
            id: ObjectId::next(),
            left: origin.x,
            top: origin.y,
            scale_x: 1.0,
            scale_y: 1.0,
            shape,
            style,
            selectable: false,
            evented: false,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Map a local point to world space.
    pub fn to_world(&self, local: Point) -> Point {
        Point::new(
            self.left + local.x * self.scale_x,
            self.top + local.y * self.scale_y,
        )
    }

    /// World-space bounding box.
    pub fn bounds(&self) -> Rect {
        let local = self.shape.local_bounds();
        Rect::from_points(self.to_world(local.origin()), self.to_world(Point::new(local.x1, local.y1)))
    }

    /// Make the object pickable once drawing has finished.
    pub fn finalize(&mut self) {
        self.selectable = true;
        self.evented = true;
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.left += delta.x;
        self.top += delta.y;
    }

    /// Proportional container rescale: origin and scale factor both follow the ratio.
    pub fn rescale(&mut self, scale: ResizeScale) {
        self.left *= scale.scale_x;
        self.top *= scale.scale_y;
        self.scale_x *= scale.scale_x;
        self.scale_y *= scale.scale_y;
    }

    /// Apply the theme ink colour. Text is filled; every other shape is stroked.
    pub fn set_ink(&mut self, ink: Color, stroke_width: f64) {
        match self.shape {
            Shape::Text { .. } => {
                self.style.fill = Some(ink);
                self.style.stroke = ink;
            }
            Shape::Rectangle { .. }
            | Shape::Circle { .. }
            | Shape::Line { .. }
            | Shape::Arrow { .. }
            | Shape::Freehand { .. } => {
                self.style.stroke = ink;
                self.style.stroke_width = stroke_width;
            }
        }
    }

    /// Whether the object has collapsed to nothing (e.g. a click without drag).
    pub fn is_degenerate(&self) -> bool {
        match &self.shape {
            Shape::Rectangle { width, height } => *width <= 0.0 && *height <= 0.0,
            Shape::Circle { radius } => *radius <= 0.0,
            Shape::Line { end } | Shape::Arrow { end } => end.to_vec2().hypot() <= 0.0,
            Shape::Text { content, .. } => content.is_empty(),
            Shape::Freehand { points } => points.len() < 2,
        }
    }
}
