//! Coordinate conversion between viewport (pointer) space and canvas space.
//!
//! `client` points are pointer coordinates as reported by the host, i.e.
//! relative to the page. Subtracting the container origin gives
//! container-local viewport coordinates; the `CanvasTransform` then maps
//! those to canvas space. All functions here are pure.

use crate::model::CanvasTransform;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Position and size of the canvas container in client coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub origin: Point,
    pub size: Size,
}

impl Container {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Container-local rectangle, `(0, 0)` to `size`.
    pub fn local_rect(&self) -> Rect {
        Rect::from_origin_size(Point::ORIGIN, self.size)
    }

    /// Centre of the container in container-local coordinates.
    pub fn local_center(&self) -> Point {
        Point::new(self.size.width / 2.0, self.size.height / 2.0)
    }

    /// Client point → container-local viewport point.
    pub fn to_local(&self, client: Point) -> Point {
        client - self.origin.to_vec2()
    }
}

/// Client (pointer) coordinates → canvas coordinates.
#[inline]
pub fn to_canvas(client: Point, transform: &CanvasTransform, origin: Point) -> Point {
    let local = client - origin.to_vec2() - transform.translation();
    Point::new(local.x / transform.scale, local.y / transform.scale)
}

/// Canvas coordinates → client (pointer) coordinates. Exact inverse of [`to_canvas`].
#[inline]
pub fn to_viewport(canvas: Point, transform: &CanvasTransform, origin: Point) -> Point {
    Point::new(
        canvas.x * transform.scale + transform.translate_x + origin.x,
        canvas.y * transform.scale + transform.translate_y + origin.y,
    )
}

/// Whether the viewport projection of a canvas point falls inside the
/// container bounds grown by `margin` on every side.
pub fn is_visible(canvas: Point, transform: &CanvasTransform, container: &Container, margin: f64) -> bool {
    let projected = to_viewport(canvas, transform, Point::ORIGIN);
    container
        .local_rect()
        .inflate(margin, margin)
        .contains(projected)
}
